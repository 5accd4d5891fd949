//! Section/document model.
//!
//! A document is an ordered set of named sections. Concatenating them (each
//! followed by one line break) yields the compilation unit; the per-section
//! line counts translate a flat line number back into `(section, line)`.
//!
//! ```text
//! "1. Imports" (3 lines) ─┐
//! "2. Style"   (4 lines) ─┼─ concatenate() ─> unit (17 lines)
//! "3. Code"   (10 lines) ─┘
//!
//! flat line 5  ─ map_flat_line() ─> ("2. Style", 2)
//! ```

mod parse;
pub mod sample;

pub use parse::parse_document;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Name of the implicit section used for single-section documents.
pub const DEFAULT_SECTION: &str = "default";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("duplicate section `{0}`")]
    DuplicateSection(String),

    #[error("unknown section `{0}`")]
    UnknownSection(String),

    #[error("section index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("document has no sections")]
    Empty,

    #[error("section `{0}` is not a string")]
    NotText(String),

    #[error("not a sectioned document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A named, independently editable slice of source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub content: String,
}

/// Direction for `SectionModel::move_section`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// A flat line number translated into a section-relative one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedLine {
    /// `None` when the line lies past the end of the document.
    pub section: Option<String>,
    pub line_number: u32,
}

/// Ordered sections plus their derived line counts.
///
/// Invariant: `line_counts` has exactly one entry per section, equal to the
/// section's newline count plus one, i.e. the lines it occupies in the unit
/// once its separator is appended.
#[derive(Debug, Clone)]
pub struct SectionModel {
    sections: Vec<Section>,
    line_counts: FxHashMap<String, usize>,
}

impl SectionModel {
    /// Single implicit section holding `content` verbatim.
    pub fn single(content: impl Into<String>) -> Self {
        let mut model = Self {
            sections: vec![Section {
                name: DEFAULT_SECTION.to_string(),
                content: content.into(),
            }],
            line_counts: FxHashMap::default(),
        };
        model.recompute();
        model
    }

    /// Build from ordered `(name, content)` pairs.
    pub fn from_sections<I, N, C>(sections: I) -> Result<Self, DocumentError>
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let mut list: Vec<Section> = Vec::new();
        for (name, content) in sections {
            let name = name.into();
            if list.iter().any(|s| s.name == name) {
                return Err(DocumentError::DuplicateSection(name));
            }
            list.push(Section {
                name,
                content: content.into(),
            });
        }
        if list.is_empty() {
            return Err(DocumentError::Empty);
        }

        let mut model = Self {
            sections: list,
            line_counts: FxHashMap::default(),
        };
        model.recompute();
        Ok(model)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_multi_section(&self) -> bool {
        self.sections.len() > 1
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.sections.get(index).map(|s| s.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.content.as_str())
    }

    pub fn line_count(&self, name: &str) -> Option<usize> {
        self.line_counts.get(name).copied()
    }

    pub fn line_counts(&self) -> &FxHashMap<String, usize> {
        &self.line_counts
    }

    /// Replace the content of one section and recompute all line counts.
    pub fn set_section_content(
        &mut self,
        name: &str,
        content: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let section = self
            .sections
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| DocumentError::UnknownSection(name.to_string()))?;
        section.content = content.into();
        self.recompute();
        Ok(())
    }

    /// Replace the content of the section at `index` (the selected section).
    pub fn set_section_content_at(
        &mut self,
        index: usize,
        content: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let section = self
            .sections
            .get_mut(index)
            .ok_or(DocumentError::IndexOutOfRange(index))?;
        section.content = content.into();
        self.recompute();
        Ok(())
    }

    /// Join all sections in order, each suffixed with one line break.
    pub fn concatenate(&self) -> String {
        let capacity = self.sections.iter().map(|s| s.content.len() + 1).sum();
        let mut unit = String::with_capacity(capacity);
        for section in &self.sections {
            unit.push_str(&section.content);
            unit.push('\n');
        }
        unit
    }

    /// Translate a line of the concatenated unit into `(section, line)`.
    ///
    /// Walks sections in order, subtracting each section's line count while
    /// the remainder exceeds it. A single-section document is never offset.
    pub fn map_flat_line(&self, line_number: u32) -> MappedLine {
        if !self.is_multi_section() {
            return MappedLine {
                section: self.name_at(0).map(str::to_string),
                line_number,
            };
        }

        let mut remaining = line_number as usize;
        for section in &self.sections {
            let count = self.line_counts.get(&section.name).copied().unwrap_or(0);
            if remaining > count {
                remaining -= count;
            } else {
                return MappedLine {
                    section: Some(section.name.clone()),
                    line_number: to_line(remaining),
                };
            }
        }

        MappedLine {
            section: None,
            line_number: to_line(remaining),
        }
    }

    /// Swap the section at `index` with its neighbor; no-op at the boundaries.
    ///
    /// Returns `true` when the order changed.
    pub fn move_section(&mut self, index: usize, direction: Direction) -> bool {
        let len = self.sections.len();
        let other = match direction {
            Direction::Left if index > 0 && index < len => index - 1,
            Direction::Right => match index.checked_add(1) {
                Some(next) if next < len => next,
                _ => return false,
            },
            _ => return false,
        };
        self.sections.swap(index, other);
        self.recompute();
        true
    }

    /// Ordered JSON object `{ name: content }`.
    pub fn to_map(&self) -> Map<String, Value> {
        self.sections
            .iter()
            .map(|s| (s.name.clone(), Value::String(s.content.clone())))
            .collect()
    }

    /// Ordered JSON object, the multi-section file format.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_map()).unwrap_or_default()
    }

    /// Per-section edits turning `self` into `next`.
    ///
    /// `None` when the section set or order differs, i.e. the document must
    /// be replaced wholesale.
    pub fn edits_to(&self, next: &SectionModel) -> Option<Vec<(String, String)>> {
        if !self.names().eq(next.names()) {
            return None;
        }
        Some(
            self.sections
                .iter()
                .zip(&next.sections)
                .filter(|(old, new)| old.content != new.content)
                .map(|(_, new)| (new.name.clone(), new.content.clone()))
                .collect(),
        )
    }

    fn recompute(&mut self) {
        self.line_counts = self
            .sections
            .iter()
            .map(|s| (s.name.clone(), s.content.matches('\n').count() + 1))
            .collect();
    }
}

fn to_line(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
