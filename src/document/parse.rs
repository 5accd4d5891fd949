//! Loading a document from raw text.

use serde_json::{Map, Value};

use super::{DocumentError, SectionModel};

/// Load a document.
///
/// With `split`, `raw` is expected to be a JSON object of section name to
/// section text, in display order. Anything else (or `split == false`) falls
/// back to a single implicit section holding `raw` verbatim, so user content
/// is never thrown away.
pub fn parse_document(raw: &str, split: bool) -> SectionModel {
    if !split {
        return SectionModel::single(raw);
    }

    match parse_sections(raw) {
        Ok(model) => model,
        Err(e) => {
            crate::debug!("document"; "{}, using raw text", e);
            SectionModel::single(raw)
        }
    }
}

fn parse_sections(raw: &str) -> Result<SectionModel, DocumentError> {
    let object: Map<String, Value> = serde_json::from_str(raw)?;

    let mut sections = Vec::with_capacity(object.len());
    for (name, value) in object {
        match value {
            Value::String(content) => sections.push((name, content)),
            _ => return Err(DocumentError::NotText(name)),
        }
    }

    SectionModel::from_sections(sections)
}
