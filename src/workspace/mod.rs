//! Workspace coordinator state.
//!
//! Owns the document, selection/cursor bookkeeping and the displayed error.
//! Handlers return [`Effect`]s for the actor to carry out; nothing in here
//! performs I/O or keeps time.
//!
//! ```text
//! debounce ─▶ [Preprocess] ─▶ Compile{seq} ─▶ on_compiled ─▶ Run ─▶ on_sandbox_event
//!                                                  │                     │
//!                                             compiler error       runtime error /
//!                                                                  codechange
//! ```

#[cfg(test)]
mod tests;

use serde_json::{Map, Value};

use crate::debug;
use crate::diagnostics::{ErrorDetails, classify, classify_with_line};
use crate::document::{Direction, DocumentError, SectionModel};
use crate::protocol::{CursorPos, ErrorComponent, HostMessage, PreprocessMessage};
use crate::sandbox::{SandboxEvent, SandboxEventKind};
use crate::worker::WorkerReply;

/// Work for the actor layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Compile { seq: u64, source: String },
    Preprocess(PreprocessMessage),
    Run(String),
    Post(HostMessage),
}

/// Document state captured when the debounce fired, posted on the next
/// successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeChangeSnapshot {
    pub sections: Map<String, Value>,
    pub code: String,
}

pub struct Workspace {
    model: SectionModel,
    selected: usize,
    cursor: Option<CursorPos>,
    selection: Option<String>,
    compiler_error: Option<ErrorDetails>,
    runtime_error: Option<ErrorDetails>,
    show_details: bool,
    pending_codechange: Option<CodeChangeSnapshot>,
    preprocess: bool,
    sandbox_id: String,
    sandbox_ready: bool,
    held_code: Option<String>,
    latest_seq: u64,
}

impl Workspace {
    pub fn new(model: SectionModel, sandbox_id: impl Into<String>) -> Self {
        Self {
            model,
            selected: 0,
            cursor: None,
            selection: None,
            compiler_error: None,
            runtime_error: None,
            show_details: false,
            pending_codechange: None,
            preprocess: false,
            sandbox_id: sandbox_id.into(),
            sandbox_ready: false,
            held_code: None,
            latest_seq: 0,
        }
    }

    /// Route code and errors through the external preprocessor.
    pub fn with_preprocess(mut self, enabled: bool) -> Self {
        self.preprocess = enabled;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn model(&self) -> &SectionModel {
        &self.model
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn cursor(&self) -> Option<CursorPos> {
        self.cursor
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn compiler_error(&self) -> Option<&ErrorDetails> {
        self.compiler_error.as_ref()
    }

    pub fn runtime_error(&self) -> Option<&ErrorDetails> {
        self.runtime_error.as_ref()
    }

    /// Compiler errors take precedence; never both.
    pub fn displayed_error(&self) -> Option<&ErrorDetails> {
        self.compiler_error.as_ref().or(self.runtime_error.as_ref())
    }

    pub fn show_details(&self) -> bool {
        self.show_details
    }

    pub fn pending_codechange(&self) -> Option<&CodeChangeSnapshot> {
        self.pending_codechange.as_ref()
    }

    pub fn status(&self) -> HostMessage {
        HostMessage::Status {
            error: self.displayed_error().cloned(),
            show_details: self.show_details,
        }
    }

    // =========================================================================
    // Document edits
    //
    // These only change state; the caller schedules the debounced pipeline.
    // =========================================================================

    /// Replace the selected section's content.
    pub fn edit_selected(&mut self, content: impl Into<String>) -> Result<(), DocumentError> {
        self.model.set_section_content_at(self.selected, content)
    }

    pub fn edit_section(
        &mut self,
        name: &str,
        content: impl Into<String>,
    ) -> Result<(), DocumentError> {
        self.model.set_section_content(name, content)
    }

    /// Swap in a document with a different section set.
    pub fn replace_document(&mut self, model: SectionModel) {
        if self.selected >= model.len() {
            self.selected = 0;
            self.cursor = None;
            self.selection = None;
        }
        self.model = model;
    }

    pub fn select_section(&mut self, index: usize) -> Result<(), DocumentError> {
        if index >= self.model.len() {
            return Err(DocumentError::IndexOutOfRange(index));
        }
        if index != self.selected {
            self.selected = index;
            self.cursor = None;
            self.selection = None;
        }
        Ok(())
    }

    pub fn set_cursor(&mut self, pos: Option<CursorPos>, selection: Option<String>) {
        self.cursor = pos;
        self.selection = selection;
    }

    /// Reorder sections. The selected index is positional and stays put.
    pub fn move_section(&mut self, index: usize, direction: Direction) -> bool {
        self.model.move_section(index, direction)
    }

    pub fn toggle_details(&mut self, show: bool) -> Vec<Effect> {
        let before = self.status();
        self.show_details = show;
        self.finish(before, Vec::new())
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Initial run on mount. Nothing is posted to the host for it.
    pub fn start(&mut self) -> Vec<Effect> {
        let code = self.model.concatenate();
        vec![self.submit(code)]
    }

    /// The debounce window closed after one or more edits.
    pub fn debounce_fired(&mut self) -> Vec<Effect> {
        let code = self.model.concatenate();
        self.pending_codechange = Some(CodeChangeSnapshot {
            sections: self.model.to_map(),
            code: code.clone(),
        });
        vec![self.submit(code)]
    }

    pub fn on_compiled(&mut self, seq: u64, reply: WorkerReply) -> Vec<Effect> {
        if seq != self.latest_seq {
            debug!("workspace"; "dropping stale compile result #{} (latest #{})", seq, self.latest_seq);
            return Vec::new();
        }

        let before = self.status();
        let mut effects = Vec::new();
        match reply {
            WorkerReply::Code { code } => {
                self.compiler_error = None;
                self.show_details = false;
                if !code.is_empty() {
                    effects.extend(self.run(code));
                }
            }
            WorkerReply::Error { error } => {
                self.show_details = false;
                let details = classify_with_line(&error.message, error.line_number);
                effects.extend(self.report(details, ErrorComponent::CompilerError));
            }
        }
        self.finish(before, effects)
    }

    pub fn on_preprocessed(&mut self, message: PreprocessMessage) -> Vec<Effect> {
        match message {
            PreprocessMessage::CodePreprocessed { code } if !code.is_empty() => {
                self.compile(code)
            }
            PreprocessMessage::ErrorPreprocessed { error, component } => {
                let before = self.status();
                self.set_error(component, error);
                self.finish(before, Vec::new())
            }
            other => {
                debug!("workspace"; "ignoring preprocessor message {:?}", other);
                Vec::new()
            }
        }
    }

    /// The sandbox started a run.
    pub fn on_run_started(&mut self) -> Vec<Effect> {
        let before = self.status();
        self.runtime_error = None;
        self.finish(before, Vec::new())
    }

    pub fn on_sandbox_event(&mut self, event: SandboxEvent) -> Vec<Effect> {
        if event.id != self.sandbox_id {
            debug!("workspace"; "ignoring event from sandbox `{}`", event.id);
            return Vec::new();
        }

        let before = self.status();
        let mut effects = Vec::new();
        match event.kind {
            SandboxEventKind::Ready => {
                self.sandbox_ready = true;
                if let Some(code) = self.held_code.take() {
                    effects.push(Effect::Run(code));
                }
            }
            SandboxEventKind::Error { payload } | SandboxEventKind::Warning { payload } => {
                effects.extend(self.report(classify(&payload), ErrorComponent::RuntimeError));
            }
            SandboxEventKind::Success { payload } => {
                if let Some(snapshot) = &self.pending_codechange {
                    effects.push(Effect::Post(HostMessage::CodeChange {
                        sections: snapshot.sections.clone(),
                        code: snapshot.code.clone(),
                        compiled: payload,
                    }));
                }
            }
        }
        self.finish(before, effects)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn submit(&mut self, code: String) -> Effect {
        if self.preprocess {
            Effect::Preprocess(PreprocessMessage::CodePreprocess { code })
        } else {
            self.next_compile(code)
        }
    }

    fn compile(&mut self, code: String) -> Vec<Effect> {
        vec![self.next_compile(code)]
    }

    fn next_compile(&mut self, source: String) -> Effect {
        self.latest_seq += 1;
        Effect::Compile {
            seq: self.latest_seq,
            source,
        }
    }

    fn run(&mut self, code: String) -> Option<Effect> {
        if self.sandbox_ready {
            Some(Effect::Run(code))
        } else {
            // Newer code replaces anything already held.
            self.held_code = Some(code);
            None
        }
    }

    fn report(&mut self, details: ErrorDetails, component: ErrorComponent) -> Option<Effect> {
        if self.preprocess {
            return Some(Effect::Preprocess(PreprocessMessage::ErrorPreprocess {
                error: details,
                component,
            }));
        }
        self.set_error(component, details);
        None
    }

    fn set_error(&mut self, component: ErrorComponent, details: ErrorDetails) {
        let details = details.map_to_section(&self.model);
        match component {
            ErrorComponent::CompilerError => self.compiler_error = Some(details),
            ErrorComponent::RuntimeError => self.runtime_error = Some(details),
        }
    }

    /// Append a status post when the displayed state changed.
    fn finish(&self, before: HostMessage, mut effects: Vec<Effect>) -> Vec<Effect> {
        let after = self.status();
        if after != before {
            effects.push(Effect::Post(after));
        }
        effects
    }
}
