use super::*;
use crate::worker::CompileError;

fn three_sections() -> SectionModel {
    SectionModel::from_sections([("A", lines("a", 3)), ("B", lines("b", 4)), ("C", lines("c", 10))])
        .unwrap()
}

/// `n` lines of `text`, i.e. a line count of `n`.
fn lines(text: &str, n: usize) -> String {
    vec![text; n].join("\n")
}

fn ready(ws: &mut Workspace) {
    ws.on_sandbox_event(SandboxEvent::ready("player"));
}

fn compile_seq(effects: &[Effect]) -> u64 {
    effects
        .iter()
        .find_map(|e| match e {
            Effect::Compile { seq, .. } => Some(*seq),
            _ => None,
        })
        .expect("compile effect")
}

fn code(s: &str) -> WorkerReply {
    WorkerReply::Code { code: s.into() }
}

fn compile_error(message: &str, line: Option<u32>) -> WorkerReply {
    WorkerReply::Error {
        error: CompileError::new(message, line),
    }
}

fn has_status(effects: &[Effect]) -> bool {
    effects
        .iter()
        .any(|e| matches!(e, Effect::Post(HostMessage::Status { .. })))
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_start_submits_concatenated_document() {
    let mut ws = Workspace::new(three_sections(), "player");
    let effects = ws.start();
    assert_eq!(
        effects,
        [Effect::Compile {
            seq: 1,
            source: three_sections().concatenate()
        }]
    );
    assert!(ws.pending_codechange().is_none());
}

#[test]
fn test_compiled_code_runs_when_ready() {
    let mut ws = Workspace::new(three_sections(), "player");
    ready(&mut ws);
    let seq = compile_seq(&ws.start());
    assert_eq!(ws.on_compiled(seq, code("run()")), [Effect::Run("run()".into())]);
}

#[test]
fn test_empty_compiled_code_is_not_run() {
    let mut ws = Workspace::new(three_sections(), "player");
    ready(&mut ws);
    let seq = compile_seq(&ws.start());
    assert!(ws.on_compiled(seq, code("")).is_empty());
}

#[test]
fn test_code_held_until_ready() {
    let mut ws = Workspace::new(three_sections(), "player");
    let seq = compile_seq(&ws.start());
    assert!(ws.on_compiled(seq, code("first")).is_empty());

    let seq = compile_seq(&ws.debounce_fired());
    assert!(ws.on_compiled(seq, code("second")).is_empty());

    assert_eq!(
        ws.on_sandbox_event(SandboxEvent::ready("player")),
        [Effect::Run("second".into())]
    );
}

#[test]
fn test_stale_compile_result_is_dropped() {
    let mut ws = Workspace::new(three_sections(), "player");
    ready(&mut ws);
    let old = compile_seq(&ws.start());
    let new = compile_seq(&ws.debounce_fired());
    assert!(new > old);

    assert!(ws.on_compiled(old, compile_error("SyntaxError: old (1)", None)).is_empty());
    assert!(ws.compiler_error().is_none());
    assert_eq!(ws.on_compiled(new, code("new")), [Effect::Run("new".into())]);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_compile_error_is_mapped_to_section() {
    let mut ws = Workspace::new(three_sections(), "player");
    let seq = compile_seq(&ws.start());
    let effects = ws.on_compiled(seq, compile_error("SyntaxError: Unexpected token", Some(5)));

    let error = ws.compiler_error().unwrap();
    assert_eq!(error.section.as_deref(), Some("B"));
    assert_eq!(error.line_number, Some(2));
    assert!(has_status(&effects));
}

#[test]
fn test_compiler_error_takes_precedence() {
    let mut ws = Workspace::new(three_sections(), "player");
    ready(&mut ws);
    ws.on_sandbox_event(SandboxEvent::error("player", "TypeError: x (1)"));
    assert_eq!(ws.displayed_error().unwrap().summary, "TypeError: x");

    let seq = compile_seq(&ws.debounce_fired());
    ws.on_compiled(seq, compile_error("SyntaxError: y", Some(1)));
    assert_eq!(ws.displayed_error().unwrap().summary, "SyntaxError: y");
    assert!(ws.runtime_error().is_some());
}

#[test]
fn test_successful_run_clears_error_and_details() {
    let mut ws = Workspace::new(three_sections(), "player");
    ready(&mut ws);
    let seq = compile_seq(&ws.start());
    ws.on_compiled(seq, compile_error("SyntaxError: y", Some(1)));
    ws.toggle_details(true);
    assert!(ws.show_details());

    let seq = compile_seq(&ws.debounce_fired());
    let effects = ws.on_compiled(seq, code("ok"));
    ws.on_run_started();
    ws.on_sandbox_event(SandboxEvent::success("player", "ok"));

    assert!(ws.displayed_error().is_none());
    assert!(!ws.show_details());
    assert!(has_status(&effects));
}

#[test]
fn test_compile_error_collapses_details() {
    let mut ws = Workspace::new(three_sections(), "player");
    ready(&mut ws);
    ws.on_sandbox_event(SandboxEvent::error("player", "TypeError: x (1)"));
    ws.toggle_details(true);
    assert!(ws.show_details());

    let seq = compile_seq(&ws.debounce_fired());
    let effects = ws.on_compiled(seq, compile_error("SyntaxError: y", Some(1)));
    assert!(!ws.show_details());
    assert_eq!(
        ws.status(),
        HostMessage::Status {
            error: ws.compiler_error().cloned(),
            show_details: false
        }
    );
    assert!(has_status(&effects));
}

#[test]
fn test_run_start_clears_runtime_error() {
    let mut ws = Workspace::new(three_sections(), "player");
    ready(&mut ws);
    ws.on_sandbox_event(SandboxEvent::warning("player", "Warning: key"));
    assert!(ws.runtime_error().is_some());

    let effects = ws.on_run_started();
    assert!(ws.runtime_error().is_none());
    assert_eq!(
        effects,
        [Effect::Post(HostMessage::Status {
            error: None,
            show_details: false
        })]
    );
    assert!(ws.on_run_started().is_empty());
}

#[test]
fn test_events_from_other_sandboxes_ignored() {
    let mut ws = Workspace::new(three_sections(), "player");
    assert!(ws.on_sandbox_event(SandboxEvent::error("other", "boom")).is_empty());
    assert!(ws.runtime_error().is_none());
}

// ============================================================================
// Codechange
// ============================================================================

#[test]
fn test_mount_run_posts_nothing() {
    let mut ws = Workspace::new(three_sections(), "player");
    ready(&mut ws);
    let seq = compile_seq(&ws.start());
    ws.on_compiled(seq, code("c"));
    assert!(ws.on_sandbox_event(SandboxEvent::success("player", "c")).is_empty());
}

#[test]
fn test_codechange_uses_snapshot_from_debounce() {
    let mut ws = Workspace::new(three_sections(), "player");
    ready(&mut ws);
    ws.edit_section("A", "edited").unwrap();
    let seq = compile_seq(&ws.debounce_fired());
    // Edits after the debounce do not leak into the posted snapshot.
    ws.edit_section("A", "later").unwrap();
    ws.on_compiled(seq, code("compiled"));

    let effects = ws.on_sandbox_event(SandboxEvent::success("player", "compiled"));
    let [Effect::Post(HostMessage::CodeChange { sections, code, compiled })] = &effects[..] else {
        panic!("expected a single codechange, got {effects:?}");
    };
    assert_eq!(sections["A"], "edited");
    assert!(code.starts_with("edited\n"));
    assert_eq!(compiled, "compiled");

    // The snapshot is kept for later successes.
    assert!(ws.pending_codechange().is_some());
}

// ============================================================================
// Preprocessing detour
// ============================================================================

#[test]
fn test_preprocess_detour() {
    let mut ws = Workspace::new(three_sections(), "player").with_preprocess(true);
    ready(&mut ws);
    let effects = ws.start();
    assert_eq!(
        effects,
        [Effect::Preprocess(PreprocessMessage::CodePreprocess {
            code: three_sections().concatenate()
        })]
    );

    let effects = ws.on_preprocessed(PreprocessMessage::CodePreprocessed { code: "pp".into() });
    assert_eq!(
        effects,
        [Effect::Compile {
            seq: 1,
            source: "pp".into()
        }]
    );
    assert!(
        ws.on_preprocessed(PreprocessMessage::CodePreprocessed { code: String::new() })
            .is_empty()
    );
}

#[test]
fn test_preprocess_error_roundtrip() {
    let mut ws = Workspace::new(three_sections(), "player").with_preprocess(true);
    ready(&mut ws);
    ws.start();
    let seq = compile_seq(&ws.on_preprocessed(PreprocessMessage::CodePreprocessed {
        code: "pp".into(),
    }));

    let effects = ws.on_compiled(seq, compile_error("SyntaxError: bad", Some(5)));
    let [Effect::Preprocess(PreprocessMessage::ErrorPreprocess { error, component })] =
        &effects[..]
    else {
        panic!("expected errorpreprocess, got {effects:?}");
    };
    assert_eq!(*component, ErrorComponent::CompilerError);
    assert!(ws.compiler_error().is_none());

    let effects = ws.on_preprocessed(PreprocessMessage::ErrorPreprocessed {
        error: error.clone(),
        component: ErrorComponent::CompilerError,
    });
    assert_eq!(ws.compiler_error().unwrap().section.as_deref(), Some("B"));
    assert!(has_status(&effects));
}

// ============================================================================
// Sections and cursor
// ============================================================================

#[test]
fn test_select_and_edit_selected() {
    let mut ws = Workspace::new(three_sections(), "player");
    ws.set_cursor(Some(CursorPos { line: 1, ch: 2 }), Some("a".into()));
    ws.select_section(2).unwrap();
    assert_eq!(ws.cursor(), None);
    assert_eq!(ws.selection(), None);

    ws.edit_selected("new c").unwrap();
    assert_eq!(ws.model().get("C"), Some("new c"));
    assert!(ws.select_section(3).is_err());
}

#[test]
fn test_move_section_changes_unit() {
    let mut ws = Workspace::new(three_sections(), "player");
    assert!(ws.move_section(1, Direction::Left));
    assert_eq!(ws.model().names().collect::<Vec<_>>(), ["B", "A", "C"]);
    assert!(!ws.move_section(0, Direction::Left));
    assert!(!ws.move_section(usize::MAX, Direction::Right));

    let Effect::Compile { source, .. } = &ws.debounce_fired()[0] else {
        panic!("expected compile");
    };
    assert!(source.starts_with("b\nb\nb\nb\na\na\na\n"));
}

#[test]
fn test_replace_document_clamps_selection() {
    let mut ws = Workspace::new(three_sections(), "player");
    ws.select_section(2).unwrap();
    ws.replace_document(SectionModel::single("x"));
    assert_eq!(ws.selected(), 0);
}
