use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::*;
use crate::document::{Direction, SectionModel};
use crate::protocol::HostMessage;
use crate::sandbox::SandboxEvent;
use crate::worker::{CompileError, WorkerReply};

const DEBOUNCE: Duration = Duration::from_millis(250);

struct Harness {
    tx: mpsc::Sender<CoordinatorMsg>,
    worker_rx: mpsc::Receiver<WorkerMsg>,
    sandbox_rx: mpsc::Receiver<SandboxMsg>,
    host_rx: mpsc::Receiver<HostMsg>,
}

fn model() -> SectionModel {
    SectionModel::from_sections([("A", "a"), ("B", "b\nb")]).unwrap()
}

fn spawn_actor() -> Harness {
    let (tx, rx) = mpsc::channel(32);
    let (worker_tx, worker_rx) = mpsc::channel(32);
    let (sandbox_tx, sandbox_rx) = mpsc::channel(32);
    let (host_tx, host_rx) = mpsc::channel(32);
    let out = Outboxes {
        worker: worker_tx,
        sandbox: sandbox_tx,
        preprocess: None,
        host: host_tx,
    };
    let actor = WorkspaceActor::new(rx, Workspace::new(model(), "player"), out, DEBOUNCE);
    tokio::spawn(actor.run());
    Harness {
        tx,
        worker_rx,
        sandbox_rx,
        host_rx,
    }
}

async fn next_compile(rx: &mut mpsc::Receiver<WorkerMsg>) -> (u64, String) {
    match rx.recv().await {
        Some(WorkerMsg::Compile { seq, source }) => (seq, source),
        other => panic!("expected compile, got {other:?}"),
    }
}

async fn send(h: &Harness, msg: CoordinatorMsg) {
    h.tx.send(msg).await.unwrap();
}

async fn next_post(rx: &mut mpsc::Receiver<HostMsg>) -> HostMessage {
    match rx.recv().await {
        Some(HostMsg::Post(message)) => message,
        _ => panic!("expected a host post"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_mount_compiles_immediately() {
    let mut h = spawn_actor();
    let (seq, source) = next_compile(&mut h.worker_rx).await;
    assert_eq!(seq, 1);
    assert_eq!(source, "a\nb\nb\n");
}

#[tokio::test(start_paused = true)]
async fn test_debounce_coalesces_edits() {
    let mut h = spawn_actor();
    next_compile(&mut h.worker_rx).await;

    for i in 0..5 {
        send(&h, CoordinatorMsg::EditSection {
            name: "A".into(),
            content: format!("v{i}"),
        })
        .await;
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(h.worker_rx.try_recv().is_err());
    }
    let last_edit = Instant::now();

    let (seq, source) = next_compile(&mut h.worker_rx).await;
    assert!(Instant::now() - last_edit >= DEBOUNCE - Duration::from_millis(100));
    assert_eq!(seq, 2);
    assert_eq!(source, "v4\nb\nb\n");

    tokio::time::advance(DEBOUNCE * 4).await;
    assert!(h.worker_rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_stale_reply_is_ignored() {
    let mut h = spawn_actor();
    let (first, _) = next_compile(&mut h.worker_rx).await;
    send(&h, CoordinatorMsg::Sandbox(SandboxEvent::ready("player"))).await;
    send(&h, CoordinatorMsg::Edit { content: "x".into() }).await;
    let (second, _) = next_compile(&mut h.worker_rx).await;

    send(&h, CoordinatorMsg::Compiled {
        seq: first,
        reply: WorkerReply::Code { code: "old".into() },
    })
    .await;
    send(&h, CoordinatorMsg::Compiled {
        seq: second,
        reply: WorkerReply::Code { code: "new".into() },
    })
    .await;

    match h.sandbox_rx.recv().await {
        Some(SandboxMsg::Run(code)) => assert_eq!(code, "new"),
        other => panic!("expected run, got {other:?}"),
    }
    assert!(h.sandbox_rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_codechange_after_debounced_success() {
    let mut h = spawn_actor();
    let (seq, _) = next_compile(&mut h.worker_rx).await;
    send(&h, CoordinatorMsg::Sandbox(SandboxEvent::ready("player"))).await;
    send(&h, CoordinatorMsg::Compiled {
        seq,
        reply: WorkerReply::Code { code: "mount".into() },
    })
    .await;
    h.sandbox_rx.recv().await;
    send(&h, CoordinatorMsg::Sandbox(SandboxEvent::success("player", "mount"))).await;

    send(&h, CoordinatorMsg::Move {
        index: 1,
        direction: Direction::Left,
    })
    .await;
    let (seq, source) = next_compile(&mut h.worker_rx).await;
    assert_eq!(source, "b\nb\na\n");
    send(&h, CoordinatorMsg::Compiled {
        seq,
        reply: WorkerReply::Code { code: "moved".into() },
    })
    .await;
    h.sandbox_rx.recv().await;
    send(&h, CoordinatorMsg::RunStarted).await;
    send(&h, CoordinatorMsg::Sandbox(SandboxEvent::success("player", "moved"))).await;

    // The mount run posted nothing, so the first post is the codechange.
    match next_post(&mut h.host_rx).await {
        HostMessage::CodeChange { code, compiled, .. } => {
            assert_eq!(code, "b\nb\na\n");
            assert_eq!(compiled, "moved");
        }
        other => panic!("expected codechange, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_compile_error_posts_status() {
    let mut h = spawn_actor();
    let (seq, _) = next_compile(&mut h.worker_rx).await;
    send(&h, CoordinatorMsg::Compiled {
        seq,
        reply: WorkerReply::Error {
            error: CompileError::new("SyntaxError: Unexpected token", Some(3)),
        },
    })
    .await;

    match next_post(&mut h.host_rx).await {
        HostMessage::Status {
            error: Some(error),
            show_details,
        } => {
            assert_eq!(error.section.as_deref(), Some("B"));
            assert_eq!(error.line_number, Some(2));
            assert!(!show_details);
        }
        other => panic!("expected status, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_move_is_ignored() {
    let mut h = spawn_actor();
    next_compile(&mut h.worker_rx).await;
    send(&h, CoordinatorMsg::Move {
        index: usize::MAX,
        direction: Direction::Right,
    })
    .await;
    send(&h, CoordinatorMsg::Move {
        index: 0,
        direction: Direction::Right,
    })
    .await;

    let (_, source) = next_compile(&mut h.worker_rx).await;
    assert_eq!(source, "b\nb\na\n");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_actor() {
    let mut h = spawn_actor();
    next_compile(&mut h.worker_rx).await;
    send(&h, CoordinatorMsg::Shutdown).await;
    assert!(h.worker_rx.recv().await.is_none());
}
