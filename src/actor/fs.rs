//! FileSystem Actor
//!
//! Watches the document file and turns each saved change into workspace
//! edits. The parent directory is watched so atomic-rename saves are seen.
//!
//! ```text
//! Watcher → Debouncer (pure timing) → reload + diff → CoordinatorMsg
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::debouncer::Debouncer;
use super::messages::CoordinatorMsg;
use crate::document::{SectionModel, parse_document};
use crate::{debug, log};

/// Editors often write a file in several steps; coalesce them.
const FS_DEBOUNCE_MS: u64 = 50;

/// FileSystem Actor - watches the document file
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    path: PathBuf,
    split: bool,
    /// Document as last read from disk
    current: SectionModel,
    coordinator_tx: mpsc::Sender<CoordinatorMsg>,
}

impl FsActor {
    /// Start watching immediately so no save is lost while the caller
    /// performs the initial run.
    pub fn new(
        path: PathBuf,
        split: bool,
        current: SectionModel,
        coordinator_tx: mpsc::Sender<CoordinatorMsg>,
    ) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            path,
            split,
            current,
            coordinator_tx,
        })
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let notify_rx = std::mem::replace(&mut self.notify_rx, std::sync::mpsc::channel().1);
        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        let mut debouncer = Debouncer::new(Duration::from_millis(FS_DEBOUNCE_MS));
        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => {
                    let Some(event) = event else { break };
                    if is_relevant(&event, &self.path) {
                        debug!("watch"; "raw notify: {:?}", event.kind);
                        debouncer.touch();
                    }
                }
                _ = tokio::time::sleep(debouncer.sleep_duration()), if debouncer.is_pending() => {
                    if debouncer.take_if_ready() && self.reload().await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    /// Re-read the document and forward what changed.
    ///
    /// Returns `Err(())` if the workspace shut down.
    async fn reload(&mut self) -> Result<(), ()> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                // Mid-save or deleted; the next event retries.
                debug!("watch"; "cannot read {}: {}", self.path.display(), e);
                return Ok(());
            }
        };

        let next = parse_document(&raw, self.split);
        let messages = diff_document(&self.current, &next);
        if !messages.is_empty() {
            log!("watch"; "{} changed", self.path.display());
        }
        self.current = next;

        for msg in messages {
            self.coordinator_tx.send(msg).await.map_err(|_| ())?;
        }
        Ok(())
    }
}

/// Content-changing event touching the watched file.
fn is_relevant(event: &notify::Event, path: &Path) -> bool {
    let content_change = match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        // Metadata-only changes (mtime/chmod) carry no new content
        EventKind::Modify(modify) => !matches!(modify, notify::event::ModifyKind::Metadata(_)),
        _ => false,
    };
    content_change
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some() && p.file_name() == path.file_name())
}

/// Messages turning `prev` into `next`: per-section edits when the section
/// set is unchanged, otherwise a wholesale replacement.
pub fn diff_document(prev: &SectionModel, next: &SectionModel) -> Vec<CoordinatorMsg> {
    match prev.edits_to(next) {
        Some(edits) => edits
            .into_iter()
            .map(|(name, content)| CoordinatorMsg::EditSection { name, content })
            .collect(),
        None => vec![CoordinatorMsg::ReplaceDocument(next.clone())],
    }
}

#[cfg(test)]
mod tests {
    use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind};

    use super::*;

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_relevant_events() {
        let doc = Path::new("/play/app.json");
        assert!(is_relevant(
            &event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), "/play/app.json"),
            doc
        ));
        assert!(is_relevant(&event(EventKind::Create(CreateKind::File), "/play/app.json"), doc));
        assert!(!is_relevant(
            &event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)), "/play/app.json"),
            doc
        ));
        assert!(!is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/play/other.json"),
            doc
        ));
    }

    #[test]
    fn test_diff_edits_changed_sections_only() {
        let prev = SectionModel::from_sections([("A", "1"), ("B", "2")]).unwrap();
        let next = SectionModel::from_sections([("A", "1"), ("B", "3")]).unwrap();
        let messages = diff_document(&prev, &next);
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            &messages[0],
            CoordinatorMsg::EditSection { name, content } if name == "B" && content == "3"
        ));
        assert!(diff_document(&prev, &prev).is_empty());
    }

    #[test]
    fn test_diff_reorder_replaces_document() {
        let prev = SectionModel::from_sections([("A", "1"), ("B", "2")]).unwrap();
        let next = SectionModel::from_sections([("B", "2"), ("A", "1")]).unwrap();
        let messages = diff_document(&prev, &next);
        assert!(matches!(&messages[..], [CoordinatorMsg::ReplaceDocument(m)] if m.len() == 2));
    }

    #[tokio::test]
    async fn test_reload_forwards_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        std::fs::write(&path, r#"{"A":"1","B":"2"}"#).unwrap();
        let current = parse_document(&std::fs::read_to_string(&path).unwrap(), true);

        let (tx, mut rx) = mpsc::channel(8);
        let mut actor = FsActor::new(path.clone(), true, current, tx).unwrap();
        std::fs::write(&path, r#"{"A":"1","B":"changed"}"#).unwrap();
        actor.reload().await.unwrap();

        match rx.try_recv() {
            Ok(CoordinatorMsg::EditSection { name, content }) => {
                assert_eq!(name, "B");
                assert_eq!(content, "changed");
            }
            other => panic!("expected edit, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }
}
