//! Source file watching for `--watch` mode.
//!
//! An external editor owns the file; every settled change is read back into
//! the editor pane and triggers a render pass.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

/// Watches the program file and reports changes once they settle.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
    settle: Duration,
    pending_since: Option<Instant>,
}

impl SourceWatcher {
    /// Watch `path`'s directory for changes to `path`.
    ///
    /// # Errors
    /// Returns an error if the platform watcher cannot be created or the
    /// directory cannot be watched.
    pub fn new(path: impl AsRef<Path>, settle: Duration) -> notify::Result<Self> {
        // Event paths arrive canonical, so compare against canonical paths.
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;
        debug!(target = %target_path.display(), root = %watch_root.display(), "watching source");

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_path,
            target_name,
            settle,
            pending_since: None,
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Drain pending events; true once a change has been quiet for the
    /// settle period.
    pub fn poll_settled(&mut self, now: Instant) -> bool {
        let mut relevant = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.is_relevant(&ev) => relevant += 1,
                Ok(ev) => {
                    crate::perf::log_event(
                        "watcher.ignored",
                        format!("kind={:?} paths={:?}", ev.kind, ev.paths),
                    );
                }
                Err(err) => warn!(error = %err, "file watcher error"),
            }
        }
        if relevant > 0 {
            crate::perf::log_event("watcher.change", format!("events={relevant}"));
            self.pending_since = Some(now);
        }

        match self.pending_since {
            Some(since) if now.duration_since(since) >= self.settle => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    /// Read the current file contents.
    ///
    /// # Errors
    /// Returns the I/O error if the file cannot be read (for example while
    /// an editor is replacing it).
    pub fn read_source(&self) -> std::io::Result<String> {
        fs::read_to_string(&self.target_path)
    }

    fn is_relevant(&self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, EventAttributes};
    use tempfile::tempdir;

    fn event(kind: EventKind, path: PathBuf) -> Event {
        Event {
            kind,
            paths: vec![path],
            attrs: EventAttributes::new(),
        }
    }

    #[test]
    fn test_directory_and_sibling_events() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("app.jsx");
        std::fs::write(&path, "const a = 1").expect("write");
        let watcher = SourceWatcher::new(&path, Duration::from_millis(10)).expect("watcher");

        assert!(watcher.is_relevant(&event(EventKind::Any, canonical_dir.clone())));
        assert!(watcher.is_relevant(&event(EventKind::Any, path.clone())));
        assert!(!watcher.is_relevant(&event(EventKind::Any, canonical_dir.join("other.js"))));
        assert!(!watcher.is_relevant(&event(EventKind::Access(AccessKind::Any), path)));
    }

    #[test]
    fn test_watch_root_for_relative_file_is_dot() {
        assert_eq!(watch_root_for(Path::new("app.jsx")), PathBuf::from("."));
    }

    #[test]
    fn test_change_is_reported_after_settling() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().canonicalize().expect("canonicalize").join("app.jsx");
        std::fs::write(&path, "original").expect("write");
        let mut watcher = SourceWatcher::new(&path, Duration::from_millis(50)).expect("watcher");

        std::thread::sleep(Duration::from_millis(300));
        std::fs::write(&path, "const edited = true").expect("write");

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut settled = false;
        while Instant::now() < deadline {
            if watcher.poll_settled(Instant::now()) {
                settled = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(25));
        }

        assert!(settled, "modification should settle within 5 seconds");
        assert_eq!(watcher.read_source().unwrap(), "const edited = true");
    }
}
