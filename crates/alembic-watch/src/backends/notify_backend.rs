//! Notify-based file watching backend.

use crate::{
    error::{Error, Result},
    events::{FileEvent, FileEventKind},
    traits::{DebounceConfig, FileWatcher, WatchConfig, WatchHandle},
};

use async_trait::async_trait;
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{
    new_debouncer, DebounceEventResult, DebouncedEvent, Debouncer, RecommendedCache,
};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

const BACKEND: &str = "notify";

/// Notify-based file watcher with debouncing support.
///
/// The debouncer runs its own thread; converted events cross into the async
/// world through the unbounded sender, which is safe to call from any thread.
pub struct NotifyWatcher {
    /// Debounced file system watcher
    debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
    /// Event sender
    event_sender: Option<mpsc::UnboundedSender<FileEvent>>,
    /// Active watches keyed by watch id
    watches: HashMap<String, WatchHandle>,
}

impl NotifyWatcher {
    /// Create a new notify-based watcher.
    pub fn new() -> Self {
        Self {
            debouncer: None,
            event_sender: None,
            watches: HashMap::new(),
        }
    }

    /// Create the debouncer. The window is fixed for the watcher's lifetime.
    fn initialize(&mut self, debounce: DebounceConfig) -> Result<()> {
        let sender = self
            .event_sender
            .clone()
            .ok_or_else(|| Error::Internal("Event sender not set before calling watch".to_string()))?;

        let debouncer = new_debouncer(
            debounce.delay(),
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events {
                        for file_event in Self::convert_notify_event(event) {
                            if let Err(e) = sender.send(file_event) {
                                error!("Failed to send file event: {}", e);
                            }
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        error!("Notify error: {:?}", error);
                    }
                }
            },
        )
        .map_err(|e| Error::Watch(format!("Failed to create notify watcher: {}", e)))?;

        self.debouncer = Some(debouncer);
        info!(delay_ms = debounce.delay_ms, "Notify watcher initialized");
        Ok(())
    }

    /// Convert a debounced notify event into zero or more file events.
    ///
    /// Multi-path events other than a completed rename are split into one event
    /// per path.
    fn convert_notify_event(event: DebouncedEvent) -> Vec<FileEvent> {
        let paths = event.event.paths;

        let kind = match event.event.kind {
            EventKind::Create(_) => FileEventKind::Created,
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
                let event_kind = FileEventKind::Moved {
                    from: paths[0].clone(),
                    to: paths[1].clone(),
                };
                return vec![FileEvent::new(event_kind, paths[1].clone())];
            }
            // Only the destination half of a rename was observed: the file
            // appeared here from outside the watched directory.
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => FileEventKind::Created,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => FileEventKind::Deleted,
            EventKind::Modify(_) => FileEventKind::Modified,
            EventKind::Remove(_) => FileEventKind::Deleted,
            other => FileEventKind::Unknown(format!("{:?}", other)),
        };

        paths
            .into_iter()
            .map(|path| FileEvent::new(kind.clone(), path))
            .collect()
    }
}

impl Default for NotifyWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileWatcher for NotifyWatcher {
    fn backend_type(&self) -> &'static str {
        BACKEND
    }

    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<FileEvent>) {
        self.event_sender = Some(sender);
    }

    async fn watch(&mut self, path: PathBuf, config: WatchConfig) -> Result<WatchHandle> {
        debug!("Adding watch for: {}", path.display());

        if !path.is_dir() {
            return Err(Error::InvalidPath(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        if self.debouncer.is_none() {
            self.initialize(config.debounce)?;
        }

        let watch_handle = WatchHandle::new(path.clone());

        if let Some(ref mut debouncer) = self.debouncer {
            let mode = if config.recursive {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };

            debouncer
                .watch(&path, mode)
                .map_err(|e| Error::Watch(format!("Failed to watch path: {}", e)))?;
        }

        self.watches.insert(config.id.clone(), watch_handle.clone());
        info!("Added notify watch: {} -> {}", config.id, path.display());

        Ok(watch_handle)
    }

    async fn unwatch(&mut self, handle: WatchHandle) -> Result<()> {
        debug!("Removing watch for: {}", handle.path.display());

        if let Some(ref mut debouncer) = self.debouncer {
            debouncer
                .unwatch(&handle.path)
                .map_err(|e| Error::Watch(format!("Failed to unwatch path: {}", e)))?;
        }

        self.watches.retain(|_, h| h.path != handle.path);
        info!("Removed notify watch: {}", handle.path.display());

        Ok(())
    }

    fn active_watches(&self) -> Vec<WatchHandle> {
        self.watches.values().cloned().collect()
    }

    fn is_available(&self) -> bool {
        true
    }
}
