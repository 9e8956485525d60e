//! File-backed location source.
//!
//! Watches a single file; whenever it is written, its contents are read
//! as a location (plain path, or a JSON object with a `route` key) and
//! pushed to the navigator.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::navigation::location::Location;

/// Watches a file and emits its contents as location updates.
pub struct LocationWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Location>,
}

impl LocationWatcher {
    /// Returns the watcher and a receiver for location updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<Location>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in the background.
    ///
    /// Updates flow until the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Some(location) = read_location(&path) {
                        tracing::info!(path = ?path, location = ?location, "Location file changed");
                        let _ = tx.send(location);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Location watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, "Location watcher started");
        Ok(watcher)
    }
}

/// Read a location from `path`, logging and skipping unreadable content.
pub fn read_location(path: &Path) -> Option<Location> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Failed to read location file");
            return None;
        }
    };
    match contents.parse::<Location>() {
        Ok(location) => Some(location),
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Ignoring malformed location");
            None
        }
    }
}
