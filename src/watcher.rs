//! File watching for the page_log
//!
//! A notify watcher runs on a blocking task and forwards change events for
//! the log file through a channel; an async task debounces them and runs
//! one rebuild-and-swap per burst. Watcher failures are logged and leave
//! the server running on its last snapshot.

use crate::server::AppState;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// How often the blocking watcher thread checks for shutdown
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long to wait for the watcher thread before aborting it
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(200);

/// How long to let writes settle before rebuilding
const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Handle to the running watch/rebuild tasks
pub struct LogWatcher {
    stop: Arc<AtomicBool>,
    watch_task: tokio::task::JoinHandle<()>,
    rebuild_task: tokio::task::JoinHandle<()>,
}

impl LogWatcher {
    /// Watch `path` and rebuild the snapshot on every change
    pub fn spawn(path: PathBuf, state: Arc<AppState>) -> Self {
        let (tx, mut rx) = mpsc::channel::<()>(8);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let watch_task = tokio::task::spawn_blocking(move || {
            let mut watcher = match RecommendedWatcher::new(
                move |result: notify::Result<Event>| {
                    if let Ok(event) = result
                        && matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
                    {
                        // A full channel just means a rebuild is already queued.
                        let _ = tx.try_send(());
                    }
                },
                Config::default(),
            ) {
                Ok(watcher) => watcher,
                Err(e) => {
                    error!("failed to create log watcher: {e}");
                    return;
                }
            };

            if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
                error!("failed to watch {}: {e}", path.display());
                return;
            }
            info!("watching {} for changes", path.display());

            while !stop_flag.load(Ordering::Acquire) {
                std::thread::sleep(POLL_INTERVAL);
            }
            drop(watcher);
        });

        let rebuild_task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // Let in-flight writes settle, then fold any queued events
                // into a single rebuild.
                tokio::time::sleep(SETTLE_DELAY).await;
                while rx.try_recv().is_ok() {}
                info!("page_log changed, rebuilding aggregates");
                state.rebuild().await;
            }
        });

        Self {
            stop,
            watch_task,
            rebuild_task,
        }
    }

    /// Stop both tasks, aborting the watcher thread if it lags
    pub async fn shutdown(self) {
        self.stop.store(true, Ordering::Release);
        self.rebuild_task.abort();

        let mut watch_task = self.watch_task;
        tokio::select! {
            result = &mut watch_task => {
                if let Err(e) = result
                    && e.is_panic()
                {
                    warn!("watcher task panicked: {e:?}");
                }
            }
            _ = tokio::time::sleep(SHUTDOWN_TIMEOUT) => {
                watch_task.abort();
                warn!("watcher task did not stop in time and was aborted");
            }
        }
    }
}
