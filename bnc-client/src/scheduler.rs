//! Debounced save task.
//!
//! Watches the store's mutation feed and calls [`BouncerEngine::save`]
//! once the feed has been quiet for the configured period. Every change
//! inside the window restarts it, so a burst of edits becomes one save.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;

use crate::engine::BouncerEngine;

/// Spawn the save scheduler.
///
/// Returns a handle that can be used to abort the task. The task also
/// ends on its own once the engine is dropped or the feed closes.
pub fn spawn_save_scheduler(
    engine: Weak<BouncerEngine>,
    mut changes: watch::Receiver<u64>,
    quiet: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Save scheduler started (quiet period: {}ms)", quiet.as_millis());

        while changes.changed().await.is_ok() {
            loop {
                match timeout(quiet, changes.changed()).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(_)) => {
                        tracing::debug!("Save scheduler: mutation feed closed");
                        return;
                    }
                    Err(_) => break,
                }
            }

            let Some(engine) = engine.upgrade() else {
                break;
            };
            tracing::debug!("Save scheduler: quiet period elapsed, saving");
            engine.save().await;
        }

        tracing::debug!("Save scheduler stopped");
    })
}
