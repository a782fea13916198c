//! Periodic background saving of an open project.
//!
//! The project is shared behind an async mutex; the autosave task only
//! writes when the project has unsaved changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::fs::{atomic_write_bytes, with_forced_extension};
use crate::core::project::{Project, PROJECT_EXTENSION};
use crate::core::settings::AppSettings;
use crate::core::{CoreError, CoreResult};

/// Project shared between the foreground editor and the autosave task
pub type SharedProject = Arc<Mutex<Project>>;

/// Where and how often to autosave
#[derive(Clone, Debug, PartialEq)]
pub struct AutosaveConfig {
    pub path: PathBuf,
    pub interval: Duration,
}

impl AutosaveConfig {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
        }
    }

    /// Builds a config from user settings, or `None` when autosave is disabled.
    pub fn from_settings(settings: &AppSettings, path: impl Into<PathBuf>) -> Option<Self> {
        if !settings.auto_save.enabled {
            return None;
        }
        let seconds = settings.auto_save.interval_seconds.clamp(30, 3600);
        Some(Self::new(path, Duration::from_secs(u64::from(seconds))))
    }
}

/// Saves the project if it is dirty. Returns whether a write happened.
///
/// The lock is held until the write completes. The file write itself runs on
/// the blocking pool so the runtime worker stays free.
pub async fn autosave_once(project: &SharedProject, path: &Path) -> CoreResult<bool> {
    let mut guard = project.lock().await;
    if !guard.is_dirty() {
        debug!("Autosave skipped, no unsaved changes");
        return Ok(false);
    }

    let target = with_forced_extension(path, PROJECT_EXTENSION);
    let bytes = serde_json::to_vec_pretty(&guard.to_document())?;
    let write_target = target.clone();
    tokio::task::spawn_blocking(move || atomic_write_bytes(&write_target, &bytes))
        .await
        .map_err(|e| CoreError::Internal(format!("Autosave write task failed: {e}")))??;

    guard.mark_saved();
    info!("Autosaved project '{}' to {:?}", guard.name(), target);
    Ok(true)
}

/// Handle to a running autosave task
pub struct AutosaveHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Stops the task after one final save of pending changes.
    pub async fn stop(self) {
        self.shutdown.notify_one();
        if let Err(e) = self.task.await {
            warn!("Autosave task ended abnormally: {}", e);
        }
    }
}

/// Spawns the autosave loop on the current tokio runtime.
pub fn spawn_autosave(project: SharedProject, config: AutosaveConfig) -> AutosaveHandle {
    let shutdown = Arc::new(Notify::new());
    let shutdown_clone = Arc::clone(&shutdown);

    let task = tokio::spawn(async move {
        info!(
            "Autosave started ({:?} every {}s)",
            config.path,
            config.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = shutdown_clone.notified() => {
                    if let Err(e) = autosave_once(&project, &config.path).await {
                        warn!("Final autosave failed: {}", e);
                    }
                    info!("Autosave stopped");
                    break;
                }
                _ = tokio::time::sleep(config.interval) => {
                    if let Err(e) = autosave_once(&project, &config.path).await {
                        warn!("Autosave failed: {}", e);
                    }
                }
            }
        }
    });

    AutosaveHandle { shutdown, task }
}
