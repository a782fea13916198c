//! Settings Persistence System
//!
//! Provides persistent application settings with:
//! - Atomic file writes (temp file + rename)
//! - Schema validation with defaults
//! - Migration support for schema changes
//! - An advisory lock so two processes never interleave writes
//!
//! Settings are an explicit value: callers load an [`AppSettings`] through a
//! [`SettingsManager`], pass it where needed, and save it back.
//!
//! Storage location: {config_dir}/reelplan/settings.json

use std::fs;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::fs::atomic_write_json_pretty;
use crate::core::timeline::{
    DEFAULT_EVENT_DURATION_SECONDS, MAX_PLAN_WEEKS, MIN_PLAN_WEEKS,
};
use crate::core::{CoreError, CoreResult};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Application directory name under the platform config dir
pub const APP_DIR_NAME: &str = "reelplan";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Recently opened project files, most recent first
    #[serde(default)]
    pub recent_projects: Vec<String>,

    /// Auto-save settings
    #[serde(default)]
    pub auto_save: AutoSaveSettings,

    /// Planning defaults
    #[serde(default)]
    pub planning: PlanningSettings,

    /// Export settings
    #[serde(default)]
    pub export: ExportSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            general: GeneralSettings::default(),
            recent_projects: Vec::new(),
            auto_save: AutoSaveSettings::default(),
            planning: PlanningSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

impl AppSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected rather than rejected, so an old or
    /// hand-edited file still loads.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.general.recent_projects_limit = self.general.recent_projects_limit.clamp(1, 50);
        self.general.default_project_location =
            normalize_optional_path(self.general.default_project_location.take());

        let mut seen = std::collections::HashSet::new();
        self.recent_projects
            .retain(|p| !p.trim().is_empty() && seen.insert(p.clone()));
        self.recent_projects
            .truncate(self.general.recent_projects_limit as usize);

        self.auto_save.interval_seconds = self.auto_save.interval_seconds.clamp(30, 3600);

        self.planning.default_duration_weeks = self
            .planning
            .default_duration_weeks
            .clamp(MIN_PLAN_WEEKS, MAX_PLAN_WEEKS);
        self.planning.default_event_duration_seconds =
            self.planning.default_event_duration_seconds.clamp(1, 3600);
        self.planning
            .default_platforms
            .retain(|p| !p.trim().is_empty());

        self.export.default_export_location =
            normalize_optional_path(self.export.default_export_location.take());
    }

    /// Moves `path` to the front of the recent list, trimming to the limit.
    pub fn add_recent_project(&mut self, path: &str) {
        self.recent_projects.retain(|p| p != path);
        self.recent_projects.insert(0, path.to_string());
        self.recent_projects
            .truncate(self.general.recent_projects_limit.clamp(1, 50) as usize);
    }

    /// Recent projects that still exist on disk. Missing entries are pruned.
    pub fn existing_recent_projects(&mut self) -> &[String] {
        self.recent_projects.retain(|p| Path::new(p).exists());
        &self.recent_projects
    }

    pub fn clear_recent_projects(&mut self) {
        self.recent_projects.clear();
    }
}

fn normalize_optional_path(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    /// Recent projects limit
    #[serde(default = "default_recent_limit")]
    pub recent_projects_limit: u32,

    /// Default project location
    #[serde(default)]
    pub default_project_location: Option<String>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            recent_projects_limit: default_recent_limit(),
            default_project_location: None,
        }
    }
}

fn default_recent_limit() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

/// Auto-save settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveSettings {
    /// Enable auto-save
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Auto-save interval in seconds
    #[serde(default = "default_auto_save_interval")]
    pub interval_seconds: u32,
}

impl Default for AutoSaveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_auto_save_interval(),
        }
    }
}

fn default_auto_save_interval() -> u32 {
    300 // 5 minutes
}

/// Defaults applied to new plans and events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanningSettings {
    /// Length of a new timeline plan in weeks
    #[serde(default = "default_duration_weeks")]
    pub default_duration_weeks: u32,

    /// Running time of a new event in seconds
    #[serde(default = "default_event_duration")]
    pub default_event_duration_seconds: u32,

    /// Platforms pre-selected on new events
    #[serde(default)]
    pub default_platforms: Vec<String>,
}

impl Default for PlanningSettings {
    fn default() -> Self {
        Self {
            default_duration_weeks: default_duration_weeks(),
            default_event_duration_seconds: default_event_duration(),
            default_platforms: Vec::new(),
        }
    }
}

fn default_duration_weeks() -> u32 {
    1
}

fn default_event_duration() -> u32 {
    DEFAULT_EVENT_DURATION_SECONDS
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// Default export location
    #[serde(default)]
    pub default_export_location: Option<String>,

    /// Pretty-print export JSON
    #[serde(default = "default_true")]
    pub pretty_json: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            default_export_location: None,
            pretty_json: true,
        }
    }
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Settings manager for loading and saving settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager with the given settings directory
    pub fn new(settings_dir: PathBuf) -> Self {
        Self {
            settings_path: settings_dir.join(SETTINGS_FILE),
        }
    }

    /// Platform default settings directory, if one can be determined.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        // Ensure parent directory exists so the lock file can be created.
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CoreError::SettingsError(format!("Failed to create settings directory: {}", e))
            })?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| {
                CoreError::SettingsError(format!("Failed to open settings lock file: {}", e))
            })?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file).map_err(|e| {
                CoreError::SettingsError(format!("Failed to lock settings file (exclusive): {}", e))
            })?;
        } else {
            fs2::FileExt::lock_shared(&lock_file).map_err(|e| {
                CoreError::SettingsError(format!("Failed to lock settings file (shared): {}", e))
            })?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if the file is missing or unreadable
    pub fn load(&self) -> AppSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(AppSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path).map_err(|e| {
                CoreError::SettingsError(format!("Failed to read settings file: {}", e))
            })?;

            let mut settings = serde_json::from_str::<AppSettings>(&content).map_err(|e| {
                CoreError::SettingsError(format!("Failed to parse settings file: {}", e))
            })?;

            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = self.migrate(settings);
            }

            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Save settings to disk using atomic write (temp file + rename).
    /// Returns the normalized settings that were written.
    pub fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            atomic_write_json_pretty(&self.settings_path, &normalized).map_err(|e| {
                CoreError::SettingsError(format!("Failed to write settings file: {}", e))
            })?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path).map_err(|e| {
                    CoreError::SettingsError(format!("Failed to delete settings file: {}", e))
                })?;
                info!("Settings file deleted");
            }
            Ok(AppSettings::default())
        })
    }

    /// Records `path` as most recently opened and saves.
    pub fn record_recent_project(&self, path: &Path) -> CoreResult<AppSettings> {
        let mut settings = self.load();
        let display = fs::canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .to_string();
        settings.add_recent_project(&display);
        self.save(&settings)
    }

    /// Recent projects that still exist; persists the pruned list when it changed.
    pub fn existing_recent_projects(&self) -> CoreResult<Vec<String>> {
        let mut settings = self.load();
        let before = settings.recent_projects.len();
        if settings.existing_recent_projects().len() != before {
            settings = self.save(&settings)?;
        }
        Ok(settings.recent_projects)
    }

    /// Migrate settings from older version
    fn migrate(&self, mut settings: AppSettings) -> AppSettings {
        // Version 0 files predate the planning section; serde defaults fill it.
        settings.version = SETTINGS_VERSION;
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ============================================================
    // Default / Normalize Tests
    // ============================================================

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.general.recent_projects_limit, 10);
        assert!(settings.auto_save.enabled);
        assert_eq!(settings.auto_save.interval_seconds, 300);
        assert_eq!(settings.planning.default_duration_weeks, 1);
        assert_eq!(settings.planning.default_event_duration_seconds, 30);
        assert!(settings.export.pretty_json);
    }

    #[test]
    fn test_normalize_clamps_values() {
        let mut settings = AppSettings::default();
        settings.general.recent_projects_limit = 0;
        settings.general.default_project_location = Some("   ".to_string());
        settings.auto_save.interval_seconds = 5;
        settings.planning.default_duration_weeks = 12;
        settings.planning.default_event_duration_seconds = 0;
        settings.recent_projects = vec!["a".into(), "a".into(), "".into(), "b".into()];

        settings.normalize();

        assert_eq!(settings.general.recent_projects_limit, 1);
        assert!(settings.general.default_project_location.is_none());
        assert_eq!(settings.auto_save.interval_seconds, 30);
        assert_eq!(settings.planning.default_duration_weeks, 4);
        assert_eq!(settings.planning.default_event_duration_seconds, 1);
        assert_eq!(settings.recent_projects, vec!["a".to_string()]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"version": 1, "autoSave": {"enabled": false}}"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();
        assert!(!settings.auto_save.enabled);
        assert_eq!(settings.auto_save.interval_seconds, 300);
        assert_eq!(settings.general, GeneralSettings::default());
        assert!(settings.recent_projects.is_empty());
    }

    // ============================================================
    // Recent Project Tests
    // ============================================================

    #[test]
    fn test_add_recent_project_dedupes_and_limits() {
        let mut settings = AppSettings::default();
        settings.general.recent_projects_limit = 3;
        for p in ["a", "b", "c", "a", "d"] {
            settings.add_recent_project(p);
        }
        assert_eq!(settings.recent_projects, vec!["d", "a", "c"]);

        settings.clear_recent_projects();
        assert!(settings.recent_projects.is_empty());
    }

    #[test]
    fn test_existing_recent_projects_prunes_missing() {
        let dir = TempDir::new().unwrap();
        let kept = dir.path().join("kept.reelplan");
        std::fs::write(&kept, "{}").unwrap();
        let kept = kept.to_string_lossy().to_string();

        let mut settings = AppSettings::default();
        settings.add_recent_project(&dir.path().join("gone.reelplan").to_string_lossy());
        settings.add_recent_project(&kept);

        assert_eq!(settings.existing_recent_projects(), [kept]);
        assert_eq!(settings.recent_projects.len(), 1);
    }

    // ============================================================
    // Manager Tests
    // ============================================================

    #[test]
    fn test_load_missing_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());

        let mut settings = AppSettings::default();
        settings.auto_save.interval_seconds = 10_000;
        settings.planning.default_platforms = vec!["TikTok".into()];
        let saved = manager.save(&settings).unwrap();
        assert_eq!(saved.auto_save.interval_seconds, 3600);

        let loaded = manager.load();
        assert_eq!(loaded, saved);
        assert!(manager.settings_path().exists());
    }

    #[test]
    fn test_load_corrupted_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        std::fs::write(manager.settings_path(), "not json").unwrap();
        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_migrates_old_version() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        std::fs::write(
            manager.settings_path(),
            r#"{"version": 0, "recentProjects": ["/tmp/a.reelplan"]}"#,
        )
        .unwrap();
        let loaded = manager.load();
        assert_eq!(loaded.version, SETTINGS_VERSION);
        assert_eq!(loaded.recent_projects, vec!["/tmp/a.reelplan"]);
    }

    #[test]
    fn test_reset_deletes_file() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().to_path_buf());
        manager.save(&AppSettings::default()).unwrap();
        assert!(manager.settings_path().exists());

        let reset = manager.reset().unwrap();
        assert_eq!(reset, AppSettings::default());
        assert!(!manager.settings_path().exists());
    }

    #[test]
    fn test_record_and_list_recent_projects() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(dir.path().join("config"));
        let project = dir.path().join("plan.reelplan");
        std::fs::write(&project, "{}").unwrap();

        manager.record_recent_project(&project).unwrap();
        manager
            .record_recent_project(&dir.path().join("deleted.reelplan"))
            .unwrap();

        let existing = manager.existing_recent_projects().unwrap();
        assert_eq!(existing.len(), 1);
        assert!(existing[0].ends_with("plan.reelplan"));
        assert_eq!(manager.load().recent_projects.len(), 1);
    }
}
