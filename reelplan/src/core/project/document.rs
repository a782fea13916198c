//! Project Document
//!
//! On-disk schema of a `.reelplan` file and the conversion to and from the
//! in-memory [`Project`]. The persisted date index is never trusted: loading
//! rebuilds it from `releaseEvents`, keeping the stored ordering only where
//! it agrees with the event records.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::assets::AssetRef;
use super::state::{Project, ProjectMeta};
use crate::core::fs::{atomic_write_json_pretty, with_forced_extension};
use crate::core::template::ContentGenerationEngine;
use crate::core::timeline::{EventStore, ReleaseEvent, TimelinePlan};
use crate::core::{new_id, AssetId, CoreError, CoreResult, EventId};

/// Current document schema version
pub const DOCUMENT_VERSION: &str = "1.0";

/// Project file extension
pub const PROJECT_EXTENSION: &str = "reelplan";

/// Persisted timeline plan with its date index
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePlanDocument {
    pub start_date: NaiveDate,
    pub duration_weeks: u32,
    #[serde(default)]
    pub events: BTreeMap<NaiveDate, Vec<EventId>>,
}

/// Serialized project
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub metadata: ProjectMeta,
    #[serde(default)]
    pub assets: BTreeMap<AssetId, AssetRef>,
    #[serde(default)]
    pub timeline_plan: Option<TimelinePlanDocument>,
    #[serde(default)]
    pub release_events: BTreeMap<EventId, ReleaseEvent>,
    #[serde(default)]
    pub content_generation: ContentGenerationEngine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_prompt: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

impl ProjectDocument {
    /// Snapshot of a project.
    pub fn from_project(project: &Project) -> Self {
        let release_events = project
            .events
            .events()
            .into_iter()
            .map(|event| (event.id().to_string(), event.clone()))
            .collect();

        let timeline_plan = project.timeline_plan.map(|plan| TimelinePlanDocument {
            start_date: plan.start_date(),
            duration_weeks: plan.duration_weeks(),
            events: project.events.date_index().clone(),
        });

        Self {
            metadata: project.meta.clone(),
            assets: project.assets.clone(),
            timeline_plan,
            release_events,
            content_generation: project.content_generation.clone(),
            global_prompt: project.global_prompt.clone(),
            version: DOCUMENT_VERSION.to_string(),
        }
    }

    /// Rebuilds a project, re-deriving the date index from `releaseEvents`.
    pub fn into_project(self) -> CoreResult<Project> {
        if self.version != DOCUMENT_VERSION {
            warn!(
                "Project document version {} differs from supported {}, loading anyway",
                self.version, DOCUMENT_VERSION
            );
        }

        let mut records: BTreeMap<EventId, ReleaseEvent> = BTreeMap::new();
        for (key, event) in self.release_events {
            let mut event = if !event.id().trim().is_empty() {
                event
            } else if !key.trim().is_empty() {
                event.with_id(key.clone())
            } else {
                let event = event.with_id(new_id());
                warn!("Event stored without an identifier, assigned {}", event.id());
                event
            };
            if let Err(e) = event.validate() {
                warn!("Skipping invalid event {}: {}", event.id(), e);
                continue;
            }
            if event.id() != key {
                warn!(
                    "Event stored under key {} carries id {}, using the id",
                    key,
                    event.id()
                );
            }
            if records.contains_key(event.id()) {
                warn!("Skipping duplicate event {}", event.id());
                continue;
            }
            records.insert(event.id().to_string(), event);
        }

        let persisted_index = self
            .timeline_plan
            .as_ref()
            .map(|plan| plan.events.clone())
            .unwrap_or_default();
        let events = rebuild_store(records, &persisted_index)?;

        let timeline_plan = self
            .timeline_plan
            .map(|plan| TimelinePlan::starting(plan.start_date, plan.duration_weeks));

        let mut content_generation = self.content_generation;
        content_generation.seed_known_content_types();

        Ok(Project {
            meta: self.metadata,
            assets: self.assets,
            timeline_plan,
            events,
            content_generation,
            global_prompt: self.global_prompt,
            is_dirty: false,
        })
    }
}

/// Builds a consistent store, following the persisted bucket order where it
/// matches the records and appending everything else chronologically.
fn rebuild_store(
    mut records: BTreeMap<EventId, ReleaseEvent>,
    persisted_index: &BTreeMap<NaiveDate, Vec<EventId>>,
) -> CoreResult<EventStore> {
    let mut store = EventStore::new();
    let mut placed: HashSet<EventId> = HashSet::new();

    for (date, ids) in persisted_index {
        for id in ids {
            if placed.contains(id) {
                warn!("Date index lists event {} more than once", id);
                continue;
            }
            match records.get(id) {
                None => warn!("Date index for {} references unknown event {}", date, id),
                Some(event) if event.date != *date => warn!(
                    "Date index lists event {} under {} but it is dated {}",
                    id, date, event.date
                ),
                Some(_) => {
                    if let Some(event) = records.remove(id) {
                        placed.insert(id.clone());
                        store.create(event)?;
                    }
                }
            }
        }
    }

    let mut remaining: Vec<ReleaseEvent> = records.into_values().collect();
    if !remaining.is_empty() {
        warn!(
            "{} event(s) missing from the date index, re-indexing",
            remaining.len()
        );
    }
    remaining.sort_by_key(|event| event.date);
    for event in remaining {
        store.create(event)?;
    }

    Ok(store)
}

impl Project {
    pub fn to_document(&self) -> ProjectDocument {
        ProjectDocument::from_project(self)
    }

    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        let document: ProjectDocument = serde_json::from_str(json)
            .map_err(|e| CoreError::ProjectCorrupted(e.to_string()))?;
        document.into_project()
    }

    /// Writes the project atomically and clears the dirty flag. The path is
    /// given the `.reelplan` extension; the final path is returned.
    pub fn save(&mut self, path: &Path) -> CoreResult<PathBuf> {
        let path = with_forced_extension(path, PROJECT_EXTENSION);
        atomic_write_json_pretty(&path, &self.to_document())?;
        self.mark_saved();
        info!("Saved project '{}' to {}", self.name(), path.display());
        Ok(path)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ProjectNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let project = Self::from_json(&content)?;
        info!(
            "Loaded project '{}' ({} events) from {}",
            project.name(),
            project.events().len(),
            path.display()
        );
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template::{ConfigParameter, LayerScope};
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_project() -> Project {
        let mut project = Project::new("Round Trip").unwrap();
        project
            .add_event(ReleaseEvent::new(date("2025-07-05"), "reel").with_id("e1"))
            .unwrap();
        project
            .add_event(ReleaseEvent::new(date("2025-07-05"), "post").with_id("e2"))
            .unwrap();
        project
            .add_event(ReleaseEvent::new(date("2025-07-08"), "story").with_id("e3"))
            .unwrap();
        project
            .template_mut(&LayerScope::Event("e3".into()))
            .unwrap()
            .set_custom("cta", ConfigParameter::fixed("Swipe up"));
        project.set_global_prompt("Keep it playful");
        project
    }

    fn event_ids(project: &Project) -> Vec<String> {
        project
            .events()
            .events()
            .iter()
            .map(|e| e.id().to_string())
            .collect()
    }

    // =========================================================================
    // Schema Tests
    // =========================================================================

    #[test]
    fn test_document_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&sample_project().to_json().unwrap()).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["metadata"]["name"], "Round Trip");
        assert_eq!(json["timelinePlan"]["durationWeeks"], 1);
        assert_eq!(json["timelinePlan"]["events"]["2025-07-05"][1], "e2");
        assert_eq!(json["releaseEvents"]["e3"]["contentType"], "story");
        assert!(json["contentGeneration"]["eventTemplates"]["e3"].is_object());
        assert_eq!(json["globalPrompt"], "Keep it playful");
    }

    // =========================================================================
    // Round Trip Tests
    // =========================================================================

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut project = sample_project();
        let path = project.save(&dir.path().join("plan")).unwrap();

        assert_eq!(path.extension().unwrap(), "reelplan");
        assert!(!project.is_dirty());

        let loaded = Project::load(&path).unwrap();
        assert_eq!(event_ids(&loaded), vec!["e1", "e2", "e3"]);
        assert_eq!(loaded.event("e2").unwrap(), project.event("e2").unwrap());
        assert_eq!(loaded.events().len(), project.events().len());
        assert_eq!(loaded.content_generation(), project.content_generation());
        assert_eq!(loaded.global_prompt(), Some("Keep it playful"));
        assert_eq!(loaded.timeline_plan(), project.timeline_plan());
        loaded.events().check_invariants().unwrap();
    }

    #[test]
    fn test_load_rebuilds_corrupted_index() {
        let mut doc = sample_project().to_document();
        let plan = doc.timeline_plan.as_mut().unwrap();
        plan.events.clear();
        // e2 listed first, e1 under the wrong date, a dangling id, a duplicate
        plan.events
            .insert(date("2025-07-05"), vec!["e2".into(), "ghost".into(), "e2".into()]);
        plan.events.insert(date("2025-07-01"), vec!["e1".into()]);

        let project = doc.into_project().unwrap();
        project.events().check_invariants().unwrap();
        assert_eq!(project.events().len(), 3);
        let same_day: Vec<&str> = project
            .events()
            .events_for_date(date("2025-07-05"))
            .iter()
            .map(|e| e.id())
            .collect();
        assert_eq!(same_day, vec!["e2", "e1"]);
        assert!(project.events().events_for_date(date("2025-07-01")).is_empty());
    }

    #[test]
    fn test_load_repairs_and_drops_invalid_records() {
        let json = r#"{
            "metadata": {"name": "Repair"},
            "releaseEvents": {
                "": {"date": "2025-07-05", "contentType": "reel"},
                "bad": {"date": "2025-07-06", "contentType": "  "},
                "scoped": {"date": "2025-07-07", "contentType": "reel@e2"}
            }
        }"#;

        let project = Project::from_json(json).unwrap();
        project.events().check_invariants().unwrap();
        assert_eq!(project.events().len(), 1);

        let event = &project.events().events()[0];
        assert_eq!(event.id().len(), 26);
        assert_eq!(event.content_type, "reel");
        assert_eq!(event.title, "Reel Content");
    }

    #[test]
    fn test_load_without_timeline_plan() {
        let mut doc = sample_project().to_document();
        doc.timeline_plan = None;
        let project = doc.into_project().unwrap();
        assert!(project.timeline_plan().is_none());
        assert_eq!(project.events().len(), 3);
        project.events().check_invariants().unwrap();
    }

    #[test]
    fn test_load_reseeds_builtin_templates() {
        let json = r#"{
            "metadata": {"name": "Old"},
            "releaseEvents": {
                "k1": {"date": "2025-07-05", "contentType": "reel"}
            },
            "contentGeneration": {"contentTypeTemplates": {}},
            "version": "0.9"
        }"#;
        let project = Project::from_json(json).unwrap();
        assert_eq!(project.event("k1").unwrap().id(), "k1");
        assert!(project.content_generation().content_type_template("tutorial").is_some());
        assert_eq!(project.meta().fps, 30);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.reelplan");
        assert!(matches!(
            Project::load(&missing),
            Err(CoreError::ProjectNotFound(_))
        ));

        let broken = dir.path().join("broken.reelplan");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            Project::load(&broken),
            Err(CoreError::ProjectCorrupted(_))
        ));
    }
}
