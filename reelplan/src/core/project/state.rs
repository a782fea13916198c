//! Project State
//!
//! In-memory project aggregate. Every planning mutation goes through
//! `Project`, which keeps the event store, the event templates and the
//! asset table consistent with each other and tracks unsaved changes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::assets::AssetRef;
use crate::core::fs::validate_project_name;
use crate::core::template::{ContentGenerationEngine, LayerScope, ResolvedConfig, Template};
use crate::core::timeline::{EventStore, ReleaseEvent, TimelinePlan};
use crate::core::{AssetId, CoreError, CoreResult, EventId};

// =============================================================================
// Project Metadata
// =============================================================================

/// Project metadata stored in the project document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Output format preset (e.g. "1080p")
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Creation timestamp (ISO 8601)
    #[serde(default)]
    pub created_at: String,
    /// Last modified timestamp (ISO 8601)
    #[serde(default)]
    pub modified_at: String,
    #[serde(default = "default_meta_version")]
    pub version: String,
}

fn default_format() -> String {
    "1080p".to_string()
}

fn default_fps() -> u32 {
    30
}

fn default_meta_version() -> String {
    "1.0".to_string()
}

impl ProjectMeta {
    /// Creates new project metadata
    pub fn new(name: &str) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            name: name.trim().to_string(),
            description: String::new(),
            format: default_format(),
            fps: default_fps(),
            created_at: now.clone(),
            modified_at: now,
            version: default_meta_version(),
        }
    }

    /// Updates the modified timestamp
    pub fn touch(&mut self) {
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }
}

// =============================================================================
// Project
// =============================================================================

/// A release plan: events on a calendar plus the templates that shape them
#[derive(Clone, Debug)]
pub struct Project {
    pub(super) meta: ProjectMeta,
    pub(super) assets: BTreeMap<AssetId, AssetRef>,
    pub(super) timeline_plan: Option<TimelinePlan>,
    pub(super) events: EventStore,
    pub(super) content_generation: ContentGenerationEngine,
    pub(super) global_prompt: Option<String>,
    pub(super) is_dirty: bool,
}

impl Project {
    /// Creates an empty project. The name must be usable as a file name.
    pub fn new(name: &str) -> CoreResult<Self> {
        validate_project_name(name)?;
        Ok(Self {
            meta: ProjectMeta::new(name),
            assets: BTreeMap::new(),
            timeline_plan: None,
            events: EventStore::new(),
            content_generation: ContentGenerationEngine::new(),
            global_prompt: None,
            is_dirty: false,
        })
    }

    pub fn meta(&self) -> &ProjectMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn set_description(&mut self, description: &str) {
        self.meta.description = description.to_string();
        self.mark_modified();
    }

    pub fn rename(&mut self, name: &str) -> CoreResult<()> {
        validate_project_name(name)?;
        self.meta.name = name.trim().to_string();
        self.mark_modified();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Dirty tracking
    // -------------------------------------------------------------------------

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn mark_modified(&mut self) {
        self.is_dirty = true;
        self.meta.touch();
    }

    pub fn mark_saved(&mut self) {
        self.is_dirty = false;
    }

    // -------------------------------------------------------------------------
    // Global prompt
    // -------------------------------------------------------------------------

    pub fn global_prompt(&self) -> Option<&str> {
        self.global_prompt.as_deref()
    }

    /// Sets the project brief; blank input clears it.
    pub fn set_global_prompt(&mut self, prompt: &str) {
        let trimmed = prompt.trim();
        self.global_prompt = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self.mark_modified();
    }

    // -------------------------------------------------------------------------
    // Timeline plan
    // -------------------------------------------------------------------------

    pub fn timeline_plan(&self) -> Option<&TimelinePlan> {
        self.timeline_plan.as_ref()
    }

    /// Creates a one-week plan around `today` unless one exists.
    pub fn initialize_timeline(&mut self, today: NaiveDate) -> TimelinePlan {
        if let Some(plan) = self.timeline_plan {
            return plan;
        }
        let plan = TimelinePlan::starting(today, 1);
        info!("Initialized timeline starting {}", plan.start_date());
        self.timeline_plan = Some(plan);
        self.mark_modified();
        plan
    }

    pub fn set_timeline_plan(&mut self, plan: TimelinePlan) {
        self.timeline_plan = Some(plan);
        self.mark_modified();
    }

    /// Changes the plan length; returns the clamped week count.
    pub fn set_timeline_duration(&mut self, weeks: u32) -> CoreResult<u32> {
        let plan = self.timeline_plan.as_mut().ok_or_else(|| {
            CoreError::ValidationError("Timeline has not been initialized".to_string())
        })?;
        let applied = plan.set_duration_weeks(weeks);
        self.mark_modified();
        Ok(applied)
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    pub fn events(&self) -> &EventStore {
        &self.events
    }

    pub fn event(&self, id: &str) -> CoreResult<&ReleaseEvent> {
        self.events
            .get(id)
            .ok_or_else(|| CoreError::EventNotFound(id.to_string()))
    }

    fn check_asset_refs(&self, event: &ReleaseEvent) -> CoreResult<()> {
        match event
            .asset_ids
            .iter()
            .find(|id| !self.assets.contains_key(id.as_str()))
        {
            Some(missing) => Err(CoreError::AssetNotFound(missing.clone())),
            None => Ok(()),
        }
    }

    /// Validates and schedules a new event. The first event also initializes
    /// the timeline plan around its date.
    pub fn add_event(&mut self, mut event: ReleaseEvent) -> CoreResult<EventId> {
        event.validate()?;
        self.check_asset_refs(&event)?;

        let id = event.id().to_string();
        let date = event.date;
        let content_type = event.content_type.clone();
        self.events.create(event)?;

        if self.timeline_plan.is_none() {
            self.timeline_plan = Some(TimelinePlan::starting(date, 1));
        }
        // Unknown content types get a default template on first use.
        self.content_generation
            .get_or_create_content_type_template(&content_type);

        info!("Added {} event {} on {}", content_type, id, date);
        self.mark_modified();
        Ok(id)
    }

    /// Replaces an event (matched by id), returning the previous version.
    pub fn update_event(&mut self, mut event: ReleaseEvent) -> CoreResult<ReleaseEvent> {
        event.validate()?;
        self.check_asset_refs(&event)?;
        if !self.events.contains(event.id()) {
            return Err(CoreError::EventNotFound(event.id().to_string()));
        }

        let content_type = event.content_type.clone();
        let previous = self.events.update(event)?;
        self.content_generation
            .get_or_create_content_type_template(&content_type);

        info!("Updated event {}", previous.id());
        self.mark_modified();
        Ok(previous)
    }

    pub fn move_event(&mut self, id: &str, date: NaiveDate) -> CoreResult<ReleaseEvent> {
        let previous = self.events.move_to(id, date)?;
        info!("Moved event {} from {} to {}", id, previous.date, date);
        self.mark_modified();
        Ok(previous)
    }

    /// Removes an event together with its event-specific template.
    pub fn remove_event(&mut self, id: &str) -> CoreResult<ReleaseEvent> {
        let removed = self.events.remove(id)?;
        if self.content_generation.remove_event_template(id).is_some() {
            debug!("Dropped event template for {}", id);
        }
        info!("Removed event {}", id);
        self.mark_modified();
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Assets
    // -------------------------------------------------------------------------

    pub fn assets(&self) -> &BTreeMap<AssetId, AssetRef> {
        &self.assets
    }

    pub fn asset(&self, id: &str) -> Option<&AssetRef> {
        self.assets.get(id)
    }

    pub fn add_asset(&mut self, asset: AssetRef) -> CoreResult<AssetId> {
        if self.assets.contains_key(&asset.id) {
            return Err(CoreError::DuplicateAsset(asset.id));
        }
        let id = asset.id.clone();
        info!("Registered asset {} ({})", id, asset.name);
        self.assets.insert(id.clone(), asset);
        self.mark_modified();
        Ok(id)
    }

    /// Unregisters an asset and detaches it from every event using it.
    pub fn remove_asset(&mut self, id: &str) -> CoreResult<AssetRef> {
        if !self.assets.contains_key(id) {
            return Err(CoreError::AssetNotFound(id.to_string()));
        }

        let referencing: Vec<ReleaseEvent> = self
            .events
            .events()
            .into_iter()
            .filter(|event| event.asset_ids.iter().any(|a| a == id))
            .cloned()
            .collect();
        for mut event in referencing {
            event.asset_ids.retain(|a| a != id);
            self.events.update(event)?;
        }

        let removed = self
            .assets
            .remove(id)
            .ok_or_else(|| CoreError::AssetNotFound(id.to_string()))?;
        info!("Removed asset {}", id);
        self.mark_modified();
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Templates
    // -------------------------------------------------------------------------

    pub fn content_generation(&self) -> &ContentGenerationEngine {
        &self.content_generation
    }

    /// Mutable access to the engine. Marks the project modified.
    pub fn content_generation_mut(&mut self) -> &mut ContentGenerationEngine {
        self.mark_modified();
        &mut self.content_generation
    }

    /// Template for `scope`, created on demand. Event scopes must name an
    /// existing event; the override is seeded from its content type.
    pub fn template_mut(&mut self, scope: &LayerScope) -> CoreResult<&mut Template> {
        let event_content_type = match scope {
            LayerScope::Event(id) => Some(self.event(id)?.content_type.clone()),
            _ => None,
        };
        self.mark_modified();

        let engine = &mut self.content_generation;
        let template = match scope {
            LayerScope::ProjectWide => engine.project_wide_template_or_create(),
            LayerScope::ContentType(ct) => engine.get_or_create_content_type_template(ct),
            LayerScope::Event(id) => {
                let ct = event_content_type.unwrap_or_default();
                engine.event_template_or_create(id, &ct)
            }
        };
        Ok(template)
    }

    pub fn resolve_config(&self, content_type: &str, event_id: Option<&str>) -> ResolvedConfig {
        self.content_generation.resolve_config(content_type, event_id)
    }

    /// Resolved config for a scheduled event, including its own override.
    pub fn resolve_event_config(&self, id: &str) -> CoreResult<ResolvedConfig> {
        let event = self.event(id)?;
        Ok(self.resolve_config(&event.content_type, Some(id)))
    }

    /// Generation instructions for a scheduled event, using its brief as the
    /// base prompt.
    pub fn event_instructions(&self, id: &str) -> CoreResult<String> {
        let event = self.event(id)?;
        Ok(self.content_generation.generate_instructions(
            &event.content_type,
            Some(id),
            &event.description,
        ))
    }
}
