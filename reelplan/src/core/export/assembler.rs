//! Export Assembler
//!
//! Combines scheduled events, resolved template configs and UI layouts into
//! one export document for a downstream generator. Assembly only reads the
//! project; a failure leaves it untouched.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::formats::ContentFormat;
use super::layout::{fallback_layout, LayoutPayload, LayoutProvider};
use super::normalize::normalize_map;
use crate::core::fs::{atomic_write_json, atomic_write_json_pretty};
use crate::core::project::{AssetRef, Project};
use crate::core::template::ResolvedConfig;
use crate::core::timeline::{EventStatus, ReleaseEvent, CONTENT_TYPE_SCOPE_SEPARATOR};
use crate::core::{AssetId, CoreError, CoreResult, EventId};

/// Export schema version
pub const EXPORT_VERSION: &str = "1.0";

// =============================================================================
// Export Document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProjectInfo {
    pub name: String,
    pub description: String,
    pub format: String,
    pub fps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: String,
}

/// Where a template's layout came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSource {
    Provider,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTemplate {
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    pub platform: String,
    pub dimensions: Dimensions,
    pub resolved_config: ResolvedConfig,
    pub layout: Value,
    pub layout_source: LayoutSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledContent {
    pub id: EventId,
    pub date: NaiveDate,
    pub content_type: String,
    pub title: String,
    /// The event brief
    pub prompt: String,
    /// Brief plus required / guided / free sections
    pub instructions: String,
    pub platforms: Vec<String>,
    pub hashtags: Vec<String>,
    pub status: EventStatus,
    pub duration_seconds: u32,
    pub asset_ids: Vec<AssetId>,
    pub template_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: String,
    pub project: ExportProjectInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_prompt: Option<String>,
    pub assets: Vec<AssetRef>,
    pub templates: BTreeMap<String, ExportTemplate>,
    pub scheduled_content: Vec<ScheduledContent>,
}

// =============================================================================
// Assembler
// =============================================================================

pub struct ExportAssembler<'a> {
    project: &'a Project,
    layouts: &'a dyn LayoutProvider,
}

impl<'a> ExportAssembler<'a> {
    pub fn new(project: &'a Project, layouts: &'a dyn LayoutProvider) -> Self {
        Self { project, layouts }
    }

    /// Event-specific key when the event has its own template or layout,
    /// otherwise the content type. The flag marks an event-scoped key.
    fn template_key(&self, event: &ReleaseEvent) -> (String, bool, Option<LayoutPayload>) {
        let event_layout = self.layouts.export_event_layout(event.id());
        let has_override = self
            .project
            .content_generation()
            .has_event_template(event.id());
        if has_override || event_layout.is_some() {
            let key = format!(
                "{}{}{}",
                event.content_type,
                CONTENT_TYPE_SCOPE_SEPARATOR,
                event.id()
            );
            (key, true, event_layout)
        } else {
            (event.content_type.clone(), false, None)
        }
    }

    fn build_template(
        &self,
        event: &ReleaseEvent,
        event_scoped: bool,
        event_layout: Option<LayoutPayload>,
    ) -> CoreResult<ExportTemplate> {
        let content_type = event.content_type.as_str();
        let event_id = event_scoped.then(|| event.id().to_string());
        let resolved_config = self
            .project
            .resolve_config(content_type, event_id.as_deref());
        let format = ContentFormat::for_content_type(content_type);

        let provided = event_layout.or_else(|| self.layouts.export_layout(content_type));
        let (layout, layout_source) = match provided {
            Some(payload) => (normalize_map(&payload)?, LayoutSource::Provider),
            None => {
                debug!("No UI layout for {}, using fallback", content_type);
                (fallback_layout(&format, &resolved_config)?, LayoutSource::Fallback)
            }
        };

        Ok(ExportTemplate {
            content_type: content_type.to_string(),
            event_id,
            platform: format.platform.clone(),
            dimensions: Dimensions {
                width: format.width,
                height: format.height,
                aspect_ratio: format.aspect_ratio(),
            },
            resolved_config,
            layout,
            layout_source,
        })
    }

    pub fn assemble(&self) -> CoreResult<ExportDocument> {
        let engine = self.project.content_generation();
        let mut templates: BTreeMap<String, ExportTemplate> = BTreeMap::new();
        let mut scheduled_content = Vec::with_capacity(self.project.events().len());

        for event in self.project.events().events() {
            let (key, event_scoped, event_layout) = self.template_key(event);
            if !templates.contains_key(&key) {
                let template = self.build_template(event, event_scoped, event_layout)?;
                templates.insert(key.clone(), template);
            }

            let instructions_event = engine
                .has_event_template(event.id())
                .then(|| event.id());
            scheduled_content.push(ScheduledContent {
                id: event.id().to_string(),
                date: event.date,
                content_type: event.content_type.clone(),
                title: event.title.clone(),
                prompt: event.description.clone(),
                instructions: engine.generate_instructions(
                    &event.content_type,
                    instructions_event,
                    &event.description,
                ),
                platforms: event.platforms.clone(),
                hashtags: event.hashtags.clone(),
                status: event.status,
                duration_seconds: event.duration_seconds,
                asset_ids: event.asset_ids.clone(),
                template_key: key,
            });
        }

        let meta = self.project.meta();
        Ok(ExportDocument {
            version: EXPORT_VERSION.to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            project: ExportProjectInfo {
                name: meta.name.clone(),
                description: meta.description.clone(),
                format: meta.format.clone(),
                fps: meta.fps,
            },
            global_prompt: self.project.global_prompt().map(str::to_string),
            assets: self.project.assets().values().cloned().collect(),
            templates,
            scheduled_content,
        })
    }
}

/// Serializes and writes an export document atomically.
pub fn write_export(document: &ExportDocument, path: &Path, pretty: bool) -> CoreResult<()> {
    let written = if pretty {
        atomic_write_json_pretty(path, document)
    } else {
        atomic_write_json(path, document)
    };
    written.map_err(|e| match e {
        CoreError::JsonError(e) => {
            CoreError::ExportFailed(format!("Failed to serialize export: {e}"))
        }
        other => CoreError::ExportFailed(format!("Failed to write {}: {other}", path.display())),
    })?;

    info!(
        "Exported {} scheduled item(s) to {}",
        document.scheduled_content.len(),
        path.display()
    );
    Ok(())
}

/// Assembles and writes the export for `project`.
pub fn export_project(
    project: &Project,
    layouts: &dyn LayoutProvider,
    path: &Path,
    pretty: bool,
) -> CoreResult<ExportDocument> {
    let document = ExportAssembler::new(project, layouts).assemble()?;
    write_export(&document, path, pretty)?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::layout::InMemoryLayouts;
    use crate::core::export::normalize::ExternalValue;
    use crate::core::template::{ConfigParameter, LayerScope};
    use crate::core::Rect;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn planned_project() -> Project {
        let mut project = Project::new("Launch").unwrap();
        project
            .add_event(
                ReleaseEvent::new(date("2025-07-05"), "reel")
                    .with_id("e1")
                    .with_description("Sneaker teaser"),
            )
            .unwrap();
        project
            .add_event(ReleaseEvent::new(date("2025-07-06"), "reel").with_id("e2"))
            .unwrap();
        project
            .add_event(ReleaseEvent::new(date("2025-07-04"), "post").with_id("e3"))
            .unwrap();
        project
    }

    #[test]
    fn test_templates_only_for_used_content_types() {
        let project = planned_project();
        let layouts = InMemoryLayouts::new();
        let doc = ExportAssembler::new(&project, &layouts).assemble().unwrap();

        let keys: Vec<&str> = doc.templates.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["post", "reel"]);

        let reel = &doc.templates["reel"];
        assert_eq!(reel.resolved_config["timing_duration"], "15-30s");
        assert_eq!(reel.dimensions.aspect_ratio, "9:16");
        assert_eq!(reel.layout_source, LayoutSource::Fallback);
        assert!(reel.event_id.is_none());

        let ids: Vec<&str> = doc.scheduled_content.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["e3", "e1", "e2"]);
        assert_eq!(doc.scheduled_content[1].template_key, "reel");
        assert!(doc.scheduled_content[1].instructions.starts_with("Sneaker teaser"));
    }

    #[test]
    fn test_event_override_gets_own_template_key() {
        let mut project = planned_project();
        project
            .template_mut(&LayerScope::Event("e2".into()))
            .unwrap()
            .timing
            .duration = ConfigParameter::fixed("12s");

        let layouts = InMemoryLayouts::new();
        let doc = ExportAssembler::new(&project, &layouts).assemble().unwrap();

        let entry = &doc.templates["reel@e2"];
        assert_eq!(entry.event_id.as_deref(), Some("e2"));
        assert_eq!(entry.resolved_config["timing_duration"], "12s");
        assert_eq!(doc.templates["reel"].resolved_config["timing_duration"], "15-30s");

        let e2 = doc.scheduled_content.iter().find(|c| c.id == "e2").unwrap();
        assert_eq!(e2.template_key, "reel@e2");
        assert!(e2.instructions.contains("Timing duration must be: 12s"));
    }

    #[test]
    fn test_event_scoped_keys_cannot_collide_with_content_types() {
        let mut project = planned_project();
        project
            .template_mut(&LayerScope::Event("e2".into()))
            .unwrap()
            .timing
            .duration = ConfigParameter::fixed("12s");
        let clash = project.add_event(ReleaseEvent::new(date("2025-07-07"), "reel@e2").with_id("x"));
        assert!(matches!(clash, Err(CoreError::ValidationError(_))));

        let layouts = InMemoryLayouts::new();
        let doc = ExportAssembler::new(&project, &layouts).assemble().unwrap();

        let scoped: Vec<(&str, Option<&str>)> = doc
            .templates
            .iter()
            .map(|(key, entry)| (key.as_str(), entry.event_id.as_deref()))
            .collect();
        assert_eq!(
            scoped,
            vec![("post", None), ("reel", None), ("reel@e2", Some("e2"))]
        );
        assert_eq!(doc.templates["reel@e2"].content_type, "reel");
        assert_eq!(doc.templates["reel@e2"].resolved_config["timing_duration"], "12s");
    }

    #[test]
    fn test_provider_layout_is_normalized() {
        let project = planned_project();
        let mut layouts = InMemoryLayouts::new();
        let mut payload = LayoutPayload::new();
        payload.insert(
            "title".into(),
            ExternalValue::map([("position", ExternalValue::Rect(Rect::new(100.0, 150.0, 880.0, 120.0)))]),
        );
        layouts.apply_layout("reel", payload);

        let doc = ExportAssembler::new(&project, &layouts).assemble().unwrap();
        let reel = &doc.templates["reel"];
        assert_eq!(reel.layout_source, LayoutSource::Provider);
        assert_eq!(reel.layout["title"]["position"]["x"], 100.0);
        assert_eq!(doc.templates["post"].layout_source, LayoutSource::Fallback);
    }

    #[test]
    fn test_event_layout_creates_event_key() {
        let project = planned_project();
        let mut layouts = InMemoryLayouts::new();
        let mut payload = LayoutPayload::new();
        payload.insert("title".into(), ExternalValue::text("custom"));
        layouts.set_event_layout("e1", payload);

        let doc = ExportAssembler::new(&project, &layouts).assemble().unwrap();
        assert_eq!(doc.templates["reel@e1"].layout["title"], "custom");
        assert_eq!(doc.templates["reel"].layout_source, LayoutSource::Fallback);
    }

    #[test]
    fn test_opaque_layout_value_fails_without_touching_project() {
        let project = planned_project();
        let before = project.to_json().unwrap();

        let mut layouts = InMemoryLayouts::new();
        let mut payload = LayoutPayload::new();
        payload.insert(
            "logo".into(),
            ExternalValue::Opaque {
                type_name: "QPixmap".into(),
                repr: "64x64".into(),
            },
        );
        layouts.apply_layout("post", payload);

        let err = ExportAssembler::new(&project, &layouts)
            .assemble()
            .unwrap_err();
        assert!(matches!(err, CoreError::NonPrimitiveValue { .. }));

        let after = project.to_json().unwrap();
        let strip = |s: &str| {
            let mut v: Value = serde_json::from_str(s).unwrap();
            v["metadata"]["modifiedAt"] = Value::Null;
            v
        };
        assert_eq!(strip(&before), strip(&after));
    }

    #[test]
    fn test_export_project_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("export.json");
        let mut project = planned_project();
        project.set_global_prompt("Playful tone");

        let layouts = InMemoryLayouts::new();
        let doc = export_project(&project, &layouts, &path, true).unwrap();

        let written: ExportDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, doc);
        assert_eq!(written.global_prompt.as_deref(), Some("Playful tone"));

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["scheduledContent"][0]["templateKey"].is_string());
        assert_eq!(raw["templates"]["post"]["layoutSource"], "fallback");
    }

    #[test]
    fn test_write_failure_maps_to_export_failed() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let project = planned_project();
        let doc = ExportAssembler::new(&project, &InMemoryLayouts::new())
            .assemble()
            .unwrap();
        let err = write_export(&doc, &blocker.join("export.json"), false).unwrap_err();
        assert!(matches!(err, CoreError::ExportFailed(_)));
    }
}
