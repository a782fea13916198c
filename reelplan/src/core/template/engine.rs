//! Content Generation Engine
//!
//! Holds the project-wide, per-content-type and per-event templates and
//! resolves them, in that order, into an effective configuration and into
//! generation instructions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::instructions::InstructionSet;
use super::models::{Template, KNOWN_CONTENT_TYPES};
use crate::core::{CoreError, CoreResult, EventId};

/// Flattened `section_name -> value` map of fixed parameters
pub type ResolvedConfig = BTreeMap<String, String>;

// =============================================================================
// Layers
// =============================================================================

/// Which cascade layer a template belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerScope {
    ProjectWide,
    ContentType(String),
    Event(EventId),
}

impl fmt::Display for LayerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerScope::ProjectWide => write!(f, "project-wide"),
            LayerScope::ContentType(ct) => write!(f, "{ct}"),
            LayerScope::Event(id) => write!(f, "event-{id}"),
        }
    }
}

/// A template together with the layer it was found in
#[derive(Debug, Clone)]
pub struct TemplateLayer<'a> {
    pub scope: LayerScope,
    pub template: &'a Template,
}

// =============================================================================
// Engine
// =============================================================================

/// Three-layer template store, persisted as a unit inside the project document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentGenerationEngine {
    #[serde(default)]
    project_wide_template: Option<Template>,
    #[serde(default)]
    content_type_templates: BTreeMap<String, Template>,
    #[serde(default)]
    event_templates: BTreeMap<EventId, Template>,
}

impl Default for ContentGenerationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentGenerationEngine {
    /// Creates an engine with built-in templates for the known content types.
    pub fn new() -> Self {
        let mut engine = Self {
            project_wide_template: None,
            content_type_templates: BTreeMap::new(),
            event_templates: BTreeMap::new(),
        };
        engine.seed_known_content_types();
        engine
    }

    /// Registers built-in templates for known content types that are missing.
    /// Returns how many were added.
    pub fn seed_known_content_types(&mut self) -> usize {
        let mut added = 0;
        for content_type in KNOWN_CONTENT_TYPES {
            if !self.content_type_templates.contains_key(*content_type) {
                self.content_type_templates.insert(
                    content_type.to_string(),
                    Template::for_content_type(content_type),
                );
                added += 1;
            }
        }
        added
    }

    // -------------------------------------------------------------------------
    // Project-wide layer
    // -------------------------------------------------------------------------

    pub fn project_wide_template(&self) -> Option<&Template> {
        self.project_wide_template.as_ref()
    }

    pub fn set_project_wide_template(&mut self, template: Template) {
        self.project_wide_template = Some(template);
    }

    pub fn clear_project_wide_template(&mut self) -> Option<Template> {
        self.project_wide_template.take()
    }

    /// Returns the project-wide template, creating one with library defaults.
    pub fn project_wide_template_or_create(&mut self) -> &mut Template {
        self.project_wide_template
            .get_or_insert_with(Template::project_wide)
    }

    // -------------------------------------------------------------------------
    // Content-type layer
    // -------------------------------------------------------------------------

    pub fn content_type_template(&self, content_type: &str) -> Option<&Template> {
        self.content_type_templates.get(content_type)
    }

    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.content_type_templates.keys().map(String::as_str)
    }

    /// Returns the registered template for `content_type`, registering one
    /// with defaults on first use. Later calls return the same entry.
    pub fn get_or_create_content_type_template(&mut self, content_type: &str) -> &mut Template {
        self.content_type_templates
            .entry(content_type.to_string())
            .or_insert_with(|| {
                debug!("Creating default template for content type '{}'", content_type);
                Template::for_content_type(content_type)
            })
    }

    pub fn set_content_type_template(&mut self, content_type: &str, mut template: Template) {
        template.content_type = content_type.to_string();
        self.content_type_templates
            .insert(content_type.to_string(), template);
    }

    // -------------------------------------------------------------------------
    // Event layer
    // -------------------------------------------------------------------------

    pub fn event_template(&self, event_id: &str) -> Option<&Template> {
        self.event_templates.get(event_id)
    }

    pub fn has_event_template(&self, event_id: &str) -> bool {
        self.event_templates.contains_key(event_id)
    }

    pub fn event_template_ids(&self) -> impl Iterator<Item = &EventId> {
        self.event_templates.keys()
    }

    pub fn set_event_template(&mut self, event_id: &str, template: Template) {
        self.event_templates.insert(event_id.to_string(), template);
    }

    pub fn remove_event_template(&mut self, event_id: &str) -> Option<Template> {
        self.event_templates.remove(event_id)
    }

    /// Returns the event override, seeding it from the content-type template
    /// (or built-in defaults) when absent.
    pub fn event_template_or_create(&mut self, event_id: &str, content_type: &str) -> &mut Template {
        let content_type_templates = &self.content_type_templates;
        self.event_templates
            .entry(event_id.to_string())
            .or_insert_with(|| {
                debug!("Seeding event template for '{}' from '{}'", event_id, content_type);
                content_type_templates
                    .get(content_type)
                    .cloned()
                    .unwrap_or_else(|| Template::for_content_type(content_type))
            })
    }

    /// Looks up the template registered for `scope`.
    pub fn template(&self, scope: &LayerScope) -> CoreResult<&Template> {
        let found = match scope {
            LayerScope::ProjectWide => self.project_wide_template.as_ref(),
            LayerScope::ContentType(ct) => self.content_type_templates.get(ct),
            LayerScope::Event(id) => self.event_templates.get(id),
        };
        found.ok_or_else(|| CoreError::TemplateNotFound(scope.to_string()))
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Templates applying to `content_type` / `event_id`, lowest priority first.
    /// Absent layers are skipped.
    pub fn layers(&self, content_type: &str, event_id: Option<&str>) -> Vec<TemplateLayer<'_>> {
        let mut layers = Vec::with_capacity(3);
        if let Some(template) = &self.project_wide_template {
            layers.push(TemplateLayer {
                scope: LayerScope::ProjectWide,
                template,
            });
        }
        if let Some(template) = self.content_type_templates.get(content_type) {
            layers.push(TemplateLayer {
                scope: LayerScope::ContentType(content_type.to_string()),
                template,
            });
        }
        if let Some(id) = event_id {
            if let Some(template) = self.event_templates.get(id) {
                layers.push(TemplateLayer {
                    scope: LayerScope::Event(id.to_string()),
                    template,
                });
            }
        }
        layers
    }

    /// Effective fixed configuration. Event beats content type beats
    /// project-wide; guided and free parameters never appear.
    pub fn resolve_config(&self, content_type: &str, event_id: Option<&str>) -> ResolvedConfig {
        let mut config = ResolvedConfig::new();
        for layer in self.layers(content_type, event_id) {
            for entry in layer.template.parameters() {
                if let Some(value) = entry.param.authoritative_value() {
                    config.insert(entry.key(), value.to_string());
                }
            }
        }
        config
    }

    /// Every parameter of every applicable layer, classified by mode.
    pub fn instructions(&self, content_type: &str, event_id: Option<&str>) -> InstructionSet {
        let mut set = InstructionSet::new();
        for layer in self.layers(content_type, event_id) {
            for entry in layer.template.parameters() {
                set.push_entry(&entry);
            }
        }
        set
    }

    pub fn generate_instructions(
        &self,
        content_type: &str,
        event_id: Option<&str>,
        base_prompt: &str,
    ) -> String {
        self.instructions(content_type, event_id).render(base_prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template::instructions::{FREE_HEADER, GUIDED_HEADER, REQUIRED_HEADER};
    use crate::core::template::parameter::{ConfigParameter, Constraints, ModeKind};

    fn with_font_size(content_type: &str, size: i64) -> Template {
        let mut template = Template::new(content_type);
        template.subtitle.font_size = ConfigParameter::fixed(size);
        template
    }

    // =========================================================================
    // Construction Tests
    // =========================================================================

    #[test]
    fn test_new_engine_seeds_known_types() {
        let engine = ContentGenerationEngine::new();
        let types: Vec<&str> = engine.content_types().collect();
        assert_eq!(types, vec!["post", "reel", "story", "tutorial"]);
        assert!(engine.project_wide_template().is_none());
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut engine = ContentGenerationEngine::new();
        engine
            .get_or_create_content_type_template("unknown")
            .set_custom("marker", ConfigParameter::fixed("kept"));

        let second = engine.get_or_create_content_type_template("unknown");
        assert!(second.custom.contains_key("marker"));
        assert_eq!(engine.content_types().filter(|ct| *ct == "unknown").count(), 1);
        assert_eq!(engine.content_types().count(), 5);
    }

    #[test]
    fn test_seed_restores_only_missing() {
        let mut engine = ContentGenerationEngine::new();
        engine.set_content_type_template("reel", with_font_size("reel", 99));
        engine.content_type_templates.remove("story");

        assert_eq!(engine.seed_known_content_types(), 1);
        assert_eq!(
            engine.resolve_config("reel", None)["subtitle_fontSize"],
            "99"
        );
        assert!(engine.content_type_template("story").is_some());
    }

    // =========================================================================
    // Resolution Tests
    // =========================================================================

    #[test]
    fn test_fresh_reel_resolves_to_builtin_defaults() {
        let engine = ContentGenerationEngine::new();
        let config = engine.resolve_config("reel", None);
        assert_eq!(config["timing_duration"], "15-30s");
        assert_eq!(config["subtitle_position"], "bottom");
        assert_eq!(config["timing_segmentCount"], "4");
        assert_eq!(config.len(), 16);
    }

    #[test]
    fn test_cascade_order() {
        let mut engine = ContentGenerationEngine::new();
        engine.set_project_wide_template(with_font_size("project", 10));
        engine.set_content_type_template("reel", with_font_size("reel", 20));
        engine.set_event_template("e1", with_font_size("reel", 30));

        assert_eq!(engine.resolve_config("reel", Some("e1"))["subtitle_fontSize"], "30");
        assert_eq!(engine.resolve_config("reel", None)["subtitle_fontSize"], "20");
        assert_eq!(engine.resolve_config("reel", Some("other"))["subtitle_fontSize"], "20");
        assert_eq!(engine.resolve_config("podcast", None)["subtitle_fontSize"], "10");
    }

    #[test]
    fn test_non_fixed_parameters_excluded() {
        let mut engine = ContentGenerationEngine::new();
        let reel = engine.get_or_create_content_type_template("reel");
        reel.subtitle.color.set_mode(ModeKind::Guided);
        reel.timing.transition_style.set_mode(ModeKind::Free);

        let config = engine.resolve_config("reel", None);
        assert!(!config.contains_key("subtitle_color"));
        assert!(!config.contains_key("timing_transitionStyle"));
        assert_eq!(config.len(), 14);
    }

    #[test]
    fn test_lower_fixed_layer_survives_upper_guided() {
        let mut engine = ContentGenerationEngine::new();
        engine.set_project_wide_template(with_font_size("project", 10));
        engine
            .get_or_create_content_type_template("reel")
            .subtitle
            .font_size
            .set_mode(ModeKind::Free);

        assert_eq!(engine.resolve_config("reel", None)["subtitle_fontSize"], "10");
    }

    #[test]
    fn test_layers_skip_absent() {
        let mut engine = ContentGenerationEngine::new();
        let scopes: Vec<LayerScope> = engine
            .layers("reel", Some("e1"))
            .into_iter()
            .map(|l| l.scope)
            .collect();
        assert_eq!(scopes, vec![LayerScope::ContentType("reel".into())]);

        engine.project_wide_template_or_create();
        engine.set_event_template("e1", Template::new("reel"));
        let scopes: Vec<String> = engine
            .layers("reel", Some("e1"))
            .into_iter()
            .map(|l| l.scope.to_string())
            .collect();
        assert_eq!(scopes, vec!["project-wide", "reel", "event-e1"]);
    }

    #[test]
    fn test_custom_parameters_resolve() {
        let mut engine = ContentGenerationEngine::new();
        engine
            .get_or_create_content_type_template("reel")
            .set_custom("cta", ConfigParameter::fixed("Follow for more"));
        assert_eq!(engine.resolve_config("reel", None)["custom_cta"], "Follow for more");
    }

    #[test]
    fn test_unconfigured_type_resolves_empty() {
        let engine = ContentGenerationEngine {
            project_wide_template: None,
            content_type_templates: BTreeMap::new(),
            event_templates: BTreeMap::new(),
        };
        assert!(engine.resolve_config("reel", Some("e1")).is_empty());
        assert!(engine.generate_instructions("reel", None, "").is_empty());
    }

    // =========================================================================
    // Instruction Tests
    // =========================================================================

    #[test]
    fn test_instructions_do_not_deduplicate_layers() {
        let mut engine = ContentGenerationEngine::new();
        engine.set_project_wide_template(Template::project_wide());

        let set = engine.instructions("reel", None);
        let font_lines = set
            .required
            .iter()
            .filter(|l| l.starts_with("Subtitle fontSize"))
            .count();
        assert_eq!(font_lines, 2);
        assert_eq!(set.required.len(), 32);
    }

    #[test]
    fn test_generate_instructions_sections() {
        let mut engine = ContentGenerationEngine::new();
        let reel = engine.get_or_create_content_type_template("reel");
        reel.subtitle.font_size = ConfigParameter::guided("24px", Constraints::range(18.0, 32.0))
            .with_description("Readable on phones");
        reel.overlay.animation_style.set_mode(ModeKind::Free);

        let text = engine.generate_instructions("reel", None, "Teaser for the summer drop");
        let required = text.find(REQUIRED_HEADER).unwrap();
        let guided = text.find(GUIDED_HEADER).unwrap();
        let free = text.find(FREE_HEADER).unwrap();

        assert!(text.starts_with("Teaser for the summer drop\n"));
        assert!(required < guided && guided < free);
        assert!(text.contains("- Timing duration must be: 15-30s"));
        assert!(text.contains(
            "- Subtitle fontSize: Readable on phones (suggested: 24px; constraints: min 18; max 32)"
        ));
        assert!(text.contains("- Overlay animationStyle: AI decides"));
    }

    // =========================================================================
    // Event Template Tests
    // =========================================================================

    #[test]
    fn test_event_template_seeded_from_content_type() {
        let mut engine = ContentGenerationEngine::new();
        engine
            .event_template_or_create("e1", "tutorial")
            .timing
            .duration
            .set_value("90s");

        let event = engine.event_template("e1").unwrap();
        assert_eq!(event.timing.segment_count.value.to_string(), "6");
        assert_eq!(engine.resolve_config("tutorial", Some("e1"))["timing_duration"], "90s");
        assert_eq!(engine.resolve_config("tutorial", None)["timing_duration"], "60-120s");

        assert!(engine.remove_event_template("e1").is_some());
        assert!(!engine.has_event_template("e1"));
    }

    #[test]
    fn test_template_lookup_by_scope() {
        let mut engine = ContentGenerationEngine::new();
        assert!(engine.template(&LayerScope::ContentType("reel".into())).is_ok());
        assert!(matches!(
            engine.template(&LayerScope::ProjectWide),
            Err(CoreError::TemplateNotFound(_))
        ));
        engine.project_wide_template_or_create();
        assert!(engine.template(&LayerScope::ProjectWide).is_ok());
        assert!(engine.template(&LayerScope::Event("nope".into())).is_err());
    }

    #[test]
    fn test_engine_serde_roundtrip_shape() {
        let mut engine = ContentGenerationEngine::new();
        engine.set_event_template("e1", Template::new("reel"));
        let json = serde_json::to_value(&engine).unwrap();
        assert!(json["projectWideTemplate"].is_null());
        assert!(json["contentTypeTemplates"]["reel"].is_object());
        assert!(json["eventTemplates"]["e1"].is_object());

        let restored: ContentGenerationEngine = serde_json::from_value(json).unwrap();
        assert_eq!(restored, engine);
    }
}
