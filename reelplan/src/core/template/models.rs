//! Template Models
//!
//! Named bundles of parameters grouped into subtitle, overlay and timing
//! sections plus an open-ended custom collection.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::parameter::ConfigParameter;
use crate::core::{CoreError, CoreResult};

/// Content types that get built-in templates.
pub const KNOWN_CONTENT_TYPES: &[&str] = &["reel", "story", "post", "tutorial"];

/// Content type label used for the project-wide template.
pub const PROJECT_WIDE_CONTENT_TYPE: &str = "project";

// =============================================================================
// Sections
// =============================================================================

/// Parameter section of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Subtitle,
    Overlay,
    Timing,
    Custom,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Subtitle,
        Section::Overlay,
        Section::Timing,
        Section::Custom,
    ];

    /// Key prefix used in resolved configs (`subtitle_fontSize`).
    pub fn prefix(&self) -> &'static str {
        match self {
            Section::Subtitle => "subtitle",
            Section::Overlay => "overlay",
            Section::Timing => "timing",
            Section::Custom => "custom",
        }
    }

    /// Human-readable label used in instruction text.
    pub fn label(&self) -> &'static str {
        match self {
            Section::Subtitle => "Subtitle",
            Section::Overlay => "Overlay",
            Section::Timing => "Timing",
            Section::Custom => "Custom",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Section {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.prefix() == s)
            .ok_or_else(|| CoreError::UnknownParameter(format!("unknown section: {s}")))
    }
}

/// Section-qualified parameter name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamKey {
    pub section: Section,
    pub name: String,
}

impl ParamKey {
    pub fn new(section: Section, name: impl Into<String>) -> Self {
        Self {
            section,
            name: name.into(),
        }
    }

    /// Parses `section_name`, splitting at the first underscore so custom
    /// names may contain underscores themselves.
    pub fn parse(key: &str) -> CoreResult<Self> {
        let (section, name) = key
            .split_once('_')
            .ok_or_else(|| CoreError::UnknownParameter(key.to_string()))?;
        if name.is_empty() {
            return Err(CoreError::UnknownParameter(key.to_string()));
        }
        let section = section
            .parse::<Section>()
            .map_err(|_| CoreError::UnknownParameter(key.to_string()))?;
        Ok(Self::new(section, name))
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.section.prefix(), self.name)
    }
}

// =============================================================================
// Section Templates
// =============================================================================

/// Subtitle styling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubtitleTemplate {
    pub font_size: ConfigParameter,
    pub font_family: ConfigParameter,
    pub color: ConfigParameter,
    pub position: ConfigParameter,
    pub stroke_width: ConfigParameter,
    pub stroke_color: ConfigParameter,
}

impl Default for SubtitleTemplate {
    fn default() -> Self {
        Self {
            font_size: ConfigParameter::fixed("24px").with_description("Subtitle font size"),
            font_family: ConfigParameter::fixed("Arial").with_description("Subtitle typeface"),
            color: ConfigParameter::fixed("white").with_description("Subtitle text color"),
            position: ConfigParameter::fixed("bottom")
                .with_description("Vertical placement of subtitles"),
            stroke_width: ConfigParameter::fixed("2px").with_description("Text outline width"),
            stroke_color: ConfigParameter::fixed("black").with_description("Text outline color"),
        }
    }
}

impl SubtitleTemplate {
    pub fn entries(&self) -> [(&'static str, &ConfigParameter); 6] {
        [
            ("fontSize", &self.font_size),
            ("fontFamily", &self.font_family),
            ("color", &self.color),
            ("position", &self.position),
            ("strokeWidth", &self.stroke_width),
            ("strokeColor", &self.stroke_color),
        ]
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ConfigParameter> {
        match name {
            "fontSize" => Some(&mut self.font_size),
            "fontFamily" => Some(&mut self.font_family),
            "color" => Some(&mut self.color),
            "position" => Some(&mut self.position),
            "strokeWidth" => Some(&mut self.stroke_width),
            "strokeColor" => Some(&mut self.stroke_color),
            _ => None,
        }
    }
}

/// Overlay and visual effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayTemplate {
    pub background_style: ConfigParameter,
    pub animation_style: ConfigParameter,
    pub overlay_elements: ConfigParameter,
    pub branding_elements: ConfigParameter,
    pub color_scheme: ConfigParameter,
}

impl Default for OverlayTemplate {
    fn default() -> Self {
        Self {
            background_style: ConfigParameter::fixed("transparent")
                .with_description("Background treatment behind text"),
            animation_style: ConfigParameter::fixed("fade_in")
                .with_description("Entrance animation"),
            overlay_elements: ConfigParameter::fixed("none")
                .with_description("Decorative overlay elements"),
            branding_elements: ConfigParameter::fixed("logo")
                .with_description("Branding shown on screen"),
            color_scheme: ConfigParameter::fixed("brand").with_description("Overall palette"),
        }
    }
}

impl OverlayTemplate {
    pub fn entries(&self) -> [(&'static str, &ConfigParameter); 5] {
        [
            ("backgroundStyle", &self.background_style),
            ("animationStyle", &self.animation_style),
            ("overlayElements", &self.overlay_elements),
            ("brandingElements", &self.branding_elements),
            ("colorScheme", &self.color_scheme),
        ]
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ConfigParameter> {
        match name {
            "backgroundStyle" => Some(&mut self.background_style),
            "animationStyle" => Some(&mut self.animation_style),
            "overlayElements" => Some(&mut self.overlay_elements),
            "brandingElements" => Some(&mut self.branding_elements),
            "colorScheme" => Some(&mut self.color_scheme),
            _ => None,
        }
    }
}

/// Timing and pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingTemplate {
    pub duration: ConfigParameter,
    pub intro_duration: ConfigParameter,
    pub outro_duration: ConfigParameter,
    pub segment_count: ConfigParameter,
    pub transition_style: ConfigParameter,
}

impl Default for TimingTemplate {
    fn default() -> Self {
        Self {
            duration: ConfigParameter::fixed("30s").with_description("Total running time"),
            intro_duration: ConfigParameter::fixed("2s").with_description("Intro length"),
            outro_duration: ConfigParameter::fixed("3s").with_description("Outro length"),
            segment_count: ConfigParameter::fixed(4i64)
                .with_description("Number of content segments"),
            transition_style: ConfigParameter::fixed("smooth")
                .with_description("Transition between segments"),
        }
    }
}

impl TimingTemplate {
    pub fn entries(&self) -> [(&'static str, &ConfigParameter); 5] {
        [
            ("duration", &self.duration),
            ("introDuration", &self.intro_duration),
            ("outroDuration", &self.outro_duration),
            ("segmentCount", &self.segment_count),
            ("transitionStyle", &self.transition_style),
        ]
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ConfigParameter> {
        match name {
            "duration" => Some(&mut self.duration),
            "introDuration" => Some(&mut self.intro_duration),
            "outroDuration" => Some(&mut self.outro_duration),
            "segmentCount" => Some(&mut self.segment_count),
            "transitionStyle" => Some(&mut self.transition_style),
            _ => None,
        }
    }
}

// =============================================================================
// Template
// =============================================================================

/// One parameter of a template, with its section
#[derive(Debug, Clone, Copy)]
pub struct TemplateEntry<'a> {
    pub section: Section,
    pub name: &'a str,
    pub param: &'a ConfigParameter,
}

impl TemplateEntry<'_> {
    pub fn key(&self) -> String {
        format!("{}_{}", self.section.prefix(), self.name)
    }
}

/// Parameter bundle for a project, a content type or a single event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub subtitle: SubtitleTemplate,
    #[serde(default)]
    pub overlay: OverlayTemplate,
    #[serde(default)]
    pub timing: TimingTemplate,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, ConfigParameter>,
}

impl Template {
    /// Creates a template with library defaults.
    pub fn new(content_type: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
            subtitle: SubtitleTemplate::default(),
            overlay: OverlayTemplate::default(),
            timing: TimingTemplate::default(),
            custom: BTreeMap::new(),
        }
    }

    /// Creates a template with the built-in defaults for `content_type`,
    /// falling back to library defaults for unknown types.
    pub fn for_content_type(content_type: &str) -> Self {
        let mut template = Self::new(content_type);
        match content_type {
            "reel" => {
                template.timing.duration.set_value("15-30s");
                template.subtitle.position.set_value("bottom");
            }
            "story" => {
                template.timing.duration.set_value("5-15s");
                template.subtitle.position.set_value("center");
            }
            "post" => {
                template.timing.duration.set_value("30-60s");
                template.subtitle.position.set_value("bottom");
            }
            "tutorial" => {
                template.timing.duration.set_value("60-120s");
                template.subtitle.position.set_value("bottom");
                template.timing.segment_count.set_value(6i64);
            }
            _ => {}
        }
        template
    }

    pub fn project_wide() -> Self {
        Self::new(PROJECT_WIDE_CONTENT_TYPE)
    }

    /// All parameters in section order: subtitle, overlay, timing, custom.
    pub fn parameters(&self) -> Vec<TemplateEntry<'_>> {
        let mut entries = Vec::with_capacity(16 + self.custom.len());
        for (name, param) in self.subtitle.entries() {
            entries.push(TemplateEntry {
                section: Section::Subtitle,
                name,
                param,
            });
        }
        for (name, param) in self.overlay.entries() {
            entries.push(TemplateEntry {
                section: Section::Overlay,
                name,
                param,
            });
        }
        for (name, param) in self.timing.entries() {
            entries.push(TemplateEntry {
                section: Section::Timing,
                name,
                param,
            });
        }
        for (name, param) in &self.custom {
            entries.push(TemplateEntry {
                section: Section::Custom,
                name: name.as_str(),
                param,
            });
        }
        entries
    }

    pub fn parameter(&self, key: &str) -> Option<&ConfigParameter> {
        let key = ParamKey::parse(key).ok()?;
        self.parameters()
            .into_iter()
            .find(|entry| entry.section == key.section && entry.name == key.name)
            .map(|entry| entry.param)
    }

    pub fn parameter_mut(&mut self, key: &str) -> CoreResult<&mut ConfigParameter> {
        let parsed = ParamKey::parse(key)?;
        let slot = match parsed.section {
            Section::Subtitle => self.subtitle.get_mut(&parsed.name),
            Section::Overlay => self.overlay.get_mut(&parsed.name),
            Section::Timing => self.timing.get_mut(&parsed.name),
            Section::Custom => self.custom.get_mut(&parsed.name),
        };
        slot.ok_or_else(|| CoreError::UnknownParameter(key.to_string()))
    }

    /// Replaces a parameter by key. Custom keys are inserted when absent.
    pub fn set_parameter(&mut self, key: &str, param: ConfigParameter) -> CoreResult<()> {
        let parsed = ParamKey::parse(key)?;
        if parsed.section == Section::Custom {
            self.custom.insert(parsed.name, param);
            return Ok(());
        }
        *self.parameter_mut(key)? = param;
        Ok(())
    }

    pub fn set_custom(&mut self, name: impl Into<String>, param: ConfigParameter) {
        self.custom.insert(name.into(), param);
    }

    pub fn remove_custom(&mut self, name: &str) -> Option<ConfigParameter> {
        self.custom.remove(name)
    }
}
