//! Layout Provider
//!
//! The UI owns element positioning. It hands layouts to the export step as
//! opaque payloads; the core only carries them through after normalization.

use std::collections::BTreeMap;

use serde_json::Value;

use super::formats::ContentFormat;
use super::normalize::{normalize, ExternalValue};
use crate::core::template::ResolvedConfig;
use crate::core::{Color, CoreResult, EventId, Rect};

/// Positioned-element map supplied by the UI
pub type LayoutPayload = BTreeMap<String, ExternalValue>;

/// Source of per-content-type (and optionally per-event) layouts
pub trait LayoutProvider {
    fn export_layout(&self, content_type: &str) -> Option<LayoutPayload>;

    fn apply_layout(&mut self, content_type: &str, payload: LayoutPayload);

    /// Layout specific to one event, when the UI edited it separately.
    fn export_event_layout(&self, _event_id: &str) -> Option<LayoutPayload> {
        None
    }
}

/// Layouts held in memory, e.g. restored from a previous session
#[derive(Debug, Clone, Default)]
pub struct InMemoryLayouts {
    by_content_type: BTreeMap<String, LayoutPayload>,
    by_event: BTreeMap<EventId, LayoutPayload>,
}

impl InMemoryLayouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_event_layout(&mut self, event_id: &str, payload: LayoutPayload) {
        self.by_event.insert(event_id.to_string(), payload);
    }

    pub fn is_empty(&self) -> bool {
        self.by_content_type.is_empty() && self.by_event.is_empty()
    }
}

impl LayoutProvider for InMemoryLayouts {
    fn export_layout(&self, content_type: &str) -> Option<LayoutPayload> {
        self.by_content_type.get(content_type).cloned()
    }

    fn apply_layout(&mut self, content_type: &str, payload: LayoutPayload) {
        self.by_content_type
            .insert(content_type.to_string(), payload);
    }

    fn export_event_layout(&self, event_id: &str) -> Option<LayoutPayload> {
        self.by_event.get(event_id).cloned()
    }
}

fn element(rect: Rect, extra: Vec<(&str, ExternalValue)>) -> ExternalValue {
    let mut fields = vec![("position", ExternalValue::Rect(rect))];
    fields.extend(extra);
    ExternalValue::map(fields)
}

fn config_text(config: &ResolvedConfig, key: &str, fallback: &str) -> ExternalValue {
    ExternalValue::text(config.get(key).map(String::as_str).unwrap_or(fallback))
}

/// Built-in title / subtitle / picture-in-picture layout for a canvas.
/// The subtitle band follows `subtitle_position` (top, center or bottom).
pub fn fallback_layout(format: &ContentFormat, config: &ResolvedConfig) -> CoreResult<Value> {
    let w = f64::from(format.width);
    let h = f64::from(format.height);
    let margin = (w * 0.05).round();
    let band = (h * 0.1).round();
    let pip_w = (w * 0.3).round();

    let subtitle_y = match config.get("subtitle_position").map(String::as_str) {
        Some("top") => (h * 0.08).round(),
        Some("center") => ((h - band) / 2.0).round(),
        _ => h - band - (h * 0.08).round(),
    };

    let layout = ExternalValue::map([
        (
            "title",
            element(
                Rect::new(margin, margin, w - 2.0 * margin, band),
                vec![
                    ("font_size", ExternalValue::text("48px")),
                    ("color", ExternalValue::Color(Color::white())),
                ],
            ),
        ),
        (
            "subtitle",
            element(
                Rect::new(margin, subtitle_y, w - 2.0 * margin, band),
                vec![
                    ("font_size", config_text(config, "subtitle_fontSize", "24px")),
                    ("color", config_text(config, "subtitle_color", "white")),
                ],
            ),
        ),
        (
            "pip_video",
            element(
                Rect::new(
                    w - margin - pip_w,
                    margin + band + margin,
                    pip_w,
                    (h * 0.2).round(),
                ),
                vec![("border_radius", ExternalValue::Int(16))],
            ),
        ),
    ]);

    normalize(&layout)
}
