//! Generation Instructions
//!
//! Sorts template parameters by mode into required, guided and free buckets
//! and renders them as prompt text for a downstream generator.

use serde::Serialize;

use super::models::TemplateEntry;
use super::parameter::ParamMode;

pub const REQUIRED_HEADER: &str = "## REQUIRED SETTINGS (must follow exactly):";
pub const GUIDED_HEADER: &str = "## GUIDED SETTINGS (follow constraints):";
pub const FREE_HEADER: &str = "## CREATIVE FREEDOM:";

/// Instruction lines grouped by mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionSet {
    pub required: Vec<String>,
    pub guided: Vec<String>,
    pub free: Vec<String>,
}

impl InstructionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies one parameter. Repeated names across layers are kept.
    pub fn push_entry(&mut self, entry: &TemplateEntry<'_>) {
        let label = entry.section.label();
        let name = entry.name;
        let param = entry.param;
        match &param.mode {
            ParamMode::Fixed => self
                .required
                .push(format!("{label} {name} must be: {}", param.value)),
            ParamMode::Guided { constraints } => {
                let description = if param.description.trim().is_empty() {
                    "guided"
                } else {
                    param.description.trim()
                };
                self.guided.push(format!(
                    "{label} {name}: {description} (suggested: {}; constraints: {constraints})",
                    param.value
                ));
            }
            ParamMode::Free => self.free.push(format!("{label} {name}: AI decides")),
        }
    }

    pub fn len(&self) -> usize {
        self.required.len() + self.guided.len() + self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders `base_prompt` followed by the non-empty sections in
    /// required, guided, free order.
    pub fn render(&self, base_prompt: &str) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !base_prompt.is_empty() {
            parts.push(base_prompt.to_string());
        }

        for (header, lines) in [
            (REQUIRED_HEADER, &self.required),
            (GUIDED_HEADER, &self.guided),
            (FREE_HEADER, &self.free),
        ] {
            if lines.is_empty() {
                continue;
            }
            parts.push(format!("\n{header}"));
            parts.extend(lines.iter().map(|line| format!("- {line}")));
        }

        parts.join("\n")
    }
}
