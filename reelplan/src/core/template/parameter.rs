//! Template Parameters
//!
//! A single configurable value plus its mode tag. Constraints live inside the
//! `Guided` variant, so a fixed or free parameter has nowhere to carry them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Values
// =============================================================================

/// Plain parameter value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Integer(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(v) => f.write_str(v),
            ParamValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

impl ParamValue {
    /// Parses loosely typed user input (CLI arguments, form fields).
    ///
    /// `true`/`false` become booleans, integers and finite floats become
    /// numbers, comma-separated input becomes a list, anything else is text.
    pub fn parse_loose(input: &str) -> Self {
        let trimmed = input.trim();
        if let Ok(b) = trimmed.parse::<bool>() {
            return ParamValue::Bool(b);
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return ParamValue::Integer(i);
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            if v.is_finite() {
                return ParamValue::Float(v);
            }
        }
        if trimmed.contains(',') {
            return ParamValue::List(
                trimmed
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        ParamValue::Text(trimmed.to_string())
    }
}

// =============================================================================
// Constraints
// =============================================================================

/// Bounds on a guided parameter
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Allowed values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Free-text hint for the generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Constraints {
    pub fn range(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Default::default()
        }
    }

    pub fn one_of<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.options.is_empty() && self.note.is_none()
    }
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut parts = Vec::new();
        if let Some(min) = self.min {
            parts.push(format!("min {min}"));
        }
        if let Some(max) = self.max {
            parts.push(format!("max {max}"));
        }
        if !self.options.is_empty() {
            parts.push(format!("one of [{}]", self.options.join(", ")));
        }
        if let Some(note) = &self.note {
            parts.push(note.clone());
        }
        f.write_str(&parts.join("; "))
    }
}

// =============================================================================
// Mode Tag
// =============================================================================

/// How strictly a downstream generator must honor a parameter
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ParamMode {
    /// Must be honored exactly
    #[default]
    Fixed,
    /// Suggested value bounded by constraints
    Guided {
        #[serde(default, skip_serializing_if = "Constraints::is_empty")]
        constraints: Constraints,
    },
    /// The generator decides; the stored value is advisory only
    Free,
}

impl ParamMode {
    pub fn guided() -> Self {
        ParamMode::Guided {
            constraints: Constraints::default(),
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            ParamMode::Fixed => ModeKind::Fixed,
            ParamMode::Guided { .. } => ModeKind::Guided,
            ParamMode::Free => ModeKind::Free,
        }
    }
}

/// Payload-free mode discriminant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Fixed,
    Guided,
    Free,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeKind::Fixed => write!(f, "fixed"),
            ModeKind::Guided => write!(f, "guided"),
            ModeKind::Free => write!(f, "free"),
        }
    }
}

impl FromStr for ModeKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(ModeKind::Fixed),
            "guided" => Ok(ModeKind::Guided),
            "free" => Ok(ModeKind::Free),
            other => Err(CoreError::ValidationError(format!(
                "Unknown parameter mode: {other} (expected fixed, guided or free)"
            ))),
        }
    }
}

impl From<ModeKind> for ParamMode {
    fn from(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Fixed => ParamMode::Fixed,
            ModeKind::Guided => ParamMode::guided(),
            ModeKind::Free => ParamMode::Free,
        }
    }
}

// =============================================================================
// Parameter
// =============================================================================

/// A configurable template value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigParameter {
    pub value: ParamValue,
    #[serde(flatten)]
    pub mode: ParamMode,
    #[serde(default)]
    pub description: String,
}

impl ConfigParameter {
    pub fn fixed(value: impl Into<ParamValue>) -> Self {
        Self {
            value: value.into(),
            mode: ParamMode::Fixed,
            description: String::new(),
        }
    }

    pub fn guided(value: impl Into<ParamValue>, constraints: Constraints) -> Self {
        Self {
            value: value.into(),
            mode: ParamMode::Guided { constraints },
            description: String::new(),
        }
    }

    pub fn free(value: impl Into<ParamValue>) -> Self {
        Self {
            value: value.into(),
            mode: ParamMode::Free,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Switches the mode tag. Switching to guided keeps existing constraints
    /// when the parameter already was guided.
    pub fn set_mode(&mut self, kind: ModeKind) {
        if self.mode.kind() != kind {
            self.mode = kind.into();
        }
    }

    pub fn set_value(&mut self, value: impl Into<ParamValue>) {
        self.value = value.into();
    }

    /// Replaces the constraints of a guided parameter.
    pub fn set_constraints(&mut self, constraints: Constraints) -> CoreResult<()> {
        match &mut self.mode {
            ParamMode::Guided { constraints: slot } => {
                *slot = constraints;
                Ok(())
            }
            other => Err(CoreError::ConstraintsRequireGuided(format!(
                "parameter is {}",
                other.kind()
            ))),
        }
    }

    /// Constraints, when guided.
    pub fn constraints(&self) -> Option<&Constraints> {
        match &self.mode {
            ParamMode::Guided { constraints } => Some(constraints),
            _ => None,
        }
    }

    /// The value downstream consumers must honor, if any.
    pub fn authoritative_value(&self) -> Option<&ParamValue> {
        match self.mode {
            ParamMode::Fixed => Some(&self.value),
            _ => None,
        }
    }

    pub fn kind(&self) -> ModeKind {
        self.mode.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Mode Tests
    // =========================================================================

    #[test]
    fn test_only_fixed_is_authoritative() {
        assert_eq!(
            ConfigParameter::fixed("24px").authoritative_value(),
            Some(&ParamValue::Text("24px".to_string()))
        );
        assert!(ConfigParameter::guided("24px", Constraints::default())
            .authoritative_value()
            .is_none());
        assert!(ConfigParameter::free("24px").authoritative_value().is_none());
    }

    #[test]
    fn test_set_constraints_requires_guided() {
        let mut param = ConfigParameter::fixed(24i64);
        let err = param
            .set_constraints(Constraints::range(18.0, 32.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::ConstraintsRequireGuided(_)));
        assert_eq!(param.mode, ParamMode::Fixed);

        param.set_mode(ModeKind::Guided);
        param.set_constraints(Constraints::range(18.0, 32.0)).unwrap();
        assert_eq!(param.constraints().unwrap().max, Some(32.0));
    }

    #[test]
    fn test_set_mode_same_kind_keeps_constraints() {
        let mut param = ConfigParameter::guided(24i64, Constraints::range(1.0, 2.0));
        param.set_mode(ModeKind::Guided);
        assert_eq!(param.constraints().unwrap().min, Some(1.0));

        param.set_mode(ModeKind::Free);
        assert!(param.constraints().is_none());
    }

    #[test]
    fn test_mode_kind_from_str() {
        assert_eq!("Guided".parse::<ModeKind>().unwrap(), ModeKind::Guided);
        assert_eq!(" free ".parse::<ModeKind>().unwrap(), ModeKind::Free);
        assert!("strict".parse::<ModeKind>().is_err());
    }

    // =========================================================================
    // Serialization Tests
    // =========================================================================

    #[test]
    fn test_parameter_json_shape() {
        let param = ConfigParameter::guided("bottom", Constraints::one_of(["bottom", "center"]))
            .with_description("Subtitle placement");
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["mode"], "guided");
        assert_eq!(json["value"], "bottom");
        assert_eq!(json["constraints"]["options"][1], "center");

        let fixed = serde_json::to_value(ConfigParameter::fixed(4i64)).unwrap();
        assert_eq!(fixed["mode"], "fixed");
        assert!(fixed.get("constraints").is_none());
    }

    #[test]
    fn test_parameter_parses_without_optional_fields() {
        let param: ConfigParameter =
            serde_json::from_str(r#"{"value": 6, "mode": "free"}"#).unwrap();
        assert_eq!(param.value, ParamValue::Integer(6));
        assert_eq!(param.kind(), ModeKind::Free);
        assert!(param.description.is_empty());
    }

    // =========================================================================
    // Value Tests
    // =========================================================================

    #[test]
    fn test_param_value_display() {
        assert_eq!(ParamValue::from("white").to_string(), "white");
        assert_eq!(ParamValue::from(4i64).to_string(), "4");
        assert_eq!(
            ParamValue::List(vec!["logo".into(), "handle".into()]).to_string(),
            "logo, handle"
        );
    }

    #[test]
    fn test_param_value_parse_loose() {
        assert_eq!(ParamValue::parse_loose("true"), ParamValue::Bool(true));
        assert_eq!(ParamValue::parse_loose("12"), ParamValue::Integer(12));
        assert_eq!(ParamValue::parse_loose("1.5"), ParamValue::Float(1.5));
        assert_eq!(
            ParamValue::parse_loose("logo, handle"),
            ParamValue::List(vec!["logo".into(), "handle".into()])
        );
        assert_eq!(ParamValue::parse_loose("24px"), ParamValue::Text("24px".into()));
        assert_eq!(ParamValue::parse_loose("NaN"), ParamValue::Text("NaN".into()));
    }

    #[test]
    fn test_constraints_display() {
        assert_eq!(Constraints::default().to_string(), "none");
        assert_eq!(
            Constraints::range(18.0, 32.0).to_string(),
            "min 18; max 32"
        );
        assert_eq!(
            Constraints::one_of(["a", "b"]).with_note("prefer a").to_string(),
            "one of [a, b]; prefer a"
        );
    }
}
