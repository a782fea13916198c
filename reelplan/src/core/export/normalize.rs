//! Boundary Normalization
//!
//! Converts values arriving from the UI (colors, points, rectangles, nested
//! maps) into plain JSON before they are persisted or exported. This is the
//! only place such values are accepted; the planning core never stores them.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::core::{Color, CoreError, CoreResult, Point2D, Rect, Size2D};

/// A value handed over by the UI collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Color(Color),
    Point(Point2D),
    Size(Size2D),
    Rect(Rect),
    List(Vec<ExternalValue>),
    Map(BTreeMap<String, ExternalValue>),
    /// A UI-native object with no plain representation
    Opaque { type_name: String, repr: String },
}

impl ExternalValue {
    pub fn text(value: impl Into<String>) -> Self {
        ExternalValue::Text(value.into())
    }

    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, ExternalValue)>,
        K: Into<String>,
    {
        ExternalValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short type label used in error messages.
    pub fn kind(&self) -> String {
        match self {
            ExternalValue::Null => "null".to_string(),
            ExternalValue::Bool(_) => "bool".to_string(),
            ExternalValue::Int(_) => "int".to_string(),
            ExternalValue::Float(_) => "float".to_string(),
            ExternalValue::Text(_) => "text".to_string(),
            ExternalValue::Color(_) => "color".to_string(),
            ExternalValue::Point(_) => "point".to_string(),
            ExternalValue::Size(_) => "size".to_string(),
            ExternalValue::Rect(_) => "rect".to_string(),
            ExternalValue::List(_) => "list".to_string(),
            ExternalValue::Map(_) => "map".to_string(),
            ExternalValue::Opaque { type_name, .. } => type_name.clone(),
        }
    }
}

impl From<Value> for ExternalValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ExternalValue::Null,
            Value::Bool(b) => ExternalValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ExternalValue::Int(i),
                None => ExternalValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ExternalValue::Text(s),
            Value::Array(items) => {
                ExternalValue::List(items.into_iter().map(ExternalValue::from).collect())
            }
            Value::Object(map) => ExternalValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, ExternalValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Normalizes a UI value into plain JSON.
///
/// - colors become `[r, g, b, a]` with 0..=255 channels
/// - points become `{x, y}`, sizes `{width, height}`, rects `{x, y, width, height}`
/// - opaque values and non-finite numbers fail with `NonPrimitiveValue`
pub fn normalize(value: &ExternalValue) -> CoreResult<Value> {
    normalize_at(value, "")
}

fn finite(value: f64, path: &str) -> CoreResult<Value> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| CoreError::NonPrimitiveValue {
            path: display_path(path),
            kind: format!("non-finite number {value}"),
        })
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn object(fields: &[(&str, f64)], path: &str) -> CoreResult<Value> {
    let mut map = Map::new();
    for (name, v) in fields {
        map.insert((*name).to_string(), finite(*v, &format!("{path}/{name}"))?);
    }
    Ok(Value::Object(map))
}

fn normalize_at(value: &ExternalValue, path: &str) -> CoreResult<Value> {
    match value {
        ExternalValue::Null => Ok(Value::Null),
        ExternalValue::Bool(b) => Ok(Value::Bool(*b)),
        ExternalValue::Int(i) => Ok(Value::from(*i)),
        ExternalValue::Float(f) => finite(*f, path),
        ExternalValue::Text(s) => Ok(Value::String(s.clone())),
        ExternalValue::Color(c) => {
            for (channel, v) in [("r", c.r), ("g", c.g), ("b", c.b), ("a", c.a.unwrap_or(1.0))] {
                if !v.is_finite() {
                    return Err(CoreError::NonPrimitiveValue {
                        path: format!("{path}/{channel}"),
                        kind: "color with non-finite channel".to_string(),
                    });
                }
            }
            Ok(Value::Array(
                c.to_rgba8().iter().map(|v| Value::from(*v)).collect(),
            ))
        }
        ExternalValue::Point(p) => object(&[("x", p.x), ("y", p.y)], path),
        ExternalValue::Size(s) => object(&[("width", s.width), ("height", s.height)], path),
        ExternalValue::Rect(r) => object(
            &[
                ("x", r.x),
                ("y", r.y),
                ("width", r.width),
                ("height", r.height),
            ],
            path,
        ),
        ExternalValue::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| normalize_at(item, &format!("{path}/{i}")))
            .collect::<CoreResult<Vec<_>>>()
            .map(Value::Array),
        ExternalValue::Map(entries) => {
            let mut map = Map::new();
            for (key, item) in entries {
                let child = format!("{path}/{}", escape_segment(key));
                map.insert(key.clone(), normalize_at(item, &child)?);
            }
            Ok(Value::Object(map))
        }
        ExternalValue::Opaque { type_name, repr } => Err(CoreError::NonPrimitiveValue {
            path: display_path(path),
            kind: format!("{type_name} ({repr})"),
        }),
    }
}

/// Normalizes every entry of a keyed payload.
pub fn normalize_map(entries: &BTreeMap<String, ExternalValue>) -> CoreResult<Value> {
    let mut map = Map::new();
    for (key, value) in entries {
        map.insert(
            key.clone(),
            normalize_at(value, &format!("/{}", escape_segment(key)))?,
        );
    }
    Ok(Value::Object(map))
}
