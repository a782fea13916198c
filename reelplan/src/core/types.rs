//! ReelPlan Core Type Definitions
//!
//! Defines fundamental types shared across the planning core.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Release event unique identifier (ULID when generated)
pub type EventId = String;

/// Asset unique identifier (ULID)
pub type AssetId = String;

/// Generates a fresh ULID string.
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

// =============================================================================
// Geometry / Color Types
// =============================================================================

/// Color (RGBA)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red (0.0 ~ 1.0)
    pub r: f32,
    /// Green (0.0 ~ 1.0)
    pub g: f32,
    /// Blue (0.0 ~ 1.0)
    pub b: f32,
    /// Alpha (0.0 ~ 1.0, optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<f32>,
}

impl Color {
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: None,
        }
    }

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: Some(a.clamp(0.0, 1.0)),
        }
    }

    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Parses a hex color string (`#RRGGBB` or `#RRGGBBAA`).
    pub fn try_from_hex(hex: &str) -> Result<Self, String> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 && hex.len() != 8 {
            return Err(format!("Invalid hex color length: {}", hex.len()));
        }
        if !hex.is_ascii() {
            return Err("Hex color must be ASCII".to_string());
        }

        let channel = |s: &str| -> Result<f32, String> {
            u8::from_str_radix(s, 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|e| e.to_string())
        };

        let r = channel(&hex[0..2])?;
        let g = channel(&hex[2..4])?;
        let b = channel(&hex[4..6])?;
        if hex.len() == 8 {
            Ok(Self::rgba(r, g, b, channel(&hex[6..8])?))
        } else {
            Ok(Self::rgb(r, g, b))
        }
    }

    /// Returns `[r, g, b, a]` as 0..=255 integers. Missing alpha is opaque.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            to_u8(self.r),
            to_u8(self.g),
            to_u8(self.b),
            to_u8(self.a.unwrap_or(1.0)),
        ]
    }
}

/// 2D Point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 2D Size
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size2D {
    pub width: f64,
    pub height: f64,
}

impl Size2D {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle (top-left origin)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn size(&self) -> Size2D {
        Size2D::new(self.width, self.height)
    }
}
