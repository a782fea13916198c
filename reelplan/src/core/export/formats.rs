//! Content Formats
//!
//! Platform label and canvas size for each content type.

use serde::Serialize;

/// Target canvas for a content type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFormat {
    pub platform: String,
    pub width: u32,
    pub height: u32,
}

impl ContentFormat {
    pub fn new(platform: &str, width: u32, height: u32) -> Self {
        Self {
            platform: platform.to_string(),
            width,
            height,
        }
    }

    /// Built-in format for `content_type`; unknown types get a landscape canvas.
    pub fn for_content_type(content_type: &str) -> Self {
        match content_type {
            "reel" => Self::new("Instagram Reels", 1080, 1920),
            "story" => Self::new("Instagram Stories", 1080, 1920),
            "post" => Self::new("Instagram Feed", 1080, 1080),
            "tutorial" => Self::new("YouTube", 1920, 1080),
            _ => Self::new("Generic", 1920, 1080),
        }
    }

    /// Reduced ratio string, e.g. `9:16`.
    pub fn aspect_ratio(&self) -> String {
        let divisor = gcd(self.width, self.height).max(1);
        format!("{}:{}", self.width / divisor, self.height / divisor)
    }

    pub fn is_vertical(&self) -> bool {
        self.height > self.width
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
