//! Timeline Models
//!
//! Release events and the planning window they are scheduled in.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::{new_id, AssetId, CoreError, CoreResult, EventId};

/// Default running time of a new event, in seconds.
pub const DEFAULT_EVENT_DURATION_SECONDS: u32 = 30;

/// Bounds of a planning window, in weeks.
pub const MIN_PLAN_WEEKS: u32 = 1;
pub const MAX_PLAN_WEEKS: u32 = 4;

// =============================================================================
// Event Status
// =============================================================================

/// Production status of a release event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Planned,
    Ready,
    Published,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Planned => write!(f, "planned"),
            EventStatus::Ready => write!(f, "ready"),
            EventStatus::Published => write!(f, "published"),
        }
    }
}

impl FromStr for EventStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planned" => Ok(EventStatus::Planned),
            "ready" => Ok(EventStatus::Ready),
            "published" => Ok(EventStatus::Published),
            other => Err(CoreError::ValidationError(format!(
                "Unknown event status: {other}"
            ))),
        }
    }
}

// =============================================================================
// Release Event
// =============================================================================

/// Joins a content type and an event id in event-scoped export keys
pub const CONTENT_TYPE_SCOPE_SEPARATOR: char = '@';

fn default_duration_seconds() -> u32 {
    DEFAULT_EVENT_DURATION_SECONDS
}

/// A scheduled content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseEvent {
    #[serde(default)]
    id: EventId,
    pub date: NaiveDate,
    pub content_type: String,
    #[serde(default)]
    pub title: String,
    /// Free-text brief
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub asset_ids: Vec<AssetId>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u32,
}

impl ReleaseEvent {
    /// Creates an event with a freshly generated identifier.
    pub fn new(date: NaiveDate, content_type: &str) -> Self {
        Self {
            id: new_id(),
            date,
            content_type: content_type.trim().to_string(),
            title: String::new(),
            description: String::new(),
            asset_ids: Vec::new(),
            platforms: Vec::new(),
            hashtags: Vec::new(),
            status: EventStatus::Planned,
            duration_seconds: DEFAULT_EVENT_DURATION_SECONDS,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replaces the identifier at construction time. Stored events are keyed
    /// by id, so an event already in a store cannot be renamed through this.
    pub fn with_id(mut self, id: impl Into<EventId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platforms.push(platform.into());
        self
    }

    pub fn with_asset(mut self, asset_id: impl Into<AssetId>) -> Self {
        self.asset_ids.push(asset_id.into());
        self
    }

    pub fn with_hashtag(mut self, tag: impl Into<String>) -> Self {
        self.hashtags.push(tag.into());
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = seconds;
        self
    }

    /// Title shown when the user left it blank, e.g. `Reel Content`.
    pub fn default_title(content_type: &str) -> String {
        let mut chars = content_type.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!("{capitalized} Content")
    }

    /// Checks required fields and fills defaults for blank optional ones.
    pub fn validate(&mut self) -> CoreResult<()> {
        if self.id.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Event identifier cannot be empty".to_string(),
            ));
        }
        self.content_type = self.content_type.trim().to_string();
        if self.content_type.is_empty() {
            return Err(CoreError::ValidationError(
                "Event content type is required".to_string(),
            ));
        }
        if self.content_type.contains(CONTENT_TYPE_SCOPE_SEPARATOR) {
            return Err(CoreError::ValidationError(format!(
                "Event content type cannot contain '{}': {}",
                CONTENT_TYPE_SCOPE_SEPARATOR, self.content_type
            )));
        }
        if self.title.trim().is_empty() {
            self.title = Self::default_title(&self.content_type);
        }
        Ok(())
    }
}

// =============================================================================
// Timeline Plan
// =============================================================================

/// Planning window: whole weeks starting on a Monday
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelinePlan {
    start_date: NaiveDate,
    duration_weeks: u32,
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

impl TimelinePlan {
    /// Creates a plan for the week containing `date`. The duration is clamped.
    pub fn starting(date: NaiveDate, duration_weeks: u32) -> Self {
        Self {
            start_date: monday_of(date),
            duration_weeks: duration_weeks.clamp(MIN_PLAN_WEEKS, MAX_PLAN_WEEKS),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn duration_weeks(&self) -> u32 {
        self.duration_weeks
    }

    pub fn total_days(&self) -> u64 {
        u64::from(self.duration_weeks) * 7
    }

    /// Last day inside the window (inclusive).
    pub fn end_date(&self) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(self.total_days() - 1))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date()
    }

    /// Sets the window length and returns the clamped value applied.
    pub fn set_duration_weeks(&mut self, weeks: u32) -> u32 {
        self.duration_weeks = weeks.clamp(MIN_PLAN_WEEKS, MAX_PLAN_WEEKS);
        self.duration_weeks
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take(self.total_days() as usize)
            .collect()
    }

    /// Moves the window by whole windows (negative moves back).
    pub fn shifted(&self, periods: i64) -> Self {
        let days = self.total_days() * periods.unsigned_abs();
        let start = if periods >= 0 {
            self.start_date.checked_add_days(Days::new(days))
        } else {
            self.start_date.checked_sub_days(Days::new(days))
        };
        Self {
            start_date: start.unwrap_or(self.start_date),
            duration_weeks: self.duration_weeks,
        }
    }
}
