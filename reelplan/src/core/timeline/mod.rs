//! Release Timeline
//!
//! Scheduled release events, the planning window, and the dual-indexed store.

pub mod models;
pub mod store;

pub use models::{
    EventStatus, ReleaseEvent, TimelinePlan, CONTENT_TYPE_SCOPE_SEPARATOR,
    DEFAULT_EVENT_DURATION_SECONDS, MAX_PLAN_WEEKS, MIN_PLAN_WEEKS,
};
pub use store::EventStore;
