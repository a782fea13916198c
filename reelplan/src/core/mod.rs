//! ReelPlan Core Engine
//!
//! Handles planning state, template resolution, persistence and export.

pub mod autosave;
pub mod export;
pub mod fs;
pub mod project;
pub mod settings;
pub mod template;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
