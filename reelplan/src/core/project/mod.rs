//! Project Management
//!
//! The project aggregate, its asset table, and the persisted document format.

pub mod assets;
pub mod document;
pub mod state;

pub use assets::{AssetKind, AssetRef};
pub use document::{ProjectDocument, TimelinePlanDocument, DOCUMENT_VERSION, PROJECT_EXTENSION};
pub use state::{Project, ProjectMeta};
