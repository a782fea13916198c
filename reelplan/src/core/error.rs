//! ReelPlan Error Definitions
//!
//! Defines error types used throughout the crate.

use thiserror::Error;

use super::{AssetId, EventId};

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Event Errors
    // =========================================================================
    #[error("Duplicate event identifier: {0}")]
    DuplicateIdentifier(EventId),

    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    // =========================================================================
    // Template Errors
    // =========================================================================
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Unknown template parameter: {0}")]
    UnknownParameter(String),

    #[error("Constraints require guided mode: {0}")]
    ConstraintsRequireGuided(String),

    // =========================================================================
    // Asset Errors
    // =========================================================================
    #[error("Asset already registered: {0}")]
    DuplicateAsset(AssetId),

    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    // =========================================================================
    // Project Errors
    // =========================================================================
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Project file corrupted: {0}")]
    ProjectCorrupted(String),

    // =========================================================================
    // Export Errors
    // =========================================================================
    #[error("Non-primitive value at {path}: {kind}")]
    NonPrimitiveValue { path: String, kind: String },

    #[error("Export failed: {0}")]
    ExportFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Settings error: {0}")]
    SettingsError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;
