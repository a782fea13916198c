//! Template System
//!
//! Parameters with mode tags, section templates, and the three-layer
//! resolution engine that turns them into configs and instructions.

pub mod engine;
pub mod instructions;
pub mod models;
pub mod parameter;

pub use engine::{ContentGenerationEngine, LayerScope, ResolvedConfig, TemplateLayer};
pub use instructions::InstructionSet;
pub use models::{
    OverlayTemplate, ParamKey, Section, SubtitleTemplate, Template, TemplateEntry,
    TimingTemplate, KNOWN_CONTENT_TYPES, PROJECT_WIDE_CONTENT_TYPE,
};
pub use parameter::{ConfigParameter, Constraints, ModeKind, ParamMode, ParamValue};
