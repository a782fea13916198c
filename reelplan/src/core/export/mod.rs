//! Export
//!
//! Boundary normalization, layout hand-off and the export document.

pub mod assembler;
pub mod formats;
pub mod layout;
pub mod normalize;

pub use assembler::{
    export_project, write_export, Dimensions, ExportAssembler, ExportDocument, ExportProjectInfo,
    ExportTemplate, LayoutSource, ScheduledContent, EXPORT_VERSION,
};
pub use formats::ContentFormat;
pub use layout::{fallback_layout, InMemoryLayouts, LayoutPayload, LayoutProvider};
pub use normalize::{normalize, normalize_map, ExternalValue};
