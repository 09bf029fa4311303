//! Export orchestration for biddoc.
//!
//! This crate ties together template loading, data transformation,
//! document rendering and delivery into the `export_document` workflow.

pub mod delivery;
pub mod pipeline;
pub mod template;

pub use delivery::{Deliver, FileDelivery};
pub use pipeline::{
    ExportOptions, ExportResult, ExportState, ExportedFile, ProgressReporter, SilentProgress,
    export_document, export_document_with_progress,
};
pub use template::TemplateSource;
