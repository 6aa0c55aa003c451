//! `labeldesk-print`: label templates and the rolling print activity log.
//!
//! Barcode/QR rasterization is left to the renderer; this crate decides
//! what goes on a label and remembers what was printed.

pub mod log;
pub mod template;

pub use log::{MAX_LOG_ENTRIES, PrintLogEntry, PrintLogStore};
pub use template::{LabelData, LabelField, LabelLayout, PrintError, PrintTemplate, Symbology};
