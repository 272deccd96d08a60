//! Intake Core - form submissions to spreadsheet rows
//!
//! The pieces that do not care which spreadsheet backend is in use:
//! - The canonical header list and append-only header reconciliation
//! - Mapping a JSON payload onto header-ordered cell values
//! - The [`SheetStore`] seam and an in-memory implementation
//! - [`ResponseRecorder`], which ties them together per submission
//!
//! # Example
//!
//! ```rust,ignore
//! use intake_core::{MemorySheetStore, RecorderConfig, ResponseRecorder, SpreadsheetId};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), intake_core::IntakeError> {
//! let id = SpreadsheetId::new("local");
//! let store = Arc::new(MemorySheetStore::new(id.clone()));
//! let recorder = ResponseRecorder::new(RecorderConfig::new(id), store);
//!
//! let row = recorder.submit(br#"{"email":"test@example.com"}"#).await?;
//! println!("Wrote {} cells", row.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod headers;
pub mod memory;
pub mod recorder;
pub mod store;
pub mod submission;
pub mod types;

pub use error::{IntakeError, StoreError};
pub use headers::{HeaderSet, Reconciliation, CANONICAL_HEADERS, TIMESTAMP_HEADER};
pub use memory::{MemorySheetStore, MemoryWorksheet};
pub use recorder::{MigrationReport, ResponseRecorder};
pub use store::SheetStore;
pub use submission::{format_timestamp, FormSubmission, FIELD_MAP};
pub use types::{
    HeaderStyle, RecorderConfig, ResponseRow, SpreadsheetId, WorksheetRef, DEFAULT_SHEET_TITLE,
    PLACEHOLDER_SPREADSHEET_ID,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
