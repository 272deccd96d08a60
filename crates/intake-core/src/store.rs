//! Storage seam between the recorder and a spreadsheet backend
//!
//! Implementations speak in whole rows against a single worksheet. Row 1 is
//! always the header row; data rows are only ever appended.

use crate::error::StoreError;
use crate::types::{HeaderStyle, SpreadsheetId, WorksheetRef};
use async_trait::async_trait;

/// A spreadsheet backend
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Resolve the worksheet with `title`, creating the tab when absent
    ///
    /// # Errors
    /// Fails when the spreadsheet itself cannot be opened.
    async fn open_worksheet(
        &self,
        spreadsheet: &SpreadsheetId,
        title: &str,
    ) -> Result<WorksheetRef, StoreError>;

    /// Values of row 1 with trailing blank cells trimmed
    async fn read_header_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
    ) -> Result<Vec<String>, StoreError>;

    /// Whether the row directly below the header holds any value
    async fn has_rows_below_header(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
    ) -> Result<bool, StoreError>;

    /// Overwrite row 1 starting at column A
    async fn write_header_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        headers: &[String],
    ) -> Result<(), StoreError>;

    /// Apply `style` to the first `columns` cells of row 1
    async fn format_header_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        columns: usize,
        style: &HeaderStyle,
    ) -> Result<(), StoreError>;

    /// Append a row directly after the last non-empty row
    async fn append_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        values: &[String],
    ) -> Result<(), StoreError>;

    /// Fit the first `columns` columns to their content
    async fn auto_resize_columns(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        columns: usize,
    ) -> Result<(), StoreError>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}
