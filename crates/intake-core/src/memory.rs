//! In-process [`SheetStore`] used for local runs and tests

use crate::error::StoreError;
use crate::store::SheetStore;
use crate::types::{HeaderStyle, SpreadsheetId, WorksheetRef};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Contents of one in-memory worksheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryWorksheet {
    /// Numeric tab id
    pub sheet_id: i64,
    /// Rows, header row first
    pub rows: Vec<Vec<String>>,
    /// Style applied to the header row, if any
    pub header_style: Option<(usize, HeaderStyle)>,
    /// Columns last auto-resized
    pub resized_columns: usize,
    /// Number of header row writes
    pub header_writes: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    sheets: BTreeMap<String, MemoryWorksheet>,
    next_sheet_id: i64,
}

/// Spreadsheet held in process memory
///
/// Only the spreadsheet id given at construction can be opened; any other id
/// behaves like a spreadsheet the caller cannot see.
#[derive(Debug)]
pub struct MemorySheetStore {
    spreadsheet_id: SpreadsheetId,
    state: Mutex<MemoryState>,
}

impl MemorySheetStore {
    /// Create an empty spreadsheet
    #[must_use]
    pub fn new(spreadsheet_id: SpreadsheetId) -> Self {
        Self {
            spreadsheet_id,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Pre-populate a worksheet with rows
    pub fn insert_worksheet(&self, title: &str, rows: Vec<Vec<String>>) -> WorksheetRef {
        let mut state = self.state.lock();
        let sheet_id = state.next_sheet_id;
        state.next_sheet_id += 1;
        state.sheets.insert(
            title.to_string(),
            MemoryWorksheet {
                sheet_id,
                rows,
                ..MemoryWorksheet::default()
            },
        );
        WorksheetRef::new(sheet_id, title)
    }

    /// Delete a worksheet, as a user would from the spreadsheet UI
    pub fn remove_worksheet(&self, title: &str) -> Option<MemoryWorksheet> {
        self.state.lock().sheets.remove(title)
    }

    /// Snapshot of a worksheet
    #[must_use]
    pub fn worksheet(&self, title: &str) -> Option<MemoryWorksheet> {
        self.state.lock().sheets.get(title).cloned()
    }

    /// Rows of a worksheet, header row first
    #[must_use]
    pub fn rows(&self, title: &str) -> Vec<Vec<String>> {
        self.worksheet(title).map(|ws| ws.rows).unwrap_or_default()
    }

    fn check_spreadsheet(&self, spreadsheet: &SpreadsheetId) -> Result<(), StoreError> {
        if *spreadsheet == self.spreadsheet_id {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("spreadsheet {spreadsheet}")))
        }
    }

    fn with_sheet<T>(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        f: impl FnOnce(&mut MemoryWorksheet) -> T,
    ) -> Result<T, StoreError> {
        self.check_spreadsheet(spreadsheet)?;
        let mut state = self.state.lock();
        match state.sheets.get_mut(&sheet.title) {
            Some(ws) if ws.sheet_id == sheet.sheet_id => Ok(f(ws)),
            _ => Err(StoreError::NotFound(format!("worksheet '{}'", sheet.title))),
        }
    }
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(String::is_empty)
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn open_worksheet(
        &self,
        spreadsheet: &SpreadsheetId,
        title: &str,
    ) -> Result<WorksheetRef, StoreError> {
        self.check_spreadsheet(spreadsheet)?;
        let existing = self
            .state
            .lock()
            .sheets
            .get(title)
            .map(|ws| WorksheetRef::new(ws.sheet_id, title));
        Ok(existing.unwrap_or_else(|| self.insert_worksheet(title, Vec::new())))
    }

    async fn read_header_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
    ) -> Result<Vec<String>, StoreError> {
        self.with_sheet(spreadsheet, sheet, |ws| {
            let mut header = ws.rows.first().cloned().unwrap_or_default();
            while header.last().is_some_and(String::is_empty) {
                header.pop();
            }
            header
        })
    }

    async fn has_rows_below_header(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
    ) -> Result<bool, StoreError> {
        self.with_sheet(spreadsheet, sheet, |ws| {
            ws.rows.get(1).is_some_and(|row| !is_blank_row(row))
        })
    }

    async fn write_header_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        headers: &[String],
    ) -> Result<(), StoreError> {
        self.with_sheet(spreadsheet, sheet, |ws| {
            ws.header_writes += 1;
            match ws.rows.first_mut() {
                Some(row) => {
                    if row.len() < headers.len() {
                        row.resize(headers.len(), String::new());
                    }
                    row[..headers.len()].clone_from_slice(headers);
                }
                None => ws.rows.push(headers.to_vec()),
            }
        })
    }

    async fn format_header_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        columns: usize,
        style: &HeaderStyle,
    ) -> Result<(), StoreError> {
        self.with_sheet(spreadsheet, sheet, |ws| {
            ws.header_style = Some((columns, style.clone()));
        })
    }

    async fn append_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        values: &[String],
    ) -> Result<(), StoreError> {
        self.with_sheet(spreadsheet, sheet, |ws| {
            while ws.rows.last().is_some_and(|row| is_blank_row(row)) {
                ws.rows.pop();
            }
            ws.rows.push(values.to_vec());
        })
    }

    async fn auto_resize_columns(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        columns: usize,
    ) -> Result<(), StoreError> {
        self.with_sheet(spreadsheet, sheet, |ws| {
            ws.resized_columns = columns;
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> SpreadsheetId {
        SpreadsheetId::new("memory-test")
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[tokio::test]
    async fn open_creates_once() {
        let store = MemorySheetStore::new(id());
        let first = store.open_worksheet(&id(), "Responses").await.unwrap();
        let second = store.open_worksheet(&id(), "Responses").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_spreadsheet_is_not_found() {
        let store = MemorySheetStore::new(id());
        let err = store
            .open_worksheet(&SpreadsheetId::new("other"), "Responses")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn rows_below_header_ignore_blank_rows() {
        let store = MemorySheetStore::new(id());
        let sheet = store.insert_worksheet("Responses", vec![Vec::new(), strings(&["", ""])]);
        assert!(!store.has_rows_below_header(&id(), &sheet).await.unwrap());

        let sheet = store.insert_worksheet("Legacy", vec![Vec::new(), strings(&["", "kept"])]);
        assert!(store.has_rows_below_header(&id(), &sheet).await.unwrap());
    }

    #[tokio::test]
    async fn header_row_is_trimmed_and_extended() {
        let store = MemorySheetStore::new(id());
        let sheet = store.insert_worksheet("Responses", vec![strings(&["A", "", ""])]);

        assert_eq!(
            store.read_header_row(&id(), &sheet).await.unwrap(),
            strings(&["A"])
        );

        store
            .write_header_row(&id(), &sheet, &strings(&["A", "B", "C", "D"]))
            .await
            .unwrap();
        assert_eq!(store.rows("Responses")[0], strings(&["A", "B", "C", "D"]));
    }

    #[tokio::test]
    async fn stale_handle_after_removal() {
        let store = MemorySheetStore::new(id());
        let sheet = store.open_worksheet(&id(), "Responses").await.unwrap();
        store.remove_worksheet("Responses");

        let err = store
            .append_row(&id(), &sheet, &strings(&["x"]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
