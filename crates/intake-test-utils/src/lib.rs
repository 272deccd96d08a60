//! Testing utilities for the form intake workspace
//!
//! Shared fixtures, stores and assertions.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use intake_core::{
    HeaderStyle, MemorySheetStore, RecorderConfig, ResponseRecorder, SheetStore, SpreadsheetId,
    StoreError, WorksheetRef, CANONICAL_HEADERS,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_SPREADSHEET_ID: &str = "test-spreadsheet";

pub fn test_spreadsheet_id() -> SpreadsheetId {
    SpreadsheetId::new(TEST_SPREADSHEET_ID)
}

/// The questionnaire answers used throughout the docs
pub fn reference_payload() -> Value {
    json!({
        "struggle_with_goals": "Sometimes",
        "life_change_scale": "8",
        "would_achieve_more": "Yes, absolutely",
        "achievement_scale": "7",
        "feeling_about_ai": "Really Excited",
        "email": "test@example.com",
        "userAgent": "Test Browser",
        "ipAddress": "127.0.0.1"
    })
}

/// Row expected for [`reference_payload`], minus the timestamp cell
pub fn reference_row_tail() -> Vec<String> {
    [
        "Sometimes",
        "8",
        "Yes, absolutely",
        "7",
        "Really Excited",
        "test@example.com",
        "",
        "",
        "",
        "Test Browser",
        "127.0.0.1",
    ]
    .iter()
    .map(|v| (*v).to_string())
    .collect()
}

pub fn canonical_header_strings() -> Vec<String> {
    CANONICAL_HEADERS.iter().map(|h| (*h).to_string()).collect()
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Recorder over a fresh in-memory spreadsheet
pub fn memory_recorder() -> (Arc<MemorySheetStore>, ResponseRecorder) {
    memory_recorder_with(RecorderConfig::new(test_spreadsheet_id()))
}

pub fn memory_recorder_with(config: RecorderConfig) -> (Arc<MemorySheetStore>, ResponseRecorder) {
    let store = Arc::new(MemorySheetStore::new(test_spreadsheet_id()));
    let recorder = ResponseRecorder::new(config, store.clone());
    (store, recorder)
}

/// Panics unless `cell` is an RFC 3339 timestamp
pub fn assert_timestamp(cell: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(cell)
        .unwrap_or_else(|e| panic!("expected RFC 3339 timestamp, got {cell:?}: {e}"))
        .with_timezone(&Utc)
}

/// Store whose every call fails with the same error
#[derive(Debug, Clone)]
pub struct FailingStore {
    pub error: StoreError,
}

impl FailingStore {
    pub fn permission_denied() -> Self {
        Self {
            error: StoreError::PermissionDenied("the caller does not have permission".to_string()),
        }
    }
}

#[async_trait]
impl SheetStore for FailingStore {
    async fn open_worksheet(
        &self,
        _spreadsheet: &SpreadsheetId,
        _title: &str,
    ) -> Result<WorksheetRef, StoreError> {
        Err(self.error.clone())
    }

    async fn read_header_row(
        &self,
        _spreadsheet: &SpreadsheetId,
        _sheet: &WorksheetRef,
    ) -> Result<Vec<String>, StoreError> {
        Err(self.error.clone())
    }

    async fn has_rows_below_header(
        &self,
        _spreadsheet: &SpreadsheetId,
        _sheet: &WorksheetRef,
    ) -> Result<bool, StoreError> {
        Err(self.error.clone())
    }

    async fn write_header_row(
        &self,
        _spreadsheet: &SpreadsheetId,
        _sheet: &WorksheetRef,
        _headers: &[String],
    ) -> Result<(), StoreError> {
        Err(self.error.clone())
    }

    async fn format_header_row(
        &self,
        _spreadsheet: &SpreadsheetId,
        _sheet: &WorksheetRef,
        _columns: usize,
        _style: &HeaderStyle,
    ) -> Result<(), StoreError> {
        Err(self.error.clone())
    }

    async fn append_row(
        &self,
        _spreadsheet: &SpreadsheetId,
        _sheet: &WorksheetRef,
        _values: &[String],
    ) -> Result<(), StoreError> {
        Err(self.error.clone())
    }

    async fn auto_resize_columns(
        &self,
        _spreadsheet: &SpreadsheetId,
        _sheet: &WorksheetRef,
        _columns: usize,
    ) -> Result<(), StoreError> {
        Err(self.error.clone())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
