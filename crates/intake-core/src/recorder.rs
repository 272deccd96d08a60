//! Response recorder
//!
//! Owns the path from a parsed submission to an appended row:
//! - Resolves (or creates) the target worksheet
//! - Seeds the header row on an empty sheet
//! - Heals missing canonical headers
//! - Maps the submission onto the header order and appends it

use crate::error::{IntakeError, StoreError};
use crate::headers::{HeaderSet, Reconciliation};
use crate::store::SheetStore;
use crate::submission::FormSubmission;
use crate::types::{RecorderConfig, ResponseRow, WorksheetRef};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Result of the startup schema migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Worksheet that was migrated
    pub sheet: WorksheetRef,
    /// Whether the sheet was empty and got a fresh header row
    pub seeded: bool,
    /// Canonical headers appended to an existing row
    pub added: Vec<&'static str>,
    /// Header row after migration
    pub headers: HeaderSet,
}

/// Records form submissions as worksheet rows
///
/// One instance serves the whole process; the resolved worksheet handle is
/// cached and dropped again when the backend reports it gone.
pub struct ResponseRecorder {
    config: RecorderConfig,
    store: Arc<dyn SheetStore>,
    sheet: RwLock<Option<WorksheetRef>>,
}

impl std::fmt::Debug for ResponseRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseRecorder")
            .field("config", &self.config)
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}

impl ResponseRecorder {
    /// Create new recorder over a store
    #[must_use]
    pub fn new(config: RecorderConfig, store: Arc<dyn SheetStore>) -> Self {
        Self {
            config,
            store,
            sheet: RwLock::new(None),
        }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Parse a raw body and record it
    ///
    /// This is the whole POST path; every failure comes back as an
    /// [`IntakeError`] for the caller to report.
    pub async fn submit(&self, body: &[u8]) -> Result<ResponseRow, IntakeError> {
        let submission = FormSubmission::from_slice(body)?;
        tracing::debug!("Received submission with {} fields", submission.len());
        self.record(&submission).await
    }

    /// Record an already-parsed submission
    pub async fn record(&self, submission: &FormSubmission) -> Result<ResponseRow, IntakeError> {
        let sheet = self.get_or_create_sheet().await?;
        let result = self.record_into(&sheet, submission).await;
        if let Err(IntakeError::Storage(e)) = &result {
            self.forget_stale(e).await;
        }
        result
    }

    async fn record_into(
        &self,
        sheet: &WorksheetRef,
        submission: &FormSubmission,
    ) -> Result<ResponseRow, IntakeError> {
        let current = self.read_headers(sheet).await?;
        let headers = if current.is_blank() {
            self.warn_if_data_below(sheet).await;
            self.add_headers(sheet).await?
        } else {
            self.reconcile_headers(sheet, &current).await?.headers
        };
        self.append_submission(sheet, &headers, submission).await
    }

    /// Resolve the target worksheet, creating it when absent
    ///
    /// Concurrent callers on a cold cache share one resolution.
    ///
    /// # Errors
    /// - `IntakeError::Config` if no spreadsheet id was configured
    /// - `IntakeError::SpreadsheetUnavailable` if the spreadsheet cannot be opened
    pub async fn get_or_create_sheet(&self) -> Result<WorksheetRef, IntakeError> {
        if let Some(sheet) = self.sheet.read().await.as_ref() {
            return Ok(sheet.clone());
        }

        let mut slot = self.sheet.write().await;
        if let Some(sheet) = slot.as_ref() {
            return Ok(sheet.clone());
        }

        let spreadsheet = &self.config.spreadsheet_id;
        if !spreadsheet.is_configured() {
            return Err(IntakeError::Config(
                "spreadsheet id is not set; configure INTAKE_SPREADSHEET_ID with the id \
                 from the spreadsheet URL"
                    .to_string(),
            ));
        }

        let sheet = self
            .store
            .open_worksheet(spreadsheet, &self.config.sheet_title)
            .await
            .map_err(|source| {
                tracing::error!("Error opening spreadsheet {}: {}", spreadsheet, source);
                IntakeError::SpreadsheetUnavailable { source }
            })?;
        tracing::info!(
            sheet_id = sheet.sheet_id,
            "Resolved worksheet '{}' in spreadsheet {}",
            sheet.title,
            spreadsheet
        );

        *slot = Some(sheet.clone());
        Ok(sheet)
    }

    /// Seed the canonical header row into an empty sheet and style it
    pub async fn add_headers(&self, sheet: &WorksheetRef) -> Result<HeaderSet, IntakeError> {
        let headers = HeaderSet::canonical();
        self.store
            .write_header_row(&self.config.spreadsheet_id, sheet, headers.as_slice())
            .await?;
        tracing::info!("Seeded {} headers into '{}'", headers.len(), sheet.title);

        if let Err(e) = self
            .store
            .format_header_row(
                &self.config.spreadsheet_id,
                sheet,
                headers.len(),
                &self.config.header_style,
            )
            .await
        {
            tracing::warn!("Header formatting failed on '{}': {}", sheet.title, e);
            self.forget_after_cosmetic(&e).await;
        }
        Ok(headers)
    }

    /// Make sure every canonical header is present; returns the header row
    ///
    /// Writes only when something is missing.
    pub async fn ensure_sheet_headers(&self, sheet: &WorksheetRef) -> Result<HeaderSet, IntakeError> {
        let current = self.read_headers(sheet).await?;
        Ok(self.reconcile_headers(sheet, &current).await?.headers)
    }

    async fn reconcile_headers(
        &self,
        sheet: &WorksheetRef,
        current: &HeaderSet,
    ) -> Result<Reconciliation, IntakeError> {
        let reconciled = current.reconcile();
        if reconciled.changed() {
            self.store
                .write_header_row(
                    &self.config.spreadsheet_id,
                    sheet,
                    reconciled.headers.as_slice(),
                )
                .await?;
            tracing::info!(
                "Appended missing headers to '{}': {:?}",
                sheet.title,
                reconciled.added
            );
        }
        Ok(reconciled)
    }

    /// Append one submission as a row aligned to the current headers
    pub async fn add_form_data(
        &self,
        sheet: &WorksheetRef,
        submission: &FormSubmission,
    ) -> Result<ResponseRow, IntakeError> {
        let headers = self.ensure_sheet_headers(sheet).await?;
        self.append_submission(sheet, &headers, submission).await
    }

    async fn append_submission(
        &self,
        sheet: &WorksheetRef,
        headers: &HeaderSet,
        submission: &FormSubmission,
    ) -> Result<ResponseRow, IntakeError> {
        let row = submission.to_row(headers, Utc::now());

        self.store
            .append_row(&self.config.spreadsheet_id, sheet, &row.values)
            .await?;
        tracing::info!("Appended row of {} cells to '{}'", row.len(), sheet.title);

        if self.config.auto_resize {
            if let Err(e) = self
                .store
                .auto_resize_columns(&self.config.spreadsheet_id, sheet, row.len())
                .await
            {
                tracing::warn!("Column auto-resize failed on '{}': {}", sheet.title, e);
                self.forget_after_cosmetic(&e).await;
            }
        }
        Ok(row)
    }

    /// Bring the worksheet schema up to date once, ahead of any traffic
    pub async fn migrate_schema(&self) -> Result<MigrationReport, IntakeError> {
        let sheet = self.get_or_create_sheet().await?;
        let result = self.migrate_into(&sheet).await;
        if let Err(IntakeError::Storage(e)) = &result {
            self.forget_stale(e).await;
        }
        result
    }

    async fn migrate_into(&self, sheet: &WorksheetRef) -> Result<MigrationReport, IntakeError> {
        let current = self.read_headers(sheet).await?;
        if current.is_blank() {
            self.warn_if_data_below(sheet).await;
            let headers = self.add_headers(sheet).await?;
            return Ok(MigrationReport {
                sheet: sheet.clone(),
                seeded: true,
                added: Vec::new(),
                headers,
            });
        }

        let reconciled = self.reconcile_headers(sheet, &current).await?;
        Ok(MigrationReport {
            sheet: sheet.clone(),
            seeded: false,
            added: reconciled.added,
            headers: reconciled.headers,
        })
    }

    async fn read_headers(&self, sheet: &WorksheetRef) -> Result<HeaderSet, IntakeError> {
        let values = self
            .store
            .read_header_row(&self.config.spreadsheet_id, sheet)
            .await?;
        Ok(HeaderSet::new(values))
    }

    /// Header row is blank but rows below it hold data
    async fn warn_if_data_below(&self, sheet: &WorksheetRef) {
        match self
            .store
            .has_rows_below_header(&self.config.spreadsheet_id, sheet)
            .await
        {
            Ok(true) => tracing::warn!(
                "Header row of '{}' is blank but data rows exist below it; \
                 seeding canonical headers over existing data",
                sheet.title
            ),
            Ok(false) => {}
            Err(e) => tracing::debug!("Could not inspect rows below header: {}", e),
        }
    }

    /// Cosmetic calls address the tab by sheet id, which goes stale when the
    /// tab is replaced under the same title
    async fn forget_after_cosmetic(&self, error: &StoreError) {
        if matches!(error, StoreError::Api { status: 400, .. }) || error.is_not_found() {
            tracing::warn!("Sheet id rejected, resolving worksheet again on next request");
            *self.sheet.write().await = None;
        }
    }

    async fn forget_stale(&self, error: &StoreError) {
        if error.is_not_found() {
            tracing::warn!("Cached worksheet handle is stale, resolving again on next request");
            *self.sheet.write().await = None;
        }
    }
}
