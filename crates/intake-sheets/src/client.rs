//! [`SheetStore`] over the Google Sheets v4 REST API

use crate::api::{self, BatchUpdateResponse, SpreadsheetMeta, ValueRange};
use crate::auth::TokenSource;
use async_trait::async_trait;
use intake_core::{HeaderStyle, SheetStore, SpreadsheetId, StoreError, WorksheetRef};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sheets API client, built once and shared by all requests
#[derive(Debug)]
pub struct SheetsClient {
    http: reqwest::Client,
    base: Url,
    tokens: TokenSource,
}

impl SheetsClient {
    /// Client against the public API
    pub fn new(tokens: TokenSource) -> Result<Self, StoreError> {
        let base = Url::parse(api::DEFAULT_BASE_URL)
            .map_err(|e| StoreError::Transport(format!("invalid base url: {e}")))?;
        Self::with_base_url(base, tokens, DEFAULT_TIMEOUT)
    }

    /// Client against a custom API root (proxies, fakes)
    pub fn with_base_url(base: Url, tokens: TokenSource, timeout: Duration) -> Result<Self, StoreError> {
        if base.cannot_be_a_base() {
            return Err(StoreError::Transport(format!(
                "invalid base url: {base}"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self { http, base, tokens })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Transport(format!("invalid base url: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn values_url(&self, spreadsheet: &SpreadsheetId, range: &str) -> Result<Url, StoreError> {
        self.endpoint(&["spreadsheets", spreadsheet.as_str(), "values", range])
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<T, StoreError> {
        let token = self.tokens.access_token(&self.http).await?;
        tracing::debug!("{} {}", method, url.path());

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api::status_error(status.as_u16(), &body));
        }
        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    async fn batch_update(
        &self,
        spreadsheet: &SpreadsheetId,
        body: &Value,
    ) -> Result<BatchUpdateResponse, StoreError> {
        let url = self.endpoint(&[
            "spreadsheets",
            &format!("{}:batchUpdate", spreadsheet.as_str()),
        ])?;
        self.call(Method::POST, url, Some(body)).await
    }
}

#[async_trait]
impl SheetStore for SheetsClient {
    async fn open_worksheet(
        &self,
        spreadsheet: &SpreadsheetId,
        title: &str,
    ) -> Result<WorksheetRef, StoreError> {
        let mut url = self.endpoint(&["spreadsheets", spreadsheet.as_str()])?;
        url.query_pairs_mut()
            .append_pair("fields", api::SHEET_PROPERTIES_FIELDS);
        let meta: SpreadsheetMeta = self.call(Method::GET, url, None).await?;

        if let Some(entry) = meta.sheets.iter().find(|s| s.properties.title == title) {
            return Ok(WorksheetRef::new(entry.properties.sheet_id, title));
        }

        let reply = self
            .batch_update(spreadsheet, &api::add_sheet_body(title))
            .await?;
        let props = reply.added_sheet().ok_or_else(|| {
            StoreError::InvalidResponse("addSheet reply without sheet properties".to_string())
        })?;
        tracing::info!("Created worksheet '{}' ({})", props.title, props.sheet_id);
        Ok(WorksheetRef::new(props.sheet_id, props.title))
    }

    async fn read_header_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
    ) -> Result<Vec<String>, StoreError> {
        let mut url = self.values_url(spreadsheet, &api::header_range(&sheet.title))?;
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");
        let range: ValueRange = self.call(Method::GET, url, None).await?;
        Ok(range.first_row())
    }

    async fn has_rows_below_header(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
    ) -> Result<bool, StoreError> {
        let mut url = self.values_url(spreadsheet, &api::first_data_range(&sheet.title))?;
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");
        let range: ValueRange = self.call(Method::GET, url, None).await?;
        Ok(!range.first_row().is_empty())
    }

    async fn write_header_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        headers: &[String],
    ) -> Result<(), StoreError> {
        let mut url = self.values_url(spreadsheet, &api::anchor_range(&sheet.title))?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let _: Value = self
            .call(Method::PUT, url, Some(&api::row_body(headers)))
            .await?;
        Ok(())
    }

    async fn format_header_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        columns: usize,
        style: &HeaderStyle,
    ) -> Result<(), StoreError> {
        let body = api::format_header_body(sheet.sheet_id, columns, style);
        self.batch_update(spreadsheet, &body).await?;
        Ok(())
    }

    async fn append_row(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        values: &[String],
    ) -> Result<(), StoreError> {
        let range = format!("{}:append", api::anchor_range(&sheet.title));
        let mut url = self.values_url(spreadsheet, &range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let _: Value = self
            .call(Method::POST, url, Some(&api::row_body(values)))
            .await?;
        Ok(())
    }

    async fn auto_resize_columns(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &WorksheetRef,
        columns: usize,
    ) -> Result<(), StoreError> {
        let body = api::auto_resize_body(sheet.sheet_id, columns);
        self.batch_update(spreadsheet, &body).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "google-sheets"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SheetsClient {
        SheetsClient::with_base_url(
            Url::parse(base).unwrap(),
            TokenSource::bearer("t"),
            DEFAULT_TIMEOUT,
        )
        .unwrap()
    }

    #[test]
    fn values_url_encodes_range() {
        let client = client("https://sheets.googleapis.com/v4/");
        let url = client
            .values_url(
                &SpreadsheetId::new("abc"),
                &api::header_range("AI Coach Questionnaire Responses"),
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/'AI%20Coach%20Questionnaire%20Responses'!1:1"
        );
    }

    #[test]
    fn base_without_trailing_slash() {
        let client = client("http://127.0.0.1:9000/v4");
        let url = client.endpoint(&["spreadsheets", "abc:batchUpdate"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/v4/spreadsheets/abc:batchUpdate");
    }

    #[test]
    fn rejects_opaque_base() {
        let err = SheetsClient::with_base_url(
            Url::parse("mailto:intake@example.com").unwrap(),
            TokenSource::bearer("t"),
            DEFAULT_TIMEOUT,
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }
}
