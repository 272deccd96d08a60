//! Google Sheets v4 wire format
//!
//! Request bodies, response shapes, A1 ranges and error translation. Kept
//! free of I/O so the client stays a thin sequence of calls.

use intake_core::{HeaderStyle, StoreError};
use serde::Deserialize;
use serde_json::{json, Value};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/";

/// Field mask used when opening a spreadsheet
pub const SHEET_PROPERTIES_FIELDS: &str = "sheets.properties(sheetId,title)";

/// Quote a worksheet title for use in A1 notation
#[must_use]
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Row 1 of a worksheet
#[must_use]
pub fn header_range(title: &str) -> String {
    format!("{}!1:1", quote_title(title))
}

/// Row 2 of a worksheet, the first data row
#[must_use]
pub fn first_data_range(title: &str) -> String {
    format!("{}!2:2", quote_title(title))
}

/// Top-left anchor of a worksheet, used for header writes and appends
#[must_use]
pub fn anchor_range(title: &str) -> String {
    format!("{}!A1", quote_title(title))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpreadsheetMeta {
    #[serde(default)]
    pub(crate) sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SheetEntry {
    pub(crate) properties: SheetProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SheetProperties {
    #[serde(default)]
    pub(crate) sheet_id: i64,
    pub(crate) title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchUpdateResponse {
    #[serde(default)]
    pub(crate) replies: Vec<Value>,
}

impl BatchUpdateResponse {
    /// Properties of the sheet created by an `addSheet` request
    pub(crate) fn added_sheet(&self) -> Option<SheetProperties> {
        self.replies
            .iter()
            .find_map(|reply| reply.pointer("/addSheet/properties"))
            .and_then(|props| serde_json::from_value(props.clone()).ok())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValueRange {
    #[serde(default)]
    pub(crate) values: Vec<Vec<Value>>,
}

impl ValueRange {
    /// First row as display strings, trailing blanks trimmed
    pub(crate) fn first_row(self) -> Vec<String> {
        let mut row: Vec<String> = self
            .values
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|cell| match cell {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect();
        while row.last().is_some_and(String::is_empty) {
            row.pop();
        }
        row
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Body for writing a single row
#[must_use]
pub fn row_body(values: &[String]) -> Value {
    json!({
        "majorDimension": "ROWS",
        "values": [values],
    })
}

/// `addSheet` batch update
#[must_use]
pub fn add_sheet_body(title: &str) -> Value {
    json!({
        "requests": [{
            "addSheet": { "properties": { "title": title } }
        }]
    })
}

/// `repeatCell` batch update styling the first `columns` header cells
#[must_use]
pub fn format_header_body(sheet_id: i64, columns: usize, style: &HeaderStyle) -> Value {
    let mut text_format = json!({ "bold": style.bold });
    if let Some(color) = rgb(&style.foreground) {
        text_format["foregroundColor"] = color;
    }
    let mut format = json!({ "textFormat": text_format });
    if let Some(color) = rgb(&style.background) {
        format["backgroundColor"] = color;
    }

    json!({
        "requests": [{
            "repeatCell": {
                "range": {
                    "sheetId": sheet_id,
                    "startRowIndex": 0,
                    "endRowIndex": 1,
                    "startColumnIndex": 0,
                    "endColumnIndex": columns,
                },
                "cell": { "userEnteredFormat": format },
                "fields": "userEnteredFormat(backgroundColor,textFormat)",
            }
        }]
    })
}

/// `autoResizeDimensions` batch update for the first `columns` columns
#[must_use]
pub fn auto_resize_body(sheet_id: i64, columns: usize) -> Value {
    json!({
        "requests": [{
            "autoResizeDimensions": {
                "dimensions": {
                    "sheetId": sheet_id,
                    "dimension": "COLUMNS",
                    "startIndex": 0,
                    "endIndex": columns,
                }
            }
        }]
    })
}

/// `#rrggbb` to a Sheets colour object
fn rgb(hex: &str) -> Option<Value> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| {
        u8::from_str_radix(hex.get(i..i + 2)?, 16)
            .ok()
            .map(|v| f64::from(v) / 255.0)
    };
    Some(json!({
        "red": channel(0)?,
        "green": channel(2)?,
        "blue": channel(4)?,
    }))
}

/// Translate a non-success response into a [`StoreError`]
#[must_use]
pub fn status_error(status: u16, body: &str) -> StoreError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    match status {
        404 => StoreError::NotFound(message),
        401 | 403 => StoreError::PermissionDenied(message),
        // A deleted tab surfaces as an unparsable range rather than a 404
        400 if message.contains("Unable to parse range") => StoreError::NotFound(message),
        _ => StoreError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn titles_are_quoted() {
        assert_eq!(
            header_range("AI Coach Questionnaire Responses"),
            "'AI Coach Questionnaire Responses'!1:1"
        );
        assert_eq!(anchor_range("Bob's sheet"), "'Bob''s sheet'!A1");
        assert_eq!(first_data_range("Responses"), "'Responses'!2:2");
    }

    #[test]
    fn header_style_colours() {
        let body = format_header_body(42, 12, &HeaderStyle::default());
        let format = &body["requests"][0]["repeatCell"]["cell"]["userEnteredFormat"];

        assert_eq!(format["textFormat"]["bold"], json!(true));
        assert_eq!(format["textFormat"]["foregroundColor"]["red"], json!(1.0));
        assert_eq!(format["backgroundColor"]["blue"], json!(f64::from(0xf4_u8) / 255.0));
        assert_eq!(
            body["requests"][0]["repeatCell"]["range"]["endColumnIndex"],
            json!(12)
        );
    }

    #[test]
    fn bad_colour_is_skipped() {
        let style = HeaderStyle {
            bold: false,
            background: "blue".to_string(),
            foreground: "#12345".to_string(),
        };
        let body = format_header_body(0, 3, &style);
        let format = &body["requests"][0]["repeatCell"]["cell"]["userEnteredFormat"];
        assert!(format.get("backgroundColor").is_none());
        assert!(format["textFormat"].get("foregroundColor").is_none());
    }

    #[test]
    fn value_range_first_row() {
        let range: ValueRange = serde_json::from_value(json!({
            "range": "'Responses'!A1:Z1",
            "values": [["Timestamp", 3, "", null, ""]]
        }))
        .unwrap();
        assert_eq!(range.first_row(), vec!["Timestamp", "3"]);

        let empty: ValueRange = serde_json::from_value(json!({ "range": "x" })).unwrap();
        assert!(empty.first_row().is_empty());
    }

    #[test]
    fn added_sheet_is_found() {
        let response: BatchUpdateResponse = serde_json::from_value(json!({
            "spreadsheetId": "abc",
            "replies": [{ "addSheet": { "properties": { "sheetId": 917, "title": "Responses" } } }]
        }))
        .unwrap();
        let props = response.added_sheet().unwrap();
        assert_eq!(props.sheet_id, 917);
        assert_eq!(props.title, "Responses");
    }

    #[test]
    fn error_statuses() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        assert_eq!(
            status_error(404, body),
            StoreError::NotFound("Requested entity was not found.".to_string())
        );
        assert!(matches!(
            status_error(403, "{}"),
            StoreError::PermissionDenied(_)
        ));
        let range = r#"{"error":{"code":400,"message":"Unable to parse range: 'Gone'!1:1"}}"#;
        assert!(status_error(400, range).is_not_found());
        assert!(matches!(
            status_error(500, "<html>oops</html>"),
            StoreError::Api { status: 500, .. }
        ));
    }
}
