//! Core types for form intake

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder id shipped in sample configuration
pub const PLACEHOLDER_SPREADSHEET_ID: &str = "YOUR_SPREADSHEET_ID_HERE";

/// Worksheet receiving questionnaire responses
pub const DEFAULT_SHEET_TITLE: &str = "AI Coach Questionnaire Responses";

/// Identifier of the target spreadsheet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpreadsheetId(String);

impl SpreadsheetId {
    /// Wrap a raw identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    /// The placeholder value, i.e. "never configured"
    #[inline]
    #[must_use]
    pub fn placeholder() -> Self {
        Self(PLACEHOLDER_SPREADSHEET_ID.to_string())
    }

    /// Whether a real identifier was supplied
    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.0.is_empty() && self.0 != PLACEHOLDER_SPREADSHEET_ID
    }

    /// Raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SpreadsheetId {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl fmt::Display for SpreadsheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved worksheet handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorksheetRef {
    /// Backend-assigned numeric id of the tab
    pub sheet_id: i64,
    /// Tab title
    pub title: String,
}

impl WorksheetRef {
    /// Create new worksheet handle
    #[inline]
    #[must_use]
    pub fn new(sheet_id: i64, title: impl Into<String>) -> Self {
        Self {
            sheet_id,
            title: title.into(),
        }
    }
}

/// Cosmetic formatting applied to a freshly seeded header row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderStyle {
    /// Bold font weight
    pub bold: bool,
    /// Background colour as `#rrggbb`
    pub background: String,
    /// Font colour as `#rrggbb`
    pub foreground: String,
}

impl Default for HeaderStyle {
    fn default() -> Self {
        Self {
            bold: true,
            background: "#4285f4".to_string(),
            foreground: "#ffffff".to_string(),
        }
    }
}

/// One appended record, aligned to the header row it was written against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRow {
    /// Cell values in column order
    pub values: Vec<String>,
}

impl ResponseRow {
    /// Number of cells
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no cells
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cell at a zero-based column index
    #[inline]
    #[must_use]
    pub fn get(&self, column: usize) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// Recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Spreadsheet that receives rows
    pub spreadsheet_id: SpreadsheetId,
    /// Worksheet title inside the spreadsheet
    pub sheet_title: String,
    /// Style for seeded header rows
    pub header_style: HeaderStyle,
    /// Auto-resize written columns after each append
    pub auto_resize: bool,
}

impl RecorderConfig {
    /// Create configuration for a spreadsheet with default settings
    #[inline]
    #[must_use]
    pub fn new(spreadsheet_id: SpreadsheetId) -> Self {
        Self {
            spreadsheet_id,
            ..Self::default()
        }
    }

    /// With worksheet title
    #[inline]
    #[must_use]
    pub fn with_sheet_title(mut self, title: impl Into<String>) -> Self {
        self.sheet_title = title.into();
        self
    }

    /// With auto-resize toggle
    #[inline]
    #[must_use]
    pub fn with_auto_resize(mut self, auto_resize: bool) -> Self {
        self.auto_resize = auto_resize;
        self
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: SpreadsheetId::default(),
            sheet_title: DEFAULT_SHEET_TITLE.to_string(),
            header_style: HeaderStyle::default(),
            auto_resize: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_not_configured() {
        assert!(!SpreadsheetId::placeholder().is_configured());
        assert!(!SpreadsheetId::new("   ").is_configured());
        assert!(SpreadsheetId::new("1I1Zw3HtxYwrQO1xF8I").is_configured());
    }

    #[test]
    fn id_is_trimmed() {
        assert_eq!(SpreadsheetId::new("  abc \n").as_str(), "abc");
    }

    #[test]
    fn config_defaults() {
        let config = RecorderConfig::default();
        assert_eq!(config.sheet_title, DEFAULT_SHEET_TITLE);
        assert!(config.auto_resize);
        assert!(!config.spreadsheet_id.is_configured());
        assert_eq!(config.header_style.background, "#4285f4");
    }
}
