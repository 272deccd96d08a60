//! Canonical header list and header-row reconciliation
//!
//! Row 1 of the worksheet is the schema. It only ever grows: canonical
//! headers that are missing get appended after whatever is already there,
//! and columns we do not recognise are kept in place.

use serde::{Deserialize, Serialize};

/// Header of the server-assigned timestamp column
pub const TIMESTAMP_HEADER: &str = "Timestamp";

/// Headers that must always be present, in seeding order
pub const CANONICAL_HEADERS: [&str; 12] = [
    TIMESTAMP_HEADER,
    "Struggle with Goals",
    "Life Change Scale (Coach Tasks)",
    "Would Achieve More (Coach)",
    "Achievement Scale",
    "Feeling about AI Coach",
    "Email",
    "Prolific PID",
    "Prolific Study ID",
    "Prolific Session ID",
    "User Agent",
    "IP Address (if available)",
];

/// Ordered column names forming row 1
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderSet(Vec<String>);

impl HeaderSet {
    /// Header set as currently stored
    #[inline]
    #[must_use]
    pub fn new(headers: Vec<String>) -> Self {
        Self(headers)
    }

    /// The canonical list, used to seed an empty sheet
    #[must_use]
    pub fn canonical() -> Self {
        Self(CANONICAL_HEADERS.iter().map(|h| (*h).to_string()).collect())
    }

    /// Whether no header cell holds any text
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|h| h.trim().is_empty())
    }

    /// Number of columns
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no columns at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Zero-based column of a header, exact match
    #[must_use]
    pub fn position(&self, header: &str) -> Option<usize> {
        self.0.iter().position(|h| h == header)
    }

    /// Canonical headers not present, in canonical order
    #[must_use]
    pub fn missing_canonical(&self) -> Vec<&'static str> {
        CANONICAL_HEADERS
            .iter()
            .copied()
            .filter(|required| self.position(required).is_none())
            .collect()
    }

    /// Append missing canonical headers after the existing ones
    #[must_use]
    pub fn reconcile(&self) -> Reconciliation {
        let added = self.missing_canonical();
        let mut headers = self.0.clone();
        headers.extend(added.iter().map(|h| (*h).to_string()));
        Reconciliation {
            headers: Self(headers),
            added,
        }
    }

    /// Iterate header names in column order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Header names as a slice
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consume into the underlying vector
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Outcome of reconciling a header row against the canonical list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Header row after reconciliation
    pub headers: HeaderSet,
    /// Canonical headers that had to be appended
    pub added: Vec<&'static str>,
}

impl Reconciliation {
    /// Whether row 1 has to be rewritten
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.added.is_empty()
    }
}
