//! Google Sheets backend for form intake
//!
//! Implements [`intake_core::SheetStore`] against the Sheets v4 REST API:
//! - Opening a spreadsheet and adding the response tab when absent
//! - Reading and writing the header row
//! - Appending rows with raw (uninterpreted) values
//! - Cosmetic header styling and column auto-resize
//!
//! Authentication is a bearer token or a service account key; see [`auth`].

#![warn(unreachable_pub)]

pub mod api;
pub mod auth;
pub mod client;

pub use auth::{CredentialsError, ServiceAccountKey, TokenSource, SPREADSHEETS_SCOPE};
pub use client::{SheetsClient, DEFAULT_TIMEOUT};
