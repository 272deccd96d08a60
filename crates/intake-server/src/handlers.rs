//! Request handlers
//!
//! Every handler answers in-band: submission failures come back as
//! `{"success":false,...}` with status 200 so the form can show the message.

use bytes::Bytes;
use chrono::Utc;
use intake_core::{format_timestamp, ResponseRecorder};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reject::{LengthRequired, MethodNotAllowed, PayloadTooLarge};
use warp::{Rejection, Reply};

/// Message returned after a successful write
pub const SAVED_MESSAGE: &str = "Data saved successfully";

/// POST result envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResponse {
    /// Whether the row was written
    pub success: bool,
    /// Confirmation or error text
    pub message: String,
}

impl PostResponse {
    /// Row written
    #[must_use]
    pub fn saved() -> Self {
        Self {
            success: true,
            message: SAVED_MESSAGE.to_string(),
        }
    }

    /// Row not written
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// GET liveness body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always `ready`
    pub status: String,
    /// Server time, RFC 3339 with milliseconds
    pub timestamp: String,
}

impl StatusResponse {
    /// Ready as of now
    #[must_use]
    pub fn now() -> Self {
        Self {
            status: "ready".to_string(),
            timestamp: format_timestamp(Utc::now()),
        }
    }
}

/// Record one submission
pub async fn handle_post(
    body: Bytes,
    recorder: Arc<ResponseRecorder>,
) -> Result<impl Reply, Infallible> {
    let response = match recorder.submit(&body).await {
        Ok(row) => {
            tracing::debug!("Recorded row with {} cells", row.len());
            PostResponse::saved()
        }
        Err(e) => {
            tracing::error!("Error: {}", e);
            PostResponse::failed(e.to_string())
        }
    };
    Ok(warp::reply::json(&response))
}

/// Liveness check; never touches the store
pub async fn handle_status() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&StatusResponse::now()))
}

/// Preflight; empty body
pub async fn handle_options() -> Result<impl Reply, Infallible> {
    Ok("")
}

/// Turn filter rejections into JSON replies
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.find::<PayloadTooLarge>().is_some() {
        (StatusCode::OK, "payload too large".to_string())
    } else if err.find::<LengthRequired>().is_some() {
        (StatusCode::OK, "content-length header is required".to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };

    if status == StatusCode::OK {
        tracing::warn!("Rejected submission: {}", message);
    }
    Ok(warp::reply::with_status(
        warp::reply::json(&PostResponse::failed(message)),
        status,
    ))
}
