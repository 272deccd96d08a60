//! Form intake webhook
//!
//! HTTP surface for [`intake_core::ResponseRecorder`]:
//! - `POST /` records the JSON body as a spreadsheet row
//! - `GET /` reports readiness
//! - `OPTIONS /` answers preflight with an empty body
//!
//! Configuration is loaded by [`config`], the command line by [`cli`].

#![warn(unreachable_pub)]

pub mod cli;
pub mod config;
pub mod handlers;

pub use cli::{command, Invocation, Mode};
pub use config::{Backend, ConfigError, LogFormat, Overrides, ServerConfig};
pub use handlers::{PostResponse, StatusResponse, SAVED_MESSAGE};

use intake_core::ResponseRecorder;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, Reply};

/// Every route, with rejection recovery, CORS header and request tracing
pub fn routes(
    recorder: Arc<ResponseRecorder>,
    max_body_bytes: u64,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let post = warp::path::end()
        .and(warp::post())
        .and(warp::body::content_length_limit(max_body_bytes))
        .and(warp::body::bytes())
        .and(with_recorder(recorder))
        .and_then(handlers::handle_post);

    let status = warp::path::end()
        .and(warp::get())
        .and_then(handlers::handle_status);

    let options = warp::path::end()
        .and(warp::options())
        .and_then(handlers::handle_options);

    post.or(status)
        .or(options)
        .recover(handlers::handle_rejection)
        .with(warp::reply::with::header("access-control-allow-origin", "*"))
        .with(warp::trace::request())
}

fn with_recorder(
    recorder: Arc<ResponseRecorder>,
) -> impl Filter<Extract = (Arc<ResponseRecorder>,), Error = Infallible> + Clone {
    warp::any().map(move || recorder.clone())
}
