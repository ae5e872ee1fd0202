//! Server-side logging to the browser console.
//!
//! Handlers log through a per-response [`Console`]; every call re-encodes the
//! accumulated rows into the `x-chromelogger-data` response header, which the
//! Chrome Logger extension decodes and prints in the developer console.
//!
//! With axum, install [`middleware::chrome_logger_middleware`] and take a
//! [`ConsoleHandle`] as a handler argument:
//!
//! ```no_run
//! use axum::{middleware, routing::get, Router};
//! use chromelogger::{chrome_log, config::LoggerConfig, ConsoleHandle};
//!
//! async fn handler(console: ConsoleHandle) -> Result<&'static str, chromelogger::AppError> {
//!     chrome_log!(console, "user", 42)?;
//!     Ok("ok")
//! }
//!
//! let app: Router = Router::new().route("/", get(handler)).layer(
//!     middleware::from_fn_with_state(
//!         LoggerConfig::default(),
//!         chromelogger::middleware::chrome_logger_middleware,
//!     ),
//! );
//! ```

pub mod backtrace;
pub mod config;
pub mod console;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod payload;
pub mod server;
pub mod signals;

pub use console::{Args, Console, HeaderSink};
pub use error::{AppError, DecodeError, LogError};
pub use middleware::ConsoleHandle;
pub use payload::{Payload, Row, RowType, HEADER_NAME, PROTOCOL_VERSION};

#[doc(hidden)]
pub use serde_json;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging
///
/// Note: This function can only be called once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
