//! Example routes exercising every console operation

use axum::{extract::OriginalUri, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;

use crate::{
    chrome_error, chrome_group, chrome_group_collapsed, chrome_info, chrome_log, chrome_warn,
    error::{AppError, LogError},
    guard::MAX_HEADER_BYTES,
    middleware::ConsoleHandle,
};

#[derive(Debug, Serialize)]
struct DemoUser {
    id: u32,
    name: &'static str,
    roles: Vec<&'static str>,
}

/// Plain, info and warn rows plus a structured object
pub async fn index(
    OriginalUri(uri): OriginalUri,
    console: ConsoleHandle,
) -> Result<impl IntoResponse, AppError> {
    chrome_log!(console, "Hello from chromelogger", env!("CARGO_PKG_VERSION"))?;
    chrome_info!(console, "Request path", uri.path())?;

    let user = DemoUser {
        id: 42,
        name: "ada",
        roles: vec!["admin", "dev"],
    };
    chrome_log!(console, "Current user", user)?;
    chrome_warn!(console, "This row renders as a warning")?;

    Ok(Json(json!({ "rows": console.rows().len() })))
}

/// Nested groups, one of them collapsed
pub async fn group(console: ConsoleHandle) -> Result<impl IntoResponse, AppError> {
    chrome_group!(console, "Database")?;
    chrome_log!(console, "SELECT * FROM users WHERE id = ?", 42)?;
    chrome_group_collapsed!(console, "Query plan")?;
    chrome_log!(console, json!({"scan": "index", "rows": 1}))?;
    console.group_end()?;
    chrome_info!(console, "1 row in 0.4ms")?;
    console.group_end()?;

    Ok(Json(json!({ "rows": console.rows().len() })))
}

/// Tries to log more than the header can carry and reports the rejection
pub async fn oversized(console: ConsoleHandle) -> Result<impl IntoResponse, AppError> {
    let filler = "A".repeat(MAX_HEADER_BYTES);

    let rejected = match chrome_log!(console, filler) {
        Err(err @ LogError::PayloadTooLarge { .. }) => err.to_string(),
        Err(err) => return Err(err.into()),
        Ok(()) => {
            return Err(AppError::InternalError(
                "oversized row was accepted".to_string(),
            ))
        }
    };
    chrome_error!(console, "Rejected oversized row", rejected.as_str())?;

    Ok(Json(json!({ "rejected": rejected })))
}
