use chrono::{DateTime, Utc};

use crate::logging::RequestLog;
use crate::server::AppState;

/// Records one handled request. Logging must never fail the request
/// itself.
#[allow(clippy::too_many_arguments)]
pub async fn log_simple_request(
    app_state: &AppState,
    start_time: DateTime<Utc>,
    method: &str,
    path: &str,
    user_id: Option<&str>,
    plan: Option<&str>,
    status_code: u16,
    error: Option<String>,
) {
    let end_time = Utc::now();
    let response_time_ms = (end_time - start_time).num_milliseconds();

    let log = RequestLog {
        id: None,
        timestamp: start_time,
        method: method.to_string(),
        path: path.to_string(),
        user_id: user_id.map(|s| s.to_string()),
        plan: plan.map(|s| s.to_string()),
        status_code,
        response_time_ms,
        error,
    };

    if let Err(e) = app_state.log_store.log_request(log).await {
        tracing::error!("Failed to log request: {}", e);
    }
}
