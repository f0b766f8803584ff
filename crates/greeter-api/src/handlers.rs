//! REST API handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{debug, error, warn};

use greeter_cluster::ClusterError;
use greeter_core::CountList;

use crate::ApiState;

pub const WELCOME: &str = "Welcome to the hello service";

/// Body of every failed request.
#[derive(serde::Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: msg.to_string(),
        }),
    )
}

/// `Hello, "<name>"`, with the name quoted as [`quote`] does.
pub fn greeting(name: &str) -> String {
    format!("Hello, {}", quote(name))
}

/// Double-quote `s` the way Go's `strconv.Quote` does.
///
/// Printable characters, combining marks included, pass through. Named
/// escapes cover `\a \b \f \n \r \t \v`. Other ASCII controls become
/// `\xHH`, and remaining non-printables become `\uHHHH` or `\UHHHHHHHH`.
/// Unassigned code points are treated as printable.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            c if is_printable(c) => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if (c as u32) < 0x10000 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    out.push('"');
    out
}

/// Letters, marks, numbers, punctuation, symbols and the ASCII space.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c,
        // Format characters (Cf).
        '\u{ad}'
            | '\u{600}'..='\u{605}'
            | '\u{61c}'
            | '\u{6dd}'
            | '\u{70f}'
            | '\u{180e}'
            | '\u{200b}'..='\u{200f}'
            | '\u{2028}'..='\u{202e}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206f}'
            | '\u{feff}'
            | '\u{fff9}'..='\u{fffb}'
            // Private use (Co).
            | '\u{e000}'..='\u{f8ff}'
            | '\u{f0000}'..='\u{ffffd}'
            | '\u{100000}'..='\u{10fffd}'
    )
}

/// GET /
pub async fn welcome() -> &'static str {
    WELCOME
}

// ── Counts ─────────────────────────────────────────────────────

/// GET /hello/{name}
pub async fn hello(State(state): State<ApiState>, Path(name): Path<String>) -> impl IntoResponse {
    match state.store.increment(&name).await {
        Ok(count) => {
            debug!(%name, %count, "greeted");
            greeting(&name).into_response()
        }
        Err(e) => {
            warn!(%name, error = %e, "failed to count greeting");
            error_response(&e.to_string(), StatusCode::SERVICE_UNAVAILABLE).into_response()
        }
    }
}

/// GET /counts
pub async fn list_counts(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list().await {
        Ok(counts) => Json(CountList { counts }).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to list counts");
            error_response(&e.to_string(), StatusCode::SERVICE_UNAVAILABLE).into_response()
        }
    }
}

// ── Health ─────────────────────────────────────────────────────

/// GET /health
pub async fn node_health(State(state): State<ApiState>) -> impl IntoResponse {
    match state.probe.probe().await {
        Ok(health) => Json(health).into_response(),
        Err(e) => {
            error!(error = %e, "health probe failed");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

/// GET /health/cluster
pub async fn cluster_health(State(state): State<ApiState>) -> impl IntoResponse {
    match state.cluster.cluster_health().await {
        Ok(cluster) => Json(cluster).into_response(),
        Err(e) => {
            match &e {
                ClusterError::Discovery(_) => error!(error = %e, "cluster health: discovery failed"),
                ClusterError::Aggregate(_) => warn!(error = %e, "cluster health: peer failed"),
            }
            error_response(&e.to_string(), StatusCode::BAD_GATEWAY).into_response()
        }
    }
}
