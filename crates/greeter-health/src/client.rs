//! Plain HTTP/1.1 GET over a fresh TCP connection.
//!
//! Used for peer `/health` queries and instance metadata lookups. Each
//! call opens its own connection and the whole exchange (connect,
//! request, body) is bounded by one timeout.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::BodyExt;
use thiserror::Error;
use tracing::debug;

use greeter_core::with_default_port;

/// Port assumed when an address doesn't carry one.
pub const DEFAULT_PORT: u16 = 80;

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connect to {address} failed: {reason}")]
    Connect { address: String, reason: String },

    #[error("http handshake with {address} failed: {reason}")]
    Handshake { address: String, reason: String },

    #[error("invalid request for {uri}: {reason}")]
    Build { uri: String, reason: String },

    #[error("request to {uri} failed: {reason}")]
    Request { uri: String, reason: String },

    #[error("{uri} returned {status}")]
    Status { uri: String, status: http::StatusCode },

    #[error("reading body from {uri} failed: {reason}")]
    Body { uri: String, reason: String },

    #[error("{uri} timed out after {timeout:?}")]
    Timeout { uri: String, timeout: Duration },
}

/// GET `http://{address}{path}` and return the body of a 2xx response.
pub async fn get(address: &str, path: &str, timeout: Duration) -> FetchResult<Bytes> {
    let authority = with_default_port(address, DEFAULT_PORT);
    let uri = format!("http://{authority}{path}");

    match tokio::time::timeout(timeout, fetch(&authority, path, &uri)).await {
        Ok(result) => result,
        Err(_) => {
            debug!(%uri, ?timeout, "http get timed out");
            Err(FetchError::Timeout { uri, timeout })
        }
    }
}

async fn fetch(authority: &str, path: &str, uri: &str) -> FetchResult<Bytes> {
    let stream = tokio::net::TcpStream::connect(authority)
        .await
        .map_err(|e| {
            debug!(error = %e, %uri, "http get connection failed");
            FetchError::Connect {
                address: authority.to_string(),
                reason: e.to_string(),
            }
        })?;

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| FetchError::Handshake {
            address: authority.to_string(),
            reason: e.to_string(),
        })?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = http::Request::builder()
        .method("GET")
        .uri(path)
        .header("host", authority)
        .header("user-agent", concat!("greeter/", env!("CARGO_PKG_VERSION")))
        .body(http_body_util::Empty::<Bytes>::new())
        .map_err(|e| FetchError::Build {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| FetchError::Request {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        debug!(%status, %uri, "http get non-2xx");
        return Err(FetchError::Status {
            uri: uri.to_string(),
            status,
        });
    }

    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| FetchError::Body {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
    Ok(body.to_bytes())
}
