// Shared HTTP plumbing for the REST-backed backends

use crate::error::Result;
use crate::monitor::models::ErrorKind;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a client with the backend's deadline baked in
pub(crate) fn build_client(timeout: Duration, insecure_tls: bool) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("stackwatch/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout);

    if insecure_tls {
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder.build()?)
}

/// GET a JSON document, mapping every failure mode onto the adapter
/// error taxonomy
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: String,
    token: Option<&str>,
) -> std::result::Result<T, (ErrorKind, String)> {
    let mut request = client.get(&url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| (classify_transport(&e), e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err((classify_status(status), format!("{} returned {}", url, status)));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| (ErrorKind::InvalidResponse, e.to_string()))
}

/// Map a transport error onto the adapter error taxonomy
pub(crate) fn classify_transport(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() {
        ErrorKind::Unreachable
    } else if err.is_decode() {
        ErrorKind::InvalidResponse
    } else {
        ErrorKind::Unreachable
    }
}

/// Map a non-success HTTP status onto the adapter error taxonomy
pub(crate) fn classify_status(status: StatusCode) -> ErrorKind {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ErrorKind::PermissionDenied
    } else {
        ErrorKind::InvalidResponse
    }
}
