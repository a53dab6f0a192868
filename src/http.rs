//! Response handling shared by the outbound API clients.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::RemoteServiceError;
use crate::format::truncate;

/// How much of an error body to keep for logs.
const MAX_ERROR_BODY: usize = 300;

/// Build the HTTP session a client keeps for its whole life.
pub(crate) fn session() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("sefaria-bot/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {e}");
            reqwest::Client::new()
        })
}

pub(crate) fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> RemoteServiceError {
    move |source| RemoteServiceError::Transport { service, source }
}

/// Check the status and decode a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, RemoteServiceError> {
    let status = response.status();
    let body = response.text().await.map_err(transport(service))?;

    debug!("{service} response status: {status}");

    if !status.is_success() {
        return Err(RemoteServiceError::Status {
            service,
            status: status.as_u16(),
            body: truncate(&body, MAX_ERROR_BODY),
        });
    }

    serde_json::from_str(&body).map_err(|e| RemoteServiceError::Decode {
        service,
        reason: e.to_string(),
    })
}

/// Join a configured base URL and a path without doubling slashes.
pub(crate) fn join(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join("https://x.org/", "/api/index"), "https://x.org/api/index");
        assert_eq!(join("https://x.org", "api/index"), "https://x.org/api/index");
    }
}
