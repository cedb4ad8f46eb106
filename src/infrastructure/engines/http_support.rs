use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::application::ports::SpeechEngineError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns the key when it is present and non-blank.
pub(crate) fn require_key<'a>(
    key: Option<&'a str>,
    what: &str,
) -> Result<&'a str, SpeechEngineError> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| SpeechEngineError::MissingCredentials(format!("{} is not configured", what)))
}

/// Any HTTP answer counts as reachable. Transport failures come back as
/// `Unreachable` so an outage is never mistaken for missing configuration.
pub(crate) async fn probe(client: &Client, url: &str) -> Result<StatusCode, SpeechEngineError> {
    client
        .get(url)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .map(|r| r.status())
        .map_err(|e| SpeechEngineError::Unreachable(format!("{}: {}", url, e.without_url())))
}

/// Maps non-success responses to errors, keeping the body for diagnostics.
pub(crate) async fn check_status(response: Response) -> Result<Response, SpeechEngineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SpeechEngineError::MissingCredentials(format!(
            "credentials rejected ({}): {}",
            status, body
        )));
    }
    Err(SpeechEngineError::ApiRequestFailed(format!(
        "status {}: {}",
        status, body
    )))
}
