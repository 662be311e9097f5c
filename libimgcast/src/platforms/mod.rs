//! Platform clients
//!
//! Each platform gets its own concrete client with its own authentication
//! scheme and request shape; they deliberately share no trait. What they do
//! share lives here: HTTP client construction, caption validation and the
//! mapping from HTTP failures to [`PlatformError`].

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{ImgcastError, PlatformError, Result};

pub mod bluesky;
pub mod instagram;
pub mod oauth;
pub mod x;

const USER_AGENT: &str = concat!("imgcast/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used by every platform
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| PlatformError::Network(format!("Failed to build HTTP client: {}", e)).into())
}

/// Reject empty captions and captions over the platform's limit.
///
/// Length is counted in Unicode scalar values, not bytes. Failures are
/// [`ImgcastError::InvalidInput`]; nothing has been sent at this point.
pub fn validate_caption(platform: &str, caption: &str, max_chars: usize) -> Result<()> {
    if caption.trim().is_empty() {
        return Err(ImgcastError::InvalidInput("Caption cannot be empty".to_string()));
    }

    let length = caption.chars().count();
    if length > max_chars {
        return Err(ImgcastError::InvalidInput(format!(
            "Caption exceeds {}'s {} character limit (current: {} characters)",
            platform, max_chars, length
        )));
    }

    Ok(())
}

/// Map a non-success HTTP response to a [`PlatformError`], keeping the body
pub(crate) fn map_http_error(
    platform: &str,
    context: &str,
    status: StatusCode,
    body: &str,
) -> PlatformError {
    let detail = format!("{} {} returned {}: {}", platform, context, status, body.trim());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PlatformError::Authentication(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::PAYLOAD_TOO_LARGE => {
            PlatformError::Validation(detail)
        }
        StatusCode::TOO_MANY_REQUESTS => PlatformError::RateLimit(detail),
        _ => PlatformError::Posting(detail),
    }
}

pub(crate) fn map_transport_error(platform: &str, context: &str, error: reqwest::Error) -> PlatformError {
    PlatformError::Network(format!(
        "Could not reach {} during {}: {}",
        platform, context, error
    ))
}

/// Check the status and decode a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    platform: &str,
    context: &str,
    response: Response,
) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| map_transport_error(platform, context, e))?;

    if !status.is_success() {
        tracing::warn!("{} {} failed with {}: {}", platform, context, status, body);
        return Err(map_http_error(platform, context, status, &body).into());
    }

    serde_json::from_str(&body).map_err(|e| {
        PlatformError::Posting(format!(
            "{} {} returned an unexpected response ({}): {}",
            platform, context, e, body
        ))
        .into()
    })
}
