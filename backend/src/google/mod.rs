//! Google Workspace implementations of the provider interfaces.
//!
//! - `auth`: service-account token minting shared by the other clients.
//! - `drive`: `FileStore` over Drive v3.
//! - `sheets`: `SheetStore` over Sheets v4, one spreadsheet per deployment.
//! - `gmail`: `Mailer` over Gmail v1 `users.messages.send`.

pub mod auth;
pub mod drive;
pub mod gmail;
pub mod sheets;

use crate::error::ProviderError;
use serde::Deserialize;
use std::time::Duration;

/// Builds the HTTP client shared by every Google client.
pub fn http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
        .map_err(|source| ProviderError::Transport {
            service: "http client",
            source,
        })
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Maps a non-2xx response to `ProviderError::Http`, keeping Google's own message when present.
pub(crate) async fn check_response(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read response body".to_string());
    Err(ProviderError::Http {
        service,
        status: status.as_u16(),
        message: api_error_message(&body),
    })
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.chars().take(200).collect(),
    }
}

pub(crate) fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> ProviderError {
    move |source| ProviderError::Transport { service, source }
}

pub(crate) fn decode(service: &'static str) -> impl FnOnce(reqwest::Error) -> ProviderError {
    move |e| ProviderError::Decode {
        service,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::api_error_message;

    #[test]
    fn extracts_google_error_message() {
        let body = r#"{"error":{"code":404,"message":"File not found: abc.","status":"NOT_FOUND"}}"#;
        assert_eq!(api_error_message(body), "File not found: abc.");
    }

    #[test]
    fn falls_back_to_truncated_body() {
        let body = "x".repeat(500);
        assert_eq!(api_error_message(&body).len(), 200);
    }
}
