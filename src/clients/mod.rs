use crate::error::ClientError;
use anyhow::Result;
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub mod backend;
pub mod endpoints;
pub mod inmet;

pub const USER_AGENT: &str = concat!("safeflood-alerts/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client. Every upstream call is bounded by `timeout`.
pub fn init_http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Maps non-success statuses onto `ClientError`, keeping the upstream
/// `message` field when the body has one.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = upstream_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    });

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized,
        StatusCode::NOT_FOUND => ClientError::NotFound,
        StatusCode::CONFLICT => ClientError::Conflict(message),
        other => ClientError::Status {
            status: other.as_u16(),
            message,
        },
    })
}

fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_is_extracted() {
        assert_eq!(
            upstream_message(r#"{"message":"Usuário já cadastrado"}"#).as_deref(),
            Some("Usuário já cadastrado")
        );
        assert_eq!(upstream_message(r#"{"message":""}"#), None);
        assert_eq!(upstream_message("<html>502</html>"), None);
    }

    #[test]
    fn client_builds_with_timeout() {
        assert!(init_http_client(Duration::from_secs(5)).is_ok());
    }
}
