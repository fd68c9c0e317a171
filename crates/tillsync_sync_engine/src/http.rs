//! HTTP transport implementation.
//!
//! Talks JSON to the Cloud sync endpoints over a blocking `reqwest`
//! client. Every request carries the shared secret in `X-Edge-Token`.

use crate::config::EdgeConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::SyncTransport;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tillsync_sync_protocol::{
    ErrorResponse, PingResponse, PullRequest, PullResponse, PushRequest, PushResponse,
    EDGE_TOKEN_HEADER, PING_PATH, PULL_PATH, PUSH_PATH,
};
use tracing::debug;

/// HTTP-based sync transport.
pub struct HttpTransport {
    base_url: String,
    token: String,
    client: Client,
}

impl HttpTransport {
    /// Creates a transport for the given configuration.
    pub fn new(config: &EdgeConfig) -> SyncResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::configuration(format!("failed to build HTTP client: {e}")))?;

        debug!(
            base_url = %config.base_url,
            token_len = config.token.len(),
            "created HTTP transport"
        );
        Ok(Self {
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            client,
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> SyncResult<R> {
        let response = request
            .header(EDGE_TOKEN_HEADER, &self.token)
            .send()
            .map_err(network_error)?;
        read_body(response)
    }
}

impl SyncTransport for HttpTransport {
    fn push(&self, request: &PushRequest) -> SyncResult<PushResponse> {
        let response: PushResponse = self.send(self.client.post(self.url(PUSH_PATH)).json(request))?;
        if !response.success {
            return Err(SyncError::Rejected(
                response.error.unwrap_or_else(|| "push rejected".into()),
            ));
        }
        Ok(response)
    }

    fn pull(&self, request: &PullRequest) -> SyncResult<PullResponse> {
        let mut query = vec![("model", request.model.clone())];
        if let Some(since) = &request.since {
            query.push(("since", tillsync_codec::format_datetime(since)));
        }

        let response: PullResponse = self.send(self.client.get(self.url(PULL_PATH)).query(&query))?;
        if !response.success {
            return Err(SyncError::Rejected(
                response.error.unwrap_or_else(|| "pull rejected".into()),
            ));
        }
        Ok(response)
    }

    fn ping(&self) -> SyncResult<PingResponse> {
        let response: PingResponse = self.send(self.client.get(self.url(PING_PATH)))?;
        if !response.success {
            return Err(SyncError::Rejected(
                response.error.unwrap_or_else(|| "ping rejected".into()),
            ));
        }
        Ok(response)
    }
}

fn network_error(err: reqwest::Error) -> SyncError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        SyncError::network_retryable(err.to_string())
    } else {
        SyncError::network_fatal(err.to_string())
    }
}

fn read_body<R: DeserializeOwned>(response: Response) -> SyncResult<R> {
    let status = response.status();
    let body = response.text().map_err(network_error)?;

    if status == StatusCode::UNAUTHORIZED {
        return Err(SyncError::Auth(error_message(&body)));
    }
    if status != StatusCode::OK {
        return Err(SyncError::Server {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    serde_json::from_str(&body)
        .map_err(|e| SyncError::Protocol(format!("failed to decode response: {e}")))
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error) => error.error,
        Err(_) => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_creation() {
        let config = EdgeConfig::new("https://cloud.example.com/", "secret");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "https://cloud.example.com");
        assert_eq!(transport.url(PUSH_PATH), "https://cloud.example.com/api/sync/push");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EdgeConfig::new("", "secret");
        assert!(matches!(
            HttpTransport::new(&config),
            Err(SyncError::Configuration(_))
        ));
    }

    #[test]
    fn error_bodies() {
        assert_eq!(
            error_message(r#"{"success": false, "error": "Invalid or missing token"}"#),
            "Invalid or missing token"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn unreachable_cloud_is_retryable() {
        let config = EdgeConfig::new("http://127.0.0.1:9", "secret")
            .with_timeout(std::time::Duration::from_secs(2));
        let transport = HttpTransport::new(&config).unwrap();

        let err = transport.ping().unwrap_err();
        assert_eq!(err.kind(), "network");
        assert!(err.is_retryable());
    }
}
