//! HTTP plumbing shared by the resource clients.
//!
//! Every backend response is wrapped in an envelope
//! `{"success"|"status", "data", "message", "timestamp"}`. A non-2xx
//! status becomes [`ApiError::Status`]; a 2xx envelope that says
//! `success: false` or `status: "error"` becomes [`ApiError::Rejected`].

use std::sync::{Arc, PoisonError, RwLock};

use mova_core::error::CoreError;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;

/// Errors from the REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("MOVA API error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The backend answered 2xx but flagged the request as failed.
    #[error("Request rejected: {message}")]
    Rejected { message: String },

    /// The envelope carried no `data` where a payload was expected.
    #[error("Response envelope has no data")]
    MissingData,

    /// The request was refused locally before being sent.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// The response envelope used by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Value>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_rejection(&self) -> bool {
        self.success == Some(false) || self.status.as_deref() == Some("error")
    }

    /// Turn a rejection into [`ApiError::Rejected`].
    fn accept(self) -> Result<Self, ApiError> {
        if self.is_rejection() {
            return Err(ApiError::Rejected {
                message: self
                    .message
                    .unwrap_or_else(|| "request failed".to_string()),
            });
        }
        Ok(self)
    }

    /// Unwrap the payload, failing on rejection or missing data.
    pub fn into_data(self) -> Result<T, ApiError> {
        self.accept()?.data.ok_or(ApiError::MissingData)
    }
}

/// HTTP client for one MOVA backend. Cheap to clone; clones share the
/// connection pool and the bearer token.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Build a client from `config`, applying its timeout and token.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let api = Self::with_client(client, config.base_url.clone());
        api.set_token(config.token.clone());
        Ok(api)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the bearer token sent with every request.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::GET, path).send().await?;
        Self::parse_response(response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::parse_response(response).await
    }

    /// `POST` without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::POST, path).send().await?;
        Self::parse_response(response).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(Method::PUT, path).json(body).send().await?;
        Self::parse_response(response).await
    }

    /// `DELETE`, ignoring any payload in the envelope.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::check_status(response).await
    }

    // ---- private helpers ----

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "MOVA API request");

        let builder = self.client.request(method, url);
        let token = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful envelope and unwrap its payload.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        response.json::<ApiEnvelope<T>>().await?.into_data()
    }

    /// Assert success (status code and envelope), discarding the payload.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        // A non-JSON body on a 2xx is not a rejection.
        if let Ok(envelope) = serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(&bytes) {
            envelope.accept()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.has_token())
            .finish()
    }
}
