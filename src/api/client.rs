use crate::api::types::{
    ActionResponse, AuthStatus, Credentials, LoginBody, NewReel, ReelsEnvelope, ReelsPage,
    RegisterBody, TrackViewBody, TrackViewResponse,
};
use crate::util::validate_base_url;
use futures::StreamExt;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Upper bound on any response body (the reel list is the largest).
const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid response: {0}")]
    Decode(String),
    /// The backend answered with `success: false`; carries its message verbatim.
    #[error("{0}")]
    Application(String),
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
    /// The task running the request died before producing a result.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// True for transport-level failures (network, timeout, non-2xx, bad body).
    pub fn is_transport(&self) -> bool {
        !matches!(self, ApiError::Application(_))
    }
}

/// Thin async client over the reels JSON API.
///
/// Cookies are kept between calls: the backend tracks both the login and the
/// anonymous view quota in its session cookie.
#[derive(Clone)]
pub struct ReelsClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ReelsClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url =
            validate_base_url(base_url).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(concat!("reelfeed/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))
    }

    /// `GET /api/reels`
    pub async fn list_reels(&self) -> Result<ReelsPage, ApiError> {
        let request = self.http.get(self.endpoint("/api/reels")?);
        let envelope: ReelsEnvelope = self.send_json(request).await?;
        if !envelope.success {
            return Err(application_error(envelope.error, "Unknown error"));
        }
        tracing::debug!(count = envelope.reels.len(), "Fetched reel list");
        Ok(ReelsPage {
            reels: envelope.reels,
            user: envelope.user,
        })
    }

    /// `POST /api/track-view`
    pub async fn track_view(&self, reel_id: i64) -> Result<TrackViewResponse, ApiError> {
        let request = self
            .http
            .post(self.endpoint("/api/track-view")?)
            .json(&TrackViewBody { reel_id });
        let response: TrackViewResponse = self.send_json(request).await?;
        if !response.success {
            return Err(application_error(response.error, "Failed to track view"));
        }
        Ok(response)
    }

    /// `GET /api/auth/status`
    pub async fn auth_status(&self) -> Result<AuthStatus, ApiError> {
        let request = self.http.get(self.endpoint("/api/auth/status")?);
        let status: AuthStatus = self.send_json(request).await?;
        if !status.success {
            return Err(application_error(status.error, "Failed to check login status"));
        }
        Ok(status)
    }

    /// `POST /api/auth/login`
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let body = LoginBody {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
        };
        let request = self
            .http
            .post(self.endpoint("/api/auth/login")?)
            .json(&body);
        self.send_action(request, "Login failed").await
    }

    /// `POST /api/auth/register`
    pub async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let body = RegisterBody {
            username: &credentials.username,
            email: credentials.email.as_deref().unwrap_or_default(),
            password: credentials.password.expose_secret(),
        };
        let request = self
            .http
            .post(self.endpoint("/api/auth/register")?)
            .json(&body);
        self.send_action(request, "Registration failed").await
    }

    /// `POST /api/reels`
    pub async fn add_reel(&self, reel: &NewReel) -> Result<(), ApiError> {
        let request = self.http.post(self.endpoint("/api/reels")?).json(reel);
        self.send_action(request, "Unknown error").await
    }

    /// `DELETE /api/reels/{id}`
    pub async fn delete_reel(&self, reel_id: i64) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.endpoint(&format!("/api/reels/{}", reel_id))?);
        self.send_action(request, "Unknown error").await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout(self.timeout.as_secs()))?
            .map_err(ApiError::Network)
    }

    /// Send a request whose non-2xx status is a transport failure.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), url = %response.url(), "Backend returned error status");
            return Err(ApiError::HttpStatus(status.as_u16()));
        }
        let bytes = read_limited_body(response, MAX_RESPONSE_SIZE).await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send a `{ success, error? }` action.
    ///
    /// Error statuses that still carry a JSON `error` surface that message, so
    /// "Invalid credentials" reaches the user instead of "status 401".
    async fn send_action(
        &self,
        request: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<(), ApiError> {
        let response = self.send(request).await?;
        let status = response.status();
        let bytes = read_limited_body(response, MAX_RESPONSE_SIZE).await?;
        match serde_json::from_slice::<ActionResponse>(&bytes) {
            Ok(body) if body.success && status.is_success() => Ok(()),
            Ok(body) if !body.success && (status.is_success() || body.error.is_some()) => {
                Err(application_error(body.error, fallback))
            }
            Ok(_) => Err(ApiError::HttpStatus(status.as_u16())),
            Err(_) if !status.is_success() => Err(ApiError::HttpStatus(status.as_u16())),
            Err(e) => Err(ApiError::Decode(e.to_string())),
        }
    }
}

fn application_error(message: Option<String>, fallback: &str) -> ApiError {
    ApiError::Application(
        message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    )
}

async fn read_limited_body(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
