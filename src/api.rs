//! API client for the auth and posts endpoints.
//!
//! DESIGN
//! ======
//! Each resource has one URL. Auth calls are `POST {action, ...}`; posts are
//! listed with `GET ?limit&offset` and mutated with `POST {action, ...}`
//! carrying the session token in `X-Auth-Token`. The [`Backend`] trait is the
//! seam flows depend on; [`HttpApi`] is the reqwest implementation.
//!
//! ERROR HANDLING
//! ==============
//! Bodies are parsed as JSON whatever the HTTP status, because the backend
//! reports request failures as `{error}` with 4xx/5xx codes. A body carrying
//! `error` becomes [`ApiError::Rejected`]; an exchange that fails or yields
//! something other than JSON is a transport-class failure. Nothing retries.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{ClientConfig, Endpoints};
use crate::error::{ApiError, ErrorCode};
use crate::types::{
    AuthRequest, AuthSuccess, CreatedPost, FeedQuery, LikeOutcome, NewPost, Post, PostRequest, PostsPage,
    Registration, Verification,
};

pub const AUTH_HEADER: &str = "X-Auth-Token";

// =============================================================================
// TRAIT
// =============================================================================

/// Operations the backend exposes to the client.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend message, or a transport error.
    async fn register(&self, form: &Registration) -> Result<AuthSuccess, ApiError>;

    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend message, or a transport error.
    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ApiError>;

    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend message, or a transport error.
    async fn verify(&self, token: &str) -> Result<Verification, ApiError>;

    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend message, or a transport error.
    async fn list_posts(&self, query: &FeedQuery) -> Result<Vec<Post>, ApiError>;

    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend message, or a transport error.
    async fn create_post(&self, token: Option<&str>, post: &NewPost) -> Result<CreatedPost, ApiError>;

    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend message, or a transport error.
    async fn like_post(&self, token: Option<&str>, post_id: i64) -> Result<LikeOutcome, ApiError>;
}

/// A shared backend is a backend.
#[async_trait::async_trait]
impl<B: Backend + ?Sized> Backend for Arc<B> {
    async fn register(&self, form: &Registration) -> Result<AuthSuccess, ApiError> {
        (**self).register(form).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ApiError> {
        (**self).login(email, password).await
    }

    async fn verify(&self, token: &str) -> Result<Verification, ApiError> {
        (**self).verify(token).await
    }

    async fn list_posts(&self, query: &FeedQuery) -> Result<Vec<Post>, ApiError> {
        (**self).list_posts(query).await
    }

    async fn create_post(&self, token: Option<&str>, post: &NewPost) -> Result<CreatedPost, ApiError> {
        (**self).create_post(token, post).await
    }

    async fn like_post(&self, token: Option<&str>, post_id: i64) -> Result<LikeOutcome, ApiError> {
        (**self).like_post(token, post_id).await
    }
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpApi {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpApi {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoints: Endpoints, request_timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, endpoints })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(config.endpoints.clone(), config.request_timeout)
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn auth_call<T: DeserializeOwned>(&self, body: &AuthRequest<'_>, action: &'static str) -> Result<T, ApiError> {
        debug!(action, url = %self.endpoints.auth, "auth request");
        let request = self.http.post(&self.endpoints.auth).json(body);
        exchange(request, action).await
    }

    async fn post_call<T: DeserializeOwned>(
        &self,
        token: Option<&str>,
        body: &PostRequest<'_>,
        action: &'static str,
    ) -> Result<T, ApiError> {
        debug!(action, url = %self.endpoints.posts, has_token = token.is_some(), "posts request");
        let request = self
            .http
            .post(&self.endpoints.posts)
            .header(AUTH_HEADER, token.unwrap_or_default())
            .json(body);
        exchange(request, action).await
    }
}

#[async_trait::async_trait]
impl Backend for HttpApi {
    async fn register(&self, form: &Registration) -> Result<AuthSuccess, ApiError> {
        let body = AuthRequest::Register {
            username: &form.username,
            email: &form.email,
            password: &form.password,
            full_name: &form.full_name,
        };
        self.auth_call(&body, "register").await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ApiError> {
        self.auth_call(&AuthRequest::Login { email, password }, "login")
            .await
    }

    async fn verify(&self, token: &str) -> Result<Verification, ApiError> {
        self.auth_call(&AuthRequest::Verify { token }, "verify")
            .await
    }

    async fn list_posts(&self, query: &FeedQuery) -> Result<Vec<Post>, ApiError> {
        let url = feed_url(&self.endpoints.posts, query);
        debug!(%url, "feed request");
        let page: PostsPage = exchange(self.http.get(&url), "list").await?;
        Ok(page.posts)
    }

    async fn create_post(&self, token: Option<&str>, post: &NewPost) -> Result<CreatedPost, ApiError> {
        let body = PostRequest::Create {
            caption: &post.caption,
            media_files: &post.media,
            media_type: post.media_type,
            location: post.location.as_deref(),
        };
        self.post_call(token, &body, "create").await
    }

    async fn like_post(&self, token: Option<&str>, post_id: i64) -> Result<LikeOutcome, ApiError> {
        self.post_call(token, &PostRequest::Like { post_id }, "like")
            .await
    }
}

// =============================================================================
// WIRE HELPERS
// =============================================================================

/// Either an `{error}` body or the expected payload.
#[derive(Deserialize)]
#[serde(untagged)]
enum Reply<T> {
    Rejected { error: String },
    Accepted(T),
}

async fn exchange<T: DeserializeOwned>(request: reqwest::RequestBuilder, action: &'static str) -> Result<T, ApiError> {
    let response = request.send().await.map_err(|e| {
        warn!(action, error = %e, "request failed");
        ApiError::Transport(e.to_string())
    })?;

    let status = response.status().as_u16();
    let text = response.text().await.map_err(|e| {
        warn!(action, status, error = %e, "response body read failed");
        ApiError::Transport(e.to_string())
    })?;

    let reply = decode_reply(status, &text);
    if let Err(e) = &reply {
        debug!(action, status, code = e.error_code(), "request did not succeed");
    }
    reply
}

/// Parse a response body into the payload or the backend's error message.
pub(crate) fn decode_reply<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    match serde_json::from_str::<Reply<T>>(body) {
        Ok(Reply::Rejected { error }) => Err(ApiError::Rejected(error)),
        Ok(Reply::Accepted(value)) => Ok(value),
        Err(e) => Err(ApiError::Decode { status, message: e.to_string() }),
    }
}

fn feed_url(base: &str, query: &FeedQuery) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    let mut url = format!("{base}{sep}limit={}&offset={}", query.limit, query.offset);
    if let Some(user_id) = query.user_id {
        url.push_str(&format!("&user_id={user_id}"));
    }
    url
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
