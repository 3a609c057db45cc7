//! Front-end facade: one backend, one session store, and the three flows.
//!
//! DESIGN
//! ======
//! `App` is what a view layer holds. It restores the persisted session on
//! construction, routes each user action to its flow, and chains the
//! follow-ups the flows do not know about (a published post refreshes the
//! feed). Every action returns the notification to show.
//!
//! ERROR HANDLING
//! ==============
//! Actions never return `Err`; failures are notifications and leave the
//! state as it was. Only construction can fail (HTTP client build).

use tracing::{info, warn};

use crate::api::{Backend, HttpApi};
use crate::config::ClientConfig;
use crate::error::{ApiError, ErrorCode};
use crate::flows::Outcome;
use crate::flows::auth::{AuthFlow, LoginForm};
use crate::flows::compose::ComposeFlow;
use crate::flows::feed::Feed;
use crate::notify::Notification;
use crate::session::{Session, SessionStore};
use crate::types::{CreatedPost, FeedQuery, LikeOutcome, Registration, UserSummary};

pub struct App {
    backend: Box<dyn Backend>,
    session: SessionStore,
    pub auth: AuthFlow,
    pub compose: ComposeFlow,
    pub feed: Feed,
}

impl App {
    /// Wire a backend and a session store, restoring any saved login.
    pub fn new(backend: impl Backend + 'static, session: SessionStore) -> Self {
        let restored = session.restore().unwrap_or_else(|e| {
            warn!(code = e.error_code(), error = %e, "session restore failed; starting anonymous");
            Session::default()
        });
        if let Some(user) = &restored.user {
            info!(user_id = user.id, "session restored");
        }
        Self {
            backend: Box::new(backend),
            session,
            auth: AuthFlow::from_session(&restored),
            compose: ComposeFlow::new(),
            feed: Feed::new(FeedQuery::default()),
        }
    }

    /// HTTP backend and file-backed session from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let api = HttpApi::from_config(config)?;
        Ok(Self::new(api, SessionStore::in_dir(&config.state_dir)))
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserSummary> {
        self.auth.user()
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    pub async fn login(&mut self, email: &str, password: &str) -> Outcome<UserSummary> {
        self.auth.login = LoginForm { email: email.to_owned(), password: password.to_owned() };
        self.auth.submit_login(self.backend.as_ref(), &self.session).await
    }

    pub async fn register(&mut self, form: Registration) -> Outcome<UserSummary> {
        self.auth.register = form;
        self.auth.submit_register(self.backend.as_ref(), &self.session).await
    }

    pub async fn verify(&mut self) -> Outcome<UserSummary> {
        self.auth.verify(self.backend.as_ref(), &self.session).await
    }

    pub fn logout(&mut self) -> Notification {
        match self.auth.logout(&self.session) {
            Ok(()) => {
                info!("signed out");
                Notification::success("Signed out", "See you soon")
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "logout could not clear the store");
                Notification::error("Error", "Could not clear the session")
            }
        }
    }

    // =========================================================================
    // POSTS
    // =========================================================================

    /// Submit the current draft; on success the feed is reloaded.
    pub async fn publish(&mut self) -> Outcome<CreatedPost> {
        let outcome = self.compose.submit(self.backend.as_ref(), &self.session).await;
        if outcome.is_success() {
            let refreshed = self.feed.refresh(self.backend.as_ref()).await;
            if !refreshed.is_success() {
                warn!(notice = %refreshed.notification, "feed reload after publish failed");
            }
        }
        outcome
    }

    pub async fn refresh_feed(&mut self) -> Outcome<usize> {
        self.feed.refresh(self.backend.as_ref()).await
    }

    pub async fn like(&mut self, post_id: i64) -> Outcome<LikeOutcome> {
        self.feed.like(self.backend.as_ref(), &self.session, post_id).await
    }
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
