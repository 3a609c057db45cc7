//! Login / registration / logout.
//!
//! Phases: `Anonymous` → `SubmittingLogin` | `SubmittingRegister` →
//! `Authenticated`, or back to the phase the flow started from on failure.
//! Logout is synchronous. The session store is written only after a
//! successful answer, and always as a token/user pair.

use tracing::{error, info, warn};

use super::{Outcome, failure_notice};
use crate::api::Backend;
use crate::error::{ApiError, ErrorCode, StoreError};
use crate::notify::Notification;
use crate::session::{Session, SessionStore};
use crate::types::{AuthSuccess, Registration, UserSummary, Verification};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthPhase {
    #[default]
    Anonymous,
    SubmittingLogin,
    SubmittingRegister,
    Authenticated,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Copy)]
enum Attempt {
    Login,
    Register,
}

#[derive(Clone, Debug, Default)]
pub struct AuthFlow {
    phase: AuthPhase,
    user: Option<UserSummary>,
    pub login: LoginForm,
    pub register: Registration,
}

impl AuthFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a restored session: authenticated only with a full pair.
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        match (&session.token, &session.user) {
            (Some(_), Some(user)) => Self { phase: AuthPhase::Authenticated, user: Some(user.clone()), ..Self::default() },
            _ => Self::default(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserSummary> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.phase == AuthPhase::Authenticated
    }

    /// False while a login or registration is pending.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !matches!(self.phase, AuthPhase::SubmittingLogin | AuthPhase::SubmittingRegister)
    }

    /// Submit the login form.
    pub async fn submit_login(&mut self, backend: &dyn Backend, session: &SessionStore) -> Outcome<UserSummary> {
        let previous = self.phase;
        self.phase = AuthPhase::SubmittingLogin;
        let result = backend
            .login(&self.login.email, &self.login.password)
            .await;
        self.finish(previous, Attempt::Login, result, session)
    }

    /// Submit the registration form.
    pub async fn submit_register(&mut self, backend: &dyn Backend, session: &SessionStore) -> Outcome<UserSummary> {
        let previous = self.phase;
        self.phase = AuthPhase::SubmittingRegister;
        let result = backend.register(&self.register).await;
        self.finish(previous, Attempt::Register, result, session)
    }

    fn finish(
        &mut self,
        previous: AuthPhase,
        attempt: Attempt,
        result: Result<AuthSuccess, ApiError>,
        session: &SessionStore,
    ) -> Outcome<UserSummary> {
        let auth = match result {
            Ok(auth) => auth,
            Err(e) => {
                self.phase = previous;
                warn!(code = e.error_code(), error = %e, "authentication failed");
                let notice = match attempt {
                    Attempt::Login => failure_notice("Login failed", "Could not sign in", &e),
                    Attempt::Register => failure_notice("Registration failed", "Could not register", &e),
                };
                return Outcome::failure(notice);
            }
        };

        if let Err(e) = session.save(&auth) {
            error!(code = e.error_code(), error = %e, "could not persist session");
            self.phase = AuthPhase::Anonymous;
            self.user = None;
            return Outcome::failure(Notification::error("Error", "Could not save the session"));
        }

        let user = auth.user;
        info!(user_id = user.id, username = %user.username, "signed in");
        self.login.password.clear();
        self.register.password.clear();
        self.phase = AuthPhase::Authenticated;
        self.user = Some(user.clone());

        let notice = match attempt {
            Attempt::Login => Notification::success("Signed in!", format!("Welcome, {}!", user.display_name())),
            Attempt::Register => {
                Notification::success("Registered!", format!("Welcome to Lumi+, {}!", user.display_name()))
            }
        };
        Outcome::success(user, notice)
    }

    /// Re-check the stored token with the backend. A confirmed session
    /// refreshes the stored user record; anything else changes nothing.
    pub async fn verify(&mut self, backend: &dyn Backend, session: &SessionStore) -> Outcome<UserSummary> {
        let token = match session.token() {
            Ok(Some(token)) => token,
            Ok(None) => return Outcome::failure(Notification::error("Not signed in", "Sign in first")),
            Err(e) => {
                error!(code = e.error_code(), error = %e, "could not read session");
                return Outcome::failure(Notification::error("Error", "Could not read the session"));
            }
        };

        match backend.verify(&token).await {
            Ok(Verification { valid: true, user: Some(user) }) => {
                if let Err(e) = session.set_user(&user) {
                    warn!(code = e.error_code(), error = %e, "could not refresh stored user");
                }
                self.phase = AuthPhase::Authenticated;
                self.user = Some(user.clone());
                let notice = Notification::success("Session valid", format!("Signed in as {}", user.display_name()));
                Outcome::success(user, notice)
            }
            Ok(_) => Outcome::failure(Notification::error("Session invalid", "The backend did not confirm this session")),
            Err(e) => Outcome::failure(failure_notice("Session invalid", "Could not verify the session", &e)),
        }
    }

    /// Clear the session. The flow is anonymous afterwards even if the
    /// store reports an error.
    ///
    /// # Errors
    ///
    /// Returns the store error if either key could not be removed.
    pub fn logout(&mut self, session: &SessionStore) -> Result<(), StoreError> {
        self.phase = AuthPhase::Anonymous;
        self.user = None;
        session.clear()
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
