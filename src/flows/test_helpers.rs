//! Scripted [`Backend`] and fixtures shared by flow and app tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::api::Backend;
use crate::error::ApiError;
use crate::types::{
    AuthSuccess, CreatedPost, FeedQuery, LikeOutcome, MediaItem, MediaKind, NewPost, Post, Registration, UserSummary,
    Verification,
};

/// A call the mock received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(Registration),
    Login { email: String, password: String },
    Verify(String),
    List(FeedQuery),
    Create { token: Option<String>, post: NewPost },
    Like { token: Option<String>, post_id: i64 },
}

/// Replies are popped per operation; an empty queue answers with a
/// transport error, so an unscripted call fails loudly in assertions.
#[derive(Default)]
pub struct MockBackend {
    auth: Mutex<VecDeque<Result<AuthSuccess, ApiError>>>,
    verify: Mutex<VecDeque<Result<Verification, ApiError>>>,
    posts: Mutex<VecDeque<Result<Vec<Post>, ApiError>>>,
    created: Mutex<VecDeque<Result<CreatedPost, ApiError>>>,
    likes: Mutex<VecDeque<Result<LikeOutcome, ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auth(self, reply: Result<AuthSuccess, ApiError>) -> Self {
        self.auth.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_verify(self, reply: Result<Verification, ApiError>) -> Self {
        self.verify.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_posts(self, reply: Result<Vec<Post>, ApiError>) -> Self {
        self.posts.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_created(self, reply: Result<CreatedPost, ApiError>) -> Self {
        self.created.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_like(self, reply: Result<LikeOutcome, ApiError>) -> Self {
        self.likes.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn next<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>) -> Result<T, ApiError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(transport()))
}

#[async_trait::async_trait]
impl Backend for MockBackend {
    async fn register(&self, form: &Registration) -> Result<AuthSuccess, ApiError> {
        self.record(Call::Register(form.clone()));
        next(&self.auth)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ApiError> {
        self.record(Call::Login { email: email.to_owned(), password: password.to_owned() });
        next(&self.auth)
    }

    async fn verify(&self, token: &str) -> Result<Verification, ApiError> {
        self.record(Call::Verify(token.to_owned()));
        next(&self.verify)
    }

    async fn list_posts(&self, query: &FeedQuery) -> Result<Vec<Post>, ApiError> {
        self.record(Call::List(*query));
        next(&self.posts)
    }

    async fn create_post(&self, token: Option<&str>, post: &NewPost) -> Result<CreatedPost, ApiError> {
        self.record(Call::Create { token: token.map(ToOwned::to_owned), post: post.clone() });
        next(&self.created)
    }

    async fn like_post(&self, token: Option<&str>, post_id: i64) -> Result<LikeOutcome, ApiError> {
        self.record(Call::Like { token: token.map(ToOwned::to_owned), post_id });
        next(&self.likes)
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn user(id: i64) -> UserSummary {
    UserSummary {
        id,
        username: format!("user{id}"),
        email: Some(format!("user{id}@lumi.test")),
        full_name: Some(format!("User {id}")),
        role: Some("user".into()),
        avatar_url: None,
    }
}

pub fn auth_success(id: i64) -> AuthSuccess {
    AuthSuccess { token: format!("tok-{id}"), user: user(id) }
}

pub fn post(id: i64, likes_count: i64, liked_by_viewer: bool) -> Post {
    Post {
        id,
        author: user(100 + id),
        media: vec![MediaItem { url: format!("https://cdn.test/{id}.jpg"), kind: MediaKind::Image }],
        caption: format!("post {id}"),
        location: None,
        likes_count,
        comments_count: 1,
        shares_count: 0,
        created_at: Some("2024-05-01T10:00:00".into()),
        liked_by_viewer,
    }
}

pub fn rejected(message: &str) -> ApiError {
    ApiError::Rejected(message.to_owned())
}

pub fn transport() -> ApiError {
    ApiError::Transport("connection refused".to_owned())
}
