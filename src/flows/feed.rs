//! The feed: one page of posts plus the query that produced it.
//!
//! Likes are not optimistic. The post is updated only after the backend
//! answers, and only the targeted post changes.

use tracing::{debug, warn};

use super::{Outcome, failure_notice};
use crate::api::Backend;
use crate::error::ErrorCode;
use crate::notify::Notification;
use crate::session::SessionStore;
use crate::types::{FeedQuery, LikeOutcome, Post};

#[derive(Clone, Debug, Default)]
pub struct Feed {
    posts: Vec<Post>,
    query: FeedQuery,
}

impl Feed {
    #[must_use]
    pub fn new(query: FeedQuery) -> Self {
        Self { posts: Vec::new(), query }
    }

    #[must_use]
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    #[must_use]
    pub fn query(&self) -> FeedQuery {
        self.query
    }

    /// Change the window or author filter; takes effect on the next refresh.
    pub fn set_query(&mut self, query: FeedQuery) {
        self.query = query;
    }

    #[must_use]
    pub fn post(&self, post_id: i64) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    /// Replace the posts with a fresh listing. Returns how many arrived.
    pub async fn refresh(&mut self, backend: &dyn Backend) -> Outcome<usize> {
        match backend.list_posts(&self.query).await {
            Ok(posts) => {
                debug!(count = posts.len(), offset = self.query.offset, "feed refreshed");
                self.posts = posts;
                let count = self.posts.len();
                Outcome::success(count, Notification::success("Feed updated", format!("{count} posts")))
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "feed refresh failed");
                Outcome::failure(failure_notice("Error", "Could not load the feed", &e))
            }
        }
    }

    /// Like (or unlike, when the backend toggles) a post.
    pub async fn like(&mut self, backend: &dyn Backend, session: &SessionStore, post_id: i64) -> Outcome<LikeOutcome> {
        let token = session.token().unwrap_or_else(|e| {
            warn!(code = e.error_code(), error = %e, "could not read session token");
            None
        });

        match backend.like_post(token.as_deref(), post_id).await {
            Ok(outcome) => {
                self.apply_like(post_id, outcome.liked);
                let liked = self.post(post_id).map_or(outcome.liked.unwrap_or(true), |p| p.liked_by_viewer);
                let notice = if liked {
                    Notification::success("Liked", format!("Post {post_id} liked"))
                } else {
                    Notification::success("Unliked", format!("Post {post_id} unliked"))
                };
                Outcome::success(outcome, notice)
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, post_id, "like failed");
                Outcome::failure(failure_notice("Error", "Could not update the like", &e))
            }
        }
    }

    /// Apply a like answer to the post with `post_id`. With `liked` set the
    /// flag takes that value; without it the flag toggles. The count moves
    /// only when the flag changes and never drops below zero. Returns false
    /// when the post is not on this page.
    pub fn apply_like(&mut self, post_id: i64, liked: Option<bool>) -> bool {
        let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) else {
            return false;
        };
        let now = liked.unwrap_or(!post.liked_by_viewer);
        if now != post.liked_by_viewer {
            post.likes_count = if now { post.likes_count + 1 } else { (post.likes_count - 1).max(0) };
            post.liked_by_viewer = now;
        }
        true
    }
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
