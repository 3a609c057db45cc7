//! Wire and domain types for the auth and posts endpoints.
//!
//! DESIGN
//! ======
//! The backend speaks loosely-typed JSON. Responses are modelled as explicit
//! records with optional fields; requests are internally tagged enums keyed
//! by `action`, matching the single-endpoint-per-resource contract.
//!
//! Posts arrive in two shapes: a `media` list of `{url, type}` items, or the
//! listing shape with `media_urls` plus one `media_type` for the whole post.
//! [`Post`] deserializes through [`PostWire`] and always exposes `media`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

// =============================================================================
// USERS
// =============================================================================

/// Identity returned by auth calls and embedded as a post author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    /// Absent on post authors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserSummary {
    /// Full name when set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }
}

// =============================================================================
// MEDIA
// =============================================================================

/// Kind of media a post carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

impl MediaKind {
    /// `Video` for `video/*` mime types, `Image` for everything else.
    #[must_use]
    pub fn for_mime(mime: &str) -> Self {
        if mime.starts_with("video/") { Self::Video } else { Self::Image }
    }
}

/// A stored media item on a published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

/// A media file queued in a draft, base64-encoded in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub data: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl MediaAsset {
    #[must_use]
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self { data: STANDARD.encode(bytes), mime_type: mime_type.into() }
    }

    #[must_use]
    pub fn kind(&self) -> MediaKind {
        MediaKind::for_mime(&self.mime_type)
    }
}

// =============================================================================
// POSTS
// =============================================================================

/// A published post as shown in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PostWire")]
pub struct Post {
    pub id: i64,
    pub author: UserSummary,
    pub media: Vec<MediaItem>,
    pub caption: String,
    pub location: Option<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub shares_count: i64,
    pub created_at: Option<String>,
    pub liked_by_viewer: bool,
}

/// Every post shape the backend has been seen to send.
#[derive(Deserialize)]
struct PostWire {
    id: i64,
    author: UserSummary,
    #[serde(default)]
    media: Option<Vec<MediaItem>>,
    #[serde(default)]
    media_urls: Vec<String>,
    #[serde(default)]
    media_type: Option<MediaKind>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    likes_count: i64,
    #[serde(default)]
    comments_count: i64,
    #[serde(default)]
    shares_count: i64,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, alias = "liked")]
    liked_by_viewer: bool,
}

impl From<PostWire> for Post {
    fn from(wire: PostWire) -> Self {
        let media = wire.media.unwrap_or_else(|| {
            let kind = wire.media_type.unwrap_or_default();
            wire.media_urls
                .into_iter()
                .map(|url| MediaItem { url, kind })
                .collect()
        });
        Self {
            id: wire.id,
            author: wire.author,
            media,
            caption: wire.caption.unwrap_or_default(),
            location: wire.location.filter(|loc| !loc.trim().is_empty()),
            likes_count: wire.likes_count,
            comments_count: wire.comments_count,
            shares_count: wire.shares_count,
            created_at: wire.created_at,
            liked_by_viewer: wire.liked_by_viewer,
        }
    }
}

/// Filter and window for a feed listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    pub limit: u32,
    pub offset: u32,
    /// Restrict to one author (profile grid).
    pub user_id: Option<i64>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self { limit: 20, offset: 0, user_id: None }
    }
}

/// A post ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub caption: String,
    pub media: Vec<MediaAsset>,
    pub media_type: MediaKind,
    pub location: Option<String>,
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Successful register/login answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSuccess {
    pub token: String,
    pub user: UserSummary,
}

/// Answer to a token verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    #[serde(default)]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PostsPage {
    #[serde(default)]
    pub posts: Vec<Post>,
}

/// Answer to a create call: either the full post or the backend's summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatedPost {
    Full {
        post: Post,
    },
    Summary {
        post_id: i64,
        #[serde(default)]
        created_at: Option<String>,
        #[serde(default)]
        media_urls: Vec<String>,
    },
}

impl CreatedPost {
    #[must_use]
    pub fn post_id(&self) -> i64 {
        match self {
            Self::Full { post } => post.id,
            Self::Summary { post_id, .. } => *post_id,
        }
    }
}

/// Answer to a like call. `liked` is the viewer's new state when the backend
/// reports it (toggle semantics); `{ok: true}` answers leave it unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Fields collected by the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub(crate) enum AuthRequest<'a> {
    Register { username: &'a str, email: &'a str, password: &'a str, full_name: &'a str },
    Login { email: &'a str, password: &'a str },
    Verify { token: &'a str },
}

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub(crate) enum PostRequest<'a> {
    Create {
        caption: &'a str,
        media_files: &'a [MediaAsset],
        media_type: MediaKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<&'a str>,
    },
    Like {
        post_id: i64,
    },
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
