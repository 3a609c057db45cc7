//! Post composition: a draft of 1..=10 media files plus caption and location.
//!
//! Phases: `Empty` → `AssetsSelected` → `Submitting` → `Done`, or back to
//! `AssetsSelected` on failure with the draft untouched. A draft without
//! media is never submitted.

use std::path::Path;

use tracing::{info, warn};

use super::{Outcome, failure_notice};
use crate::api::Backend;
use crate::error::{DraftError, ErrorCode};
use crate::notify::Notification;
use crate::session::SessionStore;
use crate::types::{CreatedPost, MediaAsset, MediaKind, NewPost};

pub const MAX_MEDIA: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComposePhase {
    #[default]
    Empty,
    AssetsSelected,
    Submitting,
    Done,
}

#[derive(Clone, Debug, Default)]
pub struct ComposeFlow {
    phase: ComposePhase,
    assets: Vec<MediaAsset>,
    pub caption: String,
    pub location: String,
}

impl ComposeFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> ComposePhase {
        self.phase
    }

    #[must_use]
    pub fn assets(&self) -> &[MediaAsset] {
        &self.assets
    }

    /// Whether another file can be queued.
    #[must_use]
    pub fn has_room(&self) -> bool {
        self.assets.len() < MAX_MEDIA
    }

    /// The submit control is enabled only with media queued and nothing pending.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase != ComposePhase::Submitting && !self.assets.is_empty()
    }

    /// Post-level media type, decided by the first queued file.
    #[must_use]
    pub fn media_type(&self) -> Option<MediaKind> {
        self.assets.first().map(MediaAsset::kind)
    }

    /// Queue a media file. Returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::TooManyMedia`] when the draft is full.
    pub fn add_asset(&mut self, asset: MediaAsset) -> Result<usize, DraftError> {
        if !self.has_room() {
            return Err(DraftError::TooManyMedia { limit: MAX_MEDIA });
        }
        self.assets.push(asset);
        self.phase = ComposePhase::AssetsSelected;
        Ok(self.assets.len() - 1)
    }

    /// Read, encode and queue a file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft is full, the extension is not a known
    /// image/video type, or the file cannot be read.
    pub fn add_file(&mut self, path: &Path) -> Result<usize, DraftError> {
        if !self.has_room() {
            return Err(DraftError::TooManyMedia { limit: MAX_MEDIA });
        }
        let asset = read_media_file(path)?;
        self.add_asset(asset)
    }

    /// Drop the file at `index`; later files shift down by one.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::NoSuchMedia`] if `index` is out of range.
    pub fn remove_asset(&mut self, index: usize) -> Result<MediaAsset, DraftError> {
        if index >= self.assets.len() {
            return Err(DraftError::NoSuchMedia { index, len: self.assets.len() });
        }
        let removed = self.assets.remove(index);
        if self.assets.is_empty() {
            self.phase = ComposePhase::Empty;
        }
        Ok(removed)
    }

    /// Throw the draft away (modal closed).
    pub fn discard(&mut self) {
        *self = Self::default();
    }

    /// Publish the draft. Without media this returns a validation notice and
    /// makes no request.
    pub async fn submit(&mut self, backend: &dyn Backend, session: &SessionStore) -> Outcome<CreatedPost> {
        let Some(media_type) = self.media_type() else {
            return Outcome::failure(Notification::error("Error", "Add at least one photo or video"));
        };

        let token = session.token().unwrap_or_else(|e| {
            warn!(code = e.error_code(), error = %e, "could not read session token");
            None
        });
        let location = self.location.trim();
        let post = NewPost {
            caption: self.caption.clone(),
            media: self.assets.clone(),
            media_type,
            location: (!location.is_empty()).then(|| location.to_owned()),
        };

        self.phase = ComposePhase::Submitting;
        match backend.create_post(token.as_deref(), &post).await {
            Ok(created) => {
                info!(post_id = created.post_id(), media = post.media.len(), "post published");
                *self = Self { phase: ComposePhase::Done, ..Self::default() };
                Outcome::success(created, Notification::success("Post published!", "Your content is now in the feed"))
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "post publish failed");
                self.phase = ComposePhase::AssetsSelected;
                Outcome::failure(failure_notice("Error", "Could not publish the post", &e))
            }
        }
    }
}

/// Mime type for a media file, by extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(mime)
}

/// Read a whole media file into a base64 [`MediaAsset`].
///
/// # Errors
///
/// Returns an error for unknown extensions or unreadable files.
pub fn read_media_file(path: &Path) -> Result<MediaAsset, DraftError> {
    let mime = mime_for_path(path).ok_or_else(|| DraftError::UnsupportedMedia(path.to_path_buf()))?;
    let bytes = std::fs::read(path).map_err(|source| DraftError::Read { path: path.to_path_buf(), source })?;
    Ok(MediaAsset::from_bytes(&bytes, mime))
}

#[cfg(test)]
#[path = "compose_test.rs"]
mod tests;
