//! Display settings for the renderer.
//!
//! Settings are a plain value passed into each render call - there is no
//! global mutable settings object and no change notification inside the
//! core. Persisting the value (e.g. behind a key-value store) is a
//! collaborator concern, which is why the type derives serde traits.

use serde::{Deserialize, Serialize};

/// Toggles that change how messages are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerSettings {
    /// Render image attachments and image embeds as inline thumbnails.
    pub image_previews: bool,

    /// Apply text formatting (bold, code blocks, ...). Escaping and
    /// auto-linking happen regardless.
    pub formatting: bool,

    /// Include author avatars in message views.
    pub user_avatars: bool,

    /// Render animated custom emoji in their animated format.
    pub animated_emoji: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            image_previews: true,
            formatting: true,
            user_avatars: true,
            animated_emoji: true,
        }
    }
}

impl ViewerSettings {
    /// All toggles on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to toggle image previews.
    #[must_use]
    pub fn with_image_previews(mut self, enabled: bool) -> Self {
        self.image_previews = enabled;
        self
    }

    /// Builder method to toggle formatting.
    #[must_use]
    pub fn with_formatting(mut self, enabled: bool) -> Self {
        self.formatting = enabled;
        self
    }

    /// Builder method to toggle user avatars.
    #[must_use]
    pub fn with_user_avatars(mut self, enabled: bool) -> Self {
        self.user_avatars = enabled;
        self
    }

    /// Builder method to toggle animated emoji.
    #[must_use]
    pub fn with_animated_emoji(mut self, enabled: bool) -> Self {
        self.animated_emoji = enabled;
        self
    }

    /// The file extension used for custom emoji images under these settings.
    pub fn emoji_extension(&self, animated: bool) -> &'static str {
        if animated && self.animated_emoji {
            "gif"
        } else {
            "webp"
        }
    }
}
