//! The archive metadata document.
//!
//! Metadata is a single JSON object holding three id-keyed maps: `users`,
//! `servers` and `channels`. The maps are `BTreeMap`s so that serializing the
//! same metadata always produces the same bytes, which is part of the archive
//! determinism contract.
//!
//! # Example
//!
//! ```
//! use chatvault::archive::{ArchiveMetadata, UserMeta};
//!
//! let mut meta = ArchiveMetadata::default();
//! meta.users.insert("1".into(), UserMeta::new("alice"));
//!
//! let json = meta.to_json().unwrap();
//! let parsed = ArchiveMetadata::from_json(&json).unwrap();
//! assert_eq!(parsed.users["1"].name, "alice");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A user as stored in the metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMeta {
    /// Account username.
    pub name: String,

    /// Display name, when it differs from the username.
    #[serde(rename = "displayName")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub display_name: Option<String>,

    /// Avatar reference (a URL or an asset path).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub avatar: Option<String>,
}

impl UserMeta {
    /// Creates a user entry with only a username.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            avatar: None,
        }
    }

    /// Builder method to set the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Builder method to set the avatar reference.
    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// The name to show in a message header: display name when present,
    /// username otherwise.
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// A server (guild, group chat or DM) as stored in the metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMeta {
    /// Server name.
    pub name: String,

    /// Server kind: `"server"`, `"group"` or `"dm"` (lowercased on export).
    #[serde(rename = "type")]
    pub kind: String,

    /// Server icon URL.
    #[serde(rename = "iconUrl")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub icon_url: Option<String>,
}

impl ServerMeta {
    /// Creates a server entry.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            icon_url: None,
        }
    }

    /// Builder method to set the icon URL.
    #[must_use]
    pub fn with_icon_url(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = Some(icon_url.into());
        self
    }
}

/// A channel as stored in the metadata document.
///
/// `parent` links may be cyclic or point at ids that do not exist; the
/// document model allows this and leaves reconciliation to
/// [`hierarchy`](crate::viewer::hierarchy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMeta {
    /// Id of the owning server.
    pub server: String,

    /// Channel name.
    pub name: String,

    /// Parent channel id; absent for root-level channels.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub parent: Option<String>,

    /// Explicit sort position within the sibling group.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub position: Option<i64>,

    /// Channel topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub topic: Option<String>,

    /// NSFW marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub nsfw: Option<bool>,
}

impl ChannelMeta {
    /// Creates a channel entry owned by `server`.
    pub fn new(server: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            name: name.into(),
            parent: None,
            position: None,
            topic: None,
            nsfw: None,
        }
    }

    /// Builder method to set the parent channel id.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Builder method to set the sort position.
    #[must_use]
    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }
}

/// The complete metadata document of an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    /// All users referenced by the archive, keyed by id.
    pub users: BTreeMap<String, UserMeta>,

    /// All servers, keyed by id.
    pub servers: BTreeMap<String, ServerMeta>,

    /// All channels, keyed by id.
    pub channels: BTreeMap<String, ChannelMeta>,
}

impl ArchiveMetadata {
    /// Serializes the metadata document.
    ///
    /// The output is pretty-printed (the document is small and meant to be
    /// inspectable) and deterministic: the same metadata always yields the
    /// same bytes.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a metadata document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ArchiveMetadata {
        let mut meta = ArchiveMetadata::default();
        meta.users.insert(
            "10".into(),
            UserMeta::new("alice")
                .with_display_name("Alice")
                .with_avatar("abc123"),
        );
        meta.users.insert("11".into(), UserMeta::new("bob"));
        meta.servers
            .insert("1".into(), ServerMeta::new("Guild", "server"));
        meta.channels
            .insert("100".into(), ChannelMeta::new("1", "general"));
        meta
    }

    #[test]
    fn test_round_trip() {
        let meta = sample();
        let json = meta.to_json().unwrap();
        let parsed = ArchiveMetadata::from_json(&json).unwrap();
        assert_eq!(parsed, meta);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = sample().to_json().unwrap();
        // bob has no display name or avatar, and the channel has no parent
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["users"]["11"].get("displayName").is_none());
        assert!(value["users"]["11"].get("avatar").is_none());
        assert!(value["channels"]["100"].get("parent").is_none());
        // wire names, not Rust names
        assert!(value["users"]["10"].get("displayName").is_some());
        assert_eq!(value["servers"]["1"]["type"], "server");
    }

    #[test]
    fn test_deterministic_serialization() {
        // BTreeMap keying means insertion order cannot leak into the output
        let a = sample().to_json().unwrap();
        let mut meta = ArchiveMetadata::default();
        meta.channels
            .insert("100".into(), ChannelMeta::new("1", "general"));
        meta.servers
            .insert("1".into(), ServerMeta::new("Guild", "server"));
        meta.users.insert("11".into(), UserMeta::new("bob"));
        meta.users.insert(
            "10".into(),
            UserMeta::new("alice")
                .with_display_name("Alice")
                .with_avatar("abc123"),
        );
        assert_eq!(a, meta.to_json().unwrap());
    }

    #[test]
    fn test_shown_name_falls_back_to_username() {
        assert_eq!(UserMeta::new("bob").shown_name(), "bob");
        assert_eq!(
            UserMeta::new("bob").with_display_name("Bobby").shown_name(),
            "Bobby"
        );
    }
}
