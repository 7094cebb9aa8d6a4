//! The immutable in-memory holder of a loaded archive.
//!
//! A [`DocumentStore`] accepts exactly one `load`: the metadata document plus
//! the parsed message stream, which it partitions by channel and then by
//! message id. After that the store is read-only for the lifetime of the
//! viewing session; a second load attempt is rejected, not merged.

use std::collections::HashMap;

use crate::archive::{ArchiveMetadata, MessageDocument};
use crate::error::{ChatvaultError, Result};

/// Messages of one channel, keyed by message id.
pub type ChannelMessages = HashMap<String, MessageDocument>;

struct LoadedArchive {
    metadata: ArchiveMetadata,
    channels: HashMap<String, ChannelMessages>,
}

/// Holder of the exported metadata and of messages partitioned by channel;
/// the single source of truth for all queries.
#[derive(Default)]
pub struct DocumentStore {
    state: Option<LoadedArchive>,
    // handed out by `messages_of` for unknown channels
    empty: ChannelMessages,
}

impl DocumentStore {
    /// Creates an empty, unloaded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an archive into the store.
    ///
    /// # Errors
    ///
    /// Returns [`ChatvaultError::AlreadyLoaded`] if an archive was loaded
    /// before; the existing state is left untouched.
    pub fn load(
        &mut self,
        metadata: ArchiveMetadata,
        messages: Vec<MessageDocument>,
    ) -> Result<()> {
        if self.state.is_some() {
            return Err(ChatvaultError::AlreadyLoaded);
        }

        let mut channels: HashMap<String, ChannelMessages> = HashMap::new();
        for message in messages {
            channels
                .entry(message.c.clone())
                .or_default()
                .insert(message.id.clone(), message);
        }

        self.state = Some(LoadedArchive { metadata, channels });
        Ok(())
    }

    /// Returns `true` once an archive has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// The loaded metadata document, if any.
    pub fn metadata(&self) -> Option<&ArchiveMetadata> {
        self.state.as_ref().map(|s| &s.metadata)
    }

    /// The id→message map of a channel; empty for unknown channels (and
    /// before any archive is loaded).
    pub fn messages_of(&self, channel: &str) -> &ChannelMessages {
        self.state
            .as_ref()
            .and_then(|s| s.channels.get(channel))
            .unwrap_or(&self.empty)
    }

    /// Locates a message by id, scanning all channels.
    ///
    /// Used for reply resolution and jump-to-message. Returns `None` rather
    /// than erroring when the id is unknown.
    pub fn find_message(&self, id: &str) -> Option<&MessageDocument> {
        let state = self.state.as_ref()?;
        state.channels.values().find_map(|messages| messages.get(id))
    }

    /// Finds which channel owns a given message id, scanning all channels.
    pub fn channel_of(&self, id: &str) -> Option<&str> {
        let state = self.state.as_ref()?;
        state
            .channels
            .iter()
            .find(|(_, messages)| messages.contains_key(id))
            .map(|(channel, _)| channel.as_str())
    }
}
