//! The query engine: channel selection, filtering, pagination and
//! cross-channel message lookup.
//!
//! The engine is a small state machine over a loaded archive: a selected
//! channel (none until the first selection), at most one active filter, the
//! 1-based current page and the page size (0 = one unbounded page).
//! Everything is computed eagerly on state changes; reads are cheap slices
//! of the precomputed visible-id list.

use crate::archive::{ArchiveMetadata, MessageDocument, snowflake};
use crate::error::Result;
use crate::viewer::filter::MessageFilter;
use crate::viewer::hierarchy::ChannelHierarchy;
use crate::viewer::store::DocumentStore;

/// A pagination action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    First,
    Previous,
    Next,
    Last,
    /// Jump to an explicit 1-based page number, clamped into range.
    Jump(usize),
}

/// Where a jumped-to message landed: its page and index within that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpLocation {
    pub page: usize,
    pub index_in_page: usize,
}

/// One entry of the channel sidebar listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelListing {
    pub id: String,
    pub name: String,
    pub server_name: String,
    pub server_kind: String,
    /// Message count under the currently active filter.
    pub message_count: usize,
    pub topic: String,
    pub nsfw: bool,
}

/// Browsing state over one loaded archive.
#[derive(Default)]
pub struct QueryEngine {
    store: DocumentStore,
    hierarchy: Option<ChannelHierarchy>,
    selected: Option<String>,
    filter: Option<MessageFilter>,
    visible: Vec<String>,
    page: usize,
    page_size: usize,
}

impl QueryEngine {
    /// Creates an engine with no archive loaded.
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Self::default()
        }
    }

    /// Loads an archive and resolves its channel hierarchy.
    ///
    /// # Errors
    ///
    /// Rejects a second load with
    /// [`ChatvaultError::AlreadyLoaded`](crate::ChatvaultError::AlreadyLoaded).
    pub fn load_archive(
        &mut self,
        metadata: ArchiveMetadata,
        messages: Vec<MessageDocument>,
    ) -> Result<()> {
        let hierarchy = ChannelHierarchy::resolve(&metadata);
        self.store.load(metadata, messages)?;
        self.hierarchy = Some(hierarchy);
        self.selected = None;
        self.visible.clear();
        self.page = 1;
        Ok(())
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Returns `true` once an archive has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.store.is_loaded()
    }

    /// The currently selected channel id, if any.
    pub fn selected_channel(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The currently active filter, if any.
    pub fn active_filter(&self) -> Option<&MessageFilter> {
        self.filter.as_ref()
    }

    /// Selects a channel: recomputes the visible message ids under the
    /// active filter, sorts them chronologically by snowflake, and resets to
    /// page 1.
    pub fn select_channel(&mut self, channel: &str) {
        let messages = self.store.messages_of(channel);
        let mut ids: Vec<String> = match &self.filter {
            Some(filter) => messages
                .iter()
                .filter(|(_, message)| filter.matches(message))
                .map(|(id, _)| id.clone())
                .collect(),
            None => messages.keys().cloned().collect(),
        };
        snowflake::sort_oldest_to_newest(&mut ids);

        self.selected = Some(channel.to_string());
        self.visible = ids;
        self.page = 1;
    }

    /// Replaces the active filter (or clears it with `None`).
    ///
    /// When a channel is selected its visible list is recomputed, which also
    /// resets the page to 1.
    pub fn set_filter(&mut self, filter: Option<MessageFilter>) {
        self.filter = filter;
        if let Some(channel) = self.selected.clone() {
            self.select_channel(&channel);
        }
    }

    /// Sets the page size; 0 means a single unbounded page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size;
    }

    /// The visible (filtered, sorted) message ids of the selected channel.
    pub fn visible_messages(&self) -> &[String] {
        &self.visible
    }

    /// Number of pages of the current visible list.
    ///
    /// 0 before any channel is selected; 1 when the page size is unbounded.
    pub fn page_count(&self) -> usize {
        if self.selected.is_none() {
            return 0;
        }
        if self.page_size == 0 {
            return 1;
        }
        self.visible.len().div_ceil(self.page_size)
    }

    /// The current page, clamped into `[1, page_count]` (1 when empty).
    pub fn current_page(&self) -> usize {
        let total = self.page_count();
        if total == 0 {
            return 1;
        }
        self.page.clamp(1, total)
    }

    /// Applies a navigation action. Out-of-range targets clamp; navigation
    /// with nothing selected is a no-op.
    pub fn navigate(&mut self, action: PageAction) {
        let total = self.page_count().max(1);
        self.page = match action {
            PageAction::First => 1,
            PageAction::Previous => self.current_page().saturating_sub(1).max(1),
            PageAction::Next => (self.current_page() + 1).min(total),
            PageAction::Last => total,
            PageAction::Jump(page) => page.clamp(1, total),
        };
    }

    /// The message documents of the current page, in chronological order.
    pub fn page_messages(&self) -> Vec<&MessageDocument> {
        let Some(channel) = self.selected.as_deref() else {
            return Vec::new();
        };
        let messages = self.store.messages_of(channel);
        self.page_ids()
            .iter()
            .filter_map(|id| messages.get(id))
            .collect()
    }

    fn page_ids(&self) -> &[String] {
        if self.page_size == 0 {
            return &self.visible;
        }
        let start = self.page_size * (self.current_page() - 1);
        let end = (start + self.page_size).min(self.visible.len());
        if start >= self.visible.len() {
            return &[];
        }
        &self.visible[start..end]
    }

    /// Jumps to a message by id.
    ///
    /// Resolves the owning channel through the store; when it differs from
    /// the selected channel, switches channel first (recomputing the visible
    /// list under the active filter). Returns `None` - a distinct not-found
    /// signal, not an error - when the id is unknown or hidden by the
    /// filter; callers typically clear the filter and retry.
    pub fn navigate_to_message(&mut self, id: &str) -> Option<JumpLocation> {
        let channel = self.store.channel_of(id)?.to_string();
        if self.selected.as_deref() != Some(channel.as_str()) {
            self.select_channel(&channel);
        }

        let index = self.visible.iter().position(|visible| visible == id)?;
        let location = if self.page_size == 0 {
            JumpLocation {
                page: 1,
                index_in_page: index,
            }
        } else {
            JumpLocation {
                page: 1 + index / self.page_size,
                index_in_page: index % self.page_size,
            }
        };
        self.page = location.page;
        Some(location)
    }

    /// The channel sidebar listing: every channel with its message count
    /// under the active filter, sorted by hierarchy rank.
    pub fn channel_list(&self) -> Vec<ChannelListing> {
        let Some(metadata) = self.store.metadata() else {
            return Vec::new();
        };

        let mut listings: Vec<ChannelListing> = metadata
            .channels
            .iter()
            .map(|(id, channel)| {
                let (server_name, server_kind) = match metadata.servers.get(&channel.server) {
                    Some(server) => (server.name.clone(), server.kind.clone()),
                    None => ("<unknown>".to_string(), "unknown".to_string()),
                };
                ChannelListing {
                    id: id.clone(),
                    name: channel.name.clone(),
                    server_name,
                    server_kind,
                    message_count: self.filtered_count(id),
                    topic: channel.topic.clone().unwrap_or_default(),
                    nsfw: channel.nsfw.unwrap_or(false),
                }
            })
            .collect();

        if let Some(hierarchy) = &self.hierarchy {
            listings.sort_by_key(|listing| {
                hierarchy.rank_of(&listing.id).unwrap_or(usize::MAX)
            });
        }
        listings
    }

    fn filtered_count(&self, channel: &str) -> usize {
        let messages = self.store.messages_of(channel);
        match &self.filter {
            Some(filter) => messages
                .values()
                .filter(|message| filter.matches(message))
                .count(),
            None => messages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ChannelMeta, ServerMeta};

    fn message(id: &str, channel: &str, user: &str, t: i64) -> MessageDocument {
        let mut msg = MessageDocument::new(id, channel, user, t);
        msg.m = Some(format!("message {id}"));
        msg
    }

    fn engine_with(count: usize) -> QueryEngine {
        let mut metadata = ArchiveMetadata::default();
        metadata
            .servers
            .insert("1".into(), ServerMeta::new("Guild", "server"));
        metadata
            .channels
            .insert("c1".into(), ChannelMeta::new("1", "general").with_position(0));
        metadata
            .channels
            .insert("c2".into(), ChannelMeta::new("1", "random").with_position(1));

        let mut messages = Vec::new();
        for i in 0..count {
            messages.push(message(&(1000 + i as i64).to_string(), "c1", "u1", i as i64));
        }
        messages.push(message("5", "c2", "u2", 1));

        let mut engine = QueryEngine::new();
        engine.load_archive(metadata, messages).unwrap();
        engine
    }

    #[test]
    fn test_select_channel_sorts_by_snowflake() {
        let mut engine = engine_with(3);
        engine.select_channel("c1");
        assert_eq!(engine.visible_messages(), ["1000", "1001", "1002"]);
        assert_eq!(engine.current_page(), 1);
    }

    #[test]
    fn test_snowflake_order_not_lexicographic() {
        let mut engine = QueryEngine::new();
        let mut metadata = ArchiveMetadata::default();
        metadata
            .channels
            .insert("c1".into(), ChannelMeta::new("1", "general"));
        let messages = vec![
            message("100", "c1", "u1", 3),
            message("9", "c1", "u1", 1),
            message("10", "c1", "u1", 2),
        ];
        engine.load_archive(metadata, messages).unwrap();
        engine.select_channel("c1");
        assert_eq!(engine.visible_messages(), ["9", "10", "100"]);
    }

    #[test]
    fn test_pagination_counts() {
        let mut engine = engine_with(120);
        engine.select_channel("c1");

        engine.set_page_size(50);
        assert_eq!(engine.page_count(), 3);
        engine.navigate(PageAction::Last);
        assert_eq!(engine.current_page(), 3);
        assert_eq!(engine.page_messages().len(), 20);

        engine.set_page_size(0);
        assert_eq!(engine.page_count(), 1);
        assert_eq!(engine.page_messages().len(), 120);
    }

    #[test]
    fn test_navigation_clamps() {
        let mut engine = engine_with(120);
        engine.select_channel("c1");
        engine.set_page_size(50);

        engine.navigate(PageAction::Previous);
        assert_eq!(engine.current_page(), 1);

        engine.navigate(PageAction::Jump(999));
        assert_eq!(engine.current_page(), 3);

        engine.navigate(PageAction::Next);
        assert_eq!(engine.current_page(), 3);

        engine.navigate(PageAction::First);
        assert_eq!(engine.current_page(), 1);
    }

    #[test]
    fn test_page_count_zero_before_selection() {
        let engine = engine_with(10);
        assert_eq!(engine.page_count(), 0);
        assert_eq!(engine.current_page(), 1);
        assert!(engine.page_messages().is_empty());
    }

    #[test]
    fn test_filter_recomputes_and_resets_page() {
        let mut engine = engine_with(120);
        engine.select_channel("c1");
        engine.set_page_size(50);
        engine.navigate(PageAction::Last);

        engine.set_filter(Some(MessageFilter::ByContents("message 100".into())));
        assert_eq!(engine.visible_messages().len(), 10); // 1000 and 1002..=1009 etc.
        assert_eq!(engine.current_page(), 1);
    }

    #[test]
    fn test_navigate_to_message_switches_channel() {
        let mut engine = engine_with(10);
        engine.select_channel("c1");
        engine.set_page_size(50);

        let location = engine.navigate_to_message("5").unwrap();
        assert_eq!(engine.selected_channel(), Some("c2"));
        assert_eq!(location.page, 1);
        assert_eq!(location.index_in_page, 0);
    }

    #[test]
    fn test_navigate_to_message_computes_page() {
        let mut engine = engine_with(120);
        engine.select_channel("c1");
        engine.set_page_size(50);

        // id 1100 is the 101st message -> index 100 -> page 3, slot 0
        let location = engine.navigate_to_message("1100").unwrap();
        assert_eq!(location, JumpLocation { page: 3, index_in_page: 0 });
        assert_eq!(engine.current_page(), 3);
    }

    #[test]
    fn test_navigate_to_hidden_message_is_not_found() {
        let mut engine = engine_with(10);
        engine.select_channel("c1");
        engine.set_page_size(50);
        engine.set_filter(Some(MessageFilter::WithImages));

        // same channel, so the selection must not move either
        assert!(engine.navigate_to_message("1003").is_none());
        assert_eq!(engine.selected_channel(), Some("c1"));
        assert_eq!(engine.current_page(), 1);
    }

    #[test]
    fn test_navigate_to_unknown_message_is_not_found() {
        let mut engine = engine_with(10);
        engine.select_channel("c1");
        assert!(engine.navigate_to_message("424242").is_none());
        assert_eq!(engine.selected_channel(), Some("c1"));
    }

    #[test]
    fn test_channel_list_counts_under_filter() {
        let mut engine = engine_with(10);
        let unfiltered = engine.channel_list();
        assert_eq!(unfiltered[0].id, "c1");
        assert_eq!(unfiltered[0].message_count, 10);
        assert_eq!(unfiltered[1].id, "c2");
        assert_eq!(unfiltered[1].message_count, 1);

        engine.set_filter(Some(MessageFilter::BySender("u2".into())));
        let filtered = engine.channel_list();
        assert_eq!(filtered[0].message_count, 0);
        assert_eq!(filtered[1].message_count, 1);
    }

    #[test]
    fn test_double_load_rejected() {
        let mut engine = engine_with(1);
        let err = engine
            .load_archive(ArchiveMetadata::default(), Vec::new())
            .unwrap_err();
        assert!(err.is_already_loaded());
    }
}
