//! The compact per-message document and its record stream.
//!
//! Every message becomes one JSON object on one line of the message record
//! stream. Field names are deliberately short - the stream dominates archive
//! size:
//!
//! | Field | Contents |
//! |-------|----------|
//! | `id`  | message id (decimal snowflake string) |
//! | `c`   | channel id |
//! | `u`   | sender user id |
//! | `t`   | timestamp, milliseconds |
//! | `m`   | text, subject to the omission rule below |
//! | `a`   | attachments |
//! | `e`   | raw embed payloads (opaque JSON strings) |
//! | `te`  | edit timestamp, milliseconds |
//! | `re`  | reactions |
//! | `r`   | replied-to message id |
//! | `f`   | legacy flags (accepted on input, never produced) |
//!
//! # Text omission rule
//!
//! `m` is omitted when the text is empty *and* the message carries at least
//! one attachment or embed; otherwise it is present, possibly as `""`. An
//! attachment-only message therefore has no `m` at all, while a genuinely
//! empty message keeps an explicit empty string.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Source URL.
    pub url: String,

    /// Display name of the file.
    pub name: String,

    /// Pixel width; present only together with `height`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub width: Option<u32>,

    /// Pixel height; present only together with `width`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub height: Option<u32>,
}

impl Attachment {
    /// Creates an attachment without dimensions.
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            width: None,
            height: None,
        }
    }

    /// Builder method to set both dimensions.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// An emoji reaction with its count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Emoji display name; the literal glyph for unicode emoji.
    pub n: String,

    /// Animated custom emoji flag.
    pub a: bool,

    /// Number of users who reacted.
    pub c: u64,

    /// Custom emoji id; absent for standard unicode emoji.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub id: Option<String>,
}

/// One message of the archive, in wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDocument {
    /// Message id. Unique within its channel.
    pub id: String,

    /// Id of the channel the message was posted in.
    pub c: String,

    /// Id of the sending user.
    pub u: String,

    /// Timestamp in milliseconds.
    pub t: i64,

    /// Message text; see the module docs for the omission rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub m: Option<String>,

    /// Attachments, in upload order.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub a: Option<Vec<Attachment>>,

    /// Raw embed payloads, carried as opaque JSON strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub e: Option<Vec<String>>,

    /// Edit timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub te: Option<i64>,

    /// Reactions.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub re: Option<Vec<Reaction>>,

    /// Id of the message this one replies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub r: Option<String>,

    /// Legacy flags bitfield. Older archives marked edited messages with bit
    /// 0 here instead of carrying `te`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub f: Option<u64>,
}

impl MessageDocument {
    /// Creates a bare message document with only the required fields.
    pub fn new(
        id: impl Into<String>,
        channel: impl Into<String>,
        user: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            c: channel.into(),
            u: user.into(),
            t: timestamp,
            m: None,
            a: None,
            e: None,
            te: None,
            re: None,
            r: None,
            f: None,
        }
    }

    /// Applies the text omission rule and sets `m` accordingly.
    ///
    /// Call after attachments and embeds have been assigned.
    pub fn set_text(&mut self, text: Option<String>) {
        let text = text.unwrap_or_default();
        if text.is_empty() && (self.a.is_some() || self.e.is_some()) {
            self.m = None;
        } else {
            self.m = Some(text);
        }
    }

    /// The message text, with an absent field reading as empty.
    pub fn text(&self) -> &str {
        self.m.as_deref().unwrap_or("")
    }

    /// Returns `true` if the message was edited.
    ///
    /// Prefers the edit timestamp; legacy documents without it are probed via
    /// flags bit 0.
    pub fn is_edited(&self) -> bool {
        match self.te {
            Some(_) => true,
            None => self.f.is_some_and(|flags| flags & 1 == 1),
        }
    }

    /// Serializes this document as one compact record line.
    pub fn to_record(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parses a message record stream: one JSON document per line, blank lines
/// skipped.
///
/// Any malformed line fails the whole parse; a partially-loaded archive is
/// never produced.
pub fn parse_message_stream(stream: &str) -> Result<Vec<MessageDocument>> {
    let mut messages = Vec::new();
    for line in stream.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        messages.push(serde_json::from_str(line)?);
    }
    Ok(messages)
}
