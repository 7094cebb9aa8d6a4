//! Message filter predicates.
//!
//! Exactly one filter is active at a time in the query engine. Each variant
//! is a pure predicate over a [`MessageDocument`]; an absent text field is
//! treated as the empty string.

use regex::Regex;

use crate::archive::{Attachment, MessageDocument};
use crate::error::{ChatvaultError, Result};

/// URL extensions that classify an attachment as an image.
const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".gif", ".jpg", ".jpeg"];

/// One of the mutually exclusive message predicates.
#[derive(Debug, Clone)]
pub enum MessageFilter {
    /// Messages sent by this exact user id.
    BySender(String),

    /// Messages whose timestamp lies in the inclusive range.
    ByTimeRange { start: i64, end: i64 },

    /// Messages whose text contains the substring.
    ByContents(String),

    /// Messages whose text matches the regular expression.
    ByPattern(Regex),

    /// Messages with an image-typed embed or an image attachment.
    WithImages,

    /// Messages with at least one attachment that is not an image.
    WithDownloads,

    /// Messages with at least one embed.
    WithEmbeds,

    /// Messages with at least one attachment.
    WithAttachments,

    /// Edited messages: an edit timestamp, or the legacy flag bit.
    IsEdited,
}

impl MessageFilter {
    /// Builds a [`MessageFilter::ByPattern`] filter from a pattern string.
    ///
    /// # Errors
    ///
    /// Returns [`ChatvaultError::InvalidPattern`] when the pattern does not
    /// compile.
    pub fn by_pattern(pattern: &str) -> Result<Self> {
        match Regex::new(pattern) {
            Ok(regex) => Ok(MessageFilter::ByPattern(regex)),
            Err(source) => Err(ChatvaultError::invalid_pattern(pattern, source)),
        }
    }

    /// Applies the predicate to one message.
    pub fn matches(&self, message: &MessageDocument) -> bool {
        match self {
            MessageFilter::BySender(user) => message.u == *user,
            MessageFilter::ByTimeRange { start, end } => {
                message.t >= *start && message.t <= *end
            }
            MessageFilter::ByContents(substring) => message.text().contains(substring),
            MessageFilter::ByPattern(regex) => regex.is_match(message.text()),
            MessageFilter::WithImages => {
                let embed_image = message
                    .e
                    .as_deref()
                    .is_some_and(|embeds| embeds.iter().any(|raw| embed_is_image(raw)));
                let attachment_image = message
                    .a
                    .as_deref()
                    .is_some_and(|attachments| {
                        attachments.iter().any(is_image_attachment)
                    });
                embed_image || attachment_image
            }
            MessageFilter::WithDownloads => message.a.as_deref().is_some_and(|attachments| {
                attachments.iter().any(|a| !is_image_attachment(a))
            }),
            MessageFilter::WithEmbeds => message.e.as_deref().is_some_and(|e| !e.is_empty()),
            MessageFilter::WithAttachments => {
                message.a.as_deref().is_some_and(|a| !a.is_empty())
            }
            MessageFilter::IsEdited => message.is_edited(),
        }
    }
}

/// Returns `true` when the attachment's URL path ends in a known image
/// extension.
pub fn is_image_attachment(attachment: &Attachment) -> bool {
    let Some(path) = url_path(&attachment.url) else {
        return false;
    };
    let path = path.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Extracts the path component of a URL: everything between the host and any
/// query/fragment. Returns `None` for strings that do not look like URLs.
fn url_path(url: &str) -> Option<&str> {
    let rest = url.split_once("://")?.1;
    let path_start = rest.find('/')?;
    let path = &rest[path_start..];
    let end = path.find(['?', '#']).unwrap_or(path.len());
    Some(&path[..end])
}

/// Peeks at a raw embed payload and reports whether it is image-typed.
fn embed_is_image(raw: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|value| {
            value
                .get("type")
                .and_then(|t| t.as_str())
                .map(|t| t == "image")
        })
        .unwrap_or(false)
}
