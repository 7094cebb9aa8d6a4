//! The message text transform pipeline.
//!
//! Escaping comes first, unconditionally: every raw text field is HTML-
//! escaped before any other transform, so injected markup can never survive
//! a formatting rule. The formatting stages then run in a fixed order, each
//! on the previous stage's output:
//!
//! 1. no-embed URL wrappers unwrap to the bare URL
//! 2. escaped backticks become literal character entities
//! 3. fenced code blocks (optional language tag ignored, inner formatting
//!    characters re-escaped)
//! 4. inline code (a run of N backticks closed by exactly N)
//! 5. single and double escape sequences for formatting punctuation
//! 6. bold, underline, italic (both delimiters), strikethrough
//!
//! Independent of the formatting toggle: bare URLs auto-link, channel and
//! user mentions resolve against the metadata, and custom emoji render as
//! image references.

use regex::Regex;

use crate::archive::ArchiveMetadata;
use crate::viewer::settings::ViewerSettings;

/// Escapes text for the display markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const URL_CHARS: &str = r"[-A-Z0-9+&@#/%?=~_|!:,.;]*[-A-Z0-9+&@#/%=~_|]";

/// Compiled pattern table of the transform pipeline.
///
/// Mention and emoji patterns match the *escaped* form (`&lt;...&gt;`)
/// because they run after the escaping stage.
pub struct MarkupRenderer {
    url: Regex,
    url_no_embed: Regex,
    code_block: Regex,
    escaped_backtick: Regex,
    escaped_single: Regex,
    escaped_double: Regex,
    special: Regex,
    mention_user: Regex,
    mention_channel: Regex,
    emoji_static: Regex,
    emoji_animated: Regex,
}

impl Default for MarkupRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupRenderer {
    /// Compiles the pattern table.
    pub fn new() -> Self {
        Self {
            url: Regex::new(&format!(r"(?i)\b(?:https?|ftp|file)://{URL_CHARS}")).unwrap(),
            url_no_embed: Regex::new(&format!(
                r"(?i)&lt;((?:https?|ftp|file)://{URL_CHARS})&gt;"
            ))
            .unwrap(),
            code_block: Regex::new(r"(?s)```(?:([A-Za-z0-9_\-]+?)\n+)?\n*(.+?)\n*```").unwrap(),
            escaped_backtick: Regex::new(r"\\`").unwrap(),
            escaped_single: Regex::new(r"\\([*_\\])").unwrap(),
            escaped_double: Regex::new(r"\\__|_\\_|\\_\\_|\\~~|~\\~|\\~\\~").unwrap(),
            special: Regex::new(r"[*_~\\]").unwrap(),
            mention_user: Regex::new(r"&lt;@!?(\d+)&gt;").unwrap(),
            mention_channel: Regex::new(r"&lt;#(\d+)&gt;").unwrap(),
            emoji_static: Regex::new(r"&lt;:([^:]+):(\d+)&gt;").unwrap(),
            emoji_animated: Regex::new(r"&lt;a:([^:]+):(\d+)&gt;").unwrap(),
        }
    }

    /// Runs the full pipeline over one raw text field and wraps the result
    /// in a paragraph.
    pub fn render(
        &self,
        contents: &str,
        metadata: &ArchiveMetadata,
        settings: &ViewerSettings,
    ) -> String {
        let mut text = escape_html(contents);
        text = self.url_no_embed.replace_all(&text, "$1").into_owned();

        if settings.formatting {
            text = self
                .escaped_backtick
                .replace_all(&text, "&#96;")
                .into_owned();
            text = self
                .code_block
                .replace_all(&text, |caps: &regex::Captures<'_>| {
                    format!(
                        "<code class='block'>{}</code>",
                        self.escape_special(&caps[2])
                    )
                })
                .into_owned();
            text = self.replace_inline_code(&text);
            text = self
                .escaped_single
                .replace_all(&text, |caps: &regex::Captures<'_>| {
                    char_entity(caps[1].chars().next().unwrap())
                })
                .into_owned();
            text = self
                .escaped_double
                .replace_all(&text, |caps: &regex::Captures<'_>| {
                    caps[0]
                        .chars()
                        .filter(|&ch| ch != '\\')
                        .map(char_entity)
                        .collect::<String>()
                })
                .into_owned();
            text = apply_span(&text, "**", "<b>", "</b>", false);
            text = apply_span(&text, "__", "<u>", "</u>", false);
            text = apply_span(&text, "*", "<i>", "</i>", false);
            text = apply_span(&text, "_", "<i>", "</i>", true);
            text = apply_span(&text, "~~", "<s>", "</s>", false);
        }

        text = self
            .url
            .replace_all(&text, "<a href='$0' target='_blank' rel='noreferrer'>$0</a>")
            .into_owned();
        text = self
            .mention_channel
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                format!(
                    "<span class='link mention-chat'>#{}</span>",
                    channel_name(metadata, &caps[1])
                )
            })
            .into_owned();
        text = self
            .mention_user
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                format!(
                    "<span class='link mention-user' title='{}'>@{}</span>",
                    user_name(metadata, &caps[1]),
                    user_display_name(metadata, &caps[1])
                )
            })
            .into_owned();
        text = self
            .emoji_static
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                emoji_img(&caps[1], &caps[2], "webp")
            })
            .into_owned();
        text = self
            .emoji_animated
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                emoji_img(&caps[1], &caps[2], settings.emoji_extension(true))
            })
            .into_owned();

        format!("<p>{text}</p>")
    }

    /// Entity-escapes formatting punctuation inside code spans so later
    /// stages cannot transform it.
    fn escape_special(&self, code: &str) -> String {
        self.special
            .replace_all(code, |caps: &regex::Captures<'_>| {
                char_entity(caps[0].chars().next().unwrap())
            })
            .into_owned()
    }

    /// Inline code: an opening run of N backticks closed by the next run of
    /// exactly N (not followed by another backtick), content non-empty and
    /// trimmed of surrounding whitespace.
    ///
    /// Hand-rolled because the closing run must repeat the opening run's
    /// length, which a backreference-free regex cannot express.
    fn replace_inline_code(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;

        while i < chars.len() {
            if chars[i] != '`' {
                out.push(chars[i]);
                i += 1;
                continue;
            }

            let open = run_length(&chars, i);
            let mut close = None;
            let mut j = i + open;
            while j < chars.len() {
                if chars[j] == '`' {
                    let run = run_length(&chars, j);
                    if run == open && j > i + open {
                        close = Some(j);
                        break;
                    }
                    j += run;
                } else {
                    j += 1;
                }
            }

            match close {
                Some(j) => {
                    let content: String = chars[i + open..j].iter().collect();
                    let trimmed = content.trim();
                    if trimmed.is_empty() {
                        // whitespace-only spans stay as typed
                        out.extend(&chars[i..j + open]);
                    } else {
                        out.push_str("<code class='inline'>");
                        out.push_str(&self.escape_special(trimmed));
                        out.push_str("</code>");
                    }
                    i = j + open;
                }
                None => {
                    out.extend(&chars[i..i + open]);
                    i += open;
                }
            }
        }
        out
    }
}

fn run_length(chars: &[char], start: usize) -> usize {
    chars[start..].iter().take_while(|&&ch| ch == '`').count()
}

fn char_entity(ch: char) -> String {
    format!("&#{};", ch as u32)
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Wraps delimited spans: an opening `delim` closed by the nearest `delim`
/// with non-empty content, where the closer is not followed by the delimiter
/// character. With `word_boundary`, the closer must additionally sit at a
/// word boundary (the underscore italic rule, so identifiers like
/// `some_var_name` stay intact).
fn apply_span(text: &str, delim: &str, open: &str, close: &str, word_boundary: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let delim_chars: Vec<char> = delim.chars().collect();
    let d = delim_chars.len();
    let marker = delim_chars[0];
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    let matches_at = |pos: usize| -> bool {
        chars.len() >= pos + d && chars[pos..pos + d] == delim_chars[..]
    };

    while i < chars.len() {
        if !matches_at(i) {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let mut found = None;
        let mut j = i + d + 1; // content is at least one character
        while j + d <= chars.len() {
            if matches_at(j) {
                let after = j + d;
                let followed_by_marker = chars.get(after) == Some(&marker);
                let boundary_ok = !word_boundary
                    || chars.get(after).is_none_or(|&ch| !is_word_char(ch));
                if !followed_by_marker && boundary_ok {
                    found = Some(j);
                    break;
                }
            }
            j += 1;
        }

        match found {
            Some(j) => {
                let content: String = chars[i + d..j].iter().collect();
                out.push_str(open);
                out.push_str(&content);
                out.push_str(close);
                i = j + d;
            }
            None => {
                out.push(chars[i]);
                i += 1;
            }
        }
    }
    out
}

fn channel_name<'a>(metadata: &'a ArchiveMetadata, id: &'a str) -> &'a str {
    metadata
        .channels
        .get(id)
        .map(|channel| channel.name.as_str())
        .unwrap_or(id)
}

fn user_name<'a>(metadata: &'a ArchiveMetadata, id: &'a str) -> &'a str {
    metadata
        .users
        .get(id)
        .map(|user| user.name.as_str())
        .unwrap_or(id)
}

fn user_display_name<'a>(metadata: &'a ArchiveMetadata, id: &'a str) -> &'a str {
    metadata
        .users
        .get(id)
        .map(|user| user.shown_name())
        .unwrap_or(id)
}

/// An inline custom-emoji image reference.
pub fn emoji_img(name: &str, id: &str, extension: &str) -> String {
    let tag = format!(":{name}:");
    format!(
        "<img src='https://cdn.discordapp.com/emojis/{id}.{extension}' \
         alt='{tag}' title='{tag}' class='emoji'>"
    )
}
