//! Rendering of messages and their sub-records.
//!
//! Every sub-record kind (embed, attachment, reply, reaction) is first
//! classified into a tagged view enum and then rendered by matching that
//! enum exhaustively. No string-keyed template dispatch: adding a variant
//! without a render arm is a compile error.

use chrono::DateTime;

use crate::archive::{ArchiveMetadata, Attachment, MessageDocument, Reaction, UserMeta};
use crate::viewer::filter::is_image_attachment;
use crate::viewer::render::markup::{MarkupRenderer, escape_html};
use crate::viewer::settings::ViewerSettings;
use crate::viewer::store::DocumentStore;

/// Placeholder shown for ids that resolve to nothing.
const UNKNOWN_USER: &str = "<unknown>";

/// Image payload of an embed: the source URL plus optional dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedImage {
    pub url: String,
    pub width: Option<u64>,
    pub height: Option<u64>,
}

/// What an opaque embed payload turned out to be. First matching case wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedView {
    /// No `url` field, or a payload that does not parse at all.
    Unsupported,
    /// An `image` or `thumbnail` sub-record with its own URL.
    Image { url: String, image: EmbedImage },
    /// A rich card with a title and optionally a description.
    Rich {
        url: String,
        title: String,
        description: Option<String>,
    },
    /// Nothing but a link.
    Link { url: String },
}

/// Classifies one raw embed payload.
pub fn classify_embed(raw: &str) -> EmbedView {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return EmbedView::Unsupported;
    };
    let Some(url) = value.get("url").and_then(|u| u.as_str()) else {
        return EmbedView::Unsupported;
    };
    let url = url.to_string();

    for key in ["image", "thumbnail"] {
        if let Some(image) = value.get(key) {
            if let Some(src) = image.get("url").and_then(|u| u.as_str()) {
                return EmbedView::Image {
                    url,
                    image: EmbedImage {
                        url: src.to_string(),
                        width: image.get("width").and_then(|w| w.as_u64()),
                        height: image.get("height").and_then(|h| h.as_u64()),
                    },
                };
            }
        }
    }

    match (
        value.get("title").and_then(|t| t.as_str()),
        value.get("description").and_then(|d| d.as_str()),
    ) {
        (Some(title), Some(description)) => EmbedView::Rich {
            url,
            title: title.to_string(),
            description: Some(description.to_string()),
        },
        (Some(title), None) => EmbedView::Rich {
            url,
            title: title.to_string(),
            description: None,
        },
        (None, _) => EmbedView::Link { url },
    }
}

/// How an attachment should be presented under the given settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentView<'a> {
    /// Inline image thumbnail.
    Image(&'a Attachment),
    /// Download link; also the fallback when image previews are off.
    Download(&'a Attachment),
}

/// Classifies one attachment.
pub fn classify_attachment<'a>(
    attachment: &'a Attachment,
    settings: &ViewerSettings,
) -> AttachmentView<'a> {
    if settings.image_previews && is_image_attachment(attachment) {
        AttachmentView::Image(attachment)
    } else {
        AttachmentView::Download(attachment)
    }
}

/// The reply state of a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplyView<'a> {
    /// The message is not a reply; renders as nothing.
    NoReply,
    /// The message replies to something the archive does not contain;
    /// renders an explicit placeholder, distinguishable from `NoReply`.
    UnknownTarget,
    /// The target resolved.
    Resolved {
        id: &'a str,
        target: &'a MessageDocument,
    },
}

/// Resolves the reply reference of a message against the store.
pub fn resolve_reply<'a>(
    message: &'a MessageDocument,
    store: &'a DocumentStore,
) -> ReplyView<'a> {
    match message.r.as_deref() {
        None => ReplyView::NoReply,
        Some(id) => match store.find_message(id) {
            Some(target) => ReplyView::Resolved { id, target },
            None => ReplyView::UnknownTarget,
        },
    }
}

/// Renders messages into display markup.
pub struct MessageRenderer {
    markup: MarkupRenderer,
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRenderer {
    pub fn new() -> Self {
        Self {
            markup: MarkupRenderer::new(),
        }
    }

    /// Renders message text through the full markup pipeline.
    pub fn render_contents(
        &self,
        contents: &str,
        metadata: &ArchiveMetadata,
        settings: &ViewerSettings,
    ) -> String {
        self.markup.render(contents, metadata, settings)
    }

    /// Renders one embed payload; first matching case wins.
    pub fn render_embed(&self, raw: &str, settings: &ViewerSettings) -> String {
        match classify_embed(raw) {
            EmbedView::Unsupported => {
                "<div class='embed download'><p>(Unsupported embed)</p></div>".to_string()
            }
            EmbedView::Image { url, image } => {
                image_thumbnail(&url, &image.url, image.width, image.height, settings)
            }
            EmbedView::Rich {
                url,
                title,
                description,
            } => {
                let mut html = format!(
                    "<div class='embed download'><a href='{}' class='title'>{}</a>",
                    escape_html(&url),
                    escape_html(&title)
                );
                if let Some(description) = description {
                    html.push_str(&format!(
                        "<p class='desc'>{}</p>",
                        escape_html(&description)
                    ));
                }
                html.push_str("</div>");
                html
            }
            EmbedView::Link { url } => {
                let url = escape_html(&url);
                format!("<a href='{url}' class='embed download'>{url}</a>")
            }
        }
    }

    /// Renders one attachment.
    pub fn render_attachment(&self, attachment: &Attachment, settings: &ViewerSettings) -> String {
        match classify_attachment(attachment, settings) {
            AttachmentView::Image(attachment) => {
                let width = attachment.width.map(u64::from);
                let height = attachment.height.map(u64::from);
                image_thumbnail(&attachment.url, &attachment.url, width, height, settings)
            }
            AttachmentView::Download(attachment) => format!(
                "<a href='{}' class='embed download'>Download {}</a>",
                escape_html(&attachment.url),
                escape_html(&attachment.name)
            ),
        }
    }

    /// Renders one reaction.
    pub fn render_reaction(&self, reaction: &Reaction, settings: &ViewerSettings) -> String {
        let name = escape_html(&reaction.n);
        match reaction.id.as_deref() {
            Some(id) => {
                let extension = settings.emoji_extension(reaction.a);
                format!(
                    "<span class='reaction-wrapper'>\
                     <img src='https://cdn.discordapp.com/emojis/{id}.{extension}' \
                     alt=':{name}:' title=':{name}:' class='reaction-emoji-custom'>\
                     <span class='count'>{}</span></span>",
                    reaction.c
                )
            }
            None => format!(
                "<span class='reaction-wrapper'><span class='reaction-emoji'>{name}</span>\
                 <span class='count'>{}</span></span>",
                reaction.c
            ),
        }
    }

    /// Renders the reply line of a message.
    pub fn render_reply(
        &self,
        view: ReplyView<'_>,
        metadata: &ArchiveMetadata,
        settings: &ViewerSettings,
    ) -> String {
        match view {
            ReplyView::NoReply => String::new(),
            ReplyView::UnknownTarget => {
                "<span class='reply-contents reply-missing'>(replies to an unknown message)</span>"
                    .to_string()
            }
            ReplyView::Resolved { id, target } => {
                let author = author_of(metadata, &target.u);
                let avatar = if settings.user_avatars {
                    avatar_img(&target.u, author.avatar.as_deref())
                        .map(|img| format!("<span class='reply-avatar'>{img}</span>"))
                        .unwrap_or_default()
                } else {
                    String::new()
                };
                let username = format!(
                    "<span class='reply-username' title='{}'>{}</span>",
                    escape_html(&author.name),
                    escape_html(author.shown_name())
                );
                let contents = if target.text().is_empty() {
                    String::new()
                } else {
                    format!(
                        "<span class='reply-contents'>{}</span>",
                        self.render_contents(target.text(), metadata, settings)
                    )
                };
                format!(
                    "<span class='jump' data-jump='{id}'>Jump to reply</span>\
                     <span class='user'>{avatar}{username}</span>{contents}"
                )
            }
        }
    }

    /// Renders one complete message view.
    ///
    /// `show_jump` adds the jump-to-message affordance; the query layer
    /// enables it while a filter is active.
    pub fn render_message(
        &self,
        message: &MessageDocument,
        store: &DocumentStore,
        settings: &ViewerSettings,
        show_jump: bool,
    ) -> String {
        let empty = ArchiveMetadata::default();
        let metadata = store.metadata().unwrap_or(&empty);
        let author = author_of(metadata, &message.u);

        let mut header = format!(
            "<h2><strong class='username' title='{}'>{}</strong>\
             <span class='info time'>{}</span>",
            escape_html(&author.name),
            escape_html(author.shown_name()),
            format_time(message.t)
        );
        if let Some(edited) = message.te {
            header.push_str(&format!(
                "<span class='info edited'>Edited {}</span>",
                format_time(edited)
            ));
        }
        if show_jump {
            header.push_str(&format!(
                "<span class='info jump' data-jump='{}'>Jump to message</span>",
                message.id
            ));
        }
        header.push_str("</h2>");

        let mut body = String::new();
        if !message.text().is_empty() {
            body.push_str(&self.render_contents(message.text(), metadata, settings));
        }
        for raw in message.e.as_deref().unwrap_or_default() {
            body.push_str(&self.render_embed(raw, settings));
        }
        for attachment in message.a.as_deref().unwrap_or_default() {
            body.push_str(&self.render_attachment(attachment, settings));
        }

        let reactions = match message.re.as_deref() {
            None | Some([]) => String::new(),
            Some(reactions) => {
                let inner: String = reactions
                    .iter()
                    .map(|reaction| self.render_reaction(reaction, settings))
                    .collect();
                format!("<div class='reactions'>{inner}</div>")
            }
        };

        let reply = self.render_reply(resolve_reply(message, store), metadata, settings);

        if settings.user_avatars {
            let avatar = avatar_img(&message.u, author.avatar.as_deref()).unwrap_or_default();
            format!(
                "<div><div class='reply-message reply-message-with-avatar'>{reply}</div>\
                 <div class='avatar-wrapper'><div class='avatar'>{avatar}</div>\
                 <div>{header}<div class='message'>{body}</div>{reactions}</div>\
                 </div></div>"
            )
        } else {
            format!(
                "<div><div class='reply-message'>{reply}</div>\
                 {header}<div class='message'>{body}</div>{reactions}</div>"
            )
        }
    }
}

fn author_of(metadata: &ArchiveMetadata, user_id: &str) -> UserMeta {
    metadata
        .users
        .get(user_id)
        .cloned()
        .unwrap_or_else(|| UserMeta::new(UNKNOWN_USER))
}

/// Avatar image reference. A bare value is treated as an avatar path on the
/// CDN; values that are already URLs pass through untouched.
fn avatar_img(user_id: &str, avatar: Option<&str>) -> Option<String> {
    let avatar = avatar?;
    let src = if avatar.contains("://") {
        avatar.to_string()
    } else {
        format!("https://cdn.discordapp.com/avatars/{user_id}/{avatar}.webp")
    };
    Some(format!("<img src='{}' alt=''>", escape_html(&src)))
}

fn image_thumbnail(
    href: &str,
    src: &str,
    width: Option<u64>,
    height: Option<u64>,
    settings: &ViewerSettings,
) -> String {
    if !settings.image_previews {
        return String::new();
    }
    let href = escape_html(href);
    let src = escape_html(src);
    match (width, height) {
        (Some(width), Some(height)) => format!(
            "<a href='{href}' class='embed thumbnail'>\
             <img src='{src}' width='{width}' height='{height}' alt=''></a><br>"
        ),
        _ => format!(
            "<a href='{href}' class='embed thumbnail'><img src='{src}' alt=''></a><br>"
        ),
    }
}

/// Human-readable timestamp; the raw millisecond value for out-of-range
/// inputs.
fn format_time(timestamp_ms: i64) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp_ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveMetadata;

    fn renderer() -> MessageRenderer {
        MessageRenderer::new()
    }

    fn settings() -> ViewerSettings {
        ViewerSettings::new()
    }

    // =========================================================================
    // Embeds
    // =========================================================================

    #[test]
    fn test_embed_without_url_is_unsupported() {
        let html = renderer().render_embed(r#"{"title":"x"}"#, &settings());
        assert!(html.contains("(Unsupported embed)"));

        let html = renderer().render_embed("not json", &settings());
        assert!(html.contains("(Unsupported embed)"));
    }

    #[test]
    fn test_embed_image_beats_rich_card() {
        let raw = r#"{"url":"https://x/page","title":"t","image":{"url":"https://x/i.png","width":100,"height":50}}"#;
        assert_eq!(
            classify_embed(raw),
            EmbedView::Image {
                url: "https://x/page".into(),
                image: EmbedImage {
                    url: "https://x/i.png".into(),
                    width: Some(100),
                    height: Some(50),
                },
            }
        );
        let html = renderer().render_embed(raw, &settings());
        assert!(html.contains("width='100' height='50'"));
    }

    #[test]
    fn test_embed_thumbnail_fallback() {
        let raw = r#"{"url":"https://x/page","thumbnail":{"url":"https://x/t.png"}}"#;
        let html = renderer().render_embed(raw, &settings());
        assert!(html.contains("src='https://x/t.png'"));
        assert!(!html.contains("width="));
    }

    #[test]
    fn test_embed_image_gated_by_previews() {
        let raw = r#"{"url":"https://x/page","image":{"url":"https://x/i.png"}}"#;
        let html = renderer().render_embed(raw, &settings().with_image_previews(false));
        assert_eq!(html, "");
    }

    #[test]
    fn test_embed_rich_card_variants() {
        let both = r#"{"url":"https://x","title":"Title","description":"Desc"}"#;
        let html = renderer().render_embed(both, &settings());
        assert!(html.contains("class='title'>Title</a>"));
        assert!(html.contains("<p class='desc'>Desc</p>"));

        let title_only = r#"{"url":"https://x","title":"Title"}"#;
        let html = renderer().render_embed(title_only, &settings());
        assert!(html.contains("class='title'>Title</a>"));
        assert!(!html.contains("class='desc'"));
    }

    #[test]
    fn test_embed_bare_link() {
        let html = renderer().render_embed(r#"{"url":"https://x/y"}"#, &settings());
        assert_eq!(
            html,
            "<a href='https://x/y' class='embed download'>https://x/y</a>"
        );
    }

    // =========================================================================
    // Attachments
    // =========================================================================

    #[test]
    fn test_attachment_image_inline_with_size() {
        let attachment = Attachment::new("https://x/pic.png", "pic.png").with_size(640, 480);
        let html = renderer().render_attachment(&attachment, &settings());
        assert!(html.contains("class='embed thumbnail'"));
        assert!(html.contains("width='640' height='480'"));
    }

    #[test]
    fn test_attachment_image_previews_off_degrades_to_download() {
        let attachment = Attachment::new("https://x/pic.png", "pic.png");
        let html = renderer().render_attachment(&attachment, &settings().with_image_previews(false));
        assert_eq!(
            html,
            "<a href='https://x/pic.png' class='embed download'>Download pic.png</a>"
        );
    }

    #[test]
    fn test_attachment_non_image_always_downloads() {
        let attachment = Attachment::new("https://x/data.zip", "data.zip");
        let html = renderer().render_attachment(&attachment, &settings());
        assert!(html.contains(">Download data.zip</a>"));
    }

    // =========================================================================
    // Reactions
    // =========================================================================

    #[test]
    fn test_reaction_standard_glyph_and_count() {
        let reaction = Reaction {
            n: "👍".into(),
            a: false,
            c: 7,
            id: None,
        };
        let html = renderer().render_reaction(&reaction, &settings());
        assert!(html.contains("<span class='reaction-emoji'>👍</span>"));
        assert!(html.contains("<span class='count'>7</span>"));
    }

    #[test]
    fn test_reaction_custom_emoji_format_follows_setting() {
        let reaction = Reaction {
            n: "party".into(),
            a: true,
            c: 2,
            id: Some("999".into()),
        };
        let animated = renderer().render_reaction(&reaction, &settings());
        assert!(animated.contains("emojis/999.gif"));

        let stills = renderer().render_reaction(&reaction, &settings().with_animated_emoji(false));
        assert!(stills.contains("emojis/999.webp"));
    }

    // =========================================================================
    // Replies
    // =========================================================================

    fn store_with_reply() -> DocumentStore {
        let mut store = DocumentStore::new();
        let mut target = MessageDocument::new("1", "c1", "u1", 1000);
        target.m = Some("original words".into());
        let mut reply = MessageDocument::new("2", "c1", "u2", 2000);
        reply.r = Some("1".into());
        let mut dangling = MessageDocument::new("3", "c1", "u2", 3000);
        dangling.r = Some("404".into());
        store
            .load(ArchiveMetadata::default(), vec![target, reply, dangling])
            .unwrap();
        store
    }

    #[test]
    fn test_reply_states_are_distinct() {
        let store = store_with_reply();
        let metadata = ArchiveMetadata::default();

        let plain = MessageDocument::new("9", "c1", "u1", 1);
        assert_eq!(resolve_reply(&plain, &store), ReplyView::NoReply);
        let html = renderer().render_reply(ReplyView::NoReply, &metadata, &settings());
        assert_eq!(html, "");

        let dangling = store.find_message("3").unwrap();
        assert_eq!(resolve_reply(dangling, &store), ReplyView::UnknownTarget);
        let html = renderer().render_reply(ReplyView::UnknownTarget, &metadata, &settings());
        assert!(html.contains("replies to an unknown message"));
    }

    #[test]
    fn test_reply_resolved_renders_jump_author_and_contents() {
        let store = store_with_reply();
        let metadata = ArchiveMetadata::default();
        let reply = store.find_message("2").unwrap();
        let view = resolve_reply(reply, &store);
        let html = renderer().render_reply(view, &metadata, &settings());
        assert!(html.contains("data-jump='1'>Jump to reply</span>"));
        // author u1 is not in the metadata: fixed placeholder, escaped
        assert!(html.contains("&lt;unknown&gt;"));
        assert!(html.contains("original words"));
    }

    // =========================================================================
    // Full message view
    // =========================================================================

    #[test]
    fn test_message_view_jump_gated_by_filter_flag() {
        let store = store_with_reply();
        let message = store.find_message("1").unwrap();
        let with_jump = renderer().render_message(message, &store, &settings(), true);
        assert!(with_jump.contains("data-jump='1'>Jump to message"));

        let without = renderer().render_message(message, &store, &settings(), false);
        assert!(!without.contains("Jump to message"));
    }

    #[test]
    fn test_message_view_avatar_variants() {
        let store = store_with_reply();
        let message = store.find_message("1").unwrap();
        let with_avatar = renderer().render_message(message, &store, &settings(), false);
        assert!(with_avatar.contains("avatar-wrapper"));

        let bare =
            renderer().render_message(message, &store, &settings().with_user_avatars(false), false);
        assert!(!bare.contains("avatar-wrapper"));
    }

    #[test]
    fn test_message_view_edit_marker() {
        let store = {
            let mut store = DocumentStore::new();
            let mut message = MessageDocument::new("1", "c1", "u1", 1_700_000_000_000);
            message.m = Some("x".into());
            message.te = Some(1_700_000_100_000);
            store.load(ArchiveMetadata::default(), vec![message]).unwrap();
            store
        };
        let message = store.find_message("1").unwrap();
        let html = renderer().render_message(message, &store, &settings(), false);
        assert!(html.contains("class='info edited'>Edited "));
    }
}
