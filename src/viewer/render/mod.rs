//! Safe display rendering of messages.
//!
//! - [`markup`] - the escape-first text transform pipeline
//! - [`message`] - tagged sub-record views (embed, attachment, reply,
//!   reaction) and the per-message assembly

pub mod markup;
pub mod message;

pub use markup::{MarkupRenderer, escape_html};
pub use message::{
    AttachmentView, EmbedImage, EmbedView, MessageRenderer, ReplyView, classify_attachment,
    classify_embed, resolve_reply,
};
