//! The shared document model of an exported archive.
//!
//! An archive is a pair of documents:
//! - [`ArchiveMetadata`] - one JSON object with `users`, `servers` and
//!   `channels` maps
//! - a message record stream - one compact JSON object per line, see
//!   [`MessageDocument`]
//!
//! Both the export pipeline and the viewer engine speak this model; nothing
//! else crosses the boundary between them.

pub mod message;
pub mod metadata;
pub mod snowflake;

pub use message::{Attachment, MessageDocument, Reaction, parse_message_stream};
pub use metadata::{ArchiveMetadata, ChannelMeta, ServerMeta, UserMeta};
pub use snowflake::compare_snowflakes;
