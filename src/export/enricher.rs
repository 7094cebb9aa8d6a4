//! Per-message enrichment: one relational row plus its satellite relations
//! become one compact document.
//!
//! Enrichment is a pure function of the row: it issues at most five point
//! lookups keyed by message id (attachments, embeds, edit timestamp,
//! reactions, reply target) and shapes the result per the document model. An
//! absent lookup result maps to an omitted field; a failed lookup is fatal to
//! the whole export run.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::archive::{Attachment, MessageDocument, Reaction};
use crate::error::Result;
use crate::export::reader::MessageRow;

/// Flattens message rows against one owned store connection.
///
/// The connection is acquired once, when the enricher is created, and held
/// for the enricher's entire lifetime: the source store does not support
/// interleaving one connection across threads, so each pipeline worker gets
/// its own enricher.
pub struct MessageEnricher {
    conn: Connection,
}

impl MessageEnricher {
    /// Opens a dedicated read-only connection to the source store.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Wraps an existing connection; used by tests on in-memory stores.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Produces the document for one message row.
    pub fn enrich(&self, row: &MessageRow) -> Result<MessageDocument> {
        let mut doc = MessageDocument::new(&row.id, &row.channel, &row.sender, row.timestamp);

        doc.a = self.attachments(&row.id)?;
        doc.e = self.embeds(&row.id)?;
        doc.te = self.edit_timestamp(&row.id)?;
        doc.re = self.reactions(&row.id)?;
        doc.r = self.reply_target(&row.id)?;
        doc.set_text(row.text.clone());

        Ok(doc)
    }

    fn attachments(&self, message_id: &str) -> Result<Option<Vec<Attachment>>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT a.name, a.download_url, a.width, a.height \
             FROM message_attachments ma \
             JOIN attachments a ON ma.attachment_id = a.attachment_id \
             WHERE ma.message_id = ?1",
        )?;
        let rows = stmt.query_map([message_id], |row| {
            let mut attachment =
                Attachment::new(row.get::<_, String>(1)?, row.get::<_, String>(0)?);
            let width: Option<u32> = row.get(2)?;
            let height: Option<u32> = row.get(3)?;
            // dimensions are emitted only as a meaningful pair
            if let (Some(w), Some(h)) = (width, height) {
                if w != 0 && h != 0 {
                    attachment = attachment.with_size(w, h);
                }
            }
            Ok(attachment)
        })?;

        let mut attachments = Vec::new();
        for row in rows {
            attachments.push(row?);
        }
        Ok((!attachments.is_empty()).then_some(attachments))
    }

    fn embeds(&self, message_id: &str) -> Result<Option<Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT json FROM message_embeds WHERE message_id = ?1")?;
        let rows = stmt.query_map([message_id], |row| row.get::<_, String>(0))?;

        let mut embeds = Vec::new();
        for row in rows {
            embeds.push(row?);
        }
        Ok((!embeds.is_empty()).then_some(embeds))
    }

    fn edit_timestamp(&self, message_id: &str) -> Result<Option<i64>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT edit_timestamp FROM message_edit_timestamps WHERE message_id = ?1",
        )?;
        let mut rows = stmt.query([message_id])?;
        match rows.next()? {
            Some(row) => {
                let ts: i64 = row.get(0)?;
                // a zero edit timestamp means "never edited" in older stores
                Ok((ts != 0).then_some(ts))
            }
            None => Ok(None),
        }
    }

    fn reactions(&self, message_id: &str) -> Result<Option<Vec<Reaction>>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT emoji_id, emoji_name, emoji_flags, count \
             FROM message_reactions WHERE message_id = ?1",
        )?;
        let rows = stmt.query_map([message_id], |row| {
            let emoji_id: Option<i64> = row.get(0)?;
            Ok(Reaction {
                n: row.get(1)?,
                a: row.get::<_, i64>(2)? != 0,
                c: row.get(3)?,
                id: emoji_id.filter(|&id| id != 0).map(|id| id.to_string()),
            })
        })?;

        let mut reactions = Vec::new();
        for row in rows {
            reactions.push(row?);
        }
        Ok((!reactions.is_empty()).then_some(reactions))
    }

    fn reply_target(&self, message_id: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT replied_to_id FROM message_replied_to WHERE message_id = ?1")?;
        let mut rows = stmt.query([message_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get::<_, i64>(0)?.to_string())),
            None => Ok(None),
        }
    }
}
