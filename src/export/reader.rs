//! Bulk reads against the relational source store.
//!
//! The reader issues four one-shot queries: users, servers and channels as
//! complete unordered collections, and all message rows ordered ascending by
//! timestamp. Any failure to open or read the store is fatal and surfaces
//! before a single byte of archive output exists - partial metadata is never
//! returned.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::archive::{ArchiveMetadata, ChannelMeta, ServerMeta, UserMeta};
use crate::error::Result;

/// Row counts of the main source tables, for the CLI banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub servers: u64,
    pub channels: u64,
    pub messages: u64,
}

/// One raw message row, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    /// Message id, as a decimal string.
    pub id: String,
    /// Sending user id.
    pub sender: String,
    /// Owning channel id.
    pub channel: String,
    /// Raw text; `None` when the column is NULL.
    pub text: Option<String>,
    /// Timestamp in milliseconds.
    pub timestamp: i64,
}

/// Read access to the relational source store.
pub struct SourceReader {
    conn: Connection,
}

impl SourceReader {
    /// Opens the source store read-only.
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

    /// Returns the row counts of the servers, channels and messages tables.
    pub fn counts(&self) -> Result<TableCounts> {
        let count = |table: &str| -> Result<u64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
        };
        Ok(TableCounts {
            servers: count("servers")?,
            channels: count("channels")?,
            messages: count("messages")?,
        })
    }

    /// Fetches the complete metadata document: all users, servers and
    /// channels.
    pub fn fetch_metadata(&self) -> Result<ArchiveMetadata> {
        let mut metadata = ArchiveMetadata::default();

        let mut stmt = self
            .conn
            .prepare("SELECT id, name, display_name, avatar_url FROM users")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let mut user = UserMeta::new(row.get::<_, String>(1)?);
            user.display_name = row.get::<_, Option<String>>(2)?.filter(|s| !s.is_empty());
            user.avatar = row.get::<_, Option<String>>(3)?;
            metadata.users.insert(id.to_string(), user);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT id, name, type, icon_hash FROM servers")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let kind: String = row.get(2)?;
            let mut server = ServerMeta::new(row.get::<_, String>(1)?, kind.to_lowercase());
            if let Some(hash) = row.get::<_, Option<String>>(3)? {
                server.icon_url = Some(format!(
                    "https://cdn.discordapp.com/icons/{id}/{hash}.webp"
                ));
            }
            metadata.servers.insert(id.to_string(), server);
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, server, name, parent_id, position, topic, nsfw FROM channels",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let server: i64 = row.get(1)?;
            let mut channel = ChannelMeta::new(server.to_string(), row.get::<_, String>(2)?);
            channel.parent = row.get::<_, Option<i64>>(3)?.map(|p| p.to_string());
            channel.position = row.get(4)?;
            channel.topic = row.get::<_, Option<String>>(5)?.filter(|s| !s.is_empty());
            channel.nsfw = match row.get::<_, Option<i64>>(6)? {
                Some(n) if n != 0 => Some(true),
                _ => None,
            };
            metadata.channels.insert(id.to_string(), channel);
        }

        Ok(metadata)
    }

    /// Fetches every message row, ordered ascending by timestamp.
    ///
    /// The order of this collection fixes the order of the exported record
    /// stream.
    pub fn fetch_message_rows(&self) -> Result<Vec<MessageRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT message_id, sender_id, channel_id, text, timestamp \
             FROM messages ORDER BY timestamp",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(MessageRow {
                id: row.get::<_, i64>(0)?.to_string(),
                sender: row.get::<_, i64>(1)?.to_string(),
                channel: row.get::<_, i64>(2)?.to_string(),
                text: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }
}
