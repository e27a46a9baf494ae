//! Persistent item store backed by SQLite.
//!
//! Items and shares are stored as JSON documents next to the columns the
//! store needs for addressing and compare-and-swap. Blocking SQLite calls run
//! on tokio's blocking pool.

use crate::query::listing_order;
use crate::{check_incoming, check_swap, ItemQuery, ItemStore, StorageError, StorageResult};
use async_trait::async_trait;
use lockbox_types::{ItemEncrypted, ItemKey, ShareId, ShareRecord};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::debug;

/// Item store persisted in a SQLite database file.
pub struct SqliteItemStore {
    conn: Arc<Mutex<Connection>>,
    changes: watch::Sender<u64>,
}

impl SqliteItemStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            changes: watch::Sender::new(0),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StorageError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StorageError::TaskJoin(e.to_string()))?
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }
}

fn init_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS shares (
            share_id TEXT PRIMARY KEY,
            hidden INTEGER NOT NULL,
            data TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS items (
            share_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            revision INTEGER NOT NULL,
            state INTEGER NOT NULL,
            data TEXT NOT NULL,
            PRIMARY KEY (share_id, item_id)
        );

        CREATE INDEX IF NOT EXISTS items_by_share ON items (share_id, state);
        ",
    )?;
    Ok(())
}

fn decode_item(data: &str) -> StorageResult<ItemEncrypted> {
    Ok(serde_json::from_str(data)?)
}

fn load_item(conn: &Connection, key: &ItemKey) -> StorageResult<Option<ItemEncrypted>> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM items WHERE share_id = ?1 AND item_id = ?2",
            params![key.share_id.to_string(), key.item_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    data.as_deref().map(decode_item).transpose()
}

fn remove_item(conn: &Connection, key: &ItemKey) -> StorageResult<()> {
    conn.execute(
        "DELETE FROM items WHERE share_id = ?1 AND item_id = ?2",
        params![key.share_id.to_string(), key.item_id.to_string()],
    )?;
    Ok(())
}

/// Pushes the share scope and state of `query` into SQL. The remaining
/// predicates are evaluated on the decoded rows.
fn item_filter(query: &ItemQuery) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    if let Some(share_ids) = query.selection.share_ids() {
        let placeholders = vec!["?"; share_ids.len()].join(", ");
        clauses.push(format!("share_id IN ({placeholders})"));
        values.extend(share_ids.iter().map(|id| Value::Text(id.to_string())));
    }
    if let Some(state) = query.state {
        clauses.push("state = ?".to_owned());
        values.push(Value::Integer(i64::from(state.code())));
    }
    if clauses.is_empty() {
        return ("SELECT data FROM items".to_owned(), values);
    }
    (format!("SELECT data FROM items WHERE {}", clauses.join(" AND ")), values)
}

fn write_item(conn: &Connection, item: &ItemEncrypted) -> StorageResult<()> {
    let revision = i64::try_from(item.revision)
        .map_err(|_| StorageError::InvalidData(format!("revision out of range: {}", item.revision)))?;
    conn.execute(
        "INSERT OR REPLACE INTO items (share_id, item_id, revision, state, data)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            item.share_id.to_string(),
            item.id.to_string(),
            revision,
            item.state.code(),
            serde_json::to_string(item)?,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn upsert_share(&self, share: ShareRecord) -> StorageResult<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO shares (share_id, hidden, data) VALUES (?1, ?2, ?3)",
                params![
                    share.share_id.to_string(),
                    share.hidden,
                    serde_json::to_string(&share)?,
                ],
            )?;
            Ok(())
        })
        .await?;
        self.notify();
        Ok(())
    }

    async fn get_share(&self, share_id: &ShareId) -> StorageResult<Option<ShareRecord>> {
        let share_id = share_id.to_string();
        self.with_conn(move |conn| {
            let data: Option<String> = conn
                .query_row(
                    "SELECT data FROM shares WHERE share_id = ?1",
                    params![share_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(data
                .as_deref()
                .map(serde_json::from_str::<ShareRecord>)
                .transpose()?)
        })
        .await
    }

    async fn shares(&self) -> StorageResult<Vec<ShareRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT data FROM shares")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let mut shares: Vec<ShareRecord> = Vec::new();
            for row in rows {
                shares.push(serde_json::from_str(&row?)?);
            }
            Ok(shares)
        })
        .await
    }

    async fn remove_share(&self, share_id: &ShareId) -> StorageResult<usize> {
        let id = share_id.to_string();
        let removed = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let removed = tx.execute("DELETE FROM items WHERE share_id = ?1", params![id])?;
                tx.execute("DELETE FROM shares WHERE share_id = ?1", params![id])?;
                tx.commit()?;
                Ok(removed)
            })
            .await?;
        debug!("Removed share {} with {} items", share_id, removed);
        self.notify();
        Ok(removed)
    }

    async fn upsert_items(&self, items: Vec<ItemEncrypted>) -> StorageResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            for item in &items {
                check_incoming(load_item(&tx, &item.key())?.as_ref(), item)?;
                write_item(&tx, item)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await?;
        self.notify();
        Ok(())
    }

    async fn get_item(&self, key: &ItemKey) -> StorageResult<Option<ItemEncrypted>> {
        let key = *key;
        self.with_conn(move |conn| load_item(conn, &key)).await
    }

    async fn query_items(&self, query: &ItemQuery) -> StorageResult<Vec<ItemEncrypted>> {
        let query = query.clone();
        self.with_conn(move |conn| {
            let hidden: HashSet<ShareId> = {
                let mut stmt = conn.prepare("SELECT share_id FROM shares WHERE hidden = 1")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut hidden = HashSet::new();
                for row in rows {
                    let id = row?;
                    hidden.insert(
                        id.parse()
                            .map_err(|e| StorageError::InvalidData(format!("bad share id {id}: {e}")))?,
                    );
                }
                hidden
            };

            let (sql, values) = item_filter(&query);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values), |row| row.get::<_, String>(0))?;

            let mut items = Vec::new();
            for row in rows {
                let item = decode_item(&row?)?;
                if query.matches(&item, &hidden) {
                    items.push(item);
                }
            }
            items.sort_by(listing_order);
            Ok(items)
        })
        .await
    }

    async fn compare_and_swap(
        &self,
        key: &ItemKey,
        expected_revision: u64,
        updated: ItemEncrypted,
    ) -> StorageResult<()> {
        let key = *key;
        let result = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                let current = load_item(&tx, &key)?;
                check_swap(&key, current.as_ref(), expected_revision, Some(&updated))?;
                let target = updated.key();
                if target != key {
                    if load_item(&tx, &target)?.is_some() {
                        return Err(StorageError::ItemExists(target));
                    }
                    remove_item(&tx, &key)?;
                }
                write_item(&tx, &updated)?;
                tx.commit()?;
                Ok(())
            })
            .await;
        if let Err(e) = &result {
            debug!("Rejected write to {}: {}", key, e);
            return result;
        }
        self.notify();
        Ok(())
    }

    async fn delete_item(&self, key: &ItemKey, expected_revision: u64) -> StorageResult<()> {
        let key = *key;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let current = load_item(&tx, &key)?;
            check_swap(&key, current.as_ref(), expected_revision, None)?;
            remove_item(&tx, &key)?;
            tx.commit()?;
            Ok(())
        })
        .await?;
        self.notify();
        Ok(())
    }

    fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
