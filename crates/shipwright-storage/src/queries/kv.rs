// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring key-value operations on the `kv_entries` table.
//!
//! An entry is live while `expires_at > now`. Reads filter on that
//! condition, so expired rows stay invisible until `purge_expired` runs.

use std::time::Duration;

use rusqlite::{OptionalExtension, params};
use shipwright_core::ShipwrightError;

use crate::database::{Database, map_tr_err};

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn expiry_millis(ttl: Duration) -> i64 {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_millis().saturating_add(ttl_ms)
}

/// Insert or replace `key`, resetting its expiry.
pub async fn set_with_ttl(
    db: &Database,
    key: &str,
    value: String,
    ttl: Duration,
) -> Result<(), ShipwrightError> {
    let key = key.to_string();
    let expires_at = expiry_millis(ttl);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO kv_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    expires_at = excluded.expires_at,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![key, value, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Live value for `key`, if any.
pub async fn get(db: &Database, key: &str) -> Result<Option<String>, ShipwrightError> {
    let key = key.to_string();
    let now = now_millis();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT value FROM kv_entries WHERE key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Remove `key` regardless of expiry. Returns whether a live entry was removed.
pub async fn delete(db: &Database, key: &str) -> Result<bool, ShipwrightError> {
    let key = key.to_string();
    let now = now_millis();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let live: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM kv_entries WHERE key = ?1 AND expires_at > ?2)",
                params![key, now],
                |row| row.get(0),
            )?;
            tx.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
            tx.commit()?;
            Ok(live)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn exists(db: &Database, key: &str) -> Result<bool, ShipwrightError> {
    let key = key.to_string();
    let now = now_millis();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM kv_entries WHERE key = ?1 AND expires_at > ?2)",
                params![key, now],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Live keys starting with `prefix`, in ascending order.
///
/// Matching uses `substr` rather than `LIKE` so `%` and `_` in the prefix
/// are taken literally.
pub async fn keys_with_prefix(db: &Database, prefix: &str) -> Result<Vec<String>, ShipwrightError> {
    let prefix = prefix.to_string();
    let now = now_millis();
    db.connection()
        .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT key FROM kv_entries
                 WHERE substr(key, 1, length(?1)) = ?1 AND expires_at > ?2
                 ORDER BY key ASC",
            )?;
            let rows = stmt.query_map(params![prefix, now], |row| row.get(0))?;
            rows.collect::<Result<Vec<String>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Physically delete expired rows. Returns the number removed.
pub async fn purge_expired(db: &Database) -> Result<usize, ShipwrightError> {
    let now = now_millis();
    db.connection()
        .call(move |conn| conn.execute("DELETE FROM kv_entries WHERE expires_at <= ?1", params![now]))
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kv.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (dir, db)
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn set_overwrites_previous_value() {
        let (_dir, db) = open_temp().await;
        set_with_ttl(&db, "checkpoint:a", "one".into(), HOUR).await.unwrap();
        set_with_ttl(&db, "checkpoint:a", "two".into(), HOUR).await.unwrap();
        assert_eq!(get(&db, "checkpoint:a").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn zero_ttl_entry_is_invisible() {
        let (_dir, db) = open_temp().await;
        set_with_ttl(&db, "gone", "v".into(), Duration::ZERO).await.unwrap();
        assert_eq!(get(&db, "gone").await.unwrap(), None);
        assert!(!exists(&db, "gone").await.unwrap());
        assert!(keys_with_prefix(&db, "go").await.unwrap().is_empty());
        assert!(!delete(&db, "gone").await.unwrap());
    }

    #[tokio::test]
    async fn rewrite_refreshes_expiry() {
        let (_dir, db) = open_temp().await;
        set_with_ttl(&db, "k", "stale".into(), Duration::ZERO).await.unwrap();
        set_with_ttl(&db, "k", "fresh".into(), HOUR).await.unwrap();
        assert_eq!(get(&db, "k").await.unwrap().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn prefix_listing_is_sorted_and_literal() {
        let (_dir, db) = open_temp().await;
        for key in ["checkpoint:b", "checkpoint:a", "other:c", "checkpointXd"] {
            set_with_ttl(&db, key, "v".into(), HOUR).await.unwrap();
        }
        let keys = keys_with_prefix(&db, "checkpoint:").await.unwrap();
        assert_eq!(keys, vec!["checkpoint:a", "checkpoint:b"]);

        set_with_ttl(&db, "a_b", "v".into(), HOUR).await.unwrap();
        set_with_ttl(&db, "axb", "v".into(), HOUR).await.unwrap();
        assert_eq!(keys_with_prefix(&db, "a_").await.unwrap(), vec!["a_b"]);
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let (_dir, db) = open_temp().await;
        set_with_ttl(&db, "k", "v".into(), HOUR).await.unwrap();
        assert!(delete(&db, "k").await.unwrap());
        assert!(!delete(&db, "k").await.unwrap());
        assert!(!exists(&db, "k").await.unwrap());
    }

    #[tokio::test]
    async fn purge_removes_only_expired_rows() {
        let (_dir, db) = open_temp().await;
        set_with_ttl(&db, "old-1", "v".into(), Duration::ZERO).await.unwrap();
        set_with_ttl(&db, "old-2", "v".into(), Duration::ZERO).await.unwrap();
        set_with_ttl(&db, "live", "v".into(), HOUR).await.unwrap();
        assert_eq!(purge_expired(&db).await.unwrap(), 2);
        assert_eq!(purge_expired(&db).await.unwrap(), 0);
        assert!(exists(&db, "live").await.unwrap());
    }
}
