//! # bingo-db-sqlite Implementation
//!
//! This module implements the hierarchical document store on a single
//! SQLite table: every document is a row keyed by its collection path and
//! id, with the JSON body stored as TEXT.

use async_trait::async_trait;
use bingo_core::traits::DocumentStore;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    body       TEXT NOT NULL,
    PRIMARY KEY (collection, id)
)";

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Opens (creating if needed) the database at `url` and ensures the
    /// schema exists.
    ///
    /// # Developer Note
    /// An in-memory database lives only as long as its connection, so
    /// `sqlite::memory:` gets a pool of exactly one connection.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;
        log::info!("document store ready at {}", url);
        Ok(Self { pool })
    }

    fn parse_rows(collection: &str, rows: Vec<sqlx::sqlite::SqliteRow>) -> Vec<(String, Value)> {
        rows.into_iter()
            .filter_map(|row| {
                let id: String = row.get("id");
                match serde_json::from_str(&row.get::<String, _>("body")) {
                    Ok(body) => Some((id, body)),
                    Err(err) => {
                        log::warn!("skipping unreadable document {}/{}: {}", collection, id, err);
                        None
                    }
                }
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Value>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(serde_json::from_str(&row.get::<String, _>("body"))?)),
            None => Ok(None),
        }
    }

    /// Compares in Rust rather than with `json_extract`, so matching is exact
    /// JSON equality regardless of how SQLite would coerce the value.
    async fn find_by_field(&self, collection: &str, field: &str, value: &Value) -> anyhow::Result<Vec<(String, Value)>> {
        Ok(self
            .list(collection)
            .await?
            .into_iter()
            .filter(|(_, doc)| doc.get(field) == Some(value))
            .collect())
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)
             ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body",
        )
        .bind(collection)
        .bind(id)
        .bind(serde_json::to_string(&doc)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, collection: &str) -> anyhow::Result<Vec<(String, Value)>> {
        let rows = sqlx::query("SELECT id, body FROM documents WHERE collection = ? ORDER BY id ASC")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;
        Ok(Self::parse_rows(collection, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingo_core::edit::{self, ModePatch};
    use bingo_core::{EntityRef, PageRepo};
    use serde_json::json;
    use std::sync::Arc;

    async fn store() -> SqliteDocumentStore {
        SqliteDocumentStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_set_get_and_replace() {
        let store = store().await;
        assert!(store.get("pages", "lydlbutton").await.unwrap().is_none());

        store.set("pages", "lydlbutton", json!({ "root": "lydlbutton" })).await.unwrap();
        store.set("pages", "lydlbutton", json!({ "root": "lydia" })).await.unwrap();

        let doc = store.get("pages", "lydlbutton").await.unwrap().unwrap();
        assert_eq!(doc["root"], "lydia");
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_collection() {
        let store = store().await;
        store.set("pages/a/options", "1", json!({ "displayName": "x" })).await.unwrap();
        store.set("pages/a/options", "2", json!({ "displayName": "y" })).await.unwrap();
        store.set("pages/b/options", "3", json!({ "displayName": "z" })).await.unwrap();

        let ids: Vec<String> = store.list("pages/a/options").await.unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["1".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn test_find_by_field_and_delete() {
        let store = store().await;
        store.set("pages", "lydlbutton", json!({ "root": "lydlbutton" })).await.unwrap();
        store.set("pages", "coco", json!({ "root": "coco" })).await.unwrap();

        let found = store.find_by_field("pages", "root", &json!("coco")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "coco");

        store.delete("pages", "coco").await.unwrap();
        store.delete("pages", "coco").await.unwrap();
        assert!(store.find_by_field("pages", "root", &json!("coco")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_page_round_trip() {
        let repo = PageRepo::new(Arc::new(store().await));

        let page = edit::new_page("lydlbutton", "LydlButton");
        let mode = page.default_mode.clone();
        let group = page.option_groups.keys().next().unwrap().clone();
        let (page, kept) = edit::new_option(&page, "APEX WIN", Some("they get a win"), Some(&group));
        let (page, gone) = edit::new_option(&page, "APEX LAST", None, Some(&group));
        let page = edit::edit_mode(
            &page,
            &mode,
            ModePatch {
                group_per_column: Some(true),
                ..Default::default()
            },
        );
        repo.write_page(&page).await.unwrap();

        let page = edit::toggle_deletion(&page, &EntityRef::Option(gone.id.clone()));
        repo.write_page(&page).await.unwrap();

        let loaded = repo.get_page("lydlbutton").await.unwrap().unwrap();
        assert_eq!(loaded.root, "lydlbutton");
        assert!(loaded.modes[&mode].group_per_column);
        assert_eq!(loaded.options.len(), 1);
        assert_eq!(loaded.options[&kept.id].tooltip, "they get a win");

        let by_slug = repo.find_by_root("LYDLBUTTON").await.unwrap().unwrap();
        assert_eq!(by_slug, loaded);
    }
}
