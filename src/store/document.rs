use crate::error::{Result, WellnessError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const PLANS: &str = "plans";
pub const CURRENT_PLAN: &str = "currentPlan";
pub const CHECK_RECORDS: &str = "twoweek_check_records";
pub const PREFERENCE_SCORES: &str = "preference_scores";
pub const LATEST: &str = "latest";
pub const DAILY_EMOTIONS: &str = "daily_emotions";

/// Address of one JSON document: `users/{user_id}/{collection}/{doc_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    pub user_id: String,
    pub collection: String,
    pub doc_id: String,
}

impl DocPath {
    pub fn new(user_id: &str, collection: &str, doc_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            collection: collection.to_string(),
            doc_id: doc_id.to_string(),
        }
    }

    pub fn current_plan(user_id: &str) -> Self {
        Self::new(user_id, PLANS, CURRENT_PLAN)
    }

    pub fn preferences(user_id: &str) -> Self {
        Self::new(user_id, PREFERENCE_SCORES, LATEST)
    }
}

/// Per-user JSON document storage. Read failures surface as `Transport`,
/// write failures as `Persistence`; a missing document is `Ok(None)`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>>;

    /// Replaces the whole document.
    async fn set(&self, path: &DocPath, body: Value) -> Result<()>;

    /// Shallow merge of top-level fields; creates the document if missing.
    async fn merge(&self, path: &DocPath, fields: Map<String, Value>) -> Result<()>;

    /// Adds a document under a fresh id and returns the id.
    async fn append(&self, user_id: &str, collection: &str, body: Value) -> Result<String>;

    /// Most recently created document of a collection.
    async fn latest(&self, user_id: &str, collection: &str) -> Result<Option<Value>>;
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<DocPath, (u64, Value)>>,
}

impl MemoryDocumentStore {
    fn next_seq(docs: &HashMap<DocPath, (u64, Value)>) -> u64 {
        docs.values().map(|(seq, _)| *seq).max().map_or(0, |s| s + 1)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>> {
        Ok(self.docs.read().await.get(path).map(|(_, body)| body.clone()))
    }

    async fn set(&self, path: &DocPath, body: Value) -> Result<()> {
        let mut docs = self.docs.write().await;
        let seq = match docs.get(path) {
            Some((seq, _)) => *seq,
            None => Self::next_seq(&docs),
        };
        docs.insert(path.clone(), (seq, body));
        Ok(())
    }

    async fn merge(&self, path: &DocPath, fields: Map<String, Value>) -> Result<()> {
        let mut docs = self.docs.write().await;
        match docs.get_mut(path) {
            Some((_, Value::Object(existing))) => existing.extend(fields),
            Some((_, other)) => *other = Value::Object(fields),
            None => {
                let seq = Self::next_seq(&docs);
                docs.insert(path.clone(), (seq, Value::Object(fields)));
            }
        }
        Ok(())
    }

    async fn append(&self, user_id: &str, collection: &str, body: Value) -> Result<String> {
        let doc_id = Uuid::new_v4().to_string();
        let mut docs = self.docs.write().await;
        let seq = Self::next_seq(&docs);
        docs.insert(DocPath::new(user_id, collection, &doc_id), (seq, body));
        Ok(doc_id)
    }

    async fn latest(&self, user_id: &str, collection: &str) -> Result<Option<Value>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .filter(|(path, _)| path.user_id == user_id && path.collection == collection)
            .max_by_key(|(_, (seq, _))| *seq)
            .map(|(_, (_, body))| body.clone()))
    }
}

/// Postgres-backed store over the single `documents` JSONB table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn read_failed(e: sqlx::Error) -> WellnessError {
    tracing::error!("Document read failed: {}", e);
    WellnessError::Transport(e.to_string())
}

fn write_failed(e: sqlx::Error) -> WellnessError {
    tracing::error!("Document write failed: {}", e);
    WellnessError::Persistence(e.to_string())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>> {
        sqlx::query_scalar::<_, Value>(
            r#"
            SELECT body
            FROM documents
            WHERE user_id = $1 AND collection = $2 AND doc_id = $3
            "#,
        )
        .bind(&path.user_id)
        .bind(&path.collection)
        .bind(&path.doc_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_failed)
    }

    async fn set(&self, path: &DocPath, body: Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (user_id, collection, doc_id, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, collection, doc_id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = now()
            "#,
        )
        .bind(&path.user_id)
        .bind(&path.collection)
        .bind(&path.doc_id)
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(write_failed)?;
        Ok(())
    }

    async fn merge(&self, path: &DocPath, fields: Map<String, Value>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (user_id, collection, doc_id, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, collection, doc_id)
            DO UPDATE SET body = documents.body || EXCLUDED.body, updated_at = now()
            "#,
        )
        .bind(&path.user_id)
        .bind(&path.collection)
        .bind(&path.doc_id)
        .bind(Value::Object(fields))
        .execute(&self.pool)
        .await
        .map_err(write_failed)?;
        Ok(())
    }

    async fn append(&self, user_id: &str, collection: &str, body: Value) -> Result<String> {
        let doc_id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO documents (user_id, collection, doc_id, body)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(collection)
        .bind(&doc_id)
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(write_failed)?;
        Ok(doc_id)
    }

    async fn latest(&self, user_id: &str, collection: &str) -> Result<Option<Value>> {
        sqlx::query_scalar::<_, Value>(
            r#"
            SELECT body
            FROM documents
            WHERE user_id = $1 AND collection = $2
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(collection)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_document_is_none() {
        let store = MemoryDocumentStore::default();
        assert!(store.get(&DocPath::current_plan("u1")).await.unwrap().is_none());
        assert!(store.latest("u1", CHECK_RECORDS).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn merge_keeps_existing_fields() {
        let store = MemoryDocumentStore::default();
        let path = DocPath::preferences("u1");
        let mut first = Map::new();
        first.insert("walking".into(), json!(80.0));
        store.merge(&path, first).await.unwrap();

        let mut second = Map::new();
        second.insert("yoga".into(), json!(55.0));
        store.merge(&path, second).await.unwrap();

        assert_eq!(store.get(&path).await.unwrap(), Some(json!({"walking": 80.0, "yoga": 55.0})));
    }

    #[tokio::test]
    async fn latest_follows_insertion_order_per_user() {
        let store = MemoryDocumentStore::default();
        store.append("u1", DAILY_EMOTIONS, json!({"n": 1})).await.unwrap();
        store.append("u2", DAILY_EMOTIONS, json!({"n": 99})).await.unwrap();
        store.append("u1", DAILY_EMOTIONS, json!({"n": 2})).await.unwrap();

        assert_eq!(store.latest("u1", DAILY_EMOTIONS).await.unwrap(), Some(json!({"n": 2})));
        assert_eq!(store.latest("u2", DAILY_EMOTIONS).await.unwrap(), Some(json!({"n": 99})));
    }

    #[tokio::test]
    async fn set_replaces_whole_document() {
        let store = MemoryDocumentStore::default();
        let path = DocPath::current_plan("u1");
        store.set(&path, json!({"a": 1, "b": 2})).await.unwrap();
        store.set(&path, json!({"a": 3})).await.unwrap();
        assert_eq!(store.get(&path).await.unwrap(), Some(json!({"a": 3})));
    }
}
