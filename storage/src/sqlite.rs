//! SQLite-backed store.
//!
//! Tables: `repos` (unique on url), `changes` (append-only, ordered by
//! insertion) and `docs` (unique on repo_id + path, drafts kept as JSON text).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use errors::StoreError;
use scribe_core::{
    ChangeEvent, DocRecord, DraftedDoc, NewRepository, RepositoryRecord, RepositoryStore
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

const BACKEND: &str = "sqlite";

pub struct SqliteStore {
    pool: SqlitePool
}

#[derive(FromRow)]
struct RepoRow {
    id: String,
    url: String,
    local_path: String,
    branch: String,
    last_revision: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>
}

#[derive(FromRow)]
struct ChangeRow {
    id: String,
    repo_id: String,
    previous_revision: Option<String>,
    new_revision: String,
    summary: Option<String>,
    detected_at: DateTime<Utc>
}

#[derive(FromRow)]
struct DocRow {
    repo_id: String,
    path: String,
    drafts: String,
    updated_at: DateTime<Utc>
}

impl SqliteStore {
    /// Connect to `database_url`, creating the database file if needed.
    ///
    /// In-memory databases are pinned to a single connection that never
    /// expires, since each SQLite connection owns a separate in-memory
    /// database.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(connection_error)?
            .create_if_missing(true);

        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(connection_error)?;

        info!(in_memory, "Connected to SQLite store");
        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        let store = Self::connect("sqlite::memory:").await?;
        store.initialize_schema().await?;
        Ok(store)
    }

    /// Create tables and unique indexes if they do not exist.
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS repos (
                id TEXT PRIMARY KEY,
                url TEXT NOT NULL UNIQUE,
                local_path TEXT NOT NULL,
                branch TEXT NOT NULL,
                last_revision TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS changes (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                repo_id TEXT NOT NULL,
                previous_revision TEXT,
                new_revision TEXT NOT NULL,
                summary TEXT,
                detected_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS docs (
                repo_id TEXT NOT NULL,
                path TEXT NOT NULL,
                drafts TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (repo_id, path)
            );

            CREATE INDEX IF NOT EXISTS idx_changes_repo ON changes(repo_id);
            "#
        )
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }
}

#[async_trait]
impl RepositoryStore for SqliteStore {
    async fn upsert_repository(
        &self,
        repo: NewRepository
    ) -> Result<RepositoryRecord, StoreError> {
        let now = Utc::now();
        let row: RepoRow = sqlx::query_as(
            r#"
            INSERT INTO repos (id, url, local_path, branch, last_revision, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)
            ON CONFLICT(url) DO UPDATE SET
                local_path = excluded.local_path,
                branch = excluded.branch,
                updated_at = excluded.updated_at
            RETURNING id, url, local_path, branch, last_revision, created_at, updated_at
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&repo.url)
        .bind(&repo.local_path)
        .bind(&repo.branch)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;

        row.try_into()
    }

    async fn get_repository(&self, id: Uuid) -> Result<Option<RepositoryRecord>, StoreError> {
        let row: Option<RepoRow> = sqlx::query_as("SELECT * FROM repos WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_repository_by_url(
        &self,
        url: &str
    ) -> Result<Option<RepositoryRecord>, StoreError> {
        let row: Option<RepoRow> = sqlx::query_as("SELECT * FROM repos WHERE url = ?1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_last_revision(&self, id: Uuid, revision: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE repos SET last_revision = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(revision)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(())
    }

    async fn append_change(&self, event: &ChangeEvent) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO changes (id, repo_id, previous_revision, new_revision, summary, detected_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#
        )
        .bind(event.id.to_string())
        .bind(event.repository_id.to_string())
        .bind(&event.previous_revision)
        .bind(&event.new_revision)
        .bind(&event.summary)
        .bind(event.detected_at)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn list_changes(&self, repository_id: Uuid) -> Result<Vec<ChangeEvent>, StoreError> {
        let rows: Vec<ChangeRow> = sqlx::query_as(
            r#"
            SELECT id, repo_id, previous_revision, new_revision, summary, detected_at
            FROM changes WHERE repo_id = ?1 ORDER BY seq
            "#
        )
        .bind(repository_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn upsert_doc(&self, doc: &DocRecord) -> Result<(), StoreError> {
        let drafts =
            serde_json::to_string(&doc.drafts).map_err(|e| StoreError::SerializationError {
                error_type: "drafts".to_string(),
                reason: e.to_string()
            })?;

        sqlx::query(
            r#"
            INSERT INTO docs (repo_id, path, drafts, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(repo_id, path) DO UPDATE SET
                drafts = excluded.drafts,
                updated_at = excluded.updated_at
            "#
        )
        .bind(doc.repository_id.to_string())
        .bind(&doc.path)
        .bind(drafts)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn list_docs(&self, repository_id: Uuid) -> Result<Vec<DocRecord>, StoreError> {
        let rows: Vec<DocRow> = sqlx::query_as(
            "SELECT repo_id, path, drafts, updated_at FROM docs WHERE repo_id = ?1 ORDER BY path"
        )
        .bind(repository_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

impl TryFrom<RepoRow> for RepositoryRecord {
    type Error = StoreError;

    fn try_from(row: RepoRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            url: row.url,
            local_path: row.local_path,
            branch: row.branch,
            last_revision: row.last_revision,
            created_at: row.created_at,
            updated_at: row.updated_at
        })
    }
}

impl TryFrom<ChangeRow> for ChangeEvent {
    type Error = StoreError;

    fn try_from(row: ChangeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            repository_id: parse_uuid(&row.repo_id)?,
            previous_revision: row.previous_revision,
            new_revision: row.new_revision,
            summary: row.summary,
            detected_at: row.detected_at
        })
    }
}

impl TryFrom<DocRow> for DocRecord {
    type Error = StoreError;

    fn try_from(row: DocRow) -> Result<Self, Self::Error> {
        let drafts: Vec<DraftedDoc> =
            serde_json::from_str(&row.drafts).map_err(|e| StoreError::SerializationError {
                error_type: "drafts".to_string(),
                reason: e.to_string()
            })?;

        Ok(Self {
            repository_id: parse_uuid(&row.repo_id)?,
            path: row.path,
            drafts,
            updated_at: row.updated_at
        })
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|e| StoreError::SerializationError {
        error_type: "uuid".to_string(),
        reason: e.to_string()
    })
}

fn connection_error(e: sqlx::Error) -> StoreError {
    StoreError::ConnectionError {
        backend: BACKEND.to_string(),
        reason: e.to_string()
    }
}

fn query_error(e: sqlx::Error) -> StoreError {
    StoreError::QueryError {
        backend: BACKEND.to_string(),
        reason: e.to_string()
    }
}
