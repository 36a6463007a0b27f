//! Postgres-backed dossier store
//!
//! Queryable run fields live in dedicated columns; the full dossier
//! (sections included) is stored as a JSONB document and is the source of
//! truth on read.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;
use venture_core::domain::dossier::Dossier;
use venture_core::dto::RunSummary;

use crate::storage::{DossierStore, StoreError};

/// Production store on top of a sqlx connection pool
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects a pool against `database_url`
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Wraps an existing pool (useful for sharing with other components)
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DossierStore for PostgresStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dossiers (
                run_id UUID PRIMARY KEY,
                idea TEXT NOT NULL,
                status VARCHAR(20) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                document JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS artifacts (
                run_id UUID NOT NULL,
                name VARCHAR(255) NOT NULL,
                content BYTEA NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (run_id, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_dossiers_created_at ON dossiers(created_at DESC)")
            .execute(&self.pool)
            .await?;

        tracing::info!("Database migrations completed successfully");
        Ok(())
    }

    async fn save_dossier(&self, dossier: &Dossier) -> Result<(), StoreError> {
        let document = serde_json::to_value(dossier)?;
        let status = serde_json::to_value(dossier.status)?
            .as_str()
            .unwrap_or("queued")
            .to_string();

        sqlx::query(
            r#"
            INSERT INTO dossiers (run_id, idea, status, created_at, updated_at, document)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (run_id) DO UPDATE
            SET status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at,
                document = EXCLUDED.document
            "#,
        )
        .bind(dossier.run_id)
        .bind(&dossier.idea)
        .bind(status)
        .bind(dossier.created_at)
        .bind(dossier.updated_at)
        .bind(document)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_dossier(&self, run_id: Uuid) -> Result<Option<Dossier>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT document FROM dossiers WHERE run_id = $1")
                .bind(run_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((document,)) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }

    async fn list_runs(&self, limit: i64) -> Result<Vec<RunSummary>, StoreError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT run_id, idea, status, created_at
            FROM dossiers
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn save_artifact(
        &self,
        run_id: Uuid,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO artifacts (run_id, name, content, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (run_id, name) DO UPDATE
            SET content = EXCLUDED.content
            "#,
        )
        .bind(run_id)
        .bind(name)
        .bind(bytes)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_artifact(&self, run_id: Uuid, name: &str) -> Result<Vec<u8>, StoreError> {
        let row: Option<(Vec<u8>,)> =
            sqlx::query_as("SELECT content FROM artifacts WHERE run_id = $1 AND name = $2")
                .bind(run_id)
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(content,)| content)
            .ok_or_else(|| StoreError::ArtifactNotFound {
                run_id,
                name: name.to_string(),
            })
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct SummaryRow {
    run_id: Uuid,
    idea: String,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<SummaryRow> for RunSummary {
    type Error = StoreError;

    fn try_from(row: SummaryRow) -> Result<Self, StoreError> {
        let status = serde_json::from_value(serde_json::Value::String(row.status))?;
        Ok(RunSummary {
            run_id: row.run_id,
            idea: row.idea,
            status,
            created_at: row.created_at,
        })
    }
}
