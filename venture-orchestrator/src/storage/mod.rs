//! Dossier storage
//!
//! The orchestrator talks to persistence exclusively through the
//! [`DossierStore`] trait so backends stay interchangeable. `postgres` is
//! the production backend; `memory` backs tests and local development.
//!
//! Every implementation must provide read-your-writes per run id: a
//! `save_dossier` followed by a `get_dossier` for the same id observes the
//! save.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;
use venture_core::domain::dossier::Dossier;
use venture_core::dto::RunSummary;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Storage error type
///
/// `ArtifactNotFound` is deliberately distinct from backend failures so the
/// API layer can map it to a 404 instead of a 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("artifact {name} not found for run {run_id}")]
    ArtifactNotFound { run_id: Uuid, name: String },

    #[error("failed to encode dossier: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable keyed state + blob storage for analysis runs
#[async_trait]
pub trait DossierStore: Send + Sync {
    /// Idempotent setup (create tables, directories, ...)
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Produce a fresh unique run identifier
    fn generate_run_id(&self) -> Uuid {
        Uuid::new_v4()
    }

    /// Full-state write, last-write-wins per call
    async fn save_dossier(&self, dossier: &Dossier) -> Result<(), StoreError>;

    /// Full-state read; `None` if the run does not exist
    async fn get_dossier(&self, run_id: Uuid) -> Result<Option<Dossier>, StoreError>;

    /// Most-recent-first run summaries
    async fn list_runs(&self, limit: i64) -> Result<Vec<RunSummary>, StoreError>;

    /// Store a derived blob for a run; immutable once written
    async fn save_artifact(
        &self,
        run_id: Uuid,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError>;

    /// Fetch a stored blob; `ArtifactNotFound` if absent
    async fn get_artifact(&self, run_id: Uuid, name: &str) -> Result<Vec<u8>, StoreError>;
}
