//! In-memory dossier store
//!
//! Backs tests and local development. Trivially read-your-writes because
//! every operation goes through the same locked maps.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;
use venture_core::domain::dossier::Dossier;
use venture_core::dto::RunSummary;

use crate::storage::{DossierStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    dossiers: RwLock<HashMap<Uuid, Dossier>>,
    artifacts: RwLock<HashMap<(Uuid, String), Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DossierStore for MemoryStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn save_dossier(&self, dossier: &Dossier) -> Result<(), StoreError> {
        self.dossiers
            .write()
            .await
            .insert(dossier.run_id, dossier.clone());
        Ok(())
    }

    async fn get_dossier(&self, run_id: Uuid) -> Result<Option<Dossier>, StoreError> {
        Ok(self.dossiers.read().await.get(&run_id).cloned())
    }

    async fn list_runs(&self, limit: i64) -> Result<Vec<RunSummary>, StoreError> {
        let mut summaries: Vec<RunSummary> = self
            .dossiers
            .read()
            .await
            .values()
            .map(|d| RunSummary {
                run_id: d.run_id,
                idea: d.idea.clone(),
                status: d.status,
                created_at: d.created_at,
            })
            .collect();

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries.truncate(limit.max(0) as usize);
        Ok(summaries)
    }

    async fn save_artifact(
        &self,
        run_id: Uuid,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        self.artifacts
            .write()
            .await
            .insert((run_id, name.to_string()), bytes.to_vec());
        Ok(())
    }

    async fn get_artifact(&self, run_id: Uuid, name: &str) -> Result<Vec<u8>, StoreError> {
        self.artifacts
            .read()
            .await
            .get(&(run_id, name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::ArtifactNotFound {
                run_id,
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use venture_core::domain::dossier::ClarifiedIdea;
    use venture_core::domain::run::RunStatus;

    fn dossier(idea: &str) -> Dossier {
        Dossier::new(Uuid::new_v4(), idea.to_string())
    }

    #[tokio::test]
    async fn test_save_then_load_observes_save() {
        let store = MemoryStore::new();
        let mut d = dossier("idea");
        d.clarified_idea = Some(ClarifiedIdea {
            problem: "p".into(),
            solution: "s".into(),
            target_customer: "t".into(),
            value_proposition: "v".into(),
            assumptions: vec![],
        });

        store.save_dossier(&d).await.unwrap();
        let loaded = store.get_dossier(d.run_id).await.unwrap().unwrap();
        assert_eq!(loaded.clarified_idea.unwrap().problem, "p");
        assert_eq!(loaded.status, RunStatus::Queued);
    }

    #[tokio::test]
    async fn test_missing_run_is_none() {
        let store = MemoryStore::new();
        assert!(store.get_dossier(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_runs_most_recent_first_with_limit() {
        let store = MemoryStore::new();
        let mut first = dossier("first");
        let mut second = dossier("second");
        let mut third = dossier("third");
        first.created_at = chrono::Utc::now() - chrono::Duration::minutes(2);
        second.created_at = chrono::Utc::now() - chrono::Duration::minutes(1);
        third.created_at = chrono::Utc::now();

        for d in [&first, &second, &third] {
            store.save_dossier(d).await.unwrap();
        }

        let listed = store.list_runs(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].idea, "third");
        assert_eq!(listed[1].idea, "second");
    }

    #[tokio::test]
    async fn test_artifact_round_trip_and_not_found() {
        let store = MemoryStore::new();
        let run_id = Uuid::new_v4();

        store
            .save_artifact(run_id, "report.md", b"# Report")
            .await
            .unwrap();
        let bytes = store.get_artifact(run_id, "report.md").await.unwrap();
        assert_eq!(bytes, b"# Report");

        let err = store.get_artifact(run_id, "report.pdf").await.unwrap_err();
        assert!(matches!(err, StoreError::ArtifactNotFound { .. }));
    }
}
