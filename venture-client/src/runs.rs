//! Run-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use uuid::Uuid;
use venture_core::domain::dossier::Dossier;
use venture_core::dto::{CreateRun, CreateRunResponse, RunList};

impl OrchestratorClient {
    // =============================================================================
    // Run Lifecycle
    // =============================================================================

    /// Submit a startup idea for analysis
    ///
    /// # Arguments
    /// * `idea` - Free-text description of the startup idea
    ///
    /// # Returns
    /// The created run's id and initial status
    pub async fn create_run(&self, idea: impl Into<String>) -> Result<CreateRunResponse> {
        let url = format!("{}/runs", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&CreateRun { idea: idea.into() })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the full dossier for a run
    ///
    /// # Arguments
    /// * `run_id` - The run UUID
    ///
    /// # Returns
    /// The dossier, including every section produced so far
    pub async fn get_run(&self, run_id: Uuid) -> Result<Dossier> {
        let url = format!("{}/runs/{}", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List recent runs, most recent first
    ///
    /// # Arguments
    /// * `limit` - Maximum number of runs to return; server default when `None`
    pub async fn list_runs(&self, limit: Option<i64>) -> Result<RunList> {
        let url = format!("{}/runs", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Artifacts
    // =============================================================================

    /// Download a derived artifact (e.g. "report.md")
    ///
    /// # Arguments
    /// * `run_id` - The run UUID
    /// * `name` - Artifact file name
    ///
    /// # Returns
    /// The raw artifact bytes
    pub async fn get_artifact(&self, run_id: Uuid, name: &str) -> Result<Vec<u8>> {
        let url = format!("{}/runs/{}/artifacts/{}", self.base_url, run_id, name);
        let response = self.client.get(&url).send().await?;

        self.handle_bytes_response(response).await
    }
}
