//! API DTOs for client/orchestrator communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::run::RunStatus;

/// Request to start a new analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRun {
    pub idea: String,
}

/// Response to a run creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRunResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
}

/// One row of the recent-runs listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub idea: String,
    pub status: RunStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Envelope for the run listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunList {
    pub runs: Vec<RunSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_run_response_wire_format() {
        let resp = CreateRunResponse {
            run_id: Uuid::nil(),
            status: RunStatus::Queued,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "queued");
        assert!(json["run_id"].is_string());
    }
}
