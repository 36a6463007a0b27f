//! Run lifecycle types

use serde::{Deserialize, Serialize};

/// Lifecycle status of an analysis run
///
/// Transitions only along `Queued -> Running -> {Done, Failed}`.
/// `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl RunStatus {
    /// Whether this status ends the run's observable lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Done | RunStatus::Failed)
    }
}

/// Pipeline stage identifier
///
/// Each variant corresponds to exactly one dossier section. The execution
/// order and required/optional classification live in the orchestrator's
/// stage table, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStep {
    Clarifier,
    MarketResearch,
    Positioning,
    MvpPlanner,
    Debate,
    Finance,
    ConfidenceScore,
    Finalizer,
}

impl AnalysisStep {
    /// Stable wire/display name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStep::Clarifier => "clarifier",
            AnalysisStep::MarketResearch => "market_research",
            AnalysisStep::Positioning => "positioning",
            AnalysisStep::MvpPlanner => "mvp_planner",
            AnalysisStep::Debate => "debate",
            AnalysisStep::Finance => "finance",
            AnalysisStep::ConfidenceScore => "confidence_score",
            AnalysisStep::Finalizer => "finalizer",
        }
    }
}

impl std::fmt::Display for AnalysisStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Done.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RunStatus::Queued).unwrap(),
            "\"queued\""
        );
        assert_eq!(
            serde_json::to_string(&RunStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[test]
    fn test_step_name_matches_serde() {
        for step in [
            AnalysisStep::Clarifier,
            AnalysisStep::MarketResearch,
            AnalysisStep::Positioning,
            AnalysisStep::MvpPlanner,
            AnalysisStep::Debate,
            AnalysisStep::Finance,
            AnalysisStep::ConfidenceScore,
            AnalysisStep::Finalizer,
        ] {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(json, format!("\"{}\"", step.as_str()));
        }
    }
}
