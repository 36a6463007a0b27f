//! Pipeline stages
//!
//! The pipeline is a plain ordered table of stages tagged required or
//! optional; the orchestrator classifies failures by that tag, never by
//! error type. Stage bodies live behind the [`AnalysisSteps`] trait so they
//! can be mocked in tests and swapped per provider.

pub mod llm;
pub mod parser;

use async_trait::async_trait;
use thiserror::Error;
use venture_core::domain::dossier::{
    ClarifiedIdea, ConfidenceScore, DebateSynthesis, Dossier, FinalReport, FinanceModel,
    MarketResearch, MvpPlan, Positioning,
};
use venture_core::domain::run::AnalysisStep;

pub use llm::LlmSteps;

/// One row of the pipeline table
#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub step: AnalysisStep,
    /// A required stage aborts the run on failure; an optional one is
    /// logged and skipped.
    pub required: bool,
}

/// Default stage ordering
///
/// Confidence scoring is best-effort: a run without it is still a complete
/// dossier.
pub fn default_pipeline() -> Vec<StageSpec> {
    vec![
        StageSpec {
            step: AnalysisStep::Clarifier,
            required: true,
        },
        StageSpec {
            step: AnalysisStep::MarketResearch,
            required: true,
        },
        StageSpec {
            step: AnalysisStep::Positioning,
            required: true,
        },
        StageSpec {
            step: AnalysisStep::MvpPlanner,
            required: true,
        },
        StageSpec {
            step: AnalysisStep::Debate,
            required: true,
        },
        StageSpec {
            step: AnalysisStep::Finance,
            required: true,
        },
        StageSpec {
            step: AnalysisStep::ConfidenceScore,
            required: false,
        },
        StageSpec {
            step: AnalysisStep::Finalizer,
            required: true,
        },
    ]
}

/// Stage failure
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{stage} needs {missing} from an earlier stage")]
    MissingInput {
        stage: AnalysisStep,
        missing: &'static str,
    },

    #[error("{stage} returned no usable output")]
    EmptyOutput { stage: AnalysisStep },

    #[error("{stage} output did not match the expected schema: {source}")]
    InvalidOutput {
        stage: AnalysisStep,
        #[source]
        source: serde_json::Error,
    },

    #[error("provider request failed: {0}")]
    Provider(String),
}

/// One async function per pipeline stage
///
/// Each method receives only the prior sections it declares and returns a
/// validated typed result or a stage failure. Implementations must not
/// touch shared state; the orchestrator persists results after each call.
#[async_trait]
pub trait AnalysisSteps: Send + Sync {
    async fn clarify(&self, idea: &str) -> Result<ClarifiedIdea, StepError>;

    async fn market_research(
        &self,
        clarified: &ClarifiedIdea,
    ) -> Result<MarketResearch, StepError>;

    async fn positioning(
        &self,
        clarified: &ClarifiedIdea,
        market: &MarketResearch,
    ) -> Result<Positioning, StepError>;

    async fn mvp_plan(
        &self,
        clarified: &ClarifiedIdea,
        positioning: &Positioning,
    ) -> Result<MvpPlan, StepError>;

    async fn debate(
        &self,
        market: &MarketResearch,
        positioning: &Positioning,
        mvp: &MvpPlan,
    ) -> Result<DebateSynthesis, StepError>;

    async fn finance(
        &self,
        clarified: &ClarifiedIdea,
        positioning: &Positioning,
    ) -> Result<FinanceModel, StepError>;

    async fn confidence_score(&self, dossier: &Dossier) -> Result<ConfidenceScore, StepError>;

    async fn finalize(&self, dossier: &Dossier) -> Result<FinalReport, StepError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline_shape() {
        let stages = default_pipeline();
        assert_eq!(stages.len(), 8);
        assert_eq!(stages[0].step, AnalysisStep::Clarifier);
        assert_eq!(stages.last().unwrap().step, AnalysisStep::Finalizer);

        // confidence scoring is the only best-effort stage in the default table
        let optional: Vec<_> = stages.iter().filter(|s| !s.required).collect();
        assert_eq!(optional.len(), 1);
        assert_eq!(optional[0].step, AnalysisStep::ConfidenceScore);
    }

    #[test]
    fn test_step_error_messages_carry_stage() {
        let err = StepError::EmptyOutput {
            stage: AnalysisStep::MarketResearch,
        };
        assert!(err.to_string().contains("market_research"));
    }
}
