//! The startup analysis dossier
//!
//! One dossier per run, keyed by run id. The orchestrator is the only
//! writer of the core fields; the background media scan writes exactly one
//! disjoint section (`media_scan`) via read-modify-write. Everything else
//! reads only.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::run::{AnalysisStep, RunStatus};

/// Accumulating analysis record for one run
///
/// Each pipeline stage owns exactly one optional section. A section is
/// present iff its producing stage completed successfully; sections are
/// never removed, only replaced by their own producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dossier {
    pub run_id: Uuid,
    pub idea: String,
    pub status: RunStatus,
    pub current_step: Option<AnalysisStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set iff `status` is `Failed`
    pub error: Option<String>,

    pub clarified_idea: Option<ClarifiedIdea>,
    pub market_research: Option<MarketResearch>,
    pub positioning: Option<Positioning>,
    pub mvp_plan: Option<MvpPlan>,
    pub debate: Option<DebateSynthesis>,
    pub finance: Option<FinanceModel>,
    pub confidence_score: Option<ConfidenceScore>,
    pub final_report: Option<FinalReport>,

    /// Written only by the background media-scan task
    pub media_scan: Option<MediaScan>,

    /// Stage start/completion timestamps, keyed by event name
    #[serde(default)]
    pub provenance: HashMap<String, String>,
}

impl Dossier {
    /// Fresh dossier in `Queued` state
    pub fn new(run_id: Uuid, idea: String) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            idea,
            status: RunStatus::Queued,
            current_step: None,
            created_at: now,
            updated_at: now,
            error: None,
            clarified_idea: None,
            market_research: None,
            positioning: None,
            mvp_plan: None,
            debate: None,
            finance: None,
            confidence_score: None,
            final_report: None,
            media_scan: None,
            provenance: HashMap::new(),
        }
    }

    /// Bumps `updated_at`, keeping it non-decreasing
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Records a provenance timestamp for an event like `clarifier_started`
    pub fn mark(&mut self, event: &str) {
        self.provenance
            .insert(event.to_string(), Utc::now().to_rfc3339());
    }
}

// =============================================================================
// Section schemas
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarifiedIdea {
    pub problem: String,
    pub solution: String,
    pub target_customer: String,
    pub value_proposition: String,
    #[serde(default)]
    pub assumptions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub url: Option<String>,
    pub description: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    pub pricing: Option<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSegment {
    pub name: String,
    pub size_estimate: String,
    #[serde(default)]
    pub characteristics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketResearch {
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub segments: Vec<MarketSegment>,
    #[serde(default)]
    pub trends: Vec<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Positioning {
    pub icp: String,
    pub positioning_statement: String,
    #[serde(default)]
    pub differentiators: Vec<String>,
    pub unique_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub description: String,
    pub priority: String,
    pub effort: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub week: u32,
    pub goal: String,
    #[serde(default)]
    pub deliverables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MvpPlan {
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub roadmap: Vec<Milestone>,
    #[serde(default)]
    pub success_metrics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSynthesis {
    #[serde(default)]
    pub bull_points: Vec<String>,
    #[serde(default)]
    pub skeptic_points: Vec<String>,
    pub synthesis: String,
    #[serde(default)]
    pub mitigations: Vec<String>,
    #[serde(default)]
    pub key_risks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialInputs {
    pub cac: f64,
    pub ltv: f64,
    pub monthly_churn: f64,
    pub pricing: f64,
    pub unit_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialOutputs {
    pub ltv_cac_ratio: f64,
    pub payback_months: f64,
    pub gross_margin: f64,
    pub break_even_customers: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceModel {
    pub inputs: FinancialInputs,
    pub outputs: FinancialOutputs,
    #[serde(default)]
    pub assumptions: Vec<String>,
    pub sensitivity_notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub overall_confidence: f64,
    pub data_availability: f64,
    pub source_quality: f64,
    pub assumption_density: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "GO")]
    Go,
    #[serde(rename = "NO_GO")]
    NoGo,
    #[serde(rename = "PIVOT")]
    Pivot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scorecard {
    pub market_opportunity: i32,
    pub competitive_advantage: i32,
    pub execution_feasibility: i32,
    pub financial_viability: i32,
    pub overall_score: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub hypothesis: String,
    pub test: String,
    pub success_criteria: String,
    pub timeline: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub recommendation: Recommendation,
    pub scorecard: Scorecard,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub next_experiments: Vec<Experiment>,
    pub go_to_market_summary: String,
}

/// Result of the background competitor-media scan
///
/// Also used as the error placeholder: on failure `videos` is empty and
/// `note` carries the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaScan {
    #[serde(default)]
    pub videos: Vec<ScannedVideo>,
    pub note: Option<String>,
}

impl MediaScan {
    /// Error-shaped value written when the scan itself fails
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            videos: Vec::new(),
            note: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedVideo {
    pub title: String,
    pub url: String,
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_dossier_is_queued_and_empty() {
        let dossier = Dossier::new(Uuid::new_v4(), "AI meal planner".to_string());
        assert_eq!(dossier.status, RunStatus::Queued);
        assert!(dossier.current_step.is_none());
        assert!(dossier.error.is_none());
        assert!(dossier.clarified_idea.is_none());
        assert!(dossier.final_report.is_none());
        assert_eq!(dossier.created_at, dossier.updated_at);
    }

    #[test]
    fn test_touch_never_decreases() {
        let mut dossier = Dossier::new(Uuid::new_v4(), "idea".to_string());
        let before = dossier.updated_at;
        dossier.touch();
        assert!(dossier.updated_at >= before);
    }

    #[test]
    fn test_dossier_round_trips_through_json() {
        let mut dossier = Dossier::new(Uuid::new_v4(), "idea".to_string());
        dossier.clarified_idea = Some(ClarifiedIdea {
            problem: "p".into(),
            solution: "s".into(),
            target_customer: "t".into(),
            value_proposition: "v".into(),
            assumptions: vec!["a".into()],
        });
        dossier.mark("clarifier_started");

        let json = serde_json::to_string(&dossier).unwrap();
        let back: Dossier = serde_json::from_str(&json).unwrap();
        assert_eq!(back.run_id, dossier.run_id);
        assert_eq!(back.clarified_idea.unwrap().problem, "p");
        assert!(back.provenance.contains_key("clarifier_started"));
    }

    #[test]
    fn test_recommendation_wire_format() {
        assert_eq!(
            serde_json::to_string(&Recommendation::NoGo).unwrap(),
            "\"NO_GO\""
        );
        let back: Recommendation = serde_json::from_str("\"PIVOT\"").unwrap();
        assert_eq!(back, Recommendation::Pivot);
    }

    #[test]
    fn test_failed_media_scan_shape() {
        let scan = MediaScan::failed("provider outage");
        assert!(scan.videos.is_empty());
        assert_eq!(scan.note.as_deref(), Some("provider outage"));
    }
}
