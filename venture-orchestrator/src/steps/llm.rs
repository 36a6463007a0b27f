//! LLM-backed stage implementations
//!
//! Talks to an OpenAI-compatible chat completions endpoint. Market research
//! optionally pulls citations from a web search provider first and feeds
//! them into the prompt.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use venture_core::domain::dossier::{
    ClarifiedIdea, ConfidenceScore, DebateSynthesis, Dossier, FinalReport, FinanceModel,
    MarketResearch, MvpPlan, Positioning,
};
use venture_core::domain::run::AnalysisStep;

use crate::integrations::SearchProvider;
use crate::steps::parser::parse_step_output;
use crate::steps::{AnalysisSteps, StepError};

const SYSTEM_PROMPT: &str = "You are an analyst producing one section of a startup \
analysis dossier. Respond with a single JSON object matching the requested schema \
and nothing else.";

/// Production step set over an OpenAI-compatible API
pub struct LlmSteps {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    search: Option<Arc<dyn SearchProvider>>,
}

impl LlmSteps {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            search: None,
        }
    }

    /// Attaches a web search provider used by market research
    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    /// One chat completion, normalized into a JSON mapping
    async fn complete(&self, prompt: String) -> Result<Value, StepError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StepError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StepError::Provider(format!(
                "completion endpoint returned {}: {}",
                status, text
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| StepError::Provider(e.to_string()))?;

        let content = payload["choices"][0]["message"]["content"].clone();
        Ok(parse_step_output(&content))
    }

    /// Rejects empty mappings, then deserializes into the stage's schema
    fn decode<T: DeserializeOwned>(stage: AnalysisStep, value: Value) -> Result<T, StepError> {
        if value.as_object().is_some_and(|m| m.is_empty()) {
            return Err(StepError::EmptyOutput { stage });
        }
        serde_json::from_value(value).map_err(|source| StepError::InvalidOutput { stage, source })
    }

    /// Compact dossier summary for the synthesis-style stages
    fn summarize(dossier: &Dossier) -> Value {
        json!({
            "idea": dossier.idea,
            "clarified": dossier.clarified_idea,
            "competitors_found": dossier
                .market_research
                .as_ref()
                .map(|m| m.competitors.len())
                .unwrap_or(0),
            "positioning": dossier
                .positioning
                .as_ref()
                .map(|p| p.positioning_statement.clone()),
            "features_planned": dossier
                .mvp_plan
                .as_ref()
                .map(|m| m.features.len())
                .unwrap_or(0),
            "debate_synthesis": dossier.debate.as_ref().map(|d| d.synthesis.clone()),
            "finance_outputs": dossier.finance.as_ref().map(|f| &f.outputs),
        })
    }
}

#[async_trait]
impl AnalysisSteps for LlmSteps {
    async fn clarify(&self, idea: &str) -> Result<ClarifiedIdea, StepError> {
        let prompt = format!(
            "Clarify this startup idea into JSON with keys problem, solution, \
             target_customer, value_proposition, assumptions (list of strings).\n\
             Idea: {idea}"
        );
        Self::decode(AnalysisStep::Clarifier, self.complete(prompt).await?)
    }

    async fn market_research(
        &self,
        clarified: &ClarifiedIdea,
    ) -> Result<MarketResearch, StepError> {
        let citations = match &self.search {
            Some(search) => {
                let query = format!("{} competitors", clarified.value_proposition);
                match search.search(&query, 10).await {
                    Ok(citations) => citations,
                    Err(e) => {
                        tracing::warn!("Web search unavailable for market research: {}", e);
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        let prompt = format!(
            "Research the market for this idea. Return JSON with keys competitors \
             (name, url, description, strengths, weaknesses, pricing, citations), \
             segments (name, size_estimate, characteristics), trends, citations.\n\
             Clarified idea: {}\nSearch results: {}",
            serde_json::to_string(clarified).unwrap_or_default(),
            serde_json::to_string(&citations).unwrap_or_default(),
        );
        Self::decode(AnalysisStep::MarketResearch, self.complete(prompt).await?)
    }

    async fn positioning(
        &self,
        clarified: &ClarifiedIdea,
        market: &MarketResearch,
    ) -> Result<Positioning, StepError> {
        let competitor_names: Vec<&str> = market
            .competitors
            .iter()
            .take(5)
            .map(|c| c.name.as_str())
            .collect();
        let prompt = format!(
            "Position this startup against its competitors. Return JSON with keys \
             icp, positioning_statement, differentiators, unique_value.\n\
             Clarified idea: {}\nTop competitors: {:?}",
            serde_json::to_string(clarified).unwrap_or_default(),
            competitor_names,
        );
        Self::decode(AnalysisStep::Positioning, self.complete(prompt).await?)
    }

    async fn mvp_plan(
        &self,
        clarified: &ClarifiedIdea,
        positioning: &Positioning,
    ) -> Result<MvpPlan, StepError> {
        let prompt = format!(
            "Plan an MVP. Return JSON with keys features (name, description, \
             priority, effort), roadmap (week, goal, deliverables), success_metrics.\n\
             Solution: {}\nValue proposition: {}\nDifferentiators: {:?}",
            clarified.solution, clarified.value_proposition, positioning.differentiators,
        );
        Self::decode(AnalysisStep::MvpPlanner, self.complete(prompt).await?)
    }

    async fn debate(
        &self,
        market: &MarketResearch,
        positioning: &Positioning,
        mvp: &MvpPlan,
    ) -> Result<DebateSynthesis, StepError> {
        let context = format!(
            "Market: {} competitors found. Positioning: {}. MVP: {} features planned.",
            market.competitors.len(),
            positioning.positioning_statement,
            mvp.features.len(),
        );

        // bull and skeptic argue from the same context; the moderator
        // reconciles them into the persisted synthesis
        let bull = self
            .complete(format!(
                "As an optimistic investor, argue for this startup. Return JSON with \
                 keys points, evidence, conclusion.\n{context}"
            ))
            .await?;
        let skeptic = self
            .complete(format!(
                "As a skeptical investor, argue against this startup. Return JSON with \
                 keys points, evidence, conclusion.\n{context}"
            ))
            .await?;

        let prompt = format!(
            "Moderate this investor debate. Return JSON with keys bull_points, \
             skeptic_points, synthesis, mitigations, key_risks.\n\
             Bull argument: {bull}\nSkeptic argument: {skeptic}"
        );
        Self::decode(AnalysisStep::Debate, self.complete(prompt).await?)
    }

    async fn finance(
        &self,
        clarified: &ClarifiedIdea,
        positioning: &Positioning,
    ) -> Result<FinanceModel, StepError> {
        let prompt = format!(
            "Build a unit-economics model. Return JSON with keys inputs (cac, ltv, \
             monthly_churn, pricing, unit_cost), outputs (ltv_cac_ratio, \
             payback_months, gross_margin, break_even_customers), assumptions, \
             sensitivity_notes.\nBusiness model: {}\nICP: {}",
            clarified.solution, positioning.icp,
        );
        Self::decode(AnalysisStep::Finance, self.complete(prompt).await?)
    }

    async fn confidence_score(&self, dossier: &Dossier) -> Result<ConfidenceScore, StepError> {
        let prompt = format!(
            "Score the confidence of this analysis (all values 0-1). Return JSON with \
             keys overall_confidence, data_availability, source_quality, \
             assumption_density, reasoning.\nDossier summary: {}",
            Self::summarize(dossier),
        );
        Self::decode(AnalysisStep::ConfidenceScore, self.complete(prompt).await?)
    }

    async fn finalize(&self, dossier: &Dossier) -> Result<FinalReport, StepError> {
        let prompt = format!(
            "Write the final recommendation. Return JSON with keys recommendation \
             (GO, NO_GO or PIVOT), scorecard (market_opportunity, \
             competitive_advantage, execution_feasibility, financial_viability as \
             integers 1-10, overall_score, reasoning), key_insights, \
             next_experiments (hypothesis, test, success_criteria, timeline), \
             go_to_market_summary.\nDossier summary: {}",
            Self::summarize(dossier),
        );
        Self::decode(AnalysisStep::Finalizer, self.complete(prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_empty_mapping() {
        let err = LlmSteps::decode::<ClarifiedIdea>(AnalysisStep::Clarifier, json!({}))
            .unwrap_err();
        assert!(matches!(err, StepError::EmptyOutput { .. }));
    }

    #[test]
    fn test_decode_rejects_schema_mismatch() {
        let err = LlmSteps::decode::<ClarifiedIdea>(
            AnalysisStep::Clarifier,
            json!({"problem": "p"}),
        )
        .unwrap_err();
        assert!(matches!(err, StepError::InvalidOutput { .. }));
    }

    #[test]
    fn test_decode_accepts_valid_section() {
        let clarified: ClarifiedIdea = LlmSteps::decode(
            AnalysisStep::Clarifier,
            json!({
                "problem": "p",
                "solution": "s",
                "target_customer": "t",
                "value_proposition": "v",
                "assumptions": ["a1"],
            }),
        )
        .unwrap();
        assert_eq!(clarified.assumptions, vec!["a1"]);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let steps = LlmSteps::new("http://localhost:9000/", "key", "model");
        assert_eq!(steps.base_url, "http://localhost:9000");
    }
}
