//! Workflow orchestrator
//!
//! Drives the stage table against one run: persists every state
//! transition, classifies failures by the stage's required/optional tag,
//! spawns the one background media scan after market research, and always
//! leaves the run in a terminal status.

pub mod notifier;
pub mod registry;

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;
use venture_core::domain::dossier::{Dossier, MarketResearch, MediaScan};
use venture_core::domain::run::{AnalysisStep, RunStatus};

use crate::integrations::{DossierIndexer, MediaScanProvider};
use crate::report::render_markdown;
use crate::steps::{default_pipeline, AnalysisSteps, StageSpec, StepError};
use crate::storage::{DossierStore, StoreError};
use registry::TaskRegistry;

/// Why a run ended in `Failed`
#[derive(Debug, Error)]
pub enum RunError {
    #[error("run {0} not found")]
    MissingRun(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: AnalysisStep,
        #[source]
        source: StepError,
    },
}

/// Executes the analysis pipeline for one run at a time
///
/// All collaborators are injected at construction; the orchestrator holds
/// no global state. One instance serves many runs; each run has exactly one
/// sequential writer (the task executing [`Orchestrator::run`]) plus at
/// most one background writer restricted to the `media_scan` section.
pub struct Orchestrator {
    store: Arc<dyn DossierStore>,
    steps: Arc<dyn AnalysisSteps>,
    media: Arc<dyn MediaScanProvider>,
    indexer: Option<Arc<dyn DossierIndexer>>,
    stages: Vec<StageSpec>,
    registry: TaskRegistry,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn DossierStore>,
        steps: Arc<dyn AnalysisSteps>,
        media: Arc<dyn MediaScanProvider>,
    ) -> Self {
        Self {
            store,
            steps,
            media,
            indexer: None,
            stages: default_pipeline(),
            registry: TaskRegistry::new(),
        }
    }

    /// Attaches the best-effort post-completion indexer
    pub fn with_indexer(mut self, indexer: Arc<dyn DossierIndexer>) -> Self {
        self.indexer = Some(indexer);
        self
    }

    /// Overrides the default stage table
    pub fn with_stages(mut self, stages: Vec<StageSpec>) -> Self {
        self.stages = stages;
        self
    }

    /// Spawns `run` as a tracked task
    pub async fn spawn_run(self: &Arc<Self>, run_id: Uuid, idea: String) {
        let orchestrator = Arc::clone(self);
        let handle = tokio::spawn(async move {
            orchestrator.run(run_id, idea).await;
        });
        self.registry.register(run_id, handle).await;
    }

    /// Awaits all in-flight runs (and, transitively, their media scans)
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }

    /// Runs the full pipeline for a queued run
    ///
    /// Fire-and-forget: all results land in the store. Never panics and
    /// never leaves the run in a non-terminal status short of the store
    /// itself failing while recording the failure.
    pub async fn run(&self, run_id: Uuid, idea: String) {
        tracing::info!("Starting workflow for run {}", run_id);

        match self.execute(run_id, &idea).await {
            Ok(()) => tracing::info!("Workflow completed for run {}", run_id),
            Err(error) => {
                tracing::error!("Workflow error for run {}: {}", run_id, error);
                self.fail_run(run_id, &error).await;
            }
        }
    }

    async fn execute(&self, run_id: Uuid, idea: &str) -> Result<(), RunError> {
        let mut dossier = self
            .store
            .get_dossier(run_id)
            .await?
            .ok_or(RunError::MissingRun(run_id))?;

        dossier.status = RunStatus::Running;
        dossier.touch();
        self.persist(&mut dossier).await?;

        let mut media_task: Option<JoinHandle<()>> = None;

        for spec in &self.stages {
            // persist the step marker first so observers see progress
            // before the stage completes
            dossier.current_step = Some(spec.step);
            dossier.mark(&format!("{}_started", spec.step));
            dossier.touch();
            self.persist(&mut dossier).await?;

            match self.execute_stage(spec.step, idea, &mut dossier).await {
                Ok(()) => {
                    dossier.mark(&format!("{}_completed", spec.step));
                    dossier.touch();
                    self.persist(&mut dossier).await?;

                    if spec.step == AnalysisStep::MarketResearch && media_task.is_none() {
                        if let Some(market) = dossier.market_research.clone() {
                            media_task =
                                Some(self.spawn_media_scan(run_id, idea.to_string(), market));
                        }
                    }
                }
                Err(source) if spec.required => {
                    return Err(RunError::Stage {
                        stage: spec.step,
                        source,
                    });
                }
                Err(source) => {
                    tracing::warn!(
                        "Optional stage {} failed for run {}; continuing: {}",
                        spec.step,
                        run_id,
                        source
                    );
                }
            }
        }

        // finalization: derive artifacts, then hand the dossier to the
        // indexer (its failure must not fail the run)
        let report = render_markdown(&dossier);
        self.store
            .save_artifact(run_id, "report.md", report.as_bytes())
            .await?;

        if let Some(indexer) = &self.indexer {
            if let Err(e) = indexer.index_dossier(&dossier).await {
                tracing::warn!("Dossier indexing failed for run {}: {}", run_id, e);
            }
        }

        dossier.status = RunStatus::Done;
        dossier.current_step = None;
        dossier.touch();
        self.persist(&mut dossier).await?;

        // the media scan persists its own section and may land after the
        // run is already Done; the terminal transition does not wait for
        // it, but the run task does, so shutdown can't strand it
        if let Some(handle) = media_task {
            if !handle.is_finished() {
                tracing::info!("Media scan still running for {}; awaiting in background", run_id);
            }
            if let Err(e) = handle.await {
                tracing::warn!("Media scan task panicked for run {}: {}", run_id, e);
            }
        }

        Ok(())
    }

    /// Saves the dossier without clobbering a media scan that landed
    /// between our saves
    async fn persist(&self, dossier: &mut Dossier) -> Result<(), StoreError> {
        if dossier.media_scan.is_none() {
            if let Some(stored) = self.store.get_dossier(dossier.run_id).await? {
                if let Some(scan) = stored.media_scan {
                    dossier.media_scan = Some(scan);
                }
            }
        }
        self.store.save_dossier(dossier).await
    }

    async fn execute_stage(
        &self,
        step: AnalysisStep,
        idea: &str,
        dossier: &mut Dossier,
    ) -> Result<(), StepError> {
        match step {
            AnalysisStep::Clarifier => {
                let clarified = self.steps.clarify(idea).await?;
                dossier.clarified_idea = Some(clarified);
            }
            AnalysisStep::MarketResearch => {
                let clarified = require(&dossier.clarified_idea, step, "clarified_idea")?;
                let market = self.steps.market_research(clarified).await?;
                dossier.market_research = Some(market);
            }
            AnalysisStep::Positioning => {
                let clarified = require(&dossier.clarified_idea, step, "clarified_idea")?;
                let market = require(&dossier.market_research, step, "market_research")?;
                let positioning = self.steps.positioning(clarified, market).await?;
                dossier.positioning = Some(positioning);
            }
            AnalysisStep::MvpPlanner => {
                let clarified = require(&dossier.clarified_idea, step, "clarified_idea")?;
                let positioning = require(&dossier.positioning, step, "positioning")?;
                let mvp = self.steps.mvp_plan(clarified, positioning).await?;
                dossier.mvp_plan = Some(mvp);
            }
            AnalysisStep::Debate => {
                let market = require(&dossier.market_research, step, "market_research")?;
                let positioning = require(&dossier.positioning, step, "positioning")?;
                let mvp = require(&dossier.mvp_plan, step, "mvp_plan")?;
                let debate = self.steps.debate(market, positioning, mvp).await?;
                dossier.debate = Some(debate);
            }
            AnalysisStep::Finance => {
                let clarified = require(&dossier.clarified_idea, step, "clarified_idea")?;
                let positioning = require(&dossier.positioning, step, "positioning")?;
                let finance = self.steps.finance(clarified, positioning).await?;
                dossier.finance = Some(finance);
            }
            AnalysisStep::ConfidenceScore => {
                let score = self.steps.confidence_score(dossier).await?;
                dossier.confidence_score = Some(score);
            }
            AnalysisStep::Finalizer => {
                let report = self.steps.finalize(dossier).await?;
                dossier.final_report = Some(report);
            }
        }
        Ok(())
    }

    /// Spawns the background competitor media scan
    ///
    /// Reads only data committed at spawn time; writes back by reloading
    /// the current dossier and setting its one section, so sequential
    /// writes made in the meantime survive. Never fails the run.
    fn spawn_media_scan(
        &self,
        run_id: Uuid,
        idea: String,
        market: MarketResearch,
    ) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let media = Arc::clone(&self.media);

        tokio::spawn(async move {
            tracing::info!("Starting background media scan for run {}", run_id);

            let scan = match media.scan(&idea, &market).await {
                Ok(scan) => scan,
                Err(e) => {
                    tracing::error!("Media scan failed for run {}: {}", run_id, e);
                    MediaScan::failed(format!("media scan failed: {}", e))
                }
            };

            match store.get_dossier(run_id).await {
                Ok(Some(mut dossier)) => {
                    dossier.media_scan = Some(scan);
                    dossier.mark("media_scan_completed");
                    dossier.touch();
                    if let Err(e) = store.save_dossier(&dossier).await {
                        tracing::error!("Could not persist media scan for run {}: {}", run_id, e);
                    }
                }
                Ok(None) => {
                    tracing::error!("Run {} disappeared before media scan could persist", run_id);
                }
                Err(e) => {
                    tracing::error!("Could not reload run {} for media scan: {}", run_id, e);
                }
            }
        })
    }

    /// Global failure handler; must never propagate an error itself
    async fn fail_run(&self, run_id: Uuid, error: &RunError) {
        let mut dossier = match self.store.get_dossier(run_id).await {
            Ok(Some(dossier)) => dossier,
            Ok(None) => {
                tracing::error!("Run {} missing while recording failure", run_id);
                return;
            }
            Err(e) => {
                tracing::error!("Could not load run {} to record failure: {}", run_id, e);
                return;
            }
        };

        dossier.status = RunStatus::Failed;
        dossier.error = Some(error.to_string());
        dossier.current_step = None;
        dossier.touch();

        if let Err(e) = self.store.save_dossier(&dossier).await {
            // last line of defense: log and swallow
            tracing::error!("Could not persist failure for run {}: {}", run_id, e);
        }
    }
}

fn require<'a, T>(
    section: &'a Option<T>,
    stage: AnalysisStep,
    name: &'static str,
) -> Result<&'a T, StepError> {
    section.as_ref().ok_or(StepError::MissingInput {
        stage,
        missing: name,
    })
}
