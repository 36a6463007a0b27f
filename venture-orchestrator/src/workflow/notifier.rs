//! Progress notifier
//!
//! Turns store polling into a push-style event stream for one run. Emits
//! an update only when the persisted fingerprint (`updated_at`) changed, so
//! several mutations between polls coalesce into one event carrying the
//! latest state. The stream always terminates: on a terminal status, on a
//! lookup/store failure, or when the poll budget runs out.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time;
use uuid::Uuid;
use venture_core::domain::dossier::Dossier;

use crate::storage::DossierStore;

/// One event on a run's progress stream
#[derive(Debug)]
pub enum RunEvent {
    /// State changed since the last emitted event
    Update(Box<Dossier>),
    /// The run reached a terminal status; final state attached
    Complete(Box<Dossier>),
    /// The run cannot be observed (missing, or the store failed)
    Error { message: String },
}

impl RunEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            RunEvent::Update(_) => "update",
            RunEvent::Complete(_) => "complete",
            RunEvent::Error { .. } => "error",
        }
    }

    /// SSE payload
    pub fn payload(&self) -> String {
        match self {
            RunEvent::Update(dossier) | RunEvent::Complete(dossier) => {
                serde_json::to_string(dossier).unwrap_or_else(|_| "{}".to_string())
            }
            RunEvent::Error { message } => {
                serde_json::json!({ "message": message }).to_string()
            }
        }
    }

    /// Whether the stream ends after this event
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::Complete(_) | RunEvent::Error { .. })
    }
}

/// Polls persisted run state and relays deltas to observers
pub struct ProgressNotifier {
    store: Arc<dyn DossierStore>,
    poll_interval: Duration,
    max_polls: usize,
}

impl ProgressNotifier {
    pub fn new(store: Arc<dyn DossierStore>, poll_interval: Duration, max_polls: usize) -> Self {
        Self {
            store,
            poll_interval,
            max_polls,
        }
    }

    /// Starts a poll loop for one run and returns its event channel
    ///
    /// The loop stops when the run terminates, the observer goes away, or
    /// `max_polls` is reached (abandoned non-terminal runs must not leak
    /// pollers).
    pub fn subscribe(&self, run_id: Uuid) -> mpsc::Receiver<RunEvent> {
        let (tx, rx) = mpsc::channel(16);
        let store = Arc::clone(&self.store);
        let poll_interval = self.poll_interval;
        let max_polls = self.max_polls;

        tokio::spawn(async move {
            let mut ticker = time::interval(poll_interval);
            let mut last_seen: Option<DateTime<Utc>> = None;

            for _ in 0..max_polls {
                ticker.tick().await;

                let dossier = match store.get_dossier(run_id).await {
                    Ok(Some(dossier)) => dossier,
                    Ok(None) => {
                        let _ = tx
                            .send(RunEvent::Error {
                                message: "Run not found".to_string(),
                            })
                            .await;
                        return;
                    }
                    Err(e) => {
                        tracing::error!("Progress poll failed for run {}: {}", run_id, e);
                        let _ = tx.send(RunEvent::Error { message: e.to_string() }).await;
                        return;
                    }
                };

                if last_seen != Some(dossier.updated_at) {
                    last_seen = Some(dossier.updated_at);
                    if tx
                        .send(RunEvent::Update(Box::new(dossier.clone())))
                        .await
                        .is_err()
                    {
                        // observer hung up
                        return;
                    }
                }

                if dossier.status.is_terminal() {
                    let _ = tx.send(RunEvent::Complete(Box::new(dossier))).await;
                    return;
                }
            }

            tracing::warn!(
                "Run {} not terminal after {} polls; closing progress stream",
                run_id,
                max_polls
            );
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use venture_core::domain::run::RunStatus;

    use crate::storage::MemoryStore;

    fn notifier(store: Arc<MemoryStore>, max_polls: usize) -> ProgressNotifier {
        ProgressNotifier::new(store, Duration::from_millis(50), max_polls)
    }

    async fn seeded_run(store: &MemoryStore, status: RunStatus) -> Dossier {
        let mut dossier = Dossier::new(Uuid::new_v4(), "idea".to_string());
        dossier.status = status;
        store.save_dossier(&dossier).await.unwrap();
        dossier
    }

    #[tokio::test]
    async fn test_terminal_run_yields_update_then_complete() {
        let store = Arc::new(MemoryStore::new());
        let dossier = seeded_run(&store, RunStatus::Done).await;

        let mut rx = notifier(store, 600).subscribe(dossier.run_id);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, RunEvent::Update(_)));
        let second = rx.recv().await.unwrap();
        match second {
            RunEvent::Complete(final_state) => assert_eq!(final_state.status, RunStatus::Done),
            other => panic!("expected complete, got {:?}", other),
        }
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_missing_run_yields_error() {
        let store = Arc::new(MemoryStore::new());
        let mut rx = notifier(store, 600).subscribe(Uuid::new_v4());

        let event = rx.recv().await.unwrap();
        match event {
            RunEvent::Error { message } => assert!(message.contains("not found")),
            other => panic!("expected error, got {:?}", other),
        }
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_mutations_between_polls_coalesce() {
        let store = Arc::new(MemoryStore::new());
        let mut dossier = seeded_run(&store, RunStatus::Running).await;

        let mut rx = notifier(store.clone(), 600).subscribe(dossier.run_id);

        // initial state
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, RunEvent::Update(_)));

        // two mutations land before the next poll
        dossier.mark("clarifier_started");
        dossier.touch();
        store.save_dossier(&dossier).await.unwrap();
        dossier.mark("clarifier_completed");
        dossier.touch();
        store.save_dossier(&dossier).await.unwrap();
        let latest = dossier.updated_at;

        let second = rx.recv().await.unwrap();
        match second {
            RunEvent::Update(seen) => assert_eq!(seen.updated_at, latest),
            other => panic!("expected one coalesced update, got {:?}", other),
        }

        // now finish the run; exactly update + complete follow
        dossier.status = RunStatus::Done;
        dossier.touch();
        store.save_dossier(&dossier).await.unwrap();

        let third = rx.recv().await.unwrap();
        assert!(matches!(third, RunEvent::Update(_)));
        let fourth = rx.recv().await.unwrap();
        assert!(matches!(fourth, RunEvent::Complete(_)));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_poll_budget_closes_abandoned_stream() {
        let store = Arc::new(MemoryStore::new());
        let dossier = seeded_run(&store, RunStatus::Running).await;

        let mut rx = notifier(store, 3).subscribe(dossier.run_id);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, RunEvent::Update(_)));
        // no further mutations: the stream must still close on its own
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unchanged_state_emits_no_duplicate_updates() {
        let store = Arc::new(MemoryStore::new());
        let dossier = seeded_run(&store, RunStatus::Running).await;

        let mut rx = notifier(store, 4).subscribe(dossier.run_id);

        let mut updates = 0;
        while let Some(event) = rx.recv().await {
            if matches!(event, RunEvent::Update(_)) {
                updates += 1;
            }
        }
        assert_eq!(updates, 1);
    }

    #[test]
    fn test_event_names_and_payloads() {
        let dossier = Dossier::new(Uuid::new_v4(), "idea".to_string());
        let update = RunEvent::Update(Box::new(dossier.clone()));
        assert_eq!(update.name(), "update");
        assert!(!update.is_terminal());

        let complete = RunEvent::Complete(Box::new(dossier));
        assert_eq!(complete.name(), "complete");
        assert!(complete.is_terminal());

        let error = RunEvent::Error {
            message: "boom".to_string(),
        };
        assert_eq!(error.name(), "error");
        assert!(error.is_terminal());
        assert!(error.payload().contains("boom"));
    }
}
