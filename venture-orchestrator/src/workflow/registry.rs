//! Per-run task registry
//!
//! Every spawned run task is registered here so a supervising process can
//! await outstanding work at shutdown instead of silently dropping it.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a run task, pruning already-finished entries
    pub async fn register(&self, run_id: Uuid, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().await;
        tasks.retain(|_, h| !h.is_finished());
        tasks.insert(run_id, handle);
    }

    /// Number of tracked tasks that have not finished
    pub async fn outstanding(&self) -> usize {
        self.tasks
            .lock()
            .await
            .values()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Awaits every tracked task
    pub async fn shutdown(&self) {
        let tasks: Vec<(Uuid, JoinHandle<()>)> = self.tasks.lock().await.drain().collect();
        for (run_id, handle) in tasks {
            if let Err(e) = handle.await {
                tracing::warn!("Run task for {} panicked: {}", run_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_awaits_registered_tasks() {
        let registry = TaskRegistry::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        registry
            .register(
                Uuid::new_v4(),
                tokio::spawn(async move {
                    let _ = rx.await;
                }),
            )
            .await;
        assert_eq!(registry.outstanding().await, 1);

        tx.send(()).unwrap();
        registry.shutdown().await;
        assert_eq!(registry.outstanding().await, 0);
    }
}
