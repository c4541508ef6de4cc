//! The tick loop (§4.1/§5): once per `tickInterval`, evaluate every active
//! workflow in sequence, isolating each workflow's failures from its
//! neighbors, with a total-tick timeout and `tokio::sync::watch`-based
//! shutdown grounded in `durable::worker::poller::TaskPoller`.

use std::sync::Arc;
use std::time::Instant;

use area_core::entities::ResolvedWorkflow;
use area_core::store::NewWorkflowLog;
use area_core::{AreaError, LogStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::context::EvalContext;
use crate::dispatcher::Dispatcher;
use crate::leader::LeaderLock;

pub struct Scheduler {
    ctx: Arc<EvalContext>,
    dispatcher: Arc<Dispatcher>,
}

impl Scheduler {
    pub fn new(ctx: Arc<EvalContext>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { ctx, dispatcher }
    }

    /// Evaluate every active workflow once, sequentially. Each workflow's
    /// evaluation is isolated: one workflow's failure never aborts the tick
    /// or affects another workflow's evaluation.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> anyhow::Result<()> {
        let workflows = self.ctx.store.active_workflows().await?;
        debug!(count = workflows.len(), "evaluating active workflows");

        let deadline = self.ctx.config.tick_timeout();
        match tokio::time::timeout(deadline, self.evaluate_all(&workflows)).await {
            Ok(()) => Ok(()),
            Err(_) => {
                warn!(?deadline, "tick exceeded its total timeout; remaining workflows skipped this tick");
                Ok(())
            }
        }
    }

    async fn evaluate_all(&self, workflows: &[ResolvedWorkflow]) {
        for workflow in workflows {
            self.evaluate_workflow(workflow).await;
        }
    }

    #[instrument(skip(self, workflow), fields(workflow_id = %workflow.workflow.id))]
    async fn evaluate_workflow(&self, workflow: &ResolvedWorkflow) {
        let started = Instant::now();
        if let Err(e) = self.evaluate_workflow_inner(workflow, started).await {
            // §7's taxonomy: Config/ConnectionMissing/Provider/UnknownKind are
            // anticipated failure kinds surfaced as `status=failed`; only a
            // true `Internal` error — one that escaped a Checker/Executor
            // unexpectedly rather than being returned via `TriggerOutcome`/
            // `ExecutionResult` — gets `status=error`.
            let status = match &e {
                AreaError::Internal(_) => LogStatus::Error,
                AreaError::Config(_) | AreaError::ConnectionMissing { .. } | AreaError::Provider(_) | AreaError::UnknownKind(_) => {
                    LogStatus::Failed
                }
            };
            warn!(error = %e, ?status, "workflow evaluation did not complete");
            let log = NewWorkflowLog {
                status,
                message: e.to_string(),
                execution_time_ms: started.elapsed().as_millis() as i64,
            };
            let record = match status {
                LogStatus::Error => self.ctx.store.record_error(workflow.workflow.id, log).await,
                _ => self.ctx.store.record_evaluation(workflow.workflow.id, self.ctx.clock.now_utc(), log).await,
            };
            if let Err(store_err) = record {
                error!(error = %store_err, "failed to record evaluation outcome");
            }
        }
    }

    async fn evaluate_workflow_inner(&self, workflow: &ResolvedWorkflow, started: Instant) -> area_core::Result<()> {
        let checker = self.dispatcher.checker_for(&workflow.action.name)?;
        let outcome = checker.check(workflow, &self.ctx).await;

        if !outcome.fired {
            return Ok(());
        }

        if let Some(error) = outcome.error {
            let log = NewWorkflowLog {
                status: LogStatus::Failed,
                message: error,
                execution_time_ms: started.elapsed().as_millis() as i64,
            };
            self.ctx
                .store
                .record_evaluation(workflow.workflow.id, self.ctx.clock.now_utc(), log)
                .await
                .map_err(AreaError::Internal)?;
            return Ok(());
        }

        let fingerprint = outcome.metadata.unwrap_or_default();
        let executor = self.dispatcher.executor_for(&workflow.reaction.name)?;
        let exec_result = executor.execute(workflow, &self.ctx).await;

        let status = if exec_result.success { LogStatus::Success } else { LogStatus::Failed };
        let message = if fingerprint.is_empty() { exec_result.log_message() } else { fingerprint };

        let log = NewWorkflowLog {
            status,
            message,
            execution_time_ms: started.elapsed().as_millis() as i64,
        };
        self.ctx
            .store
            .record_evaluation(workflow.workflow.id, self.ctx.clock.now_utc(), log)
            .await
            .map_err(AreaError::Internal)?;

        Ok(())
    }

    /// Runs the tick loop until `shutdown_rx` fires, taking `leader` once at
    /// startup and retrying acquisition on every tick boundary until it
    /// succeeds (a non-leader process sits idle rather than evaluating).
    pub fn spawn(self: Arc<Self>, mut leader: Box<dyn LeaderLock>, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        let tick_interval = self.ctx.config.tick_interval();
        tokio::spawn(async move {
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }

                match leader.try_acquire().await {
                    Ok(true) => {
                        if let Err(e) = self.tick().await {
                            error!(error = %e, "scheduler tick failed");
                        }
                    }
                    Ok(false) => debug!("not the leader this tick; skipping evaluation"),
                    Err(e) => error!(error = %e, "leader lock acquisition failed"),
                }

                tokio::select! {
                    _ = tokio::time::sleep(tick_interval) => {}
                    _ = shutdown_rx.changed() => break,
                }
            }

            if let Err(e) = leader.release().await {
                error!(error = %e, "failed to release leader lock on shutdown");
            }
        })
    }
}

/// Owns the shutdown signal and the spawned tick-loop task, so `area-api`'s
/// `main` can `start()`/`stop()` the scheduler as one lifecycle unit.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn start(scheduler: Arc<Scheduler>, leader: Box<dyn LeaderLock>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = scheduler.spawn(leader, shutdown_rx);
        Self { shutdown_tx, task }
    }

    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "scheduler task panicked during shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{Checker, DispatcherBuilder, Executor};
    use crate::testing;
    use area_core::{ExecutionResult, TriggerOutcome};
    use async_trait::async_trait;

    struct AlwaysFires;

    #[async_trait]
    impl Checker for AlwaysFires {
        async fn check(&self, _workflow: &ResolvedWorkflow, _ctx: &EvalContext) -> TriggerOutcome {
            TriggerOutcome::fired("fp-1")
        }
    }

    struct AlwaysSucceeds;

    #[async_trait]
    impl Executor for AlwaysSucceeds {
        async fn execute(&self, _workflow: &ResolvedWorkflow, _ctx: &EvalContext) -> ExecutionResult {
            ExecutionResult::ok("done")
        }
    }

    #[tokio::test]
    async fn tick_records_evaluation_on_fired_workflow() {
        let (ctx, store) = testing::eval_context_with_store();
        let mut workflow = testing::resolved_workflow(serde_json::json!({}), serde_json::json!({}));
        workflow.action.name = "always_fires".to_string();
        workflow.reaction.name = "always_succeeds".to_string();
        let workflow_id = workflow.workflow.id;
        store.add_workflow(workflow);

        let dispatcher = Arc::new(
            DispatcherBuilder::new()
                .checker("always_fires", AlwaysFires)
                .executor("always_succeeds", AlwaysSucceeds)
                .build(),
        );

        let scheduler = Scheduler::new(Arc::new(ctx), dispatcher);
        scheduler.tick().await.unwrap();

        let logs = store.logs_for(workflow_id);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "fp-1");
    }

    /// §8 invariant: a workflow whose evaluation errors must not prevent a
    /// later workflow in the same tick from being evaluated and logged.
    #[tokio::test]
    async fn a_failing_workflow_does_not_block_a_later_workflow_in_the_same_tick() {
        let (ctx, store) = testing::eval_context_with_store();

        let mut broken = testing::resolved_workflow(serde_json::json!({}), serde_json::json!({}));
        broken.action.name = "no_such_action".to_string();
        broken.reaction.name = "always_succeeds".to_string();
        let broken_id = broken.workflow.id;
        store.add_workflow(broken);

        let mut healthy = testing::resolved_workflow(serde_json::json!({}), serde_json::json!({}));
        healthy.action.name = "always_fires".to_string();
        healthy.reaction.name = "always_succeeds".to_string();
        let healthy_id = healthy.workflow.id;
        store.add_workflow(healthy);

        let dispatcher = Arc::new(
            DispatcherBuilder::new()
                .checker("always_fires", AlwaysFires)
                .executor("always_succeeds", AlwaysSucceeds)
                .build(),
        );

        let scheduler = Scheduler::new(Arc::new(ctx), dispatcher);
        scheduler.tick().await.unwrap();

        let broken_logs = store.logs_for(broken_id);
        assert_eq!(broken_logs.len(), 1);
        assert_eq!(broken_logs[0].status, LogStatus::Failed);
        assert!(broken_logs[0].message.starts_with("Unknown"), "{}", broken_logs[0].message);

        let healthy_logs = store.logs_for(healthy_id);
        assert_eq!(healthy_logs.len(), 1);
        assert_eq!(healthy_logs[0].status, LogStatus::Success);
    }

    /// §8 scenario 4: an unregistered action kind surfaces as a
    /// `status=failed` log whose message starts with "Unknown"; the workflow
    /// is left active for the next tick rather than disabled.
    #[tokio::test]
    async fn unknown_action_kind_logs_failed_with_unknown_message() {
        let (ctx, store) = testing::eval_context_with_store();

        let mut workflow = testing::resolved_workflow(serde_json::json!({}), serde_json::json!({}));
        workflow.action.name = "nonsense_action".to_string();
        workflow.reaction.name = "always_succeeds".to_string();
        let workflow_id = workflow.workflow.id;
        assert!(workflow.workflow.is_active);
        store.add_workflow(workflow);

        let dispatcher = Arc::new(DispatcherBuilder::new().executor("always_succeeds", AlwaysSucceeds).build());

        let scheduler = Scheduler::new(Arc::new(ctx), dispatcher);
        scheduler.tick().await.unwrap();

        let logs = store.logs_for(workflow_id);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Failed);
        assert!(logs[0].message.starts_with("Unknown"), "{}", logs[0].message);
    }
}
