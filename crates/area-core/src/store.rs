//! The `Store` collaborator (§6): the narrow slice of persistence the
//! Scheduler needs. `area-storage::Database` implements this trait against
//! Postgres; `area-core::testing::InMemoryStore` implements it in memory for
//! unit tests that should not need a running database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::{LogStatus, ResolvedWorkflow, UserServiceConnection, WorkflowLog};

/// Input for a new `WorkflowLog` row; `workflow_id` and `triggered_at` are
/// supplied by the store methods that accept this, not duplicated here.
#[derive(Debug, Clone)]
pub struct NewWorkflowLog {
    pub status: LogStatus,
    pub message: String,
    pub execution_time_ms: i64,
}

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// All workflows with `is_active = true`, resolved against their
    /// Action/Reaction/Service rows, in a stable (but otherwise
    /// unspecified) order — §4.1 step 1.
    async fn active_workflows(&self) -> anyhow::Result<Vec<ResolvedWorkflow>>;

    /// Exact-match dedup lookup used by email/GitHub/Facebook/Spotify
    /// Checkers.
    async fn has_log_with_message(&self, workflow_id: Uuid, message: &str) -> anyhow::Result<bool>;

    /// Substring dedup lookup used by the Drive Checker (the file id must
    /// appear anywhere in a prior log's message).
    async fn has_log_containing(&self, workflow_id: Uuid, substring: &str) -> anyhow::Result<bool>;

    /// Most recent log row with this exact message, if logged at or after
    /// `since` — used by the Spotify `playback_started` 5-minute window.
    async fn find_recent_log_with_message(
        &self,
        workflow_id: Uuid,
        message: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Option<WorkflowLog>>;

    /// Transactionally set `last_triggered = triggered_at` and append `log`.
    /// Used whenever a workflow's Action fired, regardless of whether the
    /// Reaction subsequently succeeded.
    async fn record_evaluation(
        &self,
        workflow_id: Uuid,
        triggered_at: DateTime<Utc>,
        log: NewWorkflowLog,
    ) -> anyhow::Result<WorkflowLog>;

    /// Append an `error`-status log without touching `last_triggered` — used
    /// by the tick's isolation boundary when a Checker/Executor fails
    /// unexpectedly.
    async fn record_error(&self, workflow_id: Uuid, log: NewWorkflowLog) -> anyhow::Result<WorkflowLog>;

    async fn get_connection(
        &self,
        user_id: Uuid,
        service_name: &str,
    ) -> anyhow::Result<Option<UserServiceConnection>>;

    async fn update_connection_token(
        &self,
        connection_id: Uuid,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
}
