//! Postgres-backed persistence: the `Database` repository, its row <-> entity
//! mappings, and the encryption-at-rest helper for stored provider tokens.
//!
//! `Database` implements `area_core::WorkflowStore`, so `area-scheduler` can
//! depend on the trait alone and swap in `area_core::testing::InMemoryStore`
//! for unit tests.

pub mod encryption;
pub mod models;
pub mod repositories;

pub use encryption::TokenCipher;
pub use repositories::Database;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use area_core::entities::{ResolvedWorkflow, UserServiceConnection, WorkflowLog};
use area_core::store::{NewWorkflowLog, WorkflowStore};

#[async_trait]
impl WorkflowStore for Database {
    async fn active_workflows(&self) -> anyhow::Result<Vec<ResolvedWorkflow>> {
        Database::active_workflows(self).await
    }

    async fn has_log_with_message(&self, workflow_id: Uuid, message: &str) -> anyhow::Result<bool> {
        Database::has_log_with_message(self, workflow_id, message).await
    }

    async fn has_log_containing(&self, workflow_id: Uuid, substring: &str) -> anyhow::Result<bool> {
        Database::has_log_containing(self, workflow_id, substring).await
    }

    async fn find_recent_log_with_message(
        &self,
        workflow_id: Uuid,
        message: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Option<WorkflowLog>> {
        Database::find_recent_log_with_message(self, workflow_id, message, since).await
    }

    async fn record_evaluation(
        &self,
        workflow_id: Uuid,
        triggered_at: DateTime<Utc>,
        log: NewWorkflowLog,
    ) -> anyhow::Result<WorkflowLog> {
        Database::record_evaluation(
            self,
            workflow_id,
            triggered_at,
            &log.status.to_string(),
            &log.message,
            log.execution_time_ms,
        )
        .await
    }

    async fn record_error(&self, workflow_id: Uuid, log: NewWorkflowLog) -> anyhow::Result<WorkflowLog> {
        Database::record_error(self, workflow_id, &log.message, log.execution_time_ms).await
    }

    async fn get_connection(&self, user_id: Uuid, service_name: &str) -> anyhow::Result<Option<UserServiceConnection>> {
        Database::get_connection(self, user_id, service_name).await
    }

    async fn update_connection_token(
        &self,
        connection_id: Uuid,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        Database::update_connection_token(self, connection_id, access_token, expires_at).await
    }
}
