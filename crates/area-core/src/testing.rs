//! In-memory `WorkflowStore` double, for tests that exercise the Scheduler
//! and Checkers/Executors without a running Postgres instance. Mirrors the
//! teacher's always-compiled `NoopCapability` test double rather than a
//! `#[cfg(test)]`-gated mock, so downstream crates can reuse it too.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::{ResolvedWorkflow, UserServiceConnection, WorkflowLog};
use crate::store::{NewWorkflowLog, WorkflowStore};

#[derive(Default)]
pub struct InMemoryStore {
    workflows: Mutex<Vec<ResolvedWorkflow>>,
    logs: Mutex<Vec<WorkflowLog>>,
    connections: Mutex<Vec<(String, UserServiceConnection)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_workflow(&self, workflow: ResolvedWorkflow) {
        self.workflows.lock().unwrap().push(workflow);
    }

    pub fn add_connection(&self, service_name: impl Into<String>, connection: UserServiceConnection) {
        self.connections
            .lock()
            .unwrap()
            .push((service_name.into(), connection));
    }

    pub fn logs_for(&self, workflow_id: Uuid) -> Vec<WorkflowLog> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.workflow_id == workflow_id)
            .cloned()
            .collect()
    }

    pub fn last_triggered(&self, workflow_id: Uuid) -> Option<DateTime<Utc>> {
        self.workflows
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.workflow.id == workflow_id)
            .and_then(|w| w.workflow.last_triggered)
    }

    fn push_log(&self, workflow_id: Uuid, triggered_at: DateTime<Utc>, log: NewWorkflowLog) -> WorkflowLog {
        let row = WorkflowLog {
            id: Uuid::now_v7(),
            workflow_id,
            status: log.status,
            message: log.message,
            triggered_at,
            execution_time_ms: log.execution_time_ms,
        };
        self.logs.lock().unwrap().push(row.clone());
        row
    }
}

#[async_trait]
impl WorkflowStore for InMemoryStore {
    async fn active_workflows(&self) -> anyhow::Result<Vec<ResolvedWorkflow>> {
        Ok(self
            .workflows
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.workflow.is_active)
            .cloned()
            .collect())
    }

    async fn has_log_with_message(&self, workflow_id: Uuid, message: &str) -> anyhow::Result<bool> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .any(|l| l.workflow_id == workflow_id && l.message == message))
    }

    async fn has_log_containing(&self, workflow_id: Uuid, substring: &str) -> anyhow::Result<bool> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .any(|l| l.workflow_id == workflow_id && l.message.contains(substring)))
    }

    async fn find_recent_log_with_message(
        &self,
        workflow_id: Uuid,
        message: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Option<WorkflowLog>> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.workflow_id == workflow_id && l.message == message && l.triggered_at >= since)
            .cloned())
    }

    async fn record_evaluation(
        &self,
        workflow_id: Uuid,
        triggered_at: DateTime<Utc>,
        log: NewWorkflowLog,
    ) -> anyhow::Result<WorkflowLog> {
        let mut workflows = self.workflows.lock().unwrap();
        if let Some(w) = workflows.iter_mut().find(|w| w.workflow.id == workflow_id) {
            w.workflow.last_triggered = Some(triggered_at);
        }
        drop(workflows);
        Ok(self.push_log(workflow_id, triggered_at, log))
    }

    async fn record_error(&self, workflow_id: Uuid, log: NewWorkflowLog) -> anyhow::Result<WorkflowLog> {
        Ok(self.push_log(workflow_id, Utc::now(), log))
    }

    async fn get_connection(
        &self,
        user_id: Uuid,
        service_name: &str,
    ) -> anyhow::Result<Option<UserServiceConnection>> {
        Ok(self
            .connections
            .lock()
            .unwrap()
            .iter()
            .find(|(name, c)| c.user_id == user_id && name == service_name)
            .map(|(_, c)| c.clone()))
    }

    async fn update_connection_token(
        &self,
        connection_id: Uuid,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut connections = self.connections.lock().unwrap();
        if let Some((_, c)) = connections.iter_mut().find(|(_, c)| c.id == connection_id) {
            c.access_token = access_token.to_string();
            c.token_expires_at = expires_at;
            c.updated_at = Utc::now();
        }
        Ok(())
    }
}
