//! Domain entities shared by the storage, scheduler and API crates.
//!
//! These mirror the Store's schema but are not `sqlx::FromRow` themselves —
//! `area-storage` owns the row <-> entity mapping, so the domain types here
//! stay free of any database dependency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

/// A registered user of the engine. Either `password_hash` or the
/// `(oauth_provider, oauth_provider_id)` pair must be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub oauth_provider: Option<String>,
    pub oauth_provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog row describing an integration provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub requires_oauth: bool,
    pub is_active: bool,
}

/// A named trigger condition exposed by a `Service`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    pub service_id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub config_schema: Json,
}

/// A named effect exposed by a `Service`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: Uuid,
    pub service_id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub config_schema: Json,
}

/// Persisted OAuth tokens linking a `User` to a `Service`. At most one per
/// `(user_id, service_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserServiceConnection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: DateTime<Utc>,
    pub connected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserServiceConnection {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.token_expires_at
    }
}

/// A user-defined `(Action, Reaction, config, config)` record, evaluated
/// periodically by the scheduler. Called `UserArea` in the original source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub action_id: Uuid,
    pub reaction_id: Uuid,
    pub action_config: Json,
    pub reaction_config: Json,
    pub is_active: bool,
    pub last_triggered: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fully resolved workflow: the `Workflow` row plus the `Action`/`Reaction`
/// (and their owning `Service`) it references. The dispatcher and checkers
/// operate on this, never on bare IDs.
#[derive(Debug, Clone)]
pub struct ResolvedWorkflow {
    pub workflow: Workflow,
    pub action: Action,
    pub action_service: Service,
    pub reaction: Reaction,
    pub reaction_service: Service,
}

impl ResolvedWorkflow {
    pub fn action_config(&self) -> &Json {
        &self.workflow.action_config
    }

    pub fn reaction_config(&self) -> &Json {
        &self.workflow.reaction_config
    }
}

/// Status of a single workflow evaluation, recorded to `WorkflowLog.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Failed,
    Error,
    Skipped,
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogStatus::Success => "success",
            LogStatus::Failed => "failed",
            LogStatus::Error => "error",
            LogStatus::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for LogStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(LogStatus::Success),
            "failed" => Ok(LogStatus::Failed),
            "error" => Ok(LogStatus::Error),
            "skipped" => Ok(LogStatus::Skipped),
            other => anyhow::bail!("unknown log status: {other}"),
        }
    }
}

/// An append-only execution record for a `Workflow` evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowLog {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub status: LogStatus,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    pub execution_time_ms: i64,
}
