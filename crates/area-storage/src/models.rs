//! Row types for `sqlx::query_as`. Kept separate from `area_core::entities`
//! so the domain layer never depends on the database: conversions live here.

use area_core::entities::{Action, LogStatus, Reaction, Service, User, UserServiceConnection, Workflow, WorkflowLog};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub oauth_provider: Option<String>,
    pub oauth_provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            oauth_provider: row.oauth_provider,
            oauth_provider_id: row.oauth_provider_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ServiceRow {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub requires_oauth: bool,
    pub is_active: bool,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            description: row.description,
            requires_oauth: row.requires_oauth,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ActionRow {
    pub id: Uuid,
    pub service_id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub config_schema: serde_json::Value,
}

impl From<ActionRow> for Action {
    fn from(row: ActionRow) -> Self {
        Action {
            id: row.id,
            service_id: row.service_id,
            name: row.name,
            display_name: row.display_name,
            description: row.description,
            config_schema: row.config_schema,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ReactionRow {
    pub id: Uuid,
    pub service_id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub config_schema: serde_json::Value,
}

impl From<ReactionRow> for Reaction {
    fn from(row: ReactionRow) -> Self {
        Reaction {
            id: row.id,
            service_id: row.service_id,
            name: row.name,
            display_name: row.display_name,
            description: row.description,
            config_schema: row.config_schema,
        }
    }
}

/// Connection row as stored: tokens are encrypted ciphertext, decrypted only
/// by `Database::get_connection`/`update_connection_token` via `TokenCipher`.
#[derive(Debug, Clone, FromRow)]
pub struct UserServiceConnectionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub access_token: Vec<u8>,
    pub refresh_token: Option<Vec<u8>>,
    pub token_expires_at: DateTime<Utc>,
    pub connected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserServiceConnectionRow {
    pub fn decrypt(self, cipher: &crate::encryption::TokenCipher) -> anyhow::Result<UserServiceConnection> {
        Ok(UserServiceConnection {
            id: self.id,
            user_id: self.user_id,
            service_id: self.service_id,
            access_token: cipher.decrypt(&self.access_token)?,
            refresh_token: self
                .refresh_token
                .as_deref()
                .map(|t| cipher.decrypt(t))
                .transpose()?,
            token_expires_at: self.token_expires_at,
            connected_at: self.connected_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub action_id: Uuid,
    pub reaction_id: Uuid,
    pub action_config: serde_json::Value,
    pub reaction_config: serde_json::Value,
    pub is_active: bool,
    pub last_triggered: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkflowRow> for Workflow {
    fn from(row: WorkflowRow) -> Self {
        Workflow {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            action_id: row.action_id,
            reaction_id: row.reaction_id,
            action_config: row.action_config,
            reaction_config: row.reaction_config,
            is_active: row.is_active,
            last_triggered: row.last_triggered,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkflowLogRow {
    pub id: Uuid,
    pub area_id: Uuid,
    pub status: String,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    pub execution_time_ms: i64,
}

impl TryFrom<WorkflowLogRow> for WorkflowLog {
    type Error = anyhow::Error;

    fn try_from(row: WorkflowLogRow) -> Result<Self, Self::Error> {
        Ok(WorkflowLog {
            id: row.id,
            workflow_id: row.area_id,
            status: row.status.parse::<LogStatus>()?,
            message: row.message,
            triggered_at: row.triggered_at,
            execution_time_ms: row.execution_time_ms,
        })
    }
}

/// A `user_areas` row joined against its `actions`/`reactions`/`services`,
/// produced by the single query `Database::active_workflows` runs.
#[derive(Debug, Clone, FromRow)]
pub struct ResolvedWorkflowRow {
    pub workflow_id: Uuid,
    pub user_id: Uuid,
    pub workflow_name: String,
    pub action_id: Uuid,
    pub reaction_id: Uuid,
    pub action_config: serde_json::Value,
    pub reaction_config: serde_json::Value,
    pub is_active: bool,
    pub last_triggered: Option<DateTime<Utc>>,
    pub workflow_created_at: DateTime<Utc>,
    pub workflow_updated_at: DateTime<Utc>,

    pub action_service_id: Uuid,
    pub action_name: String,
    pub action_display_name: String,
    pub action_description: Option<String>,
    pub action_config_schema: serde_json::Value,

    pub reaction_service_id: Uuid,
    pub reaction_name: String,
    pub reaction_display_name: String,
    pub reaction_description: Option<String>,
    pub reaction_config_schema: serde_json::Value,

    pub action_service_name: String,
    pub action_service_display_name: String,
    pub action_service_description: Option<String>,
    pub action_service_requires_oauth: bool,
    pub action_service_is_active: bool,

    pub reaction_service_name: String,
    pub reaction_service_display_name: String,
    pub reaction_service_description: Option<String>,
    pub reaction_service_requires_oauth: bool,
    pub reaction_service_is_active: bool,
}

impl From<ResolvedWorkflowRow> for area_core::entities::ResolvedWorkflow {
    fn from(r: ResolvedWorkflowRow) -> Self {
        area_core::entities::ResolvedWorkflow {
            workflow: Workflow {
                id: r.workflow_id,
                user_id: r.user_id,
                name: r.workflow_name,
                action_id: r.action_id,
                reaction_id: r.reaction_id,
                action_config: r.action_config,
                reaction_config: r.reaction_config,
                is_active: r.is_active,
                last_triggered: r.last_triggered,
                created_at: r.workflow_created_at,
                updated_at: r.workflow_updated_at,
            },
            action: Action {
                id: r.action_id,
                service_id: r.action_service_id,
                name: r.action_name,
                display_name: r.action_display_name,
                description: r.action_description,
                config_schema: r.action_config_schema,
            },
            action_service: Service {
                id: r.action_service_id,
                name: r.action_service_name,
                display_name: r.action_service_display_name,
                description: r.action_service_description,
                requires_oauth: r.action_service_requires_oauth,
                is_active: r.action_service_is_active,
            },
            reaction: Reaction {
                id: r.reaction_id,
                service_id: r.reaction_service_id,
                name: r.reaction_name,
                display_name: r.reaction_display_name,
                description: r.reaction_description,
                config_schema: r.reaction_config_schema,
            },
            reaction_service: Service {
                id: r.reaction_service_id,
                name: r.reaction_service_name,
                display_name: r.reaction_service_display_name,
                description: r.reaction_service_description,
                requires_oauth: r.reaction_service_requires_oauth,
                is_active: r.reaction_service_is_active,
            },
        }
    }
}
