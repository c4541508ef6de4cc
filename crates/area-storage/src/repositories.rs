//! `Database`: the Postgres-backed repository. Grounded in the teacher's
//! `everruns-storage::repositories::Database` — a thin `PgPool` wrapper with
//! one method per query, `query_as` over hand-written SQL rather than a
//! query-builder DSL.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use area_core::entities::{Action, Reaction, ResolvedWorkflow, Service, User, UserServiceConnection, Workflow, WorkflowLog};

use crate::encryption::TokenCipher;
use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    cipher: TokenCipher,
}

impl Database {
    pub fn new(pool: PgPool, cipher: TokenCipher) -> Self {
        Self { pool, cipher }
    }

    pub async fn connect(database_url: &str, cipher: TokenCipher) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool, cipher))
    }

    /// Run the single bundled migration. Idempotent: every statement in
    /// `migrations/0001_init.sql` is `CREATE ... IF NOT EXISTS`.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: Option<&str>,
        oauth_provider: Option<&str>,
        oauth_provider_id: Option<&str>,
    ) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, password_hash, oauth_provider, oauth_provider_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, password_hash, oauth_provider, oauth_provider_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(oauth_provider)
        .bind(oauth_provider_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, oauth_provider, oauth_provider_id, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    // ============================================
    // Services / Actions / Reactions (seeded catalog)
    // ============================================

    pub async fn upsert_service(
        &self,
        name: &str,
        display_name: &str,
        description: Option<&str>,
        requires_oauth: bool,
    ) -> Result<Service> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            INSERT INTO services (id, name, display_name, description, requires_oauth)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE SET display_name = EXCLUDED.display_name
            RETURNING id, name, display_name, description, requires_oauth, is_active
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(display_name)
        .bind(description)
        .bind(requires_oauth)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn get_service_by_name(&self, name: &str) -> Result<Option<Service>> {
        let row = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, name, display_name, description, requires_oauth, is_active FROM services WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn upsert_action(
        &self,
        service_id: Uuid,
        name: &str,
        display_name: &str,
        description: Option<&str>,
        config_schema: serde_json::Value,
    ) -> Result<Action> {
        let row = sqlx::query_as::<_, ActionRow>(
            r#"
            INSERT INTO actions (id, service_id, name, display_name, description, config_schema)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (service_id, name) DO NOTHING
            RETURNING id, service_id, name, display_name, description, config_schema
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(service_id)
        .bind(name)
        .bind(display_name)
        .bind(description)
        .bind(&config_schema)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => self.get_action(service_id, name).await?.ok_or_else(|| {
                anyhow::anyhow!("action '{name}' should exist after ON CONFLICT DO NOTHING")
            }),
        }
    }

    pub async fn get_action(&self, service_id: Uuid, name: &str) -> Result<Option<Action>> {
        let row = sqlx::query_as::<_, ActionRow>(
            "SELECT id, service_id, name, display_name, description, config_schema FROM actions WHERE service_id = $1 AND name = $2",
        )
        .bind(service_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn upsert_reaction(
        &self,
        service_id: Uuid,
        name: &str,
        display_name: &str,
        description: Option<&str>,
        config_schema: serde_json::Value,
    ) -> Result<Reaction> {
        let row = sqlx::query_as::<_, ReactionRow>(
            r#"
            INSERT INTO reactions (id, service_id, name, display_name, description, config_schema)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (service_id, name) DO NOTHING
            RETURNING id, service_id, name, display_name, description, config_schema
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(service_id)
        .bind(name)
        .bind(display_name)
        .bind(description)
        .bind(&config_schema)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => self.get_reaction(service_id, name).await?.ok_or_else(|| {
                anyhow::anyhow!("reaction '{name}' should exist after ON CONFLICT DO NOTHING")
            }),
        }
    }

    pub async fn get_reaction(&self, service_id: Uuid, name: &str) -> Result<Option<Reaction>> {
        let row = sqlx::query_as::<_, ReactionRow>(
            "SELECT id, service_id, name, display_name, description, config_schema FROM reactions WHERE service_id = $1 AND name = $2",
        )
        .bind(service_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    // ============================================
    // Workflows
    // ============================================

    pub async fn create_workflow(
        &self,
        user_id: Uuid,
        name: &str,
        action_id: Uuid,
        reaction_id: Uuid,
        action_config: serde_json::Value,
        reaction_config: serde_json::Value,
    ) -> Result<Workflow> {
        let row = sqlx::query_as::<_, WorkflowRow>(
            r#"
            INSERT INTO user_areas (id, user_id, name, action_id, reaction_id, action_config, reaction_config)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, name, action_id, reaction_id, action_config, reaction_config, is_active, last_triggered, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(name)
        .bind(action_id)
        .bind(reaction_id)
        .bind(&action_config)
        .bind(&reaction_config)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    const RESOLVED_WORKFLOW_SELECT: &'static str = r#"
        SELECT
            w.id AS workflow_id, w.user_id, w.name AS workflow_name,
            w.action_id, w.reaction_id, w.action_config, w.reaction_config,
            w.is_active, w.last_triggered, w.created_at AS workflow_created_at, w.updated_at AS workflow_updated_at,
            a.service_id AS action_service_id, a.name AS action_name, a.display_name AS action_display_name,
            a.description AS action_description, a.config_schema AS action_config_schema,
            r.service_id AS reaction_service_id, r.name AS reaction_name, r.display_name AS reaction_display_name,
            r.description AS reaction_description, r.config_schema AS reaction_config_schema,
            sa.name AS action_service_name, sa.display_name AS action_service_display_name,
            sa.description AS action_service_description, sa.requires_oauth AS action_service_requires_oauth,
            sa.is_active AS action_service_is_active,
            sr.name AS reaction_service_name, sr.display_name AS reaction_service_display_name,
            sr.description AS reaction_service_description, sr.requires_oauth AS reaction_service_requires_oauth,
            sr.is_active AS reaction_service_is_active
        FROM user_areas w
        JOIN actions a ON a.id = w.action_id
        JOIN reactions r ON r.id = w.reaction_id
        JOIN services sa ON sa.id = a.service_id
        JOIN services sr ON sr.id = r.service_id
    "#;

    /// All active workflows, resolved against their Action/Reaction/Service
    /// rows in a single joined query — §4.1 step 1.
    pub async fn active_workflows(&self) -> Result<Vec<ResolvedWorkflow>> {
        let sql = format!("{} WHERE w.is_active ORDER BY w.id", Self::RESOLVED_WORKFLOW_SELECT);
        let rows: Vec<ResolvedWorkflowRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_workflow(&self, id: Uuid) -> Result<Option<ResolvedWorkflow>> {
        let sql = format!("{} WHERE w.id = $1", Self::RESOLVED_WORKFLOW_SELECT);
        let row: Option<ResolvedWorkflowRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Into::into))
    }

    // ============================================
    // Workflow logs / evaluation bookkeeping
    // ============================================

    pub async fn has_log_with_message(&self, workflow_id: Uuid, message: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workflow_logs WHERE area_id = $1 AND message = $2",
        )
        .bind(workflow_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn has_log_containing(&self, workflow_id: Uuid, substring: &str) -> Result<bool> {
        let pattern = format!("%{substring}%");
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workflow_logs WHERE area_id = $1 AND message LIKE $2",
        )
        .bind(workflow_id)
        .bind(pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn find_recent_log_with_message(
        &self,
        workflow_id: Uuid,
        message: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<WorkflowLog>> {
        let row: Option<WorkflowLogRow> = sqlx::query_as(
            r#"
            SELECT id, area_id, status, message, triggered_at, execution_time_ms
            FROM workflow_logs
            WHERE area_id = $1 AND message = $2 AND triggered_at >= $3
            ORDER BY triggered_at DESC
            LIMIT 1
            "#,
        )
        .bind(workflow_id)
        .bind(message)
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    pub async fn record_evaluation(
        &self,
        workflow_id: Uuid,
        triggered_at: DateTime<Utc>,
        status: &str,
        message: &str,
        execution_time_ms: i64,
    ) -> Result<WorkflowLog> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE user_areas SET last_triggered = $2, updated_at = now() WHERE id = $1")
            .bind(workflow_id)
            .bind(triggered_at)
            .execute(&mut *tx)
            .await?;

        let row: WorkflowLogRow = sqlx::query_as(
            r#"
            INSERT INTO workflow_logs (id, area_id, status, message, triggered_at, execution_time_ms)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, area_id, status, message, triggered_at, execution_time_ms
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(workflow_id)
        .bind(status)
        .bind(message)
        .bind(triggered_at)
        .bind(execution_time_ms)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    pub async fn record_error(
        &self,
        workflow_id: Uuid,
        message: &str,
        execution_time_ms: i64,
    ) -> Result<WorkflowLog> {
        let row: WorkflowLogRow = sqlx::query_as(
            r#"
            INSERT INTO workflow_logs (id, area_id, status, message, triggered_at, execution_time_ms)
            VALUES ($1, $2, 'error', $3, now(), $4)
            RETURNING id, area_id, status, message, triggered_at, execution_time_ms
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(workflow_id)
        .bind(message)
        .bind(execution_time_ms)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    // ============================================
    // Connections
    // ============================================

    pub async fn get_connection(&self, user_id: Uuid, service_name: &str) -> Result<Option<UserServiceConnection>> {
        let row: Option<UserServiceConnectionRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.user_id, c.service_id, c.access_token, c.refresh_token, c.token_expires_at, c.connected_at, c.updated_at
            FROM user_service_connections c
            JOIN services s ON s.id = c.service_id
            WHERE c.user_id = $1 AND s.name = $2
            "#,
        )
        .bind(user_id)
        .bind(service_name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.decrypt(&self.cipher)).transpose()
    }

    pub async fn upsert_connection(
        &self,
        user_id: Uuid,
        service_id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expires_at: DateTime<Utc>,
    ) -> Result<UserServiceConnection> {
        let access_token_enc = self.cipher.encrypt(access_token)?;
        let refresh_token_enc = refresh_token.map(|t| self.cipher.encrypt(t)).transpose()?;

        let row: UserServiceConnectionRow = sqlx::query_as(
            r#"
            INSERT INTO user_service_connections (id, user_id, service_id, access_token, refresh_token, token_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, service_id) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                token_expires_at = EXCLUDED.token_expires_at,
                updated_at = now()
            RETURNING id, user_id, service_id, access_token, refresh_token, token_expires_at, connected_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(service_id)
        .bind(&access_token_enc)
        .bind(&refresh_token_enc)
        .bind(token_expires_at)
        .fetch_one(&self.pool)
        .await?;

        row.decrypt(&self.cipher)
    }

    pub async fn update_connection_token(
        &self,
        connection_id: Uuid,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let access_token_enc = self.cipher.encrypt(access_token)?;

        sqlx::query(
            "UPDATE user_service_connections SET access_token = $2, token_expires_at = $3, updated_at = now() WHERE id = $1",
        )
        .bind(connection_id)
        .bind(&access_token_enc)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::TokenCipher;

    async fn test_db() -> Option<Database> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.ok()?;
        let key = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, [9u8; 32]);
        let cipher = TokenCipher::new(&key, None).ok()?;
        let db = Database::new(pool, cipher);
        db.migrate().await.ok()?;
        Some(db)
    }

    /// A user created, then a workflow evaluated twice, round-trips through
    /// Postgres exactly as the in-memory `Store` double models it: the
    /// second evaluation sees the first's log via exact-match dedup, and
    /// `last_triggered` advances to the second evaluation's timestamp.
    #[tokio::test]
    async fn workflow_evaluation_round_trips_through_postgres() {
        let Some(db) = test_db().await else {
            eprintln!("skipping: TEST_DATABASE_URL not set");
            return;
        };

        let username = format!("test-user-{}", Uuid::now_v7());
        let user = db.create_user(&username, "test@example.com", None, None, None).await.unwrap();

        let service = db.upsert_service("test-service", "Test Service", None, false).await.unwrap();
        let action = db
            .upsert_action(service.id, "test-action", "Test Action", None, serde_json::json!({}))
            .await
            .unwrap();
        let reaction = db
            .upsert_reaction(service.id, "test-reaction", "Test Reaction", None, serde_json::json!({}))
            .await
            .unwrap();

        let workflow = db
            .create_workflow(user.id, "test workflow", action.id, reaction.id, serde_json::json!({}), serde_json::json!({}))
            .await
            .unwrap();

        assert!(!db.has_log_with_message(workflow.id, "fp-1").await.unwrap());

        let first_triggered = Utc::now();
        db.record_evaluation(workflow.id, first_triggered, "success", "fp-1", 12).await.unwrap();
        assert!(db.has_log_with_message(workflow.id, "fp-1").await.unwrap());

        let second_triggered = first_triggered + chrono::Duration::minutes(1);
        db.record_evaluation(workflow.id, second_triggered, "success", "fp-2", 8).await.unwrap();

        let resolved = db.get_workflow(workflow.id).await.unwrap().unwrap();
        assert_eq!(resolved.workflow.last_triggered.unwrap().timestamp(), second_triggered.timestamp());
    }
}
