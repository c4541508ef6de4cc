//! `new_file_in_folder` / `new_file_uploaded`, grounded in
//! `scheduler/actions.py`'s `check_drive_new_file`. Dedup is substring-based
//! (the file id must appear in a prior log message), not exact-match.

use area_core::entities::ResolvedWorkflow;
use area_core::{fingerprint, AreaError, TriggerOutcome};
use async_trait::async_trait;

use crate::config_ext::optional_str;
use crate::connection::resolve_connection;
use crate::context::EvalContext;
use crate::dispatcher::Checker;

async fn check_drive(workflow: &ResolvedWorkflow, ctx: &EvalContext, folder_name: Option<&str>) -> TriggerOutcome {
    let connection = match resolve_connection(ctx, workflow.workflow.user_id, "drive").await {
        Ok(c) => c,
        Err(e) => return TriggerOutcome::failed(e.to_string()),
    };

    let folder_id = if let Some(folder_name) = folder_name {
        match ctx.providers.drive.find_folder_id(&connection.access_token, folder_name).await {
            Ok(Some(id)) => Some(id),
            Ok(None) => return TriggerOutcome::failed(format!("Folder \"{folder_name}\" not found")),
            Err(e) => return TriggerOutcome::failed(AreaError::provider(e.to_string()).to_string()),
        }
    } else {
        None
    };

    let since = ctx.clock.now_utc() - ctx.config.lookback_window();
    let files = match ctx
        .providers
        .drive
        .list_recent_files(&connection.access_token, folder_id.as_deref(), since)
        .await
    {
        Ok(files) => files,
        Err(e) => return TriggerOutcome::failed(AreaError::provider(e.to_string()).to_string()),
    };

    for file in &files {
        match ctx.store.has_log_containing(workflow.workflow.id, &file.id).await {
            Ok(true) => continue,
            Ok(false) => return TriggerOutcome::fired(fingerprint::drive_file(&file.name, &file.id)),
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        }
    }

    TriggerOutcome::not_fired()
}

pub struct NewFileInFolderChecker;

#[async_trait]
impl Checker for NewFileInFolderChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let config = workflow.action_config();
        let folder_name = match crate::config_ext::require_str(config, "folder_name") {
            Ok(name) => name,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };
        check_drive(workflow, ctx, Some(folder_name)).await
    }
}

pub struct NewFileUploadedChecker;

#[async_trait]
impl Checker for NewFileUploadedChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        check_drive(workflow, ctx, optional_str(workflow.action_config(), "folder_name")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing as fixtures;
    use area_core::entities::UserServiceConnection;
    use area_core::WorkflowStore;
    use area_provider_drive::{DriveClient, DriveFile};
    use std::sync::Arc;
    use uuid::Uuid;

    struct FakeDrive(Vec<DriveFile>);

    #[async_trait]
    impl DriveClient for FakeDrive {
        async fn find_folder_id(&self, _access_token: &str, _folder_name: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        async fn find_file_id(&self, _access_token: &str, _file_name: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        async fn list_recent_files(
            &self,
            _access_token: &str,
            _folder_id: Option<&str>,
            _since: chrono::DateTime<chrono::Utc>,
        ) -> anyhow::Result<Vec<DriveFile>> {
            Ok(self.0.clone())
        }

        async fn create_file(
            &self,
            _access_token: &str,
            _file_name: &str,
            _content: &str,
            _folder_id: Option<&str>,
        ) -> anyhow::Result<DriveFile> {
            anyhow::bail!("not used in this test")
        }

        async fn create_folder(&self, _access_token: &str, _folder_name: &str) -> anyhow::Result<DriveFile> {
            anyhow::bail!("not used in this test")
        }

        async fn share_file(&self, _access_token: &str, _file_id: &str, _email: &str, _role: &str) -> anyhow::Result<()> {
            anyhow::bail!("not used in this test")
        }
    }

    /// §8 scenario 3: with two unseen files the Checker fires on the oldest
    /// unseen one per tick, not both at once — each tick's fire gets logged
    /// before the next tick probes again, and a third tick (nothing new)
    /// produces no fire.
    #[tokio::test]
    async fn multiple_unseen_files_fire_one_per_tick() {
        let (mut ctx, store) = fixtures::eval_context_with_store();
        let files = vec![
            DriveFile {
                id: "f1".to_string(),
                name: "a.txt".to_string(),
                web_view_link: String::new(),
            },
            DriveFile {
                id: "f2".to_string(),
                name: "b.txt".to_string(),
                web_view_link: String::new(),
            },
        ];
        ctx.providers.drive = Arc::new(FakeDrive(files));

        let workflow = fixtures::resolved_workflow(serde_json::json!({}), serde_json::json!({}));
        store.add_connection(
            "drive",
            UserServiceConnection {
                id: Uuid::now_v7(),
                user_id: workflow.workflow.user_id,
                service_id: workflow.action_service.id,
                access_token: "token".to_string(),
                refresh_token: None,
                token_expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
                connected_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
        );

        let tick1 = NewFileUploadedChecker.check(&workflow, &ctx).await;
        assert!(tick1.fired);
        assert!(tick1.metadata.as_deref().unwrap().contains("(id:f1)"));
        store
            .record_evaluation(
                workflow.workflow.id,
                ctx.clock.now_utc(),
                area_core::NewWorkflowLog {
                    status: area_core::LogStatus::Success,
                    message: tick1.metadata.unwrap(),
                    execution_time_ms: 0,
                },
            )
            .await
            .unwrap();

        let tick2 = NewFileUploadedChecker.check(&workflow, &ctx).await;
        assert!(tick2.fired);
        assert!(tick2.metadata.as_deref().unwrap().contains("(id:f2)"));
        store
            .record_evaluation(
                workflow.workflow.id,
                ctx.clock.now_utc(),
                area_core::NewWorkflowLog {
                    status: area_core::LogStatus::Success,
                    message: tick2.metadata.unwrap(),
                    execution_time_ms: 0,
                },
            )
            .await
            .unwrap();

        let tick3 = NewFileUploadedChecker.check(&workflow, &ctx).await;
        assert!(!tick3.fired, "no unseen files remain");
    }
}
