//! `create_file` / `create_folder` / `share_file`, grounded in
//! `scheduler/reactions.py`'s `execute_drive_create_file`/
//! `execute_drive_create_folder`/`execute_drive_share_file`.

use area_core::entities::ResolvedWorkflow;
use area_core::ExecutionResult;
use async_trait::async_trait;

use crate::config_ext::{optional_str, require_str};
use crate::connection::resolve_connection;
use crate::context::EvalContext;
use crate::dispatcher::Executor;

pub struct CreateFileExecutor;

#[async_trait]
impl Executor for CreateFileExecutor {
    async fn execute(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> ExecutionResult {
        let config = workflow.reaction_config();
        let file_name = match require_str(config, "file_name") {
            Ok(name) => name,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };
        let content = optional_str(config, "content").unwrap_or("");
        let folder_name = optional_str(config, "folder_name");

        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "drive").await {
            Ok(c) => c,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        let folder_id = if let Some(folder_name) = folder_name {
            match ctx.providers.drive.find_folder_id(&connection.access_token, folder_name).await {
                Ok(Some(id)) => Some(id),
                Ok(None) => return ExecutionResult::fail(format!("Folder \"{folder_name}\" not found")),
                Err(e) => return ExecutionResult::fail(e.to_string()),
            }
        } else {
            None
        };

        match ctx
            .providers
            .drive
            .create_file(&connection.access_token, file_name, content, folder_id.as_deref())
            .await
        {
            Ok(_) => ExecutionResult::ok(format!("Created file: {file_name}")),
            Err(e) => ExecutionResult::fail(e.to_string()),
        }
    }
}

pub struct CreateFolderExecutor;

#[async_trait]
impl Executor for CreateFolderExecutor {
    async fn execute(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> ExecutionResult {
        let folder_name = match require_str(workflow.reaction_config(), "folder_name") {
            Ok(name) => name,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "drive").await {
            Ok(c) => c,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        match ctx.providers.drive.create_folder(&connection.access_token, folder_name).await {
            Ok(_) => ExecutionResult::ok(format!("Created folder: {folder_name}")),
            Err(e) => ExecutionResult::fail(e.to_string()),
        }
    }
}

pub struct ShareFileExecutor;

#[async_trait]
impl Executor for ShareFileExecutor {
    async fn execute(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> ExecutionResult {
        let config = workflow.reaction_config();
        let file_name = match require_str(config, "file_name") {
            Ok(name) => name,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };
        let email = match require_str(config, "email") {
            Ok(email) => email,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };
        let role = optional_str(config, "role").unwrap_or("reader");

        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "drive").await {
            Ok(c) => c,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        let file_id = match ctx.providers.drive.find_file_id(&connection.access_token, file_name).await {
            Ok(Some(id)) => id,
            Ok(None) => return ExecutionResult::fail(format!("File \"{file_name}\" not found")),
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        match ctx.providers.drive.share_file(&connection.access_token, &file_id, email, role).await {
            Ok(()) => ExecutionResult::ok(format!("Shared {file_name} with {email}")),
            Err(e) => ExecutionResult::fail(e.to_string()),
        }
    }
}
