//! `create_post`, grounded in `scheduler/reactions.py`'s `execute_facebook_create_post`.

use area_core::entities::ResolvedWorkflow;
use area_core::ExecutionResult;
use async_trait::async_trait;

use crate::config_ext::require_str;
use crate::connection::resolve_connection;
use crate::context::EvalContext;
use crate::dispatcher::Executor;

pub struct CreatePostExecutor;

#[async_trait]
impl Executor for CreatePostExecutor {
    async fn execute(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> ExecutionResult {
        let message = match require_str(workflow.reaction_config(), "message") {
            Ok(m) => m,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "facebook").await {
            Ok(c) => c,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        match ctx.providers.facebook.create_post(&connection.access_token, message).await {
            Ok(_) => ExecutionResult::ok("Post created successfully"),
            Err(e) => ExecutionResult::fail(e.to_string()),
        }
    }
}
