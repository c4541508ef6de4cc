//! `create_issue`, grounded in `scheduler/reactions.py`'s `execute_github_create_issue`.

use area_core::entities::ResolvedWorkflow;
use area_core::ExecutionResult;
use async_trait::async_trait;

use crate::config_ext::require_str;
use crate::connection::resolve_connection;
use crate::context::EvalContext;
use crate::dispatcher::Executor;

pub struct CreateIssueExecutor;

#[async_trait]
impl Executor for CreateIssueExecutor {
    async fn execute(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> ExecutionResult {
        let config = workflow.reaction_config();
        let repo_name = match require_str(config, "repo_name") {
            Ok(r) => r,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };
        let title = match require_str(config, "title") {
            Ok(t) => t,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };
        let body = crate::config_ext::optional_str(config, "body").unwrap_or("");

        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "github").await {
            Ok(c) => c,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        match ctx.providers.github.create_issue(&connection.access_token, repo_name, title, body).await {
            Ok(issue) => ExecutionResult::ok(format!("Created issue #{}: {title}", issue.number)),
            Err(e) => ExecutionResult::fail(e.to_string()),
        }
    }
}
