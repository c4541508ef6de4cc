//! `send_email`, grounded in `scheduler/reactions.py`'s `execute_send_email`.

use area_core::entities::ResolvedWorkflow;
use area_core::ExecutionResult;
use async_trait::async_trait;

use crate::config_ext::{optional_str, require_str};
use crate::context::EvalContext;
use crate::dispatcher::Executor;

pub struct SendEmailExecutor;

#[async_trait]
impl Executor for SendEmailExecutor {
    async fn execute(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> ExecutionResult {
        let config = workflow.reaction_config();
        let to = match require_str(config, "to") {
            Ok(to) => to,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };
        let subject = optional_str(config, "subject").unwrap_or("AREA Notification");
        let body = optional_str(config, "body").unwrap_or("This is an automated message from AREA");

        match ctx.providers.email.send(to, subject, body).await {
            Ok(()) => ExecutionResult::ok(format!("Email sent successfully to {to}")),
            Err(e) => ExecutionResult::fail(e.to_string()),
        }
    }
}
