//! `log_message` / `send_notification` — internal Reactions that perform no
//! remote effect, only a WorkflowLog entry (§4.3). Not present in the
//! original's `execute_reaction` dispatch (which treats any name it doesn't
//! recognize as unknown), but named explicitly in the catalog table and
//! backed by `seed_data.py`'s config schemas, so the dispatcher registers
//! real handlers for them rather than letting them fall through to
//! `UnknownKind`.

use area_core::entities::ResolvedWorkflow;
use area_core::ExecutionResult;
use async_trait::async_trait;

use crate::config_ext::require_str;
use crate::context::EvalContext;
use crate::dispatcher::Executor;

pub struct LogMessageExecutor;

#[async_trait]
impl Executor for LogMessageExecutor {
    async fn execute(&self, workflow: &ResolvedWorkflow, _ctx: &EvalContext) -> ExecutionResult {
        match require_str(workflow.reaction_config(), "message") {
            Ok(message) => ExecutionResult::ok(message),
            Err(e) => ExecutionResult::fail(e.to_string()),
        }
    }
}

pub struct SendNotificationExecutor;

#[async_trait]
impl Executor for SendNotificationExecutor {
    async fn execute(&self, workflow: &ResolvedWorkflow, _ctx: &EvalContext) -> ExecutionResult {
        let config = workflow.reaction_config();
        let title = match require_str(config, "title") {
            Ok(t) => t,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };
        let body = match require_str(config, "body") {
            Ok(b) => b,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };
        ExecutionResult::ok(format!("{title}: {body}"))
    }
}
