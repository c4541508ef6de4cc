//! `email_received_from` / `email_subject_contains`, grounded in
//! `scheduler/actions.py`'s `check_gmail_email_received`.

use area_core::entities::ResolvedWorkflow;
use area_core::{fingerprint, AreaError, TriggerOutcome};
use async_trait::async_trait;

use crate::config_ext::require_str;
use crate::connection::resolve_connection;
use crate::context::EvalContext;
use crate::dispatcher::Checker;

async fn check_gmail(
    workflow: &ResolvedWorkflow,
    ctx: &EvalContext,
    matches: impl Fn(&area_provider_gmail::EmailMessage) -> bool,
) -> TriggerOutcome {
    let connection = match resolve_connection(ctx, workflow.workflow.user_id, "gmail").await {
        Ok(c) => c,
        Err(e) => return TriggerOutcome::failed(e.to_string()),
    };

    let since = ctx.clock.now_utc() - ctx.config.lookback_window();
    let messages = match ctx.providers.gmail.list_recent_messages(&connection.access_token, since, 10).await {
        Ok(messages) => messages,
        Err(e) => return TriggerOutcome::failed(AreaError::provider(e.to_string()).to_string()),
    };

    for message in messages.iter().filter(|m| matches(m)) {
        let fp = fingerprint::email(&message.sender, &message.subject);
        match ctx.store.has_log_with_message(workflow.workflow.id, &fp).await {
            Ok(true) => continue,
            Ok(false) => return TriggerOutcome::fired(fp),
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        }
    }

    TriggerOutcome::not_fired()
}

pub struct EmailReceivedFromChecker;

#[async_trait]
impl Checker for EmailReceivedFromChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let sender = match require_str(workflow.action_config(), "sender") {
            Ok(s) => s,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };
        check_gmail(workflow, ctx, |m| m.sender_matches(sender)).await
    }
}

pub struct EmailSubjectContainsChecker;

#[async_trait]
impl Checker for EmailSubjectContainsChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let keyword = match require_str(workflow.action_config(), "keyword") {
            Ok(k) => k,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };
        check_gmail(workflow, ctx, |m| m.subject_contains(keyword)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing as fixtures;
    use area_core::entities::UserServiceConnection;
    use area_core::WorkflowStore;
    use area_provider_gmail::{EmailMessage, GmailClient};
    use std::sync::Arc;
    use uuid::Uuid;

    struct FakeGmail(Vec<EmailMessage>);

    #[async_trait]
    impl GmailClient for FakeGmail {
        async fn list_recent_messages(
            &self,
            _access_token: &str,
            _since: chrono::DateTime<chrono::Utc>,
            _max_results: u32,
        ) -> anyhow::Result<Vec<EmailMessage>> {
            Ok(self.0.clone())
        }
    }

    fn connected_workflow(store: &area_core::testing::InMemoryStore, config: serde_json::Value) -> ResolvedWorkflow {
        let workflow = fixtures::resolved_workflow(config, serde_json::json!({}));
        store.add_connection(
            "gmail",
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
        workflow
    }

    /// §8 scenario 2: the same unseen message across two consecutive ticks
    /// must fire exactly once — the second tick finds it already logged.
    #[tokio::test]
    async fn repeated_probe_of_the_same_message_fires_only_once() {
        let (mut ctx, store) = fixtures::eval_context_with_store();
        let message = EmailMessage {
            id: "m1".to_string(),
            sender: "x@y.z".to_string(),
            subject: "hi".to_string(),
            snippet: String::new(),
        };
        ctx.providers.gmail = Arc::new(FakeGmail(vec![message]));
        let workflow = connected_workflow(&store, serde_json::json!({"sender": "x@y.z"}));

        let first = EmailReceivedFromChecker.check(&workflow, &ctx).await;
        assert!(first.fired);
        assert_eq!(first.metadata.as_deref(), Some("Email from x@y.z: hi"));
        store
            .record_evaluation(
                workflow.workflow.id,
                ctx.clock.now_utc(),
                area_core::NewWorkflowLog {
                    status: area_core::LogStatus::Success,
                    message: first.metadata.clone().unwrap(),
                    execution_time_ms: 0,
                },
            )
            .await
            .unwrap();

        let second = EmailReceivedFromChecker.check(&workflow, &ctx).await;
        assert!(!second.fired, "second probe of the same message must not re-fire");
    }
}
