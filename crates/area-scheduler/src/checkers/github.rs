//! `new_star_on_repo` / `new_issue_created` / `new_pr_opened`, grounded in
//! `scheduler/actions.py`'s `check_github_repo_activity`.

use area_core::entities::ResolvedWorkflow;
use area_core::{fingerprint, AreaError, TriggerOutcome};
use async_trait::async_trait;

use crate::config_ext::require_str;
use crate::connection::resolve_connection;
use crate::context::EvalContext;
use crate::dispatcher::Checker;

pub struct NewStarOnRepoChecker;

#[async_trait]
impl Checker for NewStarOnRepoChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let repo_name = match require_str(workflow.action_config(), "repo_name") {
            Ok(r) => r,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };
        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "github").await {
            Ok(c) => c,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };

        let since = ctx.clock.now_utc() - ctx.config.lookback_window();
        let stargazers = match ctx
            .providers
            .github
            .list_recent_stargazers(&connection.access_token, repo_name, since)
            .await
        {
            Ok(stargazers) => stargazers,
            Err(e) => return TriggerOutcome::failed(AreaError::provider(e.to_string()).to_string()),
        };

        for stargazer in &stargazers {
            let fp = fingerprint::github_star(&stargazer.user);
            match ctx.store.has_log_with_message(workflow.workflow.id, &fp).await {
                Ok(true) => continue,
                Ok(false) => return TriggerOutcome::fired(fp),
                Err(e) => return TriggerOutcome::failed(e.to_string()),
            }
        }

        TriggerOutcome::not_fired()
    }
}

pub struct NewIssueCreatedChecker;

#[async_trait]
impl Checker for NewIssueCreatedChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let repo_name = match require_str(workflow.action_config(), "repo_name") {
            Ok(r) => r,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };
        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "github").await {
            Ok(c) => c,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };

        let since = ctx.clock.now_utc() - ctx.config.lookback_window();
        let issues = match ctx
            .providers
            .github
            .list_recent_issues(&connection.access_token, repo_name, since)
            .await
        {
            Ok(issues) => issues,
            Err(e) => return TriggerOutcome::failed(AreaError::provider(e.to_string()).to_string()),
        };

        for issue in &issues {
            let fp = fingerprint::github_issue(issue.number, &issue.title);
            match ctx.store.has_log_with_message(workflow.workflow.id, &fp).await {
                Ok(true) => continue,
                Ok(false) => return TriggerOutcome::fired(fp),
                Err(e) => return TriggerOutcome::failed(e.to_string()),
            }
        }

        TriggerOutcome::not_fired()
    }
}

pub struct NewPrOpenedChecker;

#[async_trait]
impl Checker for NewPrOpenedChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let repo_name = match require_str(workflow.action_config(), "repo_name") {
            Ok(r) => r,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };
        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "github").await {
            Ok(c) => c,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };

        let since = ctx.clock.now_utc() - ctx.config.lookback_window();
        let pulls = match ctx
            .providers
            .github
            .list_recent_pull_requests(&connection.access_token, repo_name, since)
            .await
        {
            Ok(pulls) => pulls,
            Err(e) => return TriggerOutcome::failed(AreaError::provider(e.to_string()).to_string()),
        };

        for pr in &pulls {
            let fp = fingerprint::github_pr(pr.number, &pr.title);
            match ctx.store.has_log_with_message(workflow.workflow.id, &fp).await {
                Ok(true) => continue,
                Ok(false) => return TriggerOutcome::fired(fp),
                Err(e) => return TriggerOutcome::failed(e.to_string()),
            }
        }

        TriggerOutcome::not_fired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing as fixtures;
    use area_core::entities::UserServiceConnection;
    use area_provider_github::{CreatedIssue, GithubClient, Issue, PullRequest, Stargazer};
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    struct FlakyGithub {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GithubClient for FlakyGithub {
        async fn list_recent_stargazers(&self, _access_token: &str, _repo_name: &str, _since: DateTime<Utc>) -> anyhow::Result<Vec<Stargazer>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("GitHub API returned 503")
            }
            Ok(vec![])
        }

        async fn list_recent_issues(&self, _access_token: &str, _repo_name: &str, _since: DateTime<Utc>) -> anyhow::Result<Vec<Issue>> {
            Ok(vec![])
        }

        async fn list_recent_pull_requests(&self, _access_token: &str, _repo_name: &str, _since: DateTime<Utc>) -> anyhow::Result<Vec<PullRequest>> {
            Ok(vec![])
        }

        async fn create_issue(&self, _access_token: &str, _repo_name: &str, _title: &str, _body: &str) -> anyhow::Result<CreatedIssue> {
            anyhow::bail!("not used in this test")
        }
    }

    /// §8 scenario 5: a tick where the provider call fails logs `status:
    /// failed` with the provider error in the message; a subsequent tick with
    /// the provider healthy again evaluates normally (no stuck failure state).
    #[tokio::test]
    async fn provider_outage_then_recovery_across_ticks() {
        let (mut ctx, store) = fixtures::eval_context_with_store();
        ctx.providers.github = Arc::new(FlakyGithub { calls: AtomicUsize::new(0) });

        let workflow = fixtures::resolved_workflow(serde_json::json!({"repo_name": "area/area"}), serde_json::json!({}));
        store.add_connection(
            "github",
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

        let outage = NewStarOnRepoChecker.check(&workflow, &ctx).await;
        let message = outage.error.expect("provider failure surfaces as a TriggerOutcome error");
        assert!(message.contains("503"), "{message}");

        let recovered = NewStarOnRepoChecker.check(&workflow, &ctx).await;
        assert!(!recovered.fired, "no stargazers means nothing to fire on");
        assert!(recovered.error.is_none(), "a healthy provider call must not surface an error");
    }
}
