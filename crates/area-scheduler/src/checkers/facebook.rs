//! `new_post_created` / `post_contains_keyword`, grounded in
//! `scheduler/actions.py`'s `check_facebook_new_post`.

use area_core::entities::ResolvedWorkflow;
use area_core::{fingerprint, AreaError, TriggerOutcome};
use async_trait::async_trait;

use crate::config_ext::require_str;
use crate::connection::resolve_connection;
use crate::context::EvalContext;
use crate::dispatcher::Checker;

async fn check_facebook(
    workflow: &ResolvedWorkflow,
    ctx: &EvalContext,
    matches: impl Fn(&area_provider_facebook::FacebookPost) -> bool,
) -> TriggerOutcome {
    let connection = match resolve_connection(ctx, workflow.workflow.user_id, "facebook").await {
        Ok(c) => c,
        Err(e) => return TriggerOutcome::failed(e.to_string()),
    };

    let since = ctx.clock.now_utc() - ctx.config.lookback_window();
    let posts = match ctx.providers.facebook.list_recent_posts(&connection.access_token, since).await {
        Ok(posts) => posts,
        Err(e) => return TriggerOutcome::failed(AreaError::provider(e.to_string()).to_string()),
    };

    for post in posts.iter().filter(|p| matches(p)) {
        let fp = fingerprint::facebook_post(&post.message);
        match ctx.store.has_log_with_message(workflow.workflow.id, &fp).await {
            Ok(true) => continue,
            Ok(false) => return TriggerOutcome::fired(fp),
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        }
    }

    TriggerOutcome::not_fired()
}

pub struct NewPostCreatedChecker;

#[async_trait]
impl Checker for NewPostCreatedChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        check_facebook(workflow, ctx, |_| true).await
    }
}

pub struct PostContainsKeywordChecker;

#[async_trait]
impl Checker for PostContainsKeywordChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let keyword = match require_str(workflow.action_config(), "keyword") {
            Ok(k) => k,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };
        check_facebook(workflow, ctx, |p| p.contains_keyword(keyword)).await
    }
}
