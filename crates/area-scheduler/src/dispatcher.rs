//! The Dispatcher (§4.4): maps `action.name -> Checker`, `reaction.name ->
//! Executor`. The only place routing by string name lives — grounded in the
//! teacher's `WorkflowRegistry` (`durable::engine::registry`), adapted from
//! a type-erased-workflow factory map to a fixed catalog of checker/executor
//! trait objects built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use area_core::entities::ResolvedWorkflow;
use area_core::{AreaError, ExecutionResult, Result, TriggerOutcome};
use async_trait::async_trait;

use crate::context::EvalContext;

#[async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome;
}

#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> ExecutionResult;
}

#[derive(Default)]
pub struct Dispatcher {
    checkers: HashMap<&'static str, Arc<dyn Checker>>,
    executors: HashMap<&'static str, Arc<dyn Executor>>,
}

impl Dispatcher {
    pub fn checker_for(&self, name: &str) -> Result<Arc<dyn Checker>> {
        self.checkers.get(name).cloned().ok_or_else(|| AreaError::unknown_kind(name))
    }

    pub fn executor_for(&self, name: &str) -> Result<Arc<dyn Executor>> {
        self.executors.get(name).cloned().ok_or_else(|| AreaError::unknown_kind(name))
    }
}

#[derive(Default)]
pub struct DispatcherBuilder {
    checkers: HashMap<&'static str, Arc<dyn Checker>>,
    executors: HashMap<&'static str, Arc<dyn Executor>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checker(mut self, name: &'static str, checker: impl Checker + 'static) -> Self {
        self.checkers.insert(name, Arc::new(checker));
        self
    }

    pub fn executor(mut self, name: &'static str, executor: impl Executor + 'static) -> Self {
        self.executors.insert(name, Arc::new(executor));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            checkers: self.checkers,
            executors: self.executors,
        }
    }

    /// The full built-in catalog of §4.2/§4.3, wired against the provider
    /// crates. The one seam where a new integration plugs in.
    pub fn with_builtin_catalog() -> Self {
        use crate::checkers::*;
        use crate::executors::*;

        Self::new()
            .checker("time_matches", TimeMatchesChecker)
            .checker("interval_elapsed", IntervalElapsedChecker)
            .checker("email_received_from", EmailReceivedFromChecker)
            .checker("email_subject_contains", EmailSubjectContainsChecker)
            .checker("new_file_in_folder", NewFileInFolderChecker)
            .checker("new_file_uploaded", NewFileUploadedChecker)
            .checker("new_post_created", NewPostCreatedChecker)
            .checker("post_contains_keyword", PostContainsKeywordChecker)
            .checker("new_star_on_repo", NewStarOnRepoChecker)
            .checker("new_issue_created", NewIssueCreatedChecker)
            .checker("new_pr_opened", NewPrOpenedChecker)
            .checker("track_added_to_playlist", TrackAddedToPlaylistChecker)
            .checker("track_saved", TrackSavedChecker)
            .checker("playback_started", PlaybackStartedChecker)
            .executor("send_email", SendEmailExecutor)
            .executor("create_file", CreateFileExecutor)
            .executor("create_folder", CreateFolderExecutor)
            .executor("share_file", ShareFileExecutor)
            .executor("create_post", CreatePostExecutor)
            .executor("create_issue", CreateIssueExecutor)
            .executor("add_to_playlist", AddToPlaylistExecutor)
            .executor("create_playlist", CreatePlaylistExecutor)
            .executor("start_playback", StartPlaybackExecutor)
            .executor("log_message", LogMessageExecutor)
            .executor("send_notification", SendNotificationExecutor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFires;

    #[async_trait]
    impl Checker for AlwaysFires {
        async fn check(&self, _workflow: &ResolvedWorkflow, _ctx: &EvalContext) -> TriggerOutcome {
            TriggerOutcome::fired("test")
        }
    }

    #[test]
    fn unknown_name_returns_error_not_panic() {
        let dispatcher = DispatcherBuilder::new().checker("known", AlwaysFires).build();
        assert!(dispatcher.checker_for("known").is_ok());
        match dispatcher.checker_for("nonsense_action") {
            Err(AreaError::UnknownKind(name)) => assert_eq!(name, "nonsense_action"),
            other => panic!("expected UnknownKind, got {}", other.is_ok()),
        }
    }

    #[test]
    fn builtin_catalog_registers_every_kind() {
        let dispatcher = DispatcherBuilder::with_builtin_catalog().build();
        for name in [
            "time_matches",
            "interval_elapsed",
            "email_received_from",
            "email_subject_contains",
            "new_file_in_folder",
            "new_file_uploaded",
            "new_post_created",
            "post_contains_keyword",
            "new_star_on_repo",
            "new_issue_created",
            "new_pr_opened",
            "track_added_to_playlist",
            "track_saved",
            "playback_started",
        ] {
            assert!(dispatcher.checker_for(name).is_ok(), "missing checker {name}");
        }
        for name in [
            "send_email",
            "create_file",
            "create_folder",
            "share_file",
            "create_post",
            "create_issue",
            "add_to_playlist",
            "create_playlist",
            "start_playback",
            "log_message",
            "send_notification",
        ] {
            assert!(dispatcher.executor_for(name).is_ok(), "missing executor {name}");
        }
    }
}
