//! Test fixtures for Checkers/Executors: a fully-wired `EvalContext` backed
//! by `area_core::testing::InMemoryStore` and a `FixedClock`, plus a minimal
//! `ResolvedWorkflow` builder. Provider clients are stubs that fail loudly if
//! called — tests that exercise a provider-backed Checker/Executor should
//! reach for `area-provider-*`'s own fakes instead, or extend `ProviderClients`
//! on the returned context in place.

use std::sync::Arc;

use area_core::entities::{Action, ResolvedWorkflow, Service, Workflow};
use area_core::{AppConfig, FixedClock};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::context::{EvalContext, ProviderClients};

struct UnconfiguredProvider;

#[async_trait]
impl area_provider_gmail::GmailClient for UnconfiguredProvider {
    async fn list_recent_messages(
        &self,
        _access_token: &str,
        _since: DateTime<Utc>,
        _max_results: u32,
    ) -> anyhow::Result<Vec<area_provider_gmail::EmailMessage>> {
        anyhow::bail!("no gmail client configured in this test fixture")
    }
}

#[async_trait]
impl area_provider_drive::DriveClient for UnconfiguredProvider {
    async fn find_folder_id(&self, _access_token: &str, _folder_name: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("no drive client configured in this test fixture")
    }

    async fn find_file_id(&self, _access_token: &str, _file_name: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("no drive client configured in this test fixture")
    }

    async fn list_recent_files(
        &self,
        _access_token: &str,
        _folder_id: Option<&str>,
        _since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<area_provider_drive::DriveFile>> {
        anyhow::bail!("no drive client configured in this test fixture")
    }

    async fn create_file(
        &self,
        _access_token: &str,
        _file_name: &str,
        _content: &str,
        _folder_id: Option<&str>,
    ) -> anyhow::Result<area_provider_drive::DriveFile> {
        anyhow::bail!("no drive client configured in this test fixture")
    }

    async fn create_folder(&self, _access_token: &str, _folder_name: &str) -> anyhow::Result<area_provider_drive::DriveFile> {
        anyhow::bail!("no drive client configured in this test fixture")
    }

    async fn share_file(&self, _access_token: &str, _file_id: &str, _email: &str, _role: &str) -> anyhow::Result<()> {
        anyhow::bail!("no drive client configured in this test fixture")
    }
}

#[async_trait]
impl area_provider_facebook::FacebookClient for UnconfiguredProvider {
    async fn list_recent_posts(
        &self,
        _access_token: &str,
        _since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<area_provider_facebook::FacebookPost>> {
        anyhow::bail!("no facebook client configured in this test fixture")
    }

    async fn create_post(&self, _access_token: &str, _message: &str) -> anyhow::Result<String> {
        anyhow::bail!("no facebook client configured in this test fixture")
    }
}

#[async_trait]
impl area_provider_github::GithubClient for UnconfiguredProvider {
    async fn list_recent_stargazers(
        &self,
        _access_token: &str,
        _repo_name: &str,
        _since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<area_provider_github::Stargazer>> {
        anyhow::bail!("no github client configured in this test fixture")
    }

    async fn list_recent_issues(
        &self,
        _access_token: &str,
        _repo_name: &str,
        _since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<area_provider_github::Issue>> {
        anyhow::bail!("no github client configured in this test fixture")
    }

    async fn list_recent_pull_requests(
        &self,
        _access_token: &str,
        _repo_name: &str,
        _since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<area_provider_github::PullRequest>> {
        anyhow::bail!("no github client configured in this test fixture")
    }

    async fn create_issue(
        &self,
        _access_token: &str,
        _repo_name: &str,
        _title: &str,
        _body: &str,
    ) -> anyhow::Result<area_provider_github::CreatedIssue> {
        anyhow::bail!("no github client configured in this test fixture")
    }
}

#[async_trait]
impl area_provider_spotify::SpotifyClient for UnconfiguredProvider {
    async fn current_user_id(&self, _access_token: &str) -> anyhow::Result<String> {
        anyhow::bail!("no spotify client configured in this test fixture")
    }

    async fn create_playlist(
        &self,
        _access_token: &str,
        _user_id: &str,
        _name: &str,
        _description: &str,
        _public: bool,
    ) -> anyhow::Result<area_provider_spotify::CreatedPlaylist> {
        anyhow::bail!("no spotify client configured in this test fixture")
    }

    async fn list_playlist_tracks(
        &self,
        _access_token: &str,
        _playlist_id: &str,
        _since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<area_provider_spotify::Track>> {
        anyhow::bail!("no spotify client configured in this test fixture")
    }

    async fn list_saved_tracks(&self, _access_token: &str, _since: DateTime<Utc>) -> anyhow::Result<Vec<area_provider_spotify::Track>> {
        anyhow::bail!("no spotify client configured in this test fixture")
    }

    async fn current_playback(&self, _access_token: &str) -> anyhow::Result<Option<area_provider_spotify::Playback>> {
        anyhow::bail!("no spotify client configured in this test fixture")
    }

    async fn add_track_to_playlist(&self, _access_token: &str, _playlist_id: &str, _track_uri: &str) -> anyhow::Result<()> {
        anyhow::bail!("no spotify client configured in this test fixture")
    }

    async fn save_track(&self, _access_token: &str, _track_id: &str) -> anyhow::Result<()> {
        anyhow::bail!("no spotify client configured in this test fixture")
    }

    async fn start_playback(&self, _access_token: &str, _track_uri: Option<&str>, _context_uri: Option<&str>) -> anyhow::Result<()> {
        anyhow::bail!("no spotify client configured in this test fixture")
    }

    async fn pause_playback(&self, _access_token: &str) -> anyhow::Result<()> {
        anyhow::bail!("no spotify client configured in this test fixture")
    }
}

#[async_trait]
impl area_provider_smtp::EmailSender for UnconfiguredProvider {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> anyhow::Result<()> {
        anyhow::bail!("no email sender configured in this test fixture")
    }
}

fn unconfigured_providers() -> ProviderClients {
    let provider = Arc::new(UnconfiguredProvider);
    ProviderClients {
        gmail: provider.clone(),
        drive: provider.clone(),
        facebook: provider.clone(),
        github: provider.clone(),
        spotify: provider.clone(),
        email: provider,
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        jwt_secret_key: "test-secret".to_string(),
        cors_origins: vec!["*".to_string()],
        scheduler_enabled: true,
        scheduler_check_interval_minutes: 1,
        scheduler_timezone: "UTC".to_string(),
        smtp: area_core::config::SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            from_email: "noreply@example.com".to_string(),
            use_tls: false,
        },
        google: Default::default(),
        facebook: Default::default(),
        github: Default::default(),
        spotify: Default::default(),
        frontend_url: "http://localhost:3000".to_string(),
    }
}

/// An `EvalContext` pinned to `2025-01-01T00:00:00Z`, with an empty
/// `InMemoryStore` and unconfigured provider clients.
pub fn eval_context() -> EvalContext {
    eval_context_at("2025-01-01T00:00:00Z")
}

pub fn eval_context_at(iso: &str) -> EvalContext {
    let (ctx, _store) = eval_context_with_store_at(iso);
    ctx
}

/// Like [`eval_context`], but also hands back the concrete `InMemoryStore`
/// so a test can seed workflows/connections and inspect recorded logs.
pub fn eval_context_with_store() -> (EvalContext, Arc<area_core::testing::InMemoryStore>) {
    eval_context_with_store_at("2025-01-01T00:00:00Z")
}

pub fn eval_context_with_store_at(iso: &str) -> (EvalContext, Arc<area_core::testing::InMemoryStore>) {
    let at: DateTime<Utc> = iso.parse().expect("valid fixture timestamp");
    let store = Arc::new(area_core::testing::InMemoryStore::new());
    let ctx = EvalContext {
        store: store.clone(),
        clock: Arc::new(FixedClock::new(at)),
        providers: unconfigured_providers(),
        config: test_config(),
        http: reqwest::Client::new(),
    };
    (ctx, store)
}

/// A minimal `ResolvedWorkflow` with the given action/reaction config blobs;
/// every id is freshly generated and `last_triggered` starts unset.
pub fn resolved_workflow(action_config: serde_json::Value, reaction_config: serde_json::Value) -> ResolvedWorkflow {
    let now = Utc::now();
    let service = Service {
        id: Uuid::now_v7(),
        name: "test-service".to_string(),
        display_name: "Test Service".to_string(),
        description: None,
        requires_oauth: false,
        is_active: true,
    };
    let action = Action {
        id: Uuid::now_v7(),
        service_id: service.id,
        name: "test-action".to_string(),
        display_name: "Test Action".to_string(),
        description: None,
        config_schema: serde_json::json!({}),
    };
    let reaction = area_core::entities::Reaction {
        id: Uuid::now_v7(),
        service_id: service.id,
        name: "test-reaction".to_string(),
        display_name: "Test Reaction".to_string(),
        description: None,
        config_schema: serde_json::json!({}),
    };

    let workflow = Workflow {
        id: Uuid::now_v7(),
        user_id: Uuid::now_v7(),
        name: "test workflow".to_string(),
        action_id: action.id,
        reaction_id: reaction.id,
        action_config,
        reaction_config,
        is_active: true,
        last_triggered: None,
        created_at: now,
        updated_at: now,
    };

    ResolvedWorkflow {
        workflow,
        action,
        action_service: service.clone(),
        reaction,
        reaction_service: service,
    }
}
