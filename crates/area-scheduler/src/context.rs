//! The collaborator bundle every Checker/Executor is invoked with: the
//! `Store`, the `Clock`, one client per provider, and the pieces of
//! `AppConfig` needed for the single silent token refresh (§4.3).

use std::sync::Arc;

use area_core::{AppConfig, Clock, WorkflowStore};
use area_provider_drive::DriveClient;
use area_provider_facebook::FacebookClient;
use area_provider_github::GithubClient;
use area_provider_gmail::GmailClient;
use area_provider_smtp::EmailSender;
use area_provider_spotify::SpotifyClient;

/// One client per external collaborator the built-in catalog talks to.
/// Grounded in the teacher's pattern of bundling related capabilities into
/// one struct passed to activities (`everruns-worker`'s activity context).
pub struct ProviderClients {
    pub gmail: Arc<dyn GmailClient>,
    pub drive: Arc<dyn DriveClient>,
    pub facebook: Arc<dyn FacebookClient>,
    pub github: Arc<dyn GithubClient>,
    pub spotify: Arc<dyn SpotifyClient>,
    pub email: Arc<dyn EmailSender>,
}

pub struct EvalContext {
    pub store: Arc<dyn WorkflowStore>,
    pub clock: Arc<dyn Clock>,
    pub providers: ProviderClients,
    pub config: AppConfig,
    pub http: reqwest::Client,
}
