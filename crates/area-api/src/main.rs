//! Composition root for the orchestrator process (§6): loads configuration,
//! connects the Store, seeds the catalog, wires the Dispatcher's built-in
//! catalog against the provider clients, and starts the Scheduler under
//! single-leader discipline. HTTP routing/auth/OAuth-linking are collaborator
//! concerns out of scope for this core (§1) — this binary exposes only the
//! `/health` lifecycle surface a hosting load balancer needs.

use std::sync::Arc;

use anyhow::{Context, Result};
use area_core::{AppConfig, SystemClock};
use area_provider_drive::HttpDriveClient;
use area_provider_facebook::HttpFacebookClient;
use area_provider_github::HttpGithubClient;
use area_provider_gmail::HttpGmailClient;
use area_provider_smtp::SmtpEmailSender;
use area_provider_spotify::HttpSpotifyClient;
use area_scheduler::{Dispatcher, DispatcherBuilder, EvalContext, LeaderLock, PgAdvisoryLock, ProviderClients, Scheduler, SchedulerHandle};
use area_storage::{Database, TokenCipher};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Advisory-lock key the scheduler's leader election contends on. Arbitrary
/// but fixed so every replica of this process targets the same lock.
const LEADER_LOCK_KEY: i64 = 0x41524541; // "AREA" in ASCII, packed

#[derive(Clone)]
struct HealthState {
    scheduler_enabled: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    scheduler_enabled: bool,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        scheduler_enabled: state.scheduler_enabled,
    })
}

fn build_dispatcher() -> Dispatcher {
    DispatcherBuilder::with_builtin_catalog().build()
}

async fn build_eval_context(config: &AppConfig, db: Arc<Database>) -> Result<EvalContext> {
    let http = reqwest::Client::builder()
        .timeout(config.http_call_timeout())
        .build()
        .context("failed to build HTTP client")?;

    let providers = ProviderClients {
        gmail: Arc::new(HttpGmailClient::new(http.clone())),
        drive: Arc::new(HttpDriveClient::new(http.clone())),
        facebook: Arc::new(HttpFacebookClient::new(http.clone())),
        github: Arc::new(HttpGithubClient::new(http.clone())),
        spotify: Arc::new(HttpSpotifyClient::new(http.clone())),
        email: Arc::new(SmtpEmailSender::new(&config.smtp).context("failed to configure SMTP sender")?),
    };

    Ok(EvalContext {
        store: db,
        clock: Arc::new(SystemClock),
        providers,
        config: config.clone(),
        http,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "area_api=info,area_scheduler=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    tracing::info!(tick_interval_minutes = config.scheduler_check_interval_minutes, "configuration loaded");

    let cipher = TokenCipher::from_env().context("failed to initialize token cipher")?;
    let db = Database::connect(&config.database_url, cipher)
        .await
        .context("failed to connect to the store")?;
    db.migrate().await.context("failed to run migrations")?;
    tracing::info!("connected to store and applied migrations");

    area_seeder::seed_all(&db).await.context("failed to seed catalog")?;

    let db = Arc::new(db);

    let scheduler_handle = if config.scheduler_enabled {
        let ctx = Arc::new(build_eval_context(&config, db.clone()).await?);
        let dispatcher = Arc::new(build_dispatcher());
        let scheduler = Arc::new(Scheduler::new(ctx, dispatcher));
        let leader: Box<dyn LeaderLock> = Box::new(
            PgAdvisoryLock::connect(&config.database_url, LEADER_LOCK_KEY)
                .await
                .context("failed to establish the leader-election connection")?,
        );
        Some(SchedulerHandle::start(scheduler, leader))
    } else {
        tracing::info!("SCHEDULER_ENABLED=false; this replica will serve but not evaluate workflows");
        None
    };

    let cors_origins = config.cors_origins.clone();
    let cors = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(AllowOrigin::any())
    } else {
        let origins: Vec<_> = cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    let app = Router::new()
        .route("/health", get(health))
        .with_state(HealthState {
            scheduler_enabled: config.scheduler_enabled,
        })
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = "0.0.0.0:8080";
    let listener = tokio::net::TcpListener::bind(addr).await.context("failed to bind health listener")?;
    tracing::info!(%addr, "listening");

    let serve = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    serve.await.context("server error")?;

    if let Some(handle) = scheduler_handle {
        handle.stop().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
