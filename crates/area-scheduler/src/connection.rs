//! Connection resolution shared by every provider-backed Checker/Executor
//! (§4.3): fetch the `UserServiceConnection`, and if its token is expired,
//! make one silent refresh attempt before giving up. Folded into a single
//! helper rather than duplicated per provider, per §9's "re-cast as a
//! registry" note — the original duplicates this per scheduler function
//! (`scheduler/actions.py`/`reactions.py` both inline the same
//! `create_*_service(connection.access_token, connection.refresh_token)`
//! call).

use area_core::entities::UserServiceConnection;
use area_core::{AreaError, Result};
use chrono::{Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::context::EvalContext;

/// The OAuth2 token endpoint and app-credential slot for each provider that
/// supports a refresh-token grant. Facebook is deliberately absent: its
/// connections never carry a `refresh_token` (§ original's
/// `service_connections.py`: "Facebook doesn't use refresh tokens the same
/// way"), so an expired Facebook connection goes straight to
/// `ConnectionMissing`.
fn token_endpoint(service_name: &str) -> Option<&'static str> {
    match service_name {
        "gmail" | "drive" => Some("https://oauth2.googleapis.com/token"),
        "github" => Some("https://github.com/login/oauth/access_token"),
        "spotify" => Some("https://accounts.spotify.com/api/token"),
        _ => None,
    }
}

fn oauth_credentials<'a>(
    config: &'a area_core::AppConfig,
    service_name: &str,
) -> Option<&'a area_core::config::OAuthAppCredentials> {
    match service_name {
        "gmail" | "drive" => Some(&config.google),
        "github" => Some(&config.github),
        "spotify" => Some(&config.spotify),
        _ => None,
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

async fn refresh_access_token(
    http: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> anyhow::Result<(String, chrono::DateTime<Utc>)> {
    let resp: RefreshResponse = http
        .post(token_url)
        .header("Accept", "application/json")
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let expires_at = Utc::now() + Duration::seconds(resp.expires_in.unwrap_or(3600));
    Ok((resp.access_token, expires_at))
}

/// Resolve the connection a provider-backed Checker/Executor needs. Returns
/// `ConnectionMissing` if there is no connection, or if one exists but is
/// expired and the single silent refresh attempt (if a refresh token and
/// app credentials are available) also fails.
pub async fn resolve_connection(
    ctx: &EvalContext,
    user_id: Uuid,
    service_name: &str,
) -> Result<UserServiceConnection> {
    let connection = ctx
        .store
        .get_connection(user_id, service_name)
        .await
        .map_err(AreaError::Internal)?
        .ok_or_else(|| AreaError::connection_missing(service_name))?;

    if !connection.is_expired(ctx.clock.now_utc()) {
        return Ok(connection);
    }

    let refresh_token = connection
        .refresh_token
        .as_deref()
        .ok_or_else(|| AreaError::connection_missing(service_name))?;
    let token_url = token_endpoint(service_name).ok_or_else(|| AreaError::connection_missing(service_name))?;
    let creds = oauth_credentials(&ctx.config, service_name).ok_or_else(|| AreaError::connection_missing(service_name))?;
    let (client_id, client_secret) = match (&creds.client_id, &creds.client_secret) {
        (Some(id), Some(secret)) => (id.as_str(), secret.as_str()),
        _ => return Err(AreaError::connection_missing(service_name)),
    };

    let (access_token, expires_at) = refresh_access_token(&ctx.http, token_url, client_id, client_secret, refresh_token)
        .await
        .map_err(|_| AreaError::connection_missing(service_name))?;

    ctx.store
        .update_connection_token(connection.id, &access_token, expires_at)
        .await
        .map_err(AreaError::Internal)?;

    Ok(UserServiceConnection {
        access_token,
        token_expires_at: expires_at,
        updated_at: ctx.clock.now_utc(),
        ..connection
    })
}
