//! `add_to_playlist` / `create_playlist` / `start_playback`, grounded in
//! `scheduler/reactions.py`'s Spotify executors.

use area_core::entities::ResolvedWorkflow;
use area_core::ExecutionResult;
use async_trait::async_trait;

use crate::config_ext::{optional_bool, optional_str, require_str};
use crate::connection::resolve_connection;
use crate::context::EvalContext;
use crate::dispatcher::Executor;

pub struct AddToPlaylistExecutor;

#[async_trait]
impl Executor for AddToPlaylistExecutor {
    async fn execute(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> ExecutionResult {
        let config = workflow.reaction_config();
        let playlist_id = match require_str(config, "playlist_id") {
            Ok(id) => id,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };
        let track_uri = match require_str(config, "track_uri") {
            Ok(uri) => uri,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "spotify").await {
            Ok(c) => c,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        match ctx
            .providers
            .spotify
            .add_track_to_playlist(&connection.access_token, playlist_id, track_uri)
            .await
        {
            Ok(()) => ExecutionResult::ok("Track added to playlist successfully"),
            Err(e) => ExecutionResult::fail(format!("Failed to add track to playlist: {e}")),
        }
    }
}

pub struct CreatePlaylistExecutor;

#[async_trait]
impl Executor for CreatePlaylistExecutor {
    async fn execute(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> ExecutionResult {
        let config = workflow.reaction_config();
        let name = match require_str(config, "name") {
            Ok(name) => name,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };
        let description = optional_str(config, "description").unwrap_or("");
        let public = optional_bool(config, "public", true);

        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "spotify").await {
            Ok(c) => c,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        let user_id = match ctx.providers.spotify.current_user_id(&connection.access_token).await {
            Ok(id) => id,
            Err(e) => return ExecutionResult::fail(format!("Failed to create playlist: {e}")),
        };

        match ctx
            .providers
            .spotify
            .create_playlist(&connection.access_token, &user_id, name, description, public)
            .await
        {
            Ok(_) => ExecutionResult::ok(format!("Created playlist: {name}")),
            Err(e) => ExecutionResult::fail(format!("Failed to create playlist: {e}")),
        }
    }
}

pub struct StartPlaybackExecutor;

#[async_trait]
impl Executor for StartPlaybackExecutor {
    async fn execute(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> ExecutionResult {
        let config = workflow.reaction_config();
        let track_uri = optional_str(config, "track_uri");
        let context_uri = optional_str(config, "context_uri");

        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "spotify").await {
            Ok(c) => c,
            Err(e) => return ExecutionResult::fail(e.to_string()),
        };

        match ctx
            .providers
            .spotify
            .start_playback(&connection.access_token, track_uri, context_uri)
            .await
        {
            Ok(()) => ExecutionResult::ok("Playback started successfully"),
            Err(e) => ExecutionResult::fail(format!("Failed to start playback: {e}")),
        }
    }
}
