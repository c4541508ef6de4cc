//! `track_added_to_playlist` / `track_saved` / `playback_started`, grounded
//! in `scheduler/actions.py`'s `check_spotify_activity`.

use area_core::entities::ResolvedWorkflow;
use area_core::{fingerprint, AreaError, TriggerOutcome};
use async_trait::async_trait;

use crate::config_ext::require_str;
use crate::connection::resolve_connection;
use crate::context::EvalContext;
use crate::dispatcher::Checker;

pub struct TrackAddedToPlaylistChecker;

#[async_trait]
impl Checker for TrackAddedToPlaylistChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let playlist_id = match require_str(workflow.action_config(), "playlist_id") {
            Ok(id) => id,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };
        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "spotify").await {
            Ok(c) => c,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };

        let since = ctx.clock.now_utc() - ctx.config.lookback_window();
        let tracks = match ctx
            .providers
            .spotify
            .list_playlist_tracks(&connection.access_token, playlist_id, since)
            .await
        {
            Ok(tracks) => tracks,
            Err(e) => return TriggerOutcome::failed(AreaError::provider(e.to_string()).to_string()),
        };

        for track in &tracks {
            let fp = fingerprint::spotify_track_added(&track.name, &track.artists);
            match ctx.store.has_log_with_message(workflow.workflow.id, &fp).await {
                Ok(true) => continue,
                Ok(false) => return TriggerOutcome::fired(fp),
                Err(e) => return TriggerOutcome::failed(e.to_string()),
            }
        }

        TriggerOutcome::not_fired()
    }
}

pub struct TrackSavedChecker;

#[async_trait]
impl Checker for TrackSavedChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "spotify").await {
            Ok(c) => c,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };

        let since = ctx.clock.now_utc() - ctx.config.lookback_window();
        let tracks = match ctx.providers.spotify.list_saved_tracks(&connection.access_token, since).await {
            Ok(tracks) => tracks,
            Err(e) => return TriggerOutcome::failed(AreaError::provider(e.to_string()).to_string()),
        };

        for track in &tracks {
            let fp = fingerprint::spotify_track_saved(&track.name, &track.artists);
            match ctx.store.has_log_with_message(workflow.workflow.id, &fp).await {
                Ok(true) => continue,
                Ok(false) => return TriggerOutcome::fired(fp),
                Err(e) => return TriggerOutcome::failed(e.to_string()),
            }
        }

        TriggerOutcome::not_fired()
    }
}

/// Unlike the other remote-data Checkers, playback state has no stable item
/// id to dedup against — the source re-fires at most once per 5-minute
/// lookback window rather than once ever (§9's open question, preserved
/// as-is rather than guessed at).
pub struct PlaybackStartedChecker;

#[async_trait]
impl Checker for PlaybackStartedChecker {
    async fn check(&self, workflow: &ResolvedWorkflow, ctx: &EvalContext) -> TriggerOutcome {
        let connection = match resolve_connection(ctx, workflow.workflow.user_id, "spotify").await {
            Ok(c) => c,
            Err(e) => return TriggerOutcome::failed(e.to_string()),
        };

        let playback = match ctx.providers.spotify.current_playback(&connection.access_token).await {
            Ok(Some(playback)) if playback.is_playing => playback,
            Ok(_) => return TriggerOutcome::not_fired(),
            Err(e) => return TriggerOutcome::failed(AreaError::provider(e.to_string()).to_string()),
        };

        let fp = fingerprint::spotify_now_playing(&playback.track_name, &playback.artists);
        let since = ctx.clock.now_utc() - ctx.config.lookback_window();
        match ctx.store.find_recent_log_with_message(workflow.workflow.id, &fp, since).await {
            Ok(Some(_)) => TriggerOutcome::not_fired(),
            Ok(None) => TriggerOutcome::fired(fp),
            Err(e) => TriggerOutcome::failed(e.to_string()),
        }
    }
}
