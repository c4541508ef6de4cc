//! A narrow Spotify Web API client for the playlist/library/playback
//! Checkers and Executors. Grounded in `utils/spotify_client.py`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: String,
    pub uri: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Playback {
    pub is_playing: bool,
    pub track_name: String,
    pub artists: String,
}

#[derive(Debug, Clone)]
pub struct CreatedPlaylist {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait SpotifyClient: Send + Sync {
    /// The current user's Spotify id, needed to scope playlist creation.
    async fn current_user_id(&self, access_token: &str) -> anyhow::Result<String>;

    async fn create_playlist(
        &self,
        access_token: &str,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> anyhow::Result<CreatedPlaylist>;

    async fn list_playlist_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Track>>;

    async fn list_saved_tracks(&self, access_token: &str, since: DateTime<Utc>) -> anyhow::Result<Vec<Track>>;

    async fn current_playback(&self, access_token: &str) -> anyhow::Result<Option<Playback>>;

    async fn add_track_to_playlist(&self, access_token: &str, playlist_id: &str, track_uri: &str) -> anyhow::Result<()>;

    async fn save_track(&self, access_token: &str, track_id: &str) -> anyhow::Result<()>;

    async fn start_playback(&self, access_token: &str, track_uri: Option<&str>, context_uri: Option<&str>) -> anyhow::Result<()>;

    async fn pause_playback(&self, access_token: &str) -> anyhow::Result<()>;
}

pub struct HttpSpotifyClient {
    http: reqwest::Client,
}

impl HttpSpotifyClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn track_uri(raw: &str) -> String {
        if raw.starts_with("spotify:") {
            raw.to_string()
        } else {
            format!("spotify:track:{raw}")
        }
    }
}

#[derive(Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Deserialize)]
struct TrackItem {
    added_at: Option<DateTime<Utc>>,
    track: Option<TrackObject>,
}

#[derive(Deserialize)]
struct TrackObject {
    id: String,
    name: String,
    uri: String,
    #[serde(default)]
    artists: Vec<ArtistObject>,
}

#[derive(Deserialize)]
struct ArtistObject {
    name: String,
}

fn artist_names(artists: &[ArtistObject]) -> String {
    artists.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
}

#[derive(Deserialize)]
struct PlaybackResponse {
    is_playing: bool,
    item: Option<TrackObject>,
}

#[derive(Deserialize)]
struct ProfileResponse {
    id: String,
}

#[derive(Deserialize)]
struct PlaylistResponse {
    id: String,
    external_urls: ExternalUrls,
}

#[derive(Deserialize)]
struct ExternalUrls {
    spotify: String,
}

#[async_trait]
impl SpotifyClient for HttpSpotifyClient {
    async fn current_user_id(&self, access_token: &str) -> anyhow::Result<String> {
        let profile: ProfileResponse = self
            .http
            .get("https://api.spotify.com/v1/me")
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(profile.id)
    }

    async fn create_playlist(
        &self,
        access_token: &str,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> anyhow::Result<CreatedPlaylist> {
        let resp: PlaylistResponse = self
            .http
            .post(format!("https://api.spotify.com/v1/users/{user_id}/playlists"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "name": name, "description": description, "public": public }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(CreatedPlaylist {
            id: resp.id,
            url: resp.external_urls.spotify,
        })
    }

    async fn list_playlist_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Track>> {
        let page: TrackPage = self
            .http
            .get(format!("https://api.spotify.com/v1/playlists/{playlist_id}/tracks"))
            .bearer_auth(access_token)
            .query(&[("limit", "10")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(tracks_since(page, since))
    }

    async fn list_saved_tracks(&self, access_token: &str, since: DateTime<Utc>) -> anyhow::Result<Vec<Track>> {
        let page: TrackPage = self
            .http
            .get("https://api.spotify.com/v1/me/tracks")
            .bearer_auth(access_token)
            .query(&[("limit", "20")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(tracks_since(page, since))
    }

    async fn current_playback(&self, access_token: &str) -> anyhow::Result<Option<Playback>> {
        let resp = self
            .http
            .get("https://api.spotify.com/v1/me/player")
            .bearer_auth(access_token)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body: PlaybackResponse = resp.error_for_status()?.json().await?;
        Ok(body.item.map(|track| Playback {
            is_playing: body.is_playing,
            track_name: track.name,
            artists: artist_names(&track.artists),
        }))
    }

    async fn add_track_to_playlist(&self, access_token: &str, playlist_id: &str, track_uri: &str) -> anyhow::Result<()> {
        self.http
            .post(format!("https://api.spotify.com/v1/playlists/{playlist_id}/tracks"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "uris": [Self::track_uri(track_uri)] }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn save_track(&self, access_token: &str, track_id: &str) -> anyhow::Result<()> {
        let id = track_id.replace("spotify:track:", "");
        self.http
            .put("https://api.spotify.com/v1/me/tracks")
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "ids": [id] }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn start_playback(&self, access_token: &str, track_uri: Option<&str>, context_uri: Option<&str>) -> anyhow::Result<()> {
        let body = match (track_uri, context_uri) {
            (Some(uri), _) => serde_json::json!({ "uris": [Self::track_uri(uri)] }),
            (None, Some(context_uri)) => serde_json::json!({ "context_uri": context_uri }),
            (None, None) => serde_json::json!({}),
        };
        self.http
            .put("https://api.spotify.com/v1/me/player/play")
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn pause_playback(&self, access_token: &str) -> anyhow::Result<()> {
        self.http
            .put("https://api.spotify.com/v1/me/player/pause")
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn tracks_since(page: TrackPage, since: DateTime<Utc>) -> Vec<Track> {
    page.items
        .into_iter()
        .filter_map(|item| {
            let added_at = item.added_at?;
            if added_at < since {
                return None;
            }
            let track = item.track?;
            Some(Track {
                id: track.id,
                name: track.name,
                artists: artist_names(&track.artists),
                uri: track.uri,
                added_at,
            })
        })
        .collect()
}
