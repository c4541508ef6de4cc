//! The Seeder (§4.5): on every process start, idempotently ensures the admin
//! user, the built-in service catalog, and each built-in Action/Reaction row
//! with its `configSchema` exist. Purely additive — grounded in the
//! original's `seed_data.py`, one `seed_*_service` function per provider,
//! each a no-op once its row exists so operator edits to `display_name` etc.
//! survive a restart (only `display_name` is re-synced via `ON CONFLICT DO
//! UPDATE` in `Database::upsert_service`; actions/reactions use `DO NOTHING`
//! so their schema, once seeded, is never silently overwritten).

use anyhow::Result;
use area_storage::Database;
use serde_json::json;
use tracing::info;

const ADMIN_USERNAME: &str = "admin";
const ADMIN_EMAIL: &str = "admin@area.local";
const ADMIN_PASSWORD: &str = "Admin123!";

/// Runs the full seed sequence. Safe to call on every startup and from
/// multiple replicas concurrently: each step is either `ON CONFLICT DO
/// NOTHING`/`DO UPDATE` at the database layer, so a second run changes
/// nothing (beyond re-syncing a service's `display_name`).
pub async fn seed_all(db: &Database) -> Result<()> {
    info!("seeding database");

    seed_admin_user(db).await?;
    seed_timer_service(db).await?;
    seed_email_service(db).await?;
    seed_system_service(db).await?;
    seed_gmail_service(db).await?;
    seed_drive_service(db).await?;
    seed_facebook_service(db).await?;
    seed_github_service(db).await?;
    seed_spotify_service(db).await?;

    info!("seeding complete");
    Ok(())
}

async fn seed_admin_user(db: &Database) -> Result<()> {
    if db.get_user_by_username(ADMIN_USERNAME).await?.is_some() {
        return Ok(());
    }

    let hash = area_storage::encryption::hash_password(ADMIN_PASSWORD)?;
    db.create_user(ADMIN_USERNAME, ADMIN_EMAIL, Some(&hash), None, None).await?;
    info!(username = ADMIN_USERNAME, "created admin user");
    Ok(())
}

async fn seed_timer_service(db: &Database) -> Result<()> {
    let timer = db
        .upsert_service("timer", "Timer", Some("Time-based triggers and scheduling"), false)
        .await?;

    db.upsert_action(
        timer.id,
        "time_matches",
        "Time matches HH:MM",
        Some("Triggers when current time matches specified time (checks every minute)"),
        json!({
            "type": "object",
            "properties": {
                "time": {
                    "type": "string",
                    "pattern": "^([0-1][0-9]|2[0-3]):[0-5][0-9]$",
                    "description": "Time in HH:MM format (24-hour)"
                },
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone name (defaults to the server timezone)"
                }
            },
            "required": ["time"]
        }),
    )
    .await?;

    db.upsert_action(
        timer.id,
        "interval_elapsed",
        "Every X minutes",
        Some("Triggers every specified number of minutes"),
        json!({
            "type": "object",
            "properties": {
                "interval_minutes": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Interval in minutes"
                }
            },
            "required": ["interval_minutes"]
        }),
    )
    .await?;

    Ok(())
}

async fn seed_email_service(db: &Database) -> Result<()> {
    let email = db.upsert_service("email", "Email", Some("Send emails via SMTP"), false).await?;

    db.upsert_reaction(
        email.id,
        "send_email",
        "Send an email",
        Some("Sends an email to the specified recipient"),
        json!({
            "type": "object",
            "properties": {
                "to": {"type": "string", "format": "email", "description": "Recipient email address"},
                "subject": {"type": "string", "maxLength": 200, "description": "Email subject line"},
                "body": {"type": "string", "maxLength": 5000, "description": "Email body content"}
            },
            "required": ["to", "subject", "body"]
        }),
    )
    .await?;

    Ok(())
}

async fn seed_system_service(db: &Database) -> Result<()> {
    let system = db
        .upsert_service("system", "System", Some("System-level actions and reactions"), false)
        .await?;

    db.upsert_reaction(
        system.id,
        "log_message",
        "Log a message",
        Some("Saves a message to workflow execution logs"),
        json!({
            "type": "object",
            "properties": {"message": {"type": "string", "maxLength": 500, "description": "Message to log"}},
            "required": ["message"]
        }),
    )
    .await?;

    db.upsert_reaction(
        system.id,
        "send_notification",
        "Send notification",
        Some("Logs notification to console (placeholder for real notifications)"),
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "maxLength": 100, "description": "Notification title"},
                "body": {"type": "string", "maxLength": 500, "description": "Notification body"}
            },
            "required": ["title", "body"]
        }),
    )
    .await?;

    Ok(())
}

async fn seed_gmail_service(db: &Database) -> Result<()> {
    let gmail = db
        .upsert_service("gmail", "Gmail", Some("Email detection and monitoring"), true)
        .await?;

    db.upsert_action(
        gmail.id,
        "email_received_from",
        "Email Received From",
        Some("Triggers when email is received from a specific sender"),
        json!({
            "type": "object",
            "properties": {
                "sender": {
                    "type": "string",
                    "description": "Email address of the sender",
                    "pattern": "^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\\.[a-zA-Z]{2,}$"
                }
            },
            "required": ["sender"]
        }),
    )
    .await?;

    db.upsert_action(
        gmail.id,
        "email_subject_contains",
        "Email Subject Contains",
        Some("Triggers when email subject contains specific keyword"),
        json!({
            "type": "object",
            "properties": {"keyword": {"type": "string", "description": "Keyword to search for in subject"}},
            "required": ["keyword"]
        }),
    )
    .await?;

    Ok(())
}

async fn seed_drive_service(db: &Database) -> Result<()> {
    let drive = db
        .upsert_service("drive", "Google Drive", Some("Cloud storage and file management"), true)
        .await?;

    db.upsert_action(
        drive.id,
        "new_file_in_folder",
        "New File in Folder",
        Some("Triggers when a new file is added to a specific folder"),
        json!({
            "type": "object",
            "properties": {"folder_name": {"type": "string", "description": "Name of the folder to monitor"}},
            "required": ["folder_name"]
        }),
    )
    .await?;

    db.upsert_action(
        drive.id,
        "new_file_uploaded",
        "New File Uploaded",
        Some("Triggers when any new file is uploaded to Drive"),
        json!({"type": "object", "properties": {}}),
    )
    .await?;

    db.upsert_reaction(
        drive.id,
        "create_file",
        "Create a file",
        Some("Creates a new text file in Google Drive"),
        json!({
            "type": "object",
            "properties": {
                "file_name": {"type": "string", "description": "Name of the file to create"},
                "content": {"type": "string", "description": "Content of the file"},
                "folder_name": {"type": "string", "description": "Optional folder name (leave empty for root)"}
            },
            "required": ["file_name", "content"]
        }),
    )
    .await?;

    db.upsert_reaction(
        drive.id,
        "create_folder",
        "Create a folder",
        Some("Creates a new folder in Google Drive"),
        json!({
            "type": "object",
            "properties": {"folder_name": {"type": "string", "description": "Name of the folder to create"}},
            "required": ["folder_name"]
        }),
    )
    .await?;

    db.upsert_reaction(
        drive.id,
        "share_file",
        "Share a file",
        Some("Shares a file with a user by email"),
        json!({
            "type": "object",
            "properties": {
                "file_name": {"type": "string", "description": "Name of the file to share"},
                "email": {"type": "string", "format": "email", "description": "Email address to share with"},
                "role": {"type": "string", "enum": ["reader", "writer"], "description": "Permission level"}
            },
            "required": ["file_name", "email", "role"]
        }),
    )
    .await?;

    Ok(())
}

async fn seed_facebook_service(db: &Database) -> Result<()> {
    let facebook = db
        .upsert_service("facebook", "Facebook", Some("Personal timeline post monitoring"), true)
        .await?;

    db.upsert_action(
        facebook.id,
        "new_post_created",
        "New Post Created",
        Some("Triggers when you create a new post on your Facebook timeline"),
        json!({"type": "object", "properties": {}}),
    )
    .await?;

    db.upsert_action(
        facebook.id,
        "post_contains_keyword",
        "Post Contains Keyword",
        Some("Triggers when your Facebook post contains a specific keyword"),
        json!({
            "type": "object",
            "properties": {"keyword": {"type": "string", "description": "Keyword to search for in post"}},
            "required": ["keyword"]
        }),
    )
    .await?;

    db.upsert_reaction(
        facebook.id,
        "create_post",
        "Create Post",
        Some("Creates a new post on your Facebook timeline"),
        json!({
            "type": "object",
            "properties": {"message": {"type": "string", "description": "Content of the post to create", "maxLength": 5000}},
            "required": ["message"]
        }),
    )
    .await?;

    Ok(())
}

async fn seed_github_service(db: &Database) -> Result<()> {
    let github = db
        .upsert_service("github", "GitHub", Some("Repository monitoring and automation"), true)
        .await?;

    db.upsert_action(
        github.id,
        "new_star_on_repo",
        "New Star on Repository",
        Some("Triggers when someone stars your repository"),
        json!({
            "type": "object",
            "properties": {"repo_name": {"type": "string", "description": "Repository name (e.g., username/repo)"}},
            "required": ["repo_name"]
        }),
    )
    .await?;

    db.upsert_action(
        github.id,
        "new_issue_created",
        "New Issue Created",
        Some("Triggers when a new issue is created in your repository"),
        json!({
            "type": "object",
            "properties": {"repo_name": {"type": "string", "description": "Repository name (e.g., username/repo)"}},
            "required": ["repo_name"]
        }),
    )
    .await?;

    db.upsert_action(
        github.id,
        "new_pr_opened",
        "New Pull Request Opened",
        Some("Triggers when a new PR is opened in your repository"),
        json!({
            "type": "object",
            "properties": {"repo_name": {"type": "string", "description": "Repository name (e.g., username/repo)"}},
            "required": ["repo_name"]
        }),
    )
    .await?;

    db.upsert_reaction(
        github.id,
        "create_issue",
        "Create Issue",
        Some("Creates a new issue in a repository"),
        json!({
            "type": "object",
            "properties": {
                "repo_name": {"type": "string", "description": "Repository name (e.g., username/repo)"},
                "title": {"type": "string", "maxLength": 200, "description": "Issue title"},
                "body": {"type": "string", "maxLength": 5000, "description": "Issue description"}
            },
            "required": ["repo_name", "title", "body"]
        }),
    )
    .await?;

    Ok(())
}

async fn seed_spotify_service(db: &Database) -> Result<()> {
    let spotify = db
        .upsert_service("spotify", "Spotify", Some("Music playback control and playlist management"), true)
        .await?;

    db.upsert_action(
        spotify.id,
        "track_added_to_playlist",
        "Track Added to Playlist",
        Some("Triggers when a new track is added to a specific playlist"),
        json!({
            "type": "object",
            "properties": {"playlist_id": {"type": "string", "description": "Spotify playlist ID"}},
            "required": ["playlist_id"]
        }),
    )
    .await?;

    db.upsert_action(
        spotify.id,
        "track_saved",
        "Track Saved to Library",
        Some("Triggers when you save (like) a new track to your library"),
        json!({"type": "object", "properties": {}}),
    )
    .await?;

    db.upsert_action(
        spotify.id,
        "playback_started",
        "Playback Started",
        Some("Triggers when you start playing music on Spotify"),
        json!({"type": "object", "properties": {}}),
    )
    .await?;

    db.upsert_reaction(
        spotify.id,
        "add_to_playlist",
        "Add Track to Playlist",
        Some("Add a track to a specific playlist"),
        json!({
            "type": "object",
            "properties": {
                "playlist_id": {"type": "string", "description": "Spotify playlist ID"},
                "track_uri": {"type": "string", "description": "Spotify track URI (e.g., spotify:track:xxxxx or just track ID)"}
            },
            "required": ["playlist_id", "track_uri"]
        }),
    )
    .await?;

    db.upsert_reaction(
        spotify.id,
        "create_playlist",
        "Create Playlist",
        Some("Create a new playlist in your Spotify account"),
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "maxLength": 100, "description": "Playlist name"},
                "description": {"type": "string", "maxLength": 300, "description": "Playlist description (optional)"},
                "public": {"type": "boolean", "description": "Make playlist public (default: true)"}
            },
            "required": ["name"]
        }),
    )
    .await?;

    db.upsert_reaction(
        spotify.id,
        "start_playback",
        "Start Playback",
        Some("Start playing a specific track or playlist"),
        json!({
            "type": "object",
            "properties": {
                "track_uri": {"type": "string", "description": "Spotify track URI (optional)"},
                "context_uri": {"type": "string", "description": "Spotify playlist/album URI (optional)"}
            }
        }),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use area_storage::TokenCipher;
    use sqlx::PgPool;

    async fn test_db() -> Option<Database> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.ok()?;
        let key = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, [7u8; 32]);
        let cipher = TokenCipher::new(&key, None).ok()?;
        let db = Database::new(pool, cipher);
        db.migrate().await.ok()?;
        Some(db)
    }

    #[tokio::test]
    async fn seeding_twice_is_a_noop() {
        let Some(db) = test_db().await else {
            eprintln!("skipping: TEST_DATABASE_URL not set");
            return;
        };

        seed_all(&db).await.unwrap();
        let timer_first = db.get_service_by_name("timer").await.unwrap().unwrap();

        seed_all(&db).await.unwrap();
        let timer_second = db.get_service_by_name("timer").await.unwrap().unwrap();

        assert_eq!(timer_first.id, timer_second.id);
        assert!(db.get_user_by_username(ADMIN_USERNAME).await.unwrap().is_some());
    }
}
