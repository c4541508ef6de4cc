//! Deterministic fingerprint strings (§4.2). These become `WorkflowLog.message`
//! and double as the idempotency key for remote-data Action kinds: a Checker
//! fires only when no prior log row for the workflow carries the same (or,
//! for Drive, a containing) fingerprint.

/// `"Email from {sender}: {subject}"`
pub fn email(sender: &str, subject: &str) -> String {
    format!("Email from {sender}: {subject}")
}

/// Drive dedup keys on the file id being a substring of the message, so any
/// format containing `(id:{id})` works; this is the one recommended by §4.2.
pub fn drive_file(name: &str, id: &str) -> String {
    format!("New file: {name} (id:{id})")
}

/// First 50 chars of the post body, matching the original's `message[:50]`
/// (byte-oriented truncation in the source; we truncate on `char` boundaries
/// to stay correct for non-ASCII text while keeping the same visible cutoff).
pub fn facebook_post(message: &str) -> String {
    let preview: String = message.chars().take(50).collect();
    format!("Facebook post: {preview}")
}

pub fn github_star(user: &str) -> String {
    format!("New star from {user}")
}

pub fn github_issue(number: u64, title: &str) -> String {
    format!("Issue #{number}: {title}")
}

pub fn github_pr(number: u64, title: &str) -> String {
    format!("PR #{number}: {title}")
}

pub fn spotify_track_added(name: &str, artists: &str) -> String {
    format!("Track added: {name} by {artists}")
}

pub fn spotify_track_saved(name: &str, artists: &str) -> String {
    format!("Track saved: {name} by {artists}")
}

pub fn spotify_now_playing(track: &str, artists: &str) -> String {
    format!("Now playing: {track} by {artists}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facebook_post_truncates_to_50_chars() {
        let long = "x".repeat(80);
        let fp = facebook_post(&long);
        assert_eq!(fp, format!("Facebook post: {}", "x".repeat(50)));
    }

    #[test]
    fn github_fingerprints_match_spec_format() {
        assert_eq!(github_star("alice"), "New star from alice");
        assert_eq!(github_issue(42, "Bug"), "Issue #42: Bug");
        assert_eq!(github_pr(7, "Fix"), "PR #7: Fix");
    }
}
