//! A narrow Facebook Graph API probe client for `new_post_created`/
//! `post_contains_keyword`. Grounded in `utils/facebook_client.py`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct FacebookPost {
    pub id: String,
    pub message: String,
    pub permalink: String,
}

impl FacebookPost {
    pub fn contains_keyword(&self, keyword: &str) -> bool {
        self.message.to_lowercase().contains(&keyword.to_lowercase())
    }
}

#[async_trait]
pub trait FacebookClient: Send + Sync {
    async fn list_recent_posts(&self, access_token: &str, since: DateTime<Utc>) -> anyhow::Result<Vec<FacebookPost>>;

    /// Posts `message` to the user's timeline (`/me/feed`); returns the new post's id.
    async fn create_post(&self, access_token: &str, message: &str) -> anyhow::Result<String>;
}

pub struct HttpFacebookClient {
    http: reqwest::Client,
}

impl HttpFacebookClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[derive(Deserialize)]
struct PostListResponse {
    #[serde(default)]
    data: Vec<PostEntry>,
}

#[derive(Deserialize)]
struct PostEntry {
    id: String,
    #[serde(default)]
    message: String,
    #[serde(default, rename = "permalink_url")]
    permalink_url: String,
}

#[async_trait]
impl FacebookClient for HttpFacebookClient {
    async fn list_recent_posts(&self, access_token: &str, since: DateTime<Utc>) -> anyhow::Result<Vec<FacebookPost>> {
        let resp: PostListResponse = self
            .http
            .get("https://graph.facebook.com/v18.0/me/posts")
            .query(&[
                ("access_token", access_token.to_string()),
                ("fields", "id,message,created_time,permalink_url".to_string()),
                ("limit", "10".to_string()),
                ("since", since.timestamp().to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp
            .data
            .into_iter()
            .map(|p| FacebookPost {
                id: p.id,
                message: p.message,
                permalink: p.permalink_url,
            })
            .collect())
    }

    async fn create_post(&self, access_token: &str, message: &str) -> anyhow::Result<String> {
        #[derive(Deserialize)]
        struct CreatePostResponse {
            id: String,
        }

        let resp: CreatePostResponse = self
            .http
            .post("https://graph.facebook.com/v18.0/me/feed")
            .query(&[("access_token", access_token)])
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_match_is_case_insensitive() {
        let post = FacebookPost {
            id: "1".into(),
            message: "Big Launch Today!".into(),
            permalink: String::new(),
        };
        assert!(post.contains_keyword("launch"));
        assert!(!post.contains_keyword("giveaway"));
    }
}
