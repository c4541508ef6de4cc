//! A narrow Gmail probe client: list recently received messages and expose
//! the two match predicates the `email_received_from`/`email_subject_contains`
//! Checkers need. Grounded in `utils/gmail_client.py`; this is not a Gmail SDK.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub snippet: String,
}

impl EmailMessage {
    /// True if `target_sender` appears in the sender header, case-insensitively —
    /// either as a raw substring or as the bracketed address in `Name <addr>`.
    pub fn sender_matches(&self, target_sender: &str) -> bool {
        let sender = self.sender.to_lowercase();
        let target = target_sender.to_lowercase();
        if sender.contains(&target) {
            return true;
        }
        if let (Some(start), Some(end)) = (sender.find('<'), sender.find('>')) {
            if start < end {
                return sender[start + 1..end] == target;
            }
        }
        false
    }

    pub fn subject_contains(&self, keyword: &str) -> bool {
        self.subject.to_lowercase().contains(&keyword.to_lowercase())
    }
}

#[async_trait]
pub trait GmailClient: Send + Sync {
    /// Messages received at or after `since`, most recent `max_results` only.
    async fn list_recent_messages(
        &self,
        access_token: &str,
        since: DateTime<Utc>,
        max_results: u32,
    ) -> anyhow::Result<Vec<EmailMessage>>;
}

pub struct HttpGmailClient {
    http: reqwest::Client,
}

impl HttpGmailClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[derive(Deserialize)]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Deserialize)]
struct MessageDetail {
    payload: MessagePayload,
    #[serde(default)]
    snippet: String,
}

#[derive(Deserialize)]
struct MessagePayload {
    headers: Vec<MessageHeader>,
}

#[derive(Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

fn header(headers: &[MessageHeader], name: &str) -> String {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
        .unwrap_or_default()
}

#[async_trait]
impl GmailClient for HttpGmailClient {
    async fn list_recent_messages(
        &self,
        access_token: &str,
        since: DateTime<Utc>,
        max_results: u32,
    ) -> anyhow::Result<Vec<EmailMessage>> {
        let list: MessageListResponse = self
            .http
            .get("https://gmail.googleapis.com/gmail/v1/users/me/messages")
            .bearer_auth(access_token)
            .query(&[
                ("q", format!("after:{}", since.timestamp())),
                ("maxResults", max_results.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut emails = Vec::with_capacity(list.messages.len());
        for msg_ref in list.messages {
            let detail: MessageDetail = self
                .http
                .get(format!(
                    "https://gmail.googleapis.com/gmail/v1/users/me/messages/{}",
                    msg_ref.id
                ))
                .bearer_auth(access_token)
                .query(&[("format", "metadata"), ("metadataHeaders", "Subject"), ("metadataHeaders", "From")])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            emails.push(EmailMessage {
                id: msg_ref.id,
                sender: header(&detail.payload.headers, "From"),
                subject: header(&detail.payload.headers, "Subject"),
                snippet: detail.snippet,
            });
        }

        Ok(emails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(sender: &str, subject: &str) -> EmailMessage {
        EmailMessage {
            id: "1".into(),
            sender: sender.into(),
            subject: subject.into(),
            snippet: String::new(),
        }
    }

    #[test]
    fn sender_matches_bracketed_address() {
        let e = email("Alice <alice@example.com>", "hi");
        assert!(e.sender_matches("alice@example.com"));
        assert!(e.sender_matches("Alice"));
        assert!(!e.sender_matches("bob@example.com"));
    }

    #[test]
    fn subject_contains_is_case_insensitive() {
        let e = email("a@example.com", "Weekly Report Ready");
        assert!(e.subject_contains("report"));
        assert!(!e.subject_contains("invoice"));
    }
}
