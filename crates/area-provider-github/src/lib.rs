//! A narrow GitHub REST API client: probes for the repo-activity Checkers
//! (`new_star_on_repo`/`new_issue_created`/`new_pr_opened`) and the
//! `create_issue` Executor. Grounded in `utils/github_client.py`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Stargazer {
    pub user: String,
    pub starred_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

#[derive(Debug, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

#[async_trait]
pub trait GithubClient: Send + Sync {
    async fn list_recent_stargazers(
        &self,
        access_token: &str,
        repo_name: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Stargazer>>;

    async fn list_recent_issues(
        &self,
        access_token: &str,
        repo_name: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Issue>>;

    async fn list_recent_pull_requests(
        &self,
        access_token: &str,
        repo_name: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PullRequest>>;

    async fn create_issue(
        &self,
        access_token: &str,
        repo_name: &str,
        title: &str,
        body: &str,
    ) -> anyhow::Result<CreatedIssue>;
}

#[derive(Debug, Clone)]
pub struct CreatedIssue {
    pub number: u64,
    pub html_url: String,
}

pub struct HttpGithubClient {
    http: reqwest::Client,
}

impl HttpGithubClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[derive(Deserialize)]
struct StargazerEntry {
    user: GithubUser,
    starred_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct GithubUser {
    login: String,
}

#[derive(Deserialize)]
struct IssueEntry {
    number: u64,
    title: String,
    html_url: String,
    created_at: DateTime<Utc>,
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct CreateIssueResponse {
    number: u64,
    html_url: String,
}

#[async_trait]
impl GithubClient for HttpGithubClient {
    async fn list_recent_stargazers(
        &self,
        access_token: &str,
        repo_name: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Stargazer>> {
        let entries: Vec<StargazerEntry> = self
            .http
            .get(format!("https://api.github.com/repos/{repo_name}/stargazers"))
            .bearer_auth(access_token)
            .header("Accept", "application/vnd.github.v3.star+json")
            .header("User-Agent", "area-engine")
            .query(&[("per_page", "10")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(entries
            .into_iter()
            .filter(|e| e.starred_at >= since)
            .map(|e| Stargazer {
                user: e.user.login,
                starred_at: e.starred_at,
            })
            .collect())
    }

    async fn list_recent_issues(
        &self,
        access_token: &str,
        repo_name: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Issue>> {
        let entries: Vec<IssueEntry> = self
            .http
            .get(format!("https://api.github.com/repos/{repo_name}/issues"))
            .bearer_auth(access_token)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "area-engine")
            .query(&[
                ("state", "all"),
                ("sort", "created"),
                ("direction", "desc"),
                ("per_page", "10"),
                ("since", &since.to_rfc3339()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(entries
            .into_iter()
            .filter(|e| e.pull_request.is_none())
            .map(|e| Issue {
                number: e.number,
                title: e.title,
                html_url: e.html_url,
            })
            .collect())
    }

    async fn list_recent_pull_requests(
        &self,
        access_token: &str,
        repo_name: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PullRequest>> {
        let entries: Vec<IssueEntry> = self
            .http
            .get(format!("https://api.github.com/repos/{repo_name}/pulls"))
            .bearer_auth(access_token)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "area-engine")
            .query(&[("state", "all"), ("sort", "created"), ("direction", "desc"), ("per_page", "10")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(entries
            .into_iter()
            .filter(|e| e.created_at >= since)
            .map(|e| PullRequest {
                number: e.number,
                title: e.title,
                html_url: e.html_url,
            })
            .collect())
    }

    async fn create_issue(
        &self,
        access_token: &str,
        repo_name: &str,
        title: &str,
        body: &str,
    ) -> anyhow::Result<CreatedIssue> {
        let resp: CreateIssueResponse = self
            .http
            .post(format!("https://api.github.com/repos/{repo_name}/issues"))
            .bearer_auth(access_token)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "area-engine")
            .json(&serde_json::json!({ "title": title, "body": body }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(CreatedIssue {
            number: resp.number,
            html_url: resp.html_url,
        })
    }
}
