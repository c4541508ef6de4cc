//! A narrow Google Drive probe client for the `new_file_in_folder`/
//! `new_file_uploaded` Checkers. Grounded in `utils/drive_client.py`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub web_view_link: String,
}

#[async_trait]
pub trait DriveClient: Send + Sync {
    /// Resolves a user-visible folder name to its Drive file id.
    async fn find_folder_id(&self, access_token: &str, folder_name: &str) -> anyhow::Result<Option<String>>;

    /// Resolves a user-visible, non-trashed file name to its Drive file id.
    async fn find_file_id(&self, access_token: &str, file_name: &str) -> anyhow::Result<Option<String>>;

    /// Recently created, non-trashed files, optionally scoped to `folder_id`.
    async fn list_recent_files(
        &self,
        access_token: &str,
        folder_id: Option<&str>,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<DriveFile>>;

    async fn create_file(
        &self,
        access_token: &str,
        file_name: &str,
        content: &str,
        folder_id: Option<&str>,
    ) -> anyhow::Result<DriveFile>;

    async fn create_folder(&self, access_token: &str, folder_name: &str) -> anyhow::Result<DriveFile>;

    async fn share_file(&self, access_token: &str, file_id: &str, email: &str, role: &str) -> anyhow::Result<()>;
}

pub struct HttpDriveClient {
    http: reqwest::Client,
}

impl HttpDriveClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[derive(Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Deserialize)]
struct FileEntry {
    id: String,
    name: String,
    #[serde(default, rename = "webViewLink")]
    web_view_link: String,
}

#[async_trait]
impl DriveClient for HttpDriveClient {
    async fn find_folder_id(&self, access_token: &str, folder_name: &str) -> anyhow::Result<Option<String>> {
        let query = format!("name='{folder_name}' and mimeType='application/vnd.google-apps.folder' and trashed=false");
        let resp: FileListResponse = self
            .http
            .get("https://www.googleapis.com/drive/v3/files")
            .bearer_auth(access_token)
            .query(&[("q", query.as_str()), ("pageSize", "1"), ("fields", "files(id,name)")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.files.into_iter().next().map(|f| f.id))
    }

    async fn find_file_id(&self, access_token: &str, file_name: &str) -> anyhow::Result<Option<String>> {
        let query = format!("name='{file_name}' and trashed=false");
        let resp: FileListResponse = self
            .http
            .get("https://www.googleapis.com/drive/v3/files")
            .bearer_auth(access_token)
            .query(&[("q", query.as_str()), ("pageSize", "1"), ("fields", "files(id,name)")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.files.into_iter().next().map(|f| f.id))
    }

    async fn list_recent_files(
        &self,
        access_token: &str,
        folder_id: Option<&str>,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<DriveFile>> {
        let mut query_parts = Vec::new();
        if let Some(folder_id) = folder_id {
            query_parts.push(format!("'{folder_id}' in parents"));
        }
        query_parts.push(format!("createdTime > '{}'", since.format("%Y-%m-%dT%H:%M:%S")));
        query_parts.push("trashed = false".to_string());
        let query = query_parts.join(" and ");

        let resp: FileListResponse = self
            .http
            .get("https://www.googleapis.com/drive/v3/files")
            .bearer_auth(access_token)
            .query(&[
                ("q", query.as_str()),
                ("pageSize", "10"),
                ("fields", "files(id,name,webViewLink)"),
                ("orderBy", "createdTime desc"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp
            .files
            .into_iter()
            .map(|f| DriveFile {
                id: f.id,
                name: f.name,
                web_view_link: f.web_view_link,
            })
            .collect())
    }

    async fn create_file(
        &self,
        access_token: &str,
        file_name: &str,
        content: &str,
        folder_id: Option<&str>,
    ) -> anyhow::Result<DriveFile> {
        let metadata = match folder_id {
            Some(folder_id) => serde_json::json!({ "name": file_name, "parents": [folder_id] }),
            None => serde_json::json!({ "name": file_name }),
        };

        let boundary = "area-drive-upload-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
             --{boundary}\r\nContent-Type: text/plain\r\n\r\n{content}\r\n--{boundary}--",
        );

        let resp: FileEntry = self
            .http
            .post("https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&fields=id,name,webViewLink")
            .bearer_auth(access_token)
            .header("Content-Type", format!("multipart/related; boundary={boundary}"))
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(DriveFile {
            id: resp.id,
            name: resp.name,
            web_view_link: resp.web_view_link,
        })
    }

    async fn create_folder(&self, access_token: &str, folder_name: &str) -> anyhow::Result<DriveFile> {
        let resp: FileEntry = self
            .http
            .post("https://www.googleapis.com/drive/v3/files?fields=id,name,webViewLink")
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "name": folder_name,
                "mimeType": "application/vnd.google-apps.folder",
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(DriveFile {
            id: resp.id,
            name: resp.name,
            web_view_link: resp.web_view_link,
        })
    }

    async fn share_file(&self, access_token: &str, file_id: &str, email: &str, role: &str) -> anyhow::Result<()> {
        self.http
            .post(format!("https://www.googleapis.com/drive/v3/files/{file_id}/permissions"))
            .bearer_auth(access_token)
            .query(&[("sendNotificationEmail", "true"), ("fields", "id")])
            .json(&serde_json::json!({ "type": "user", "role": role, "emailAddress": email }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
