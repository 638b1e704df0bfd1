//! HTTP client for the Drive v3 files API.
//!
//! Holds one already-authorized bearer token for the client's lifetime;
//! token acquisition and refresh are the caller's concern.

use reqwest::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use super::{sync_error, DriveFiles, RemoteFile};
use crate::util::compact_text;
use crate::{Error, Result};

/// Stock Drive v3 endpoints.
const API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";

/// MIME type Drive uses to mark folders.
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Page size requested for file listings.
const LIST_PAGE_SIZE: u32 = 100;

/// Fields requested on file descriptors.
const FILE_FIELDS: &str = "id,name";

/// HTTP client for the Drive files API.
#[derive(Clone)]
pub struct DriveApiClient {
    api_base_url: String,
    upload_base_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for DriveApiClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DriveApiClient")
            .field("api_base_url", &self.api_base_url)
            .field("upload_base_url", &self.upload_base_url)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl DriveApiClient {
    /// Build a client for the stock Google endpoints from an
    /// already-authorized access token.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_base_urls(access_token, API_BASE_URL, UPLOAD_BASE_URL)
    }

    /// Build a client against explicit API and upload endpoints.
    pub fn with_base_urls(
        access_token: impl Into<String>,
        api_base_url: impl Into<String>,
        upload_base_url: impl Into<String>,
    ) -> Result<Self> {
        let access_token = access_token.into().trim().to_string();
        if access_token.is_empty() {
            return Err(Error::Validation(
                "access token must not be empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|error| sync_error("construct HTTP client", error))?;
        Ok(Self {
            api_base_url: normalize_base_url(&api_base_url.into())?,
            upload_base_url: normalize_base_url(&upload_base_url.into())?,
            access_token,
            client,
        })
    }

    /// Run a files query, concatenating pages in listing order.
    async fn list_query(&self, query: &str) -> Result<Vec<RemoteFile>> {
        let fields = format!("nextPageToken,files({FILE_FIELDS})");
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/files?spaces=drive&pageSize={LIST_PAGE_SIZE}&fields={}&q={}",
                self.api_base_url,
                urlencoding::encode(&fields),
                urlencoding::encode(query)
            );
            if let Some(token) = &page_token {
                url.push_str("&pageToken=");
                url.push_str(&urlencoding::encode(token));
            }

            let response = self
                .client
                .get(url)
                .bearer_auth(&self.access_token)
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|error| sync_error("list files", error))?;
            let payload = read_success(response, "list files").await?;

            let page = parse_file_list(&payload)?;
            files.extend(page.files);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }
}

impl DriveFiles for DriveApiClient {
    async fn find_folders(&self, name: &str) -> Result<Vec<RemoteFile>> {
        let query = format!(
            "name='{}' and mimeType='{FOLDER_MIME_TYPE}'",
            escape_query_value(name)
        );
        self.list_query(&query).await
    }

    async fn create_folder(&self, name: &str) -> Result<RemoteFile> {
        let response = self
            .client
            .post(format!(
                "{}/files?fields={}",
                self.api_base_url,
                urlencoding::encode(FILE_FIELDS)
            ))
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .json(&serde_json::json!({
                "name": name,
                "mimeType": FOLDER_MIME_TYPE,
            }))
            .send()
            .await
            .map_err(|error| sync_error("create folder", error))?;
        let payload = read_success(response, "create folder").await?;
        Ok(serde_json::from_str(&payload)?)
    }

    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteFile>> {
        let query = format!("'{}' in parents", escape_query_value(folder_id));
        self.list_query(&query).await
    }

    async fn upload(
        &self,
        folder_id: &str,
        name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<RemoteFile> {
        let metadata = serde_json::json!({
            "name": name,
            "parents": [folder_id],
        });
        let boundary = format!("dolphypretzel-{}", Uuid::new_v4().simple());
        let body = build_multipart_body(&boundary, &metadata.to_string(), content_type, bytes);

        let response = self
            .client
            .post(format!(
                "{}/files?uploadType=multipart&fields={}",
                self.upload_base_url,
                urlencoding::encode(FILE_FIELDS)
            ))
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|error| sync_error("upload file", error))?;
        let payload = read_success(response, "upload file").await?;
        Ok(serde_json::from_str(&payload)?)
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/files/{}?alt=media",
            self.api_base_url,
            urlencoding::encode(file_id)
        );
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|error| sync_error("download file", error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Sync(parse_api_error("download file", status, &body)));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|error| sync_error("download file", error))?;
        Ok(bytes.to_vec())
    }
}

/// One page of a files listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    files: Vec<RemoteFile>,
    next_page_token: Option<String>,
}

fn parse_file_list(payload: &str) -> Result<FileListPage> {
    Ok(serde_json::from_str(payload)?)
}

/// Assemble a `multipart/related` upload body: a JSON metadata part
/// followed by the media part.
fn build_multipart_body(
    boundary: &str,
    metadata_json: &str,
    content_type: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata_json.len() + bytes.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata_json.as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

/// Escape a value for embedding in a Drive query string literal.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

async fn read_success(response: reqwest::Response, operation: &str) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Sync(parse_api_error(operation, status, &body)));
    }
    response
        .text()
        .await
        .map_err(|error| sync_error(operation, error))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

fn parse_api_error(operation: &str, status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.error.and_then(|detail| detail.message) {
            return format!(
                "{operation} failed with HTTP {}: {}",
                status.as_u16(),
                message.trim()
            );
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("{operation} failed with HTTP {}", status.as_u16())
    } else {
        format!(
            "{operation} failed with HTTP {}: {}",
            status.as_u16(),
            compact_text(trimmed)
        )
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(Error::Validation("base URL must not be empty".to_string()));
    }
    if !(base.starts_with("https://") || base.starts_with("http://")) {
        return Err(Error::Validation(
            "base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escape_query_value_escapes_quotes_and_backslashes() {
        assert_eq!(escape_query_value("plain"), "plain");
        assert_eq!(escape_query_value("it's"), "it\\'s");
        assert_eq!(escape_query_value("a\\b"), "a\\\\b");
    }

    #[test]
    fn parse_file_list_reads_page_and_token() {
        let page = parse_file_list(
            r#"{"nextPageToken":"token-2","files":[{"id":"1","name":"entry_1.txt","mimeType":"text/plain"}]}"#,
        )
        .unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("token-2"));
        assert_eq!(
            page.files,
            vec![RemoteFile {
                id: "1".to_string(),
                name: "entry_1.txt".to_string(),
            }]
        );

        let last = parse_file_list(r#"{"files":[]}"#).unwrap();
        assert!(last.next_page_token.is_none());
        assert!(last.files.is_empty());

        let empty = parse_file_list("{}").unwrap();
        assert!(empty.files.is_empty());
    }

    #[test]
    fn parse_api_error_prefers_api_message() {
        let message = parse_api_error(
            "list files",
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":404,"message":"File not found"}}"#,
        );
        assert_eq!(message, "list files failed with HTTP 404: File not found");
    }

    #[test]
    fn parse_api_error_falls_back_to_body_text() {
        let message = parse_api_error("upload file", StatusCode::BAD_GATEWAY, "upstream broke");
        assert_eq!(message, "upload file failed with HTTP 502: upstream broke");

        let bare = parse_api_error("upload file", StatusCode::BAD_GATEWAY, "  ");
        assert_eq!(bare, "upload file failed with HTTP 502");
    }

    #[test]
    fn build_multipart_body_lays_out_parts() {
        let body = build_multipart_body("BOUNDARY", r#"{"name":"entry_1.txt"}"#, "text/plain", b"hello");
        let text = String::from_utf8(body).unwrap();
        assert_eq!(
            text,
            "--BOUNDARY\r\n\
             Content-Type: application/json; charset=UTF-8\r\n\r\n\
             {\"name\":\"entry_1.txt\"}\r\n\
             --BOUNDARY\r\n\
             Content-Type: text/plain\r\n\r\n\
             hello\r\n\
             --BOUNDARY--\r\n"
        );
    }

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url("").is_err());
        assert!(normalize_base_url("example.com").is_err());
        assert_eq!(
            normalize_base_url("https://api.example.com/").unwrap(),
            "https://api.example.com"
        );
    }

    #[test]
    fn client_rejects_blank_access_token() {
        assert!(DriveApiClient::new("   ").is_err());
    }

    #[test]
    fn client_debug_redacts_access_token() {
        let client = DriveApiClient::new("secret-token").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires DOLPHYPRETZEL_ACCESS_TOKEN and network access"]
    async fn drive_round_trip_upload_list_download() {
        dotenvy::dotenv().ok();
        let Ok(access_token) = std::env::var("DOLPHYPRETZEL_ACCESS_TOKEN") else {
            eprintln!("Skipping: DOLPHYPRETZEL_ACCESS_TOKEN not set");
            return;
        };

        let client = DriveApiClient::new(access_token).unwrap();
        let folder = client.create_folder("dolphypretzel-roundtrip").await.unwrap();
        let uploaded = client
            .upload(&folder.id, "entry_roundtrip.txt", "text/plain", b"round trip")
            .await
            .unwrap();

        let children = client.list_children(&folder.id).await.unwrap();
        assert!(children.iter().any(|file| file.id == uploaded.id));

        let bytes = client.download(&uploaded.id).await.unwrap();
        assert_eq!(bytes, b"round trip");
    }
}
