//! HTTP backend for GitHub-style repository contents APIs.
//!
//! ```text
//! GET  {api_base}/repos/{owner}/{repo}/contents/{path}?ref={branch}
//!      -> 200 {"content": "<base64>", "sha": "<token>"} | 404
//! PUT  {api_base}/repos/{owner}/{repo}/contents/{path}
//!      {"message", "content": "<base64>", "sha"?, "branch"}
//!      -> 200/201 {"content": {"sha": "<token>"}} | 409/422 on stale sha
//! ```

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use roster_types::VersionToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::BlobStoreSettings;
use crate::error::{RemoteError, RemoteResult};
use crate::traits::{BlobBackend, VersionedBlob};

const USER_AGENT: &str = concat!("roster/", env!("CARGO_PKG_VERSION"));
const MEDIA_TYPE: &str = "application/vnd.github+json";

#[derive(Deserialize)]
struct ContentsEntry {
    #[serde(default)]
    content: Option<String>,
    sha: String,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    branch: &'a str,
}

#[derive(Deserialize)]
struct PutResponse {
    content: Option<PutContent>,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

/// Contents-API [`BlobBackend`] over `reqwest`.
pub struct ContentsApi {
    http: Client,
    settings: BlobStoreSettings,
    url: String,
}

impl ContentsApi {
    pub fn new(settings: BlobStoreSettings) -> RemoteResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RemoteError::Unavailable(format!("http client: {e}")))?;
        let url = settings.contents_url();
        Ok(Self { http, settings, url })
    }

    fn authorization(&self) -> RemoteResult<String> {
        match self.settings.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(format!("token {token}")),
            _ => Err(RemoteError::Unauthorized("no blob store credential configured".into())),
        }
    }
}

/// Map a non-success status to the remote error taxonomy.
fn classify(status: StatusCode, body: &str) -> RemoteError {
    let detail = format!("{status}: {}", body.chars().take(200).collect::<String>());
    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound,
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(detail),
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => RemoteError::Conflict(detail),
        _ => RemoteError::Unavailable(detail),
    }
}

/// Decode base64 content, ignoring the line breaks some servers insert.
fn decode_content(encoded: &str) -> RemoteResult<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| RemoteError::Decode(format!("invalid base64 content: {e}")))
}

#[async_trait]
impl BlobBackend for ContentsApi {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn get(&self) -> RemoteResult<Option<VersionedBlob>> {
        let auth = self.authorization()?;
        let response = self
            .http
            .get(&self.url)
            .query(&[("ref", self.settings.branch.as_str())])
            .header(AUTHORIZATION, auth)
            .header(ACCEPT, MEDIA_TYPE)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("contents entry does not exist");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, &body));
        }

        let entry: ContentsEntry = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(format!("contents entry: {e}")))?;
        let encoded = entry
            .content
            .ok_or_else(|| RemoteError::Decode("contents entry has no content".into()))?;
        let content = decode_content(&encoded)?;
        Ok(Some(VersionedBlob {
            content,
            token: VersionToken::new(entry.sha),
        }))
    }

    #[instrument(skip(self, content), fields(url = %self.url, bytes = content.len()))]
    async fn put(
        &self,
        content: &[u8],
        expected: Option<&VersionToken>,
    ) -> RemoteResult<Option<VersionToken>> {
        let auth = self.authorization()?;
        let body = PutRequest {
            message: &self.settings.commit_message,
            content: STANDARD.encode(content),
            sha: expected.map(VersionToken::as_str),
            branch: &self.settings.branch,
        };
        let response = self
            .http
            .put(&self.url)
            .header(AUTHORIZATION, auth)
            .header(ACCEPT, MEDIA_TYPE)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, &body));
        }

        match response.json::<PutResponse>().await {
            Ok(PutResponse { content: Some(c) }) => Ok(Some(VersionToken::new(c.sha))),
            Ok(PutResponse { content: None }) => Ok(None),
            Err(e) => {
                warn!(error = %e, "write accepted but response carried no readable token");
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for ContentsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentsApi")
            .field("url", &self.url)
            .field("branch", &self.settings.branch)
            .finish()
    }
}
