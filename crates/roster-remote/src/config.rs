use serde::{Deserialize, Serialize};

/// Where the shared document lives in a contents-API blob store.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobStoreSettings {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Path of the document inside the repository.
    pub path: String,
    pub branch: String,
    /// Access credential. Without one the blob store is unconfigured.
    pub token: Option<String>,
    pub commit_message: String,
    pub timeout_secs: u64,
}

impl BlobStoreSettings {
    /// `true` when a non-empty credential is present.
    pub fn is_configured(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Contents endpoint URL for the document.
    pub fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.path.trim_start_matches('/'),
        )
    }
}

impl Default for BlobStoreSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".into(),
            owner: "genshin-users".into(),
            repo: "data-storage".into(),
            path: "users_data.json".into(),
            branch: "main".into(),
            token: None,
            commit_message: "Update roster data".into(),
            timeout_secs: 15,
        }
    }
}

impl std::fmt::Debug for BlobStoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStoreSettings")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("branch", &self.branch)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("commit_message", &self.commit_message)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
