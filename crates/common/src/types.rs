// Core domain types shared across all gac crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome text for a commit attempt on a clean working tree.
pub const NO_CHANGES_MESSAGE: &str = "No changes to commit";

/// Remote repository and credentials for one watched folder.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoConfig {
    pub repo_url: String,
    pub username: String,
    /// Personal access token. Never logged; `Debug` masks it.
    pub token: String,
    /// Whether the watcher should auto-commit this folder.
    #[serde(default = "default_auto_commit")]
    pub auto_commit: bool,
}

fn default_auto_commit() -> bool {
    true
}

impl RepoConfig {
    pub fn new(
        repo_url: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            username: username.into(),
            token: token.into(),
            auto_commit: true,
        }
    }
}

impl fmt::Debug for RepoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoConfig")
            .field("repo_url", &self.repo_url)
            .field("username", &self.username)
            .field("token", &"********")
            .field("auto_commit", &self.auto_commit)
            .finish()
    }
}

/// Result of a git operation sequence: success flag plus the diagnostic or
/// summary text to show the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitResult {
    pub success: bool,
    pub message: String,
}

impl CommitResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }

    /// The idempotent no-op outcome for a clean tree.
    pub fn no_changes() -> Self {
        Self::ok(NO_CHANGES_MESSAGE)
    }

    pub fn is_no_changes(&self) -> bool {
        self.success && self.message == NO_CHANGES_MESSAGE
    }
}

impl fmt::Display for CommitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_config_defaults_auto_commit_on() {
        let cfg = RepoConfig::new("https://example.com/r.git", "me", "secret");
        assert!(cfg.auto_commit);
    }

    #[test]
    fn repo_config_missing_auto_commit_deserializes_true() {
        let cfg: RepoConfig = serde_json::from_str(
            r#"{"repo_url":"https://example.com/r.git","username":"me","token":"t"}"#,
        )
        .unwrap();
        assert!(cfg.auto_commit);
    }

    #[test]
    fn repo_config_debug_masks_token() {
        let cfg = RepoConfig::new("https://example.com/r.git", "me", "ghp_supersecret");
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("ghp_supersecret"));
        assert!(rendered.contains("https://example.com/r.git"));
    }

    #[test]
    fn commit_result_no_changes() {
        let result = CommitResult::no_changes();
        assert!(result.success);
        assert_eq!(result.message, "No changes to commit");
        assert!(result.is_no_changes());
        assert!(!CommitResult::ok("pushed").is_no_changes());
        assert!(!CommitResult::failed(NO_CHANGES_MESSAGE).is_no_changes());
    }

    #[test]
    fn commit_result_display_is_message() {
        let result = CommitResult::failed("Failed to push changes: denied");
        assert_eq!(result.to_string(), "Failed to push changes: denied");
    }
}
