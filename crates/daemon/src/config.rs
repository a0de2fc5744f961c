// Folder registry and watcher settings persisted at `~/.gac/config.toml`.
//
// The file holds per-folder credentials, so it is created owner-only (0600)
// inside an owner-only directory (0700).

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gac_common::path::{folder_key, normalize_folder, PathError};
use gac_common::types::RepoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::git::sync::{is_git_repo, DEFAULT_COMMIT_MESSAGE};
use crate::security::{ensure_owner_only_dir, ensure_owner_only_file, open_private_truncate};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "GAC_CONFIG";

/// Default quiet period before an automatic commit.
pub const DEFAULT_DEBOUNCE_SECS: u64 = 30;
/// Shortest accepted quiet period.
const MIN_DEBOUNCE_SECS: u64 = 1;

/// Root directory for gac state: `~/.gac/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".gac"))
}

/// Path to the default config file: `~/.gac/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

/// Pick the config file: explicit path, then `$GAC_CONFIG`, then the default.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(from_env) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(from_env));
    }
    default_config_path().ok_or(ConfigError::NoHomeDir)
}

// ── File format ────────────────────────────────────────────────────

/// On-disk layout of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub watcher: WatcherSettings,
    /// Registered folders keyed by absolute path.
    pub folders: BTreeMap<String, RepoConfig>,
}

/// Watcher tuning shared by every folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatcherSettings {
    /// Quiet period in seconds after the last change before committing.
    pub debounce_secs: u64,
    /// Message used for automatic commits.
    pub commit_message: String,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            debounce_secs: DEFAULT_DEBOUNCE_SECS,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }
}

impl WatcherSettings {
    /// Debounce window, at least one second.
    pub fn debounce_window(&self) -> Duration {
        Duration::from_secs(self.debounce_secs.max(MIN_DEBOUNCE_SECS))
    }
}

fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::Io(e)),
    }
}

fn key_for(folder: &Path) -> Result<String, ConfigError> {
    let raw = folder_key(folder)?;
    Ok(folder_key(&normalize_folder(&raw)?)?)
}

// ── Folder source ──────────────────────────────────────────────────

/// Read-only view of the registered folders, re-read on every call.
pub trait FolderSource: Send + Sync {
    fn load_folders(&self) -> Result<BTreeMap<PathBuf, RepoConfig>, ConfigError>;
}

// ── Folder store ───────────────────────────────────────────────────

/// The persisted folder registry.
#[derive(Debug, Clone)]
pub struct FolderStore {
    path: PathBuf,
    file: ConfigFile,
}

impl FolderStore {
    /// Open the store at `path`. A missing file is an empty store; it is
    /// written on the first `save`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let file = load_file(&path)?;
        Ok(Self { path, file })
    }

    /// Open the store at `--config`, `$GAC_CONFIG`, or `~/.gac/config.toml`.
    pub fn open_resolved(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::open(resolve_config_path(explicit)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, discarding in-memory state.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        self.file = load_file(&self.path)?;
        Ok(())
    }

    /// Write the store (creates parent directories, owner-only permissions).
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
            ensure_owner_only_dir(parent)
                .map_err(|error| ConfigError::Io(std::io::Error::other(error.to_string())))?;
        }
        let contents = toml::to_string_pretty(&self.file)?;
        let mut file = open_private_truncate(&self.path)?;
        file.write_all(contents.as_bytes())?;
        ensure_owner_only_file(&self.path)
            .map_err(|error| ConfigError::Io(std::io::Error::other(error.to_string())))?;
        info!(path = %self.path.display(), "saved configuration");
        Ok(())
    }

    pub fn settings(&self) -> &WatcherSettings {
        &self.file.watcher
    }

    pub fn settings_mut(&mut self) -> &mut WatcherSettings {
        &mut self.file.watcher
    }

    pub fn get_folders(&self) -> &BTreeMap<String, RepoConfig> {
        &self.file.folders
    }

    pub fn get_folder_config(&self, folder: &Path) -> Option<&RepoConfig> {
        let key = key_for(folder).ok()?;
        self.file.folders.get(&key)
    }

    pub fn is_registered(&self, folder: &Path) -> bool {
        self.get_folder_config(folder).is_some()
    }

    /// Register (or re-register) a folder. The folder must exist and already
    /// be a git repository. Returns the normalized path and saves the store.
    pub fn add_folder(
        &mut self,
        folder: &Path,
        repo_url: &str,
        username: &str,
        token: &str,
    ) -> Result<PathBuf, ConfigError> {
        let key = key_for(folder)?;
        let normalized = PathBuf::from(&key);
        if !normalized.is_dir() {
            return Err(ConfigError::NotADirectory(normalized));
        }
        if !is_git_repo(&normalized) {
            return Err(ConfigError::NotARepository(normalized));
        }

        self.file.folders.insert(key, RepoConfig::new(repo_url, username, token));
        self.save()?;
        info!(folder = %normalized.display(), "registered folder");
        Ok(normalized)
    }

    /// Unregister a folder and save the store.
    pub fn remove_folder(&mut self, folder: &Path) -> Result<(), ConfigError> {
        let key = key_for(folder)?;
        if self.file.folders.remove(&key).is_none() {
            return Err(ConfigError::NotRegistered(PathBuf::from(key)));
        }
        self.save()?;
        info!(folder = %key, "removed folder");
        Ok(())
    }
}

impl FolderSource for FolderStore {
    fn load_folders(&self) -> Result<BTreeMap<PathBuf, RepoConfig>, ConfigError> {
        let file = load_file(&self.path)?;
        Ok(file.folders.into_iter().map(|(key, cfg)| (PathBuf::from(key), cfg)).collect())
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("invalid folder path: {0}")]
    Path(#[from] PathError),

    #[error("folder `{}` does not exist", .0.display())]
    NotADirectory(PathBuf),

    #[error("folder `{}` is not a git repository", .0.display())]
    NotARepository(PathBuf),

    #[error("folder `{}` is not registered", .0.display())]
    NotRegistered(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo_dir(parent: &Path, name: &str) -> PathBuf {
        let dir = parent.join(name);
        std::fs::create_dir_all(dir.join(".git")).unwrap();
        dir
    }

    #[test]
    fn settings_defaults() {
        let settings = WatcherSettings::default();
        assert_eq!(settings.debounce_secs, 30);
        assert_eq!(settings.commit_message, "Auto-commit");
        assert_eq!(settings.debounce_window(), Duration::from_secs(30));
    }

    #[test]
    fn debounce_window_has_a_floor() {
        let settings = WatcherSettings { debounce_secs: 0, ..WatcherSettings::default() };
        assert_eq!(settings.debounce_window(), Duration::from_secs(1));
    }

    #[test]
    fn parse_from_toml() {
        let toml_str = r#"
[watcher]
debounce_secs = 10
commit_message = "wip"

[folders."/home/me/notes"]
repo_url = "https://github.com/me/notes.git"
username = "me"
token = "ghp_abc"

[folders."/home/me/site"]
repo_url = "https://github.com/me/site.git"
username = "me"
token = "ghp_def"
auto_commit = false
"#;
        let file: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(file.watcher.debounce_secs, 10);
        assert_eq!(file.watcher.commit_message, "wip");
        assert_eq!(file.folders.len(), 2);
        assert!(file.folders["/home/me/notes"].auto_commit);
        assert!(!file.folders["/home/me/site"].auto_commit);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let file: ConfigFile = toml::from_str("[watcher]\ndebounce_secs = 5\n").unwrap();
        assert_eq!(file.watcher.debounce_secs, 5);
        assert_eq!(file.watcher.commit_message, "Auto-commit");
        assert!(file.folders.is_empty());
    }

    #[test]
    fn missing_file_opens_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = FolderStore::open(dir.path().join("missing.toml")).unwrap();
        assert!(store.get_folders().is_empty());
        assert!(!dir.path().join("missing.toml").exists());
    }

    #[test]
    fn unparsable_file_is_an_error_not_a_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "folders = [not toml").unwrap();

        let result = FolderStore::open(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "folders = [not toml");
    }

    #[test]
    fn add_folder_roundtrips_through_disk() {
        let dir = TempDir::new().unwrap();
        let folder = repo_dir(dir.path(), "notes");
        let path = dir.path().join("cfg").join("config.toml");

        let mut store = FolderStore::open(&path).unwrap();
        let added = store
            .add_folder(&folder, "https://github.com/me/notes.git", "me", "ghp_abc")
            .unwrap();
        assert_eq!(added, folder);

        let reopened = FolderStore::open(&path).unwrap();
        let cfg = reopened.get_folder_config(&folder).unwrap();
        assert_eq!(cfg.repo_url, "https://github.com/me/notes.git");
        assert_eq!(cfg.username, "me");
        assert_eq!(cfg.token, "ghp_abc");
        assert!(cfg.auto_commit);
    }

    #[test]
    fn lookups_normalize_the_folder_path() {
        let dir = TempDir::new().unwrap();
        let folder = repo_dir(dir.path(), "notes");
        let mut store = FolderStore::open(dir.path().join("config.toml")).unwrap();
        store.add_folder(&folder, "u", "me", "t").unwrap();

        let with_slash = PathBuf::from(format!("{}/", folder.display()));
        let with_dots = folder.join("sub").join("..");
        assert!(store.is_registered(&with_slash));
        assert!(store.is_registered(&with_dots));
        assert!(!store.is_registered(&dir.path().join("other")));
    }

    #[test]
    fn add_folder_requires_existing_directory() {
        let dir = TempDir::new().unwrap();
        let mut store = FolderStore::open(dir.path().join("config.toml")).unwrap();

        let error = store.add_folder(&dir.path().join("nope"), "u", "me", "t").unwrap_err();
        assert!(matches!(error, ConfigError::NotADirectory(_)));
    }

    #[test]
    fn add_folder_requires_git_repository() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain");
        std::fs::create_dir(&plain).unwrap();
        let mut store = FolderStore::open(dir.path().join("config.toml")).unwrap();

        let error = store.add_folder(&plain, "u", "me", "t").unwrap_err();
        assert!(matches!(error, ConfigError::NotARepository(_)));
        assert!(error.to_string().contains("is not a git repository"));
    }

    #[test]
    fn remove_folder() {
        let dir = TempDir::new().unwrap();
        let folder = repo_dir(dir.path(), "notes");
        let path = dir.path().join("config.toml");
        let mut store = FolderStore::open(&path).unwrap();
        store.add_folder(&folder, "u", "me", "t").unwrap();

        store.remove_folder(&folder).unwrap();
        assert!(!store.is_registered(&folder));
        assert!(FolderStore::open(&path).unwrap().get_folders().is_empty());

        let error = store.remove_folder(&folder).unwrap_err();
        assert!(matches!(error, ConfigError::NotRegistered(_)));
    }

    #[test]
    fn load_folders_rereads_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let store = FolderStore::open(&path).unwrap();
        assert!(store.load_folders().unwrap().is_empty());

        std::fs::write(
            &path,
            "[folders.\"/srv/notes\"]\nrepo_url = \"u\"\nusername = \"me\"\ntoken = \"t\"\n",
        )
        .unwrap();

        let folders = store.load_folders().unwrap();
        assert_eq!(folders.len(), 1);
        assert!(folders.contains_key(Path::new("/srv/notes")));
    }

    #[test]
    fn reload_picks_up_external_edits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut store = FolderStore::open(&path).unwrap();

        std::fs::write(&path, "[watcher]\ndebounce_secs = 7\n").unwrap();
        assert_eq!(store.settings().debounce_secs, 30);
        store.reload().unwrap();
        assert_eq!(store.settings().debounce_secs, 7);
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = resolve_config_path(Some(Path::new("/tmp/gac-test.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/gac-test.toml"));
    }

    #[test]
    fn default_path_is_under_home() {
        let path = default_config_path().unwrap();
        assert!(path.ends_with(".gac/config.toml"));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("config.toml");
        let store = FolderStore::open(&path).unwrap();
        store.save().unwrap();

        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        let dir_mode = std::fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        assert_eq!(dir_mode, 0o700);
    }
}
