// Integration test: real filesystem watcher → debounce → git commit and push.
//
// 1. Publish a repo to a local bare remote and register it with a controller.
// 2. Write two files in quick succession.
// 3. Verify exactly one auto-commit containing both files reaches the remote.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gac_common::types::RepoConfig;
use gac_daemon::config::{ConfigError, FolderSource, FolderStore};
use gac_daemon::controller::{StartOutcome, WatcherController, WatcherState};
use gac_daemon::watcher::debounce::GitCommitRunner;
use tempfile::TempDir;
use tokio::runtime::Handle;

const WINDOW: Duration = Duration::from_millis(700);

struct StaticSource {
    folders: Mutex<BTreeMap<PathBuf, RepoConfig>>,
}

impl FolderSource for StaticSource {
    fn load_folders(&self) -> Result<BTreeMap<PathBuf, RepoConfig>, ConfigError> {
        Ok(self.folders.lock().unwrap().clone())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn burst_of_edits_produces_one_pushed_commit() {
    let temp = TempDir::new().unwrap();
    let (repo, remote) = publish_repo(temp.path());

    let mut folders = BTreeMap::new();
    folders.insert(repo.clone(), RepoConfig::new(path_str(&remote), "me", "tok"));
    let source = Arc::new(StaticSource { folders: Mutex::new(folders) });

    let mut controller = WatcherController::new(
        source,
        Arc::new(GitCommitRunner::new("Auto-commit")),
        WINDOW,
        Handle::current(),
    );
    assert_eq!(controller.start_watching().unwrap(), StartOutcome::Started { folders: 1 });
    tokio::time::sleep(Duration::from_millis(200)).await;

    std::fs::write(repo.join("first.md"), "one\n").unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    std::fs::write(repo.join("second.md"), "two\n").unwrap();

    assert!(
        wait_for_commit_count(&repo, 2, Duration::from_secs(15)).await,
        "auto-commit did not happen"
    );
    // Give a second commit time to appear if debounce were broken.
    tokio::time::sleep(WINDOW * 3).await;

    assert_eq!(commit_count(&repo), 2);
    let files = run_git_capture(&repo, &["show", "--name-only", "--pretty=", "HEAD"]);
    assert!(files.contains("first.md") && files.contains("second.md"), "got: {files}");
    let subject = run_git_capture(&repo, &["log", "-1", "--pretty=%s"]);
    assert_eq!(subject.trim(), "Auto-commit");

    let local = run_git_capture(&repo, &["rev-parse", "HEAD"]);
    let remote_head = run_git_capture(
        &repo,
        &["--git-dir", path_str(&remote), "rev-parse", "refs/heads/main"],
    );
    assert_eq!(local.trim(), remote_head.trim());

    assert_eq!(controller.stop_watching().unwrap(), 1);
    assert_eq!(controller.state(), WatcherState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn edits_after_stop_are_not_committed() {
    let temp = TempDir::new().unwrap();
    let (repo, remote) = publish_repo(temp.path());
    let config_path = temp.path().join("gac").join("config.toml");

    let mut store = FolderStore::open(&config_path).unwrap();
    store.settings_mut().debounce_secs = 1;
    store.add_folder(&repo, path_str(&remote), "me", "tok").unwrap();

    let mut controller =
        WatcherController::from_store(FolderStore::open(&config_path).unwrap(), Handle::current());
    controller.start_watching().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    controller.stop_watching().unwrap();

    std::fs::write(repo.join("late.md"), "late\n").unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert_eq!(commit_count(&repo), 1);
    let status = run_git_capture(&repo, &["status", "--porcelain"]);
    assert!(status.contains("late.md"));
}

async fn wait_for_commit_count(repo: &Path, expected: usize, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if commit_count(repo) >= expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

fn publish_repo(root: &Path) -> (PathBuf, PathBuf) {
    let remote = root.join("remote.git");
    let repo = root.join("repo");
    run_git(root, &["init", "--bare", path_str(&remote)]);
    run_git(root, &["init", "-b", "main", path_str(&repo)]);
    run_git(&repo, &["config", "user.name", "gac test"]);
    run_git(&repo, &["config", "user.email", "gac-test@example.test"]);
    run_git(&repo, &["remote", "add", "origin", path_str(&remote)]);
    std::fs::write(repo.join("README.md"), "# Notes\n").unwrap();
    run_git(&repo, &["add", "-A"]);
    run_git(&repo, &["commit", "-m", "seed"]);
    run_git(&repo, &["push", "-u", "origin", "main"]);
    (repo, remote)
}

fn commit_count(repo: &Path) -> usize {
    run_git_capture(repo, &["rev-list", "--count", "HEAD"]).trim().parse().unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

fn run_git(cwd: &Path, args: &[&str]) {
    let output =
        Command::new("git").args(args).current_dir(cwd).output().expect("git command should run");
    assert!(
        output.status.success(),
        "git {:?} failed:\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn run_git_capture(cwd: &Path, args: &[&str]) -> String {
    let output =
        Command::new("git").args(args).current_dir(cwd).output().expect("git command should run");
    assert!(
        output.status.success(),
        "git {:?} failed:\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf8 output")
}
