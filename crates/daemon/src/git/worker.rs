use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitWorkerError {
    SpawnFailed { command: String, message: String },
    CommandFailed { command: String, code: Option<i32>, stderr: String },
}

impl GitWorkerError {
    /// The tool's own diagnostic text, without the command prefix.
    pub fn diagnostic(&self) -> &str {
        match self {
            GitWorkerError::SpawnFailed { message, .. } => message.trim(),
            GitWorkerError::CommandFailed { stderr, .. } => stderr.trim(),
        }
    }
}

impl Display for GitWorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GitWorkerError::SpawnFailed { command, message } => {
                write!(f, "failed to run `{command}`: {message}")
            }
            GitWorkerError::CommandFailed { command, code, stderr } => {
                write!(f, "`{command}` failed with code {:?}: {}", code, stderr.trim())
            }
        }
    }
}

impl Error for GitWorkerError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandExecutor: Send + Sync {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<CommandResult, std::io::Error>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandExecutor;

impl CommandExecutor for ProcessCommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<CommandResult, std::io::Error> {
        // Background pushes must fail instead of waiting on a credential prompt.
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()?;
        Ok(CommandResult {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GitWorker<E = ProcessCommandExecutor> {
    repo_path: PathBuf,
    executor: E,
}

impl GitWorker<ProcessCommandExecutor> {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self { repo_path: repo_path.into(), executor: ProcessCommandExecutor }
    }
}

impl<E: CommandExecutor> GitWorker<E> {
    pub fn with_executor(repo_path: impl Into<PathBuf>, executor: E) -> Self {
        Self { repo_path: repo_path.into(), executor }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn status_porcelain(&self) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["status".to_string(), "--porcelain".to_string()])
    }

    /// Stage everything: additions, modifications, and deletions.
    pub fn add_all(&self) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["add".to_string(), "-A".to_string()])
    }

    pub fn commit(&self, message: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["commit".to_string(), "-m".to_string(), message.to_string()])
    }

    pub fn push(&self) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["push".to_string()])
    }

    pub fn push_set_upstream(
        &self,
        remote: &str,
        branch: &str,
    ) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec![
            "push".to_string(),
            "--set-upstream".to_string(),
            remote.to_string(),
            branch.to_string(),
        ])
    }

    pub fn init(&self) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["init".to_string()])
    }

    pub fn remote_add(&self, name: &str, url: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec!["remote".to_string(), "add".to_string(), name.to_string(), url.to_string()])
    }

    /// Configured URL of `name` as written in the repo config, trimmed.
    /// Unlike `git remote get-url`, no `insteadOf` rewriting is applied.
    pub fn remote_url(&self, name: &str) -> Result<String, GitWorkerError> {
        let output = self.run(vec![
            "config".to_string(),
            "--get".to_string(),
            format!("remote.{name}.url"),
        ])?;
        Ok(output.stdout.trim().to_string())
    }

    pub fn remote_set_url(
        &self,
        name: &str,
        url: &str,
    ) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(vec![
            "remote".to_string(),
            "set-url".to_string(),
            name.to_string(),
            url.to_string(),
        ])
    }

    /// Name of the checked-out branch (`main`, `master`, ...).
    pub fn current_branch(&self) -> Result<String, GitWorkerError> {
        let output = self.run(vec![
            "rev-parse".to_string(),
            "--abbrev-ref".to_string(),
            "HEAD".to_string(),
        ])?;
        Ok(output.stdout.trim().to_string())
    }

    fn run(&self, args: Vec<String>) -> Result<GitCommandOutput, GitWorkerError> {
        let command = format!("git {}", args.join(" "));
        let result = self.executor.execute("git", &args, &self.repo_path).map_err(|error| {
            GitWorkerError::SpawnFailed { command: command.clone(), message: error.to_string() }
        })?;

        if result.success {
            return Ok(GitCommandOutput { stdout: result.stdout, stderr: result.stderr });
        }

        let stderr = if result.stderr.trim().is_empty() { result.stdout } else { result.stderr };

        Err(GitWorkerError::CommandFailed { command, code: result.code, stderr })
    }
}
