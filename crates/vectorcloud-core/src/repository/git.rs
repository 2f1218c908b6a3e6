use std::ffi::OsString;
use std::fmt::Debug;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::repository::error::GitError;

/// Source-control operations repository sync relies on
#[async_trait]
pub trait GitBackend: Send + Sync + Debug {
    /// Clone `url` into the directory `dest`, which must not exist yet
    async fn clone_repository(&self, url: &str, dest: &Path) -> Result<(), GitError>;

    /// Pull the latest changes into the working tree at `checkout`
    async fn pull(&self, checkout: &Path) -> Result<(), GitError>;
}

/// [`GitBackend`] that runs the git command-line client
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    timeout: Option<Duration>,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), timeout: None }
    }

    /// Kill any invocation that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn execute(&self, args: Vec<OsString>, cwd: Option<&Path>) -> Result<(), GitError> {
        let command_line = format!(
            "{} {}",
            self.program,
            args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" ")
        );
        let mut command = Command::new(&self.program);
        command
            .args(&args)
            // Never stop to ask for credentials
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        log::debug!("Running '{}'", command_line);
        let output = command.output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output).await.map_err(|_| GitError::Timeout {
                command: command_line.clone(),
                seconds: limit.as_secs(),
            })?,
            None => output.await,
        }
        .map_err(|source| GitError::Spawn { program: self.program.clone(), source })?;

        if !output.status.success() {
            return Err(GitError::Failed {
                command: command_line,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GitBackend for GitCli {
    async fn clone_repository(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        let args = vec![OsString::from("clone"), OsString::from(url), dest.as_os_str().to_owned()];
        self.execute(args, None).await
    }

    async fn pull(&self, checkout: &Path) -> Result<(), GitError> {
        self.execute(vec![OsString::from("pull")], Some(checkout)).await
    }
}
