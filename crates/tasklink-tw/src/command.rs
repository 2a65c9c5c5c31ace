//! TaskWarrior command execution abstraction
//!
//! This module provides an abstraction for executing `task` commands,
//! allowing for both real command execution and mocked execution in tests.
//! The executor captures stdout/stderr/exit status and never interprets
//! success or failure itself: the same non-zero exit means different
//! things per sub-command, so classification happens in the managers.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use tasklink_core::{Config, Error, Result};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Captured output of one engine invocation
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Whether the engine reported a zero exit code
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Build a successful output with the given stdout (test helper)
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// Build a failed output with the given exit code and stderr (test helper)
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }
}

/// Trait for executing TaskWarrior commands
///
/// `run` appends the configured safety preamble (taskrc pointer,
/// confirmation off) to every call; `run_without_defaults` skips it and is
/// used only for the one-off version check.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Execute a command with the fixed option preamble appended
    async fn run(&self, args: &[&str]) -> Result<CommandOutput>;

    /// Execute a command without the option preamble
    async fn run_without_defaults(&self, args: &[&str]) -> Result<CommandOutput>;

    /// The client configuration this executor was built from
    fn config(&self) -> &Config;
}

/// Real executor invoking the external `task` binary
#[derive(Debug, Clone)]
pub struct TaskCommand {
    config: Config,
    version: Option<String>,
}

impl TaskCommand {
    /// Create an executor without probing for the binary
    ///
    /// Prefer [`TaskCommand::resolve`], which performs the one-time
    /// missing-binary check and bootstraps the taskrc.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            version: None,
        }
    }

    /// Create an executor, verifying the binary is resolvable
    ///
    /// Creates a minimal taskrc and the data directory when missing, then
    /// runs `task --version` (without the preamble). An unresolvable
    /// binary is a fatal configuration error detected here, not per call.
    pub async fn resolve(config: Config) -> Result<Self> {
        config.ensure_files()?;
        let executor = Self::new(config);

        let output = executor.run_without_defaults(&["--version"]).await?;
        if !output.success() {
            return Err(Error::Configuration(format!(
                "TaskWarrior binary '{}' failed the version check: {}",
                executor.config.task_cmd,
                output.stderr.trim()
            )));
        }

        Ok(Self {
            version: Some(output.stdout.trim().to_string()),
            ..executor
        })
    }

    /// Engine version reported by the one-time check, if performed
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    async fn spawn(&self, args: Vec<String>) -> Result<CommandOutput> {
        debug!(argv = ?args, "Running task command");

        let mut cmd = Command::new(&self.config.task_cmd);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let running = cmd.output();
        let output = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, running).await.map_err(|_| {
                Error::engine(
                    format!("Command timed out after {:?}", limit),
                    String::new(),
                )
            })?,
            None => running.await,
        };

        let output = output.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Configuration(format!(
                    "TaskWarrior command '{}' not found in PATH",
                    self.config.task_cmd
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        };

        if !result.success() {
            warn!(
                exit_code = ?result.exit_code,
                stderr = %truncate(&result.stderr),
                "task command reported failure"
            );
        }
        debug!(
            stdout = %truncate(&result.stdout),
            stderr = %truncate(&result.stderr),
            "task command finished"
        );

        Ok(result)
    }
}

#[async_trait]
impl TaskExecutor for TaskCommand {
    #[instrument(skip(self), fields(taskrc = %self.config.taskrc.display()))]
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let mut argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        argv.extend(self.config.options());
        self.spawn(argv).await
    }

    #[instrument(skip(self))]
    async fn run_without_defaults(&self, args: &[&str]) -> Result<CommandOutput> {
        let argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.spawn(argv).await
    }

    fn config(&self) -> &Config {
        &self.config
    }
}

/// Shared executors: one `TaskCommand` (or mock) can back several
/// managers through `Arc` without re-probing the binary.
#[async_trait]
impl<E: TaskExecutor + ?Sized> TaskExecutor for std::sync::Arc<E> {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        (**self).run(args).await
    }

    async fn run_without_defaults(&self, args: &[&str]) -> Result<CommandOutput> {
        (**self).run_without_defaults(args).await
    }

    fn config(&self) -> &Config {
        (**self).config()
    }
}

fn truncate(s: &str) -> &str {
    let limit = 80;
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Mock executor returning pre-configured responses, keyed on the full
/// argument vector; every invocation is recorded for assertions.
pub struct MockTaskExecutor {
    config: Config,
    responses: HashMap<Vec<String>, CommandOutput>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl Default for MockTaskExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTaskExecutor {
    pub fn new() -> Self {
        let mut config = Config::with_taskrc("/mock/taskrc");
        config.data_location = None;
        Self {
            config,
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register the output to return for an exact argument vector
    pub fn with_response(mut self, args: &[&str], output: CommandOutput) -> Self {
        let key: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.responses.insert(key, output);
        self
    }

    /// Argument vectors of every call made so far
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskExecutor for MockTaskExecutor {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let key: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.calls.lock().unwrap().push(key.clone());
        self.responses.get(&key).cloned().ok_or_else(|| {
            Error::engine(
                format!("Mock executor: no response configured for args: {:?}", args),
                String::new(),
            )
        })
    }

    async fn run_without_defaults(&self, args: &[&str]) -> Result<CommandOutput> {
        self.run(args).await
    }

    fn config(&self) -> &Config {
        &self.config
    }
}
