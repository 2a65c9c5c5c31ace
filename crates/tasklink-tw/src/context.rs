//! Context management
//!
//! Wraps the `context` sub-command family. Contexts live entirely in the
//! engine's configuration: which one is active is a property of the
//! external process, so nothing here is cached — every query goes back to
//! the engine.

use tasklink_core::{Context, Error, Result};
use tracing::{debug, instrument};

use crate::command::TaskExecutor;

/// Manager for named filter contexts
pub struct ContextManager<E: TaskExecutor> {
    executor: E,
}

impl<E: TaskExecutor> ContextManager<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::Validation(
                "Context name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a context with the given name and filter expression
    #[instrument(skip(self))]
    pub async fn define(&self, name: &str, filter: &str) -> Result<()> {
        Self::validate_name(name)?;

        let output = self
            .executor
            .run(&["context", "define", name, filter])
            .await?;
        if !output.success() {
            return Err(Error::engine(
                format!("Failed to define context '{}'", name),
                output.stderr,
            ));
        }
        Ok(())
    }

    /// Apply a context, making it the active filter for all queries
    #[instrument(skip(self))]
    pub async fn apply(&self, name: &str) -> Result<()> {
        Self::validate_name(name)?;

        let output = self.executor.run(&["context", name]).await?;
        if !output.success() {
            return Err(Error::Configuration(format!(
                "Failed to apply context '{}': {}",
                name,
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    /// Deactivate the current context
    #[instrument(skip(self))]
    pub async fn unset(&self) -> Result<()> {
        let output = self.executor.run(&["context", "none"]).await?;
        if !output.success() {
            return Err(Error::engine("Failed to unset context", output.stderr));
        }
        Ok(())
    }

    /// List every defined context
    ///
    /// Parses the tabular `context list` output: two header lines, then
    /// one `name definition [yes|no]` row per context.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Context>> {
        let output = self.executor.run(&["context", "list"]).await?;
        if !output.success() {
            if output.stdout.contains("No contexts defined")
                || output.stderr.contains("No contexts defined")
            {
                return Ok(Vec::new());
            }
            return Err(Error::engine("Failed to list contexts", output.stderr));
        }

        let mut contexts = Vec::new();
        for line in output.stdout.lines().skip(2) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((name, rest)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            let rest = rest.trim();
            let (filter, active) = match rest.strip_suffix(" yes") {
                Some(filter) => (filter, true),
                None => (rest.strip_suffix(" no").unwrap_or(rest), false),
            };
            contexts.push(Context {
                name: name.to_string(),
                filter: Some(filter.trim().to_string()),
                active,
            });
        }
        debug!(count = contexts.len(), "Listed contexts");
        Ok(contexts)
    }

    /// Name of the currently active context, if any
    ///
    /// Reads `rc.context` through `_get`; an unset context comes back as
    /// an empty line.
    pub async fn current(&self) -> Result<Option<String>> {
        let output = self.executor.run(&["_get", "rc.context"]).await?;
        if !output.success() {
            return Ok(None);
        }
        let name = output.stdout.trim();
        Ok(if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        })
    }

    /// Delete a defined context
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        Self::validate_name(name)?;

        let output = self.executor.run(&["context", "delete", name]).await?;
        if !output.success() {
            return Err(Error::Configuration(format!(
                "Failed to delete context '{}': {}",
                name,
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    /// Whether a context with the given name is defined
    pub async fn exists(&self, name: &str) -> bool {
        match self.list().await {
            Ok(contexts) => contexts.iter().any(|c| c.name == name),
            Err(_) => false,
        }
    }
}
