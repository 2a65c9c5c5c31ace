//! Task lifecycle operations
//!
//! Composes the argument encoder, the command executor, and the export
//! mapper into the add/modify/get/list/delete/purge/done/start/stop/
//! annotate operations plus the recurring-task queries. Exit-code
//! classification lives here, per operation: the executor itself never
//! decides what a non-zero exit means.

use serde::Serialize;
use tasklink_core::{Error, Result, Status, TaskInput, TaskRecord};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::command::TaskExecutor;
use crate::encode::{build_args, quote};
use crate::export::parse_export;

/// Default list filter: everything not deleted and not completed
pub const DEFAULT_FILTER: &str = "(status.not:deleted and status.not:completed)";

/// Engine paths, preamble and version, for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub task_cmd: String,
    pub taskrc: String,
    pub options: Vec<String>,
    pub version: Option<String>,
}

/// Manager for task lifecycle operations
///
/// Task identities are passed as strings holding either a uuid or a
/// numeric working-set index. The index is transient (it is reassigned
/// whenever pending tasks complete or disappear), so anything kept beyond
/// a single round-trip should be keyed by uuid.
pub struct TaskManager<E: TaskExecutor> {
    executor: E,
}

impl<E: TaskExecutor> TaskManager<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Add a new task and return it as stored by the engine
    ///
    /// The `add` sub-command's stdout does not reliably return structured
    /// identity, so the created task is re-queried through an `export`
    /// filtered to `+LATEST` and keyed by the uuid found there. Pending
    /// annotations are applied afterwards, then the task is fetched once
    /// more so the returned record includes them.
    #[instrument(skip(self, task), fields(description = %task.description))]
    pub async fn add(&self, task: &TaskInput) -> Result<TaskRecord> {
        if task.description.trim().is_empty() {
            return Err(Error::Validation(
                "Task description cannot be empty".to_string(),
            ));
        }

        let args = build_args(task);
        let mut argv: Vec<&str> = vec!["add"];
        argv.extend(args.iter().map(String::as_str));

        let output = self.executor.run(&argv).await?;
        if !output.success() {
            return Err(Error::engine("Failed to add task", output.stderr));
        }

        let mut created = self.list("+LATEST").await?;
        let record = match created.pop() {
            Some(record) if created.is_empty() => record,
            _ => {
                return Err(Error::engine(
                    "Failed to retrieve added task",
                    String::new(),
                ))
            }
        };
        debug!(uuid = %record.uuid, "Added task");

        if task.annotations.is_empty() {
            return Ok(record);
        }
        let uuid = record.uuid.to_string();
        for text in &task.annotations {
            self.annotate(&uuid, text).await?;
        }
        self.get(&uuid).await
    }

    /// Apply a sparse patch to an existing task
    ///
    /// Only the fields set on `task` are sent; everything else keeps its
    /// current value. The task is re-fetched after the mutation so the
    /// returned record reflects the authoritative engine state.
    #[instrument(skip(self, task))]
    pub async fn modify(&self, task: &TaskInput, id: &str) -> Result<TaskRecord> {
        let args = build_args(task);
        let mut argv: Vec<&str> = vec![id, "modify"];
        argv.extend(args.iter().map(String::as_str));

        let output = self.executor.run(&argv).await?;
        if !output.success() {
            return Err(Error::engine(
                format!("Failed to modify task {}", id),
                output.stderr,
            ));
        }

        self.get(id).await
    }

    /// Retrieve a single task by uuid or working-set index
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<TaskRecord> {
        self.get_filtered(id, None).await
    }

    async fn get_filtered(&self, id: &str, filter: Option<&str>) -> Result<TaskRecord> {
        let mut argv = Vec::new();
        if let Some(filter) = filter {
            argv.push(filter);
        }
        argv.push(id);
        argv.push("export");

        let output = self.executor.run(&argv).await?;
        if !output.success() {
            return Err(Error::engine(
                format!("Failed to retrieve task {}", id),
                output.stderr,
            ));
        }

        let mut tasks = parse_export(&output.stdout)?;
        match tasks.len() {
            0 => Err(Error::NotFound(format!("No task with ID/UUID {}", id))),
            1 => Ok(tasks.remove(0)),
            n => Err(Error::engine(
                format!("More than one task ({}) returned for ID/UUID {}", n, id),
                String::new(),
            )),
        }
    }

    /// Retrieve every task matching a filter expression
    ///
    /// An empty match is a valid empty list; a filter the engine rejects
    /// surfaces as an [`Error::Engine`] with the engine's stderr attached.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &str) -> Result<Vec<TaskRecord>> {
        let mut argv = Vec::new();
        if !filter.is_empty() {
            argv.push(filter);
        }
        argv.push("export");

        let output = self.executor.run(&argv).await?;
        if !output.success() {
            return Err(Error::engine("Failed to list tasks", output.stderr));
        }

        let tasks = parse_export(&output.stdout)?;
        debug!(count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    /// Retrieve every task not deleted and not completed
    pub async fn list_pending(&self) -> Result<Vec<TaskRecord>> {
        self.list(DEFAULT_FILTER).await
    }

    /// Look up the recurring template for an identity
    ///
    /// Queries with a `status:recurring` filter first; when the identity
    /// does not resolve as a template (it may already be a materialized
    /// instance, or a plain task), falls back to a normal lookup.
    #[instrument(skip(self))]
    pub async fn recurring_template(&self, id: &str) -> Result<TaskRecord> {
        let status_filter = format!("status:{}", Status::Recurring);
        let output = self.executor.run(&[id, &status_filter, "export"]).await?;

        if output.success() {
            if let Ok(mut tasks) = parse_export(&output.stdout) {
                if !tasks.is_empty() {
                    return Ok(tasks.remove(0));
                }
            }
        }

        debug!(id, "Not found as a recurring template, trying normal retrieval");
        self.get(id).await
    }

    /// All instances the engine has materialized from a recurring template
    ///
    /// An empty result is valid: the template exists but has not yet
    /// produced instances.
    #[instrument(skip(self))]
    pub async fn recurring_instances(&self, parent: &Uuid) -> Result<Vec<TaskRecord>> {
        let filter = format!("parent:{}", parent);
        let output = self.executor.run(&[&filter, "export"]).await?;

        if !output.success() {
            if output.stderr.contains("No matches")
                || output.stderr.contains("Unable to find report that matches")
            {
                return Ok(Vec::new());
            }
            return Err(Error::NotFound(format!(
                "Failed to get recurring instances of {}: {}",
                parent,
                output.stderr.trim()
            )));
        }

        if output.stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_export(&output.stdout)
    }

    /// Mark a task as deleted (reversible; the task stays retrievable)
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.simple_command(id, "delete").await
    }

    /// Permanently remove a task; a subsequent `get` fails with `NotFound`
    pub async fn purge(&self, id: &str) -> Result<()> {
        self.simple_command(id, "purge").await
    }

    /// Mark a task as completed
    pub async fn done(&self, id: &str) -> Result<()> {
        self.simple_command(id, "done").await
    }

    /// Start working on a task
    pub async fn start(&self, id: &str) -> Result<()> {
        self.simple_command(id, "start").await
    }

    /// Stop working on a task
    pub async fn stop(&self, id: &str) -> Result<()> {
        self.simple_command(id, "stop").await
    }

    #[instrument(skip(self))]
    async fn simple_command(&self, id: &str, sub_command: &str) -> Result<()> {
        let output = self.executor.run(&[id, sub_command]).await?;
        if !output.success() {
            return Err(Error::NotFound(format!(
                "Failed to {} task {}: {}",
                sub_command,
                id,
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    /// Attach a timestamped note to a task
    #[instrument(skip(self, text))]
    pub async fn annotate(&self, id: &str, text: &str) -> Result<()> {
        let quoted = quote(text);
        let output = self.executor.run(&[id, "annotate", &quoted]).await?;
        if !output.success() {
            return Err(Error::NotFound(format!(
                "Failed to annotate task {}: {}",
                id,
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    /// Engine configuration and version, for diagnostics
    pub async fn info(&self) -> EngineInfo {
        let config = self.executor.config();
        let version = match self.executor.run_without_defaults(&["--version"]).await {
            Ok(output) if output.success() => Some(output.stdout.trim().to_string()),
            _ => None,
        };
        EngineInfo {
            task_cmd: config.task_cmd.clone(),
            taskrc: config.taskrc.display().to_string(),
            options: config.options(),
            version,
        }
    }

    /// The executor backing this manager
    pub fn executor(&self) -> &E {
        &self.executor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandOutput, MockTaskExecutor};

    const UUID_A: &str = "c3f8a9a2-1d62-4a4a-9d3e-2f8b55a1f111";
    const UUID_TEMPLATE: &str = "71c1dbc5-2884-4b9c-a38e-1e99e2e1a222";

    fn pending_row(uuid: &str, description: &str) -> String {
        format!(
            r#"[{{"id": 1, "uuid": "{}", "description": "{}", "status": "pending", "entry": "20260115T143000Z"}}]"#,
            uuid, description
        )
    }

    #[tokio::test]
    async fn test_add_returns_created_task() {
        let mock = MockTaskExecutor::new()
            .with_response(&["add", "description:'Buy milk'"], CommandOutput::ok(""))
            .with_response(
                &["+LATEST", "export"],
                CommandOutput::ok(pending_row(UUID_A, "Buy milk")),
            );

        let manager = TaskManager::new(mock);
        let task = TaskInput::new("Buy milk").unwrap();
        let record = manager.add(&task).await.unwrap();

        assert_eq!(record.uuid.to_string(), UUID_A);
        assert_eq!(record.status, Status::Pending);
        assert_eq!(record.description, "Buy milk");
        assert!(record.tags.is_empty());
    }

    #[tokio::test]
    async fn test_add_applies_pending_annotations() {
        let mock = MockTaskExecutor::new()
            .with_response(&["add", "description:'Buy milk'"], CommandOutput::ok(""))
            .with_response(
                &["+LATEST", "export"],
                CommandOutput::ok(pending_row(UUID_A, "Buy milk")),
            )
            .with_response(&[UUID_A, "annotate", "'ask for oat milk'"], CommandOutput::ok(""))
            .with_response(
                &[UUID_A, "export"],
                CommandOutput::ok(pending_row(UUID_A, "Buy milk")),
            );

        let manager = TaskManager::new(mock);
        let task = TaskInput::new("Buy milk")
            .unwrap()
            .with_annotation("ask for oat milk");
        manager.add(&task).await.unwrap();

        let calls = manager.executor().calls();
        assert!(calls
            .iter()
            .any(|argv| argv.get(1).map(String::as_str) == Some("annotate")));
    }

    #[tokio::test]
    async fn test_add_rejects_empty_description_before_any_call() {
        let mock = MockTaskExecutor::new();
        let manager = TaskManager::new(mock);

        let task = TaskInput {
            description: "   ".to_string(),
            ..TaskInput::default()
        };
        let err = manager.add(&task).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(manager.executor().calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_failure_carries_engine_stderr() {
        let mock = MockTaskExecutor::new().with_response(
            &["add", "description:'Buy milk'"],
            CommandOutput::failed(2, "The duration value 'x' is not supported"),
        );

        let manager = TaskManager::new(mock);
        let task = TaskInput::new("Buy milk").unwrap();
        let err = manager.add(&task).await.unwrap_err();
        match err {
            Error::Engine { stderr, .. } => assert!(stderr.contains("not supported")),
            other => panic!("expected Engine error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_modify_refetches_authoritative_state() {
        let mock = MockTaskExecutor::new()
            .with_response(
                &[UUID_A, "modify", "description:'Buy oat milk'"],
                CommandOutput::ok(""),
            )
            .with_response(
                &[UUID_A, "export"],
                CommandOutput::ok(pending_row(UUID_A, "Buy oat milk")),
            );

        let manager = TaskManager::new(mock);
        let patch = TaskInput::new("Buy oat milk").unwrap();
        let record = manager.modify(&patch, UUID_A).await.unwrap();
        assert_eq!(record.description, "Buy oat milk");
    }

    #[tokio::test]
    async fn test_get_zero_rows_is_not_found() {
        let mock = MockTaskExecutor::new()
            .with_response(&[UUID_A, "export"], CommandOutput::ok("[]"));

        let manager = TaskManager::new(mock);
        assert!(matches!(
            manager.get(UUID_A).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_multiple_rows_is_engine_error() {
        let two = format!(
            "[{},{}]",
            pending_row(UUID_A, "a").trim_start_matches('[').trim_end_matches(']'),
            pending_row(UUID_TEMPLATE, "b").trim_start_matches('[').trim_end_matches(']')
        );
        let mock =
            MockTaskExecutor::new().with_response(&["1", "export"], CommandOutput::ok(two));

        let manager = TaskManager::new(mock);
        assert!(matches!(
            manager.get("1").await,
            Err(Error::Engine { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_empty_match_is_empty_list() {
        let mock = MockTaskExecutor::new()
            .with_response(&["project:void", "export"], CommandOutput::ok("[]"));

        let manager = TaskManager::new(mock);
        assert!(manager.list("project:void").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_rejected_filter_is_engine_error() {
        let mock = MockTaskExecutor::new().with_response(
            &["status:nonsense", "export"],
            CommandOutput::failed(1, "The 'status' attribute does not allow a value of 'nonsense'"),
        );

        let manager = TaskManager::new(mock);
        assert!(matches!(
            manager.list("status:nonsense").await,
            Err(Error::Engine { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_malformed_json_is_parse_error() {
        let mock = MockTaskExecutor::new()
            .with_response(&["export"], CommandOutput::ok("not json"));

        let manager = TaskManager::new(mock);
        assert!(matches!(manager.list("").await, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_default_filter_excludes_deleted_and_completed() {
        let mock = MockTaskExecutor::new().with_response(
            &[DEFAULT_FILTER, "export"],
            CommandOutput::ok(pending_row(UUID_A, "Buy milk")),
        );

        let manager = TaskManager::new(mock);
        let tasks = manager.list_pending().await.unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_recurring_template_lookup() {
        let template = format!(
            r#"[{{"id": 0, "uuid": "{}", "description": "Weekly review", "status": "recurring", "recur": "weekly"}}]"#,
            UUID_TEMPLATE
        );
        let mock = MockTaskExecutor::new().with_response(
            &[UUID_TEMPLATE, "status:recurring", "export"],
            CommandOutput::ok(template),
        );

        let manager = TaskManager::new(mock);
        let record = manager.recurring_template(UUID_TEMPLATE).await.unwrap();
        assert_eq!(record.status, Status::Recurring);
    }

    #[tokio::test]
    async fn test_recurring_template_falls_back_to_plain_get() {
        let mock = MockTaskExecutor::new()
            .with_response(
                &[UUID_A, "status:recurring", "export"],
                CommandOutput::ok("[]"),
            )
            .with_response(
                &[UUID_A, "export"],
                CommandOutput::ok(pending_row(UUID_A, "Buy milk")),
            );

        let manager = TaskManager::new(mock);
        let record = manager.recurring_template(UUID_A).await.unwrap();
        assert_eq!(record.status, Status::Pending);
    }

    #[tokio::test]
    async fn test_recurring_instances_parent_filter() {
        let parent: Uuid = UUID_TEMPLATE.parse().unwrap();
        let instance = format!(
            r#"[{{"id": 4, "uuid": "{}", "description": "Weekly review", "status": "pending", "parent": "{}", "recur": "weekly"}}]"#,
            UUID_A, UUID_TEMPLATE
        );
        let filter = format!("parent:{}", parent);
        let mock = MockTaskExecutor::new()
            .with_response(&[&filter, "export"], CommandOutput::ok(instance));

        let manager = TaskManager::new(mock);
        let instances = manager.recurring_instances(&parent).await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].parent, Some(parent));
        assert_eq!(instances[0].status, Status::Pending);
    }

    #[tokio::test]
    async fn test_recurring_instances_no_matches_is_empty() {
        let parent: Uuid = UUID_TEMPLATE.parse().unwrap();
        let filter = format!("parent:{}", parent);
        let mock = MockTaskExecutor::new()
            .with_response(&[&filter, "export"], CommandOutput::failed(1, "No matches."));

        let manager = TaskManager::new(mock);
        assert!(manager.recurring_instances(&parent).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_delete_is_explicit_not_found() {
        let mock = MockTaskExecutor::new().with_response(
            &[UUID_A, "delete"],
            CommandOutput::failed(1, "Task is already deleted"),
        );

        let manager = TaskManager::new(mock);
        let err = manager.delete(UUID_A).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_done_start_stop_purge() {
        let mock = MockTaskExecutor::new()
            .with_response(&["1", "done"], CommandOutput::ok(""))
            .with_response(&["1", "start"], CommandOutput::ok(""))
            .with_response(&["1", "stop"], CommandOutput::ok(""))
            .with_response(&["1", "purge"], CommandOutput::ok(""));

        let manager = TaskManager::new(mock);
        manager.start("1").await.unwrap();
        manager.stop("1").await.unwrap();
        manager.done("1").await.unwrap();
        manager.purge("1").await.unwrap();
        assert_eq!(manager.executor().calls().len(), 4);
    }

    #[tokio::test]
    async fn test_get_after_purge_is_not_found() {
        let mock = MockTaskExecutor::new()
            .with_response(&[UUID_A, "purge"], CommandOutput::ok(""))
            .with_response(&[UUID_A, "export"], CommandOutput::ok("[]"));

        let manager = TaskManager::new(mock);
        manager.purge(UUID_A).await.unwrap();
        assert!(matches!(
            manager.get(UUID_A).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_metacharacter_description_round_trip() {
        let description = "Test; rm -rf /tmp/x";
        let row = format!(
            r#"[{{"id": 1, "uuid": "{}", "description": "{}", "status": "pending"}}]"#,
            UUID_A, description
        );
        let mock = MockTaskExecutor::new()
            .with_response(
                &["add", "description:'Test; rm -rf /tmp/x'"],
                CommandOutput::ok(""),
            )
            .with_response(&["+LATEST", "export"], CommandOutput::ok(row));

        let manager = TaskManager::new(mock);
        let task = TaskInput::new(description).unwrap();
        let record = manager.add(&task).await.unwrap();
        assert_eq!(record.description, description);
        // The whole mutation travelled as exactly two argv tokens.
        assert_eq!(manager.executor().calls()[0].len(), 2);
    }

    #[tokio::test]
    async fn test_info_reports_version() {
        let mock = MockTaskExecutor::new()
            .with_response(&["--version"], CommandOutput::ok("3.0.2\n"));

        let manager = TaskManager::new(mock);
        let info = manager.info().await;
        assert_eq!(info.version.as_deref(), Some("3.0.2"));
        assert!(info.options.contains(&"rc.confirmation=off".to_string()));
    }
}
