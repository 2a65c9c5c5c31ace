//! Task mutation requests and retrieval records

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Annotation, Priority, Recurrence, Status};

/// A sparse task mutation request
///
/// Only `description` is required; every other field is present-vs-absent
/// (`Option`), and unset fields produce no CLI tokens at all. This is what
/// makes `modify` a sparse patch: omitted fields leave the existing values
/// on the task untouched.
///
/// Date fields (`due`, `scheduled`, `wait`, `until`) are kept as strings
/// because they may hold TaskWarrior expressions ("tomorrow", "eom") that
/// only the engine can resolve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    /// Task description (required, non-empty after trimming)
    pub description: String,
    /// Priority level
    pub priority: Option<Priority>,
    /// Due date, ISO-8601 or a TaskWarrior date expression
    pub due: Option<String>,
    /// Project name, hierarchical names like `work.reports` allowed
    pub project: Option<String>,
    /// Tags to assign; `None` leaves tags untouched on modify
    pub tags: Option<Vec<String>>,
    /// UUIDs of tasks this task depends on
    pub depends: Option<Vec<Uuid>>,
    /// UUID of the recurring template this task belongs to
    pub parent: Option<Uuid>,
    /// Recurrence period for recurring tasks
    pub recur: Option<Recurrence>,
    /// Earliest date the task can be started
    pub scheduled: Option<String>,
    /// Date until which the task is hidden from the pending list
    pub wait: Option<String>,
    /// Expiration date for recurring instances
    pub until: Option<String>,
    /// Annotation texts applied after the task exists (never encoded
    /// as mutation tokens)
    #[serde(default)]
    pub annotations: Vec<String>,
    /// User Defined Attribute values, keyed by UDA name
    #[serde(default)]
    pub udas: BTreeMap<String, serde_json::Value>,
}

impl TaskInput {
    /// Create a mutation request with the given description
    ///
    /// The description is trimmed; an empty or whitespace-only description
    /// is rejected before any process call is made.
    pub fn new(description: impl Into<String>) -> Result<Self> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(Error::Validation(
                "Task description cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            description,
            ..Self::default()
        })
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due(mut self, due: impl Into<String>) -> Self {
        self.due = Some(due.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_depends<I>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = Uuid>,
    {
        self.depends = Some(depends.into_iter().collect());
        self
    }

    pub fn with_parent(mut self, parent: Uuid) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_recur(mut self, recur: Recurrence) -> Self {
        self.recur = Some(recur);
        self
    }

    pub fn with_scheduled(mut self, scheduled: impl Into<String>) -> Self {
        self.scheduled = Some(scheduled.into());
        self
    }

    pub fn with_wait(mut self, wait: impl Into<String>) -> Self {
        self.wait = Some(wait.into());
        self
    }

    pub fn with_until(mut self, until: impl Into<String>) -> Self {
        self.until = Some(until.into());
        self
    }

    pub fn with_annotation(mut self, text: impl Into<String>) -> Self {
        self.annotations.push(text.into());
        self
    }

    pub fn with_uda(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.udas.insert(name.into(), value.into());
        self
    }
}

/// A task as returned by a TaskWarrior `export` invocation
///
/// Adds the engine-assigned read-only fields to the [`TaskInput`] field
/// set. `uuid` is the durable identity; `index` is the working-set
/// position, reassigned whenever pending tasks complete or disappear, and
/// must never be cached beyond a single round-trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    /// Task description
    pub description: String,
    /// Transient working-set position (wire name `id`)
    #[serde(rename = "id")]
    pub index: u64,
    /// Durable unique identifier
    pub uuid: Uuid,
    /// Current lifecycle status
    pub status: Status,
    /// Priority level
    pub priority: Option<Priority>,
    /// Due date
    pub due: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub entry: Option<DateTime<Utc>>,
    /// Timestamp the task was started
    pub start: Option<DateTime<Utc>>,
    /// Timestamp the task was completed or deleted
    pub end: Option<DateTime<Utc>>,
    /// Last modification timestamp
    pub modified: Option<DateTime<Utc>>,
    /// Assigned tags
    pub tags: Vec<String>,
    /// Project name
    pub project: Option<String>,
    /// UUIDs of dependency tasks
    pub depends: Vec<Uuid>,
    /// UUID of the recurring template, set on materialized instances
    pub parent: Option<Uuid>,
    /// Recurrence period, set on templates and instances
    pub recur: Option<Recurrence>,
    /// Earliest start date
    pub scheduled: Option<DateTime<Utc>>,
    /// Hidden-until date
    pub wait: Option<DateTime<Utc>>,
    /// Expiration date for recurring instances
    pub until: Option<DateTime<Utc>>,
    /// Engine-computed urgency score
    pub urgency: Option<f64>,
    /// Attached annotations
    pub annotations: Vec<Annotation>,
    /// User Defined Attribute values, including every export key not in
    /// the built-in schema
    pub udas: BTreeMap<String, serde_json::Value>,
    /// Recurrence mask (string on templates, instance number on instances)
    pub imask: Option<serde_json::Value>,
    /// Recurrence type reported by the engine
    pub rtype: Option<String>,
}

impl TaskRecord {
    /// Look up a User Defined Attribute value by name
    pub fn get_uda(&self, name: &str) -> Option<&serde_json::Value> {
        self.udas.get(name)
    }

    /// Convert to a [`TaskInput`] patch for a subsequent modify call
    ///
    /// Engine-owned fields (uuid, index, status, timestamps, urgency,
    /// imask, rtype) are stripped; date fields are re-encoded as ISO-8601
    /// strings. Annotations are skipped because they are append-only and
    /// re-sending them would duplicate notes.
    pub fn to_input(&self) -> TaskInput {
        TaskInput {
            description: self.description.clone(),
            priority: self.priority,
            due: self.due.map(|d| d.to_rfc3339()),
            project: self.project.clone(),
            tags: if self.tags.is_empty() {
                None
            } else {
                Some(self.tags.clone())
            },
            depends: if self.depends.is_empty() {
                None
            } else {
                Some(self.depends.clone())
            },
            parent: self.parent,
            recur: self.recur,
            scheduled: self.scheduled.map(|d| d.to_rfc3339()),
            wait: self.wait.map(|d| d.to_rfc3339()),
            until: self.until.map(|d| d.to_rfc3339()),
            annotations: Vec::new(),
            udas: self.udas.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> TaskRecord {
        TaskRecord {
            description: "Buy milk".to_string(),
            index: 1,
            uuid: Uuid::new_v4(),
            status: Status::Pending,
            priority: Some(Priority::High),
            due: Some(Utc::now()),
            entry: Some(Utc::now()),
            start: None,
            end: None,
            modified: None,
            tags: vec!["errand".to_string()],
            project: Some("home".to_string()),
            depends: Vec::new(),
            parent: None,
            recur: None,
            scheduled: None,
            wait: None,
            until: None,
            urgency: Some(6.4),
            annotations: Vec::new(),
            udas: BTreeMap::new(),
            imask: None,
            rtype: None,
        }
    }

    #[test]
    fn test_empty_description_rejected() {
        assert!(TaskInput::new("").is_err());
        assert!(TaskInput::new("   ").is_err());
    }

    #[test]
    fn test_description_trimmed() {
        let task = TaskInput::new("  Buy milk  ").unwrap();
        assert_eq!(task.description, "Buy milk");
    }

    #[test]
    fn test_builder_leaves_unset_fields_absent() {
        let task = TaskInput::new("Buy milk").unwrap();
        assert!(task.priority.is_none());
        assert!(task.tags.is_none());
        assert!(task.depends.is_none());
        assert!(task.udas.is_empty());
    }

    #[test]
    fn test_to_input_strips_engine_fields() {
        let record = sample_record();
        let input = record.to_input();
        assert_eq!(input.description, "Buy milk");
        assert_eq!(input.priority, Some(Priority::High));
        assert_eq!(input.tags, Some(vec!["errand".to_string()]));
        assert!(input.due.is_some());
        assert!(input.annotations.is_empty());
    }

    #[test]
    fn test_to_input_empty_lists_stay_unset() {
        let mut record = sample_record();
        record.tags.clear();
        let input = record.to_input();
        assert!(input.tags.is_none());
        assert!(input.depends.is_none());
    }

    #[test]
    fn test_get_uda() {
        let mut record = sample_record();
        record
            .udas
            .insert("severity".to_string(), serde_json::json!("high"));
        assert_eq!(
            record.get_uda("severity"),
            Some(&serde_json::json!("high"))
        );
        assert!(record.get_uda("estimate").is_none());
    }
}
