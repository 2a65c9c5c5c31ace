//! CLI argument encoding for task mutations
//!
//! Converts a [`TaskInput`] into the ordered `attribute:value` token list
//! the engine's add/modify grammar accepts. Only explicitly set fields
//! produce tokens (sparse-patch semantics); every scalar value is escaped
//! individually so that no combination of field values can ever be read
//! as a second command.

use tasklink_core::TaskInput;
use tracing::debug;

/// Characters that never need quoting in an attribute value
fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '_' | '-')
}

/// Escape a scalar value for use inside an attribute token
///
/// POSIX single-quote escaping: safe values pass through unchanged,
/// anything else is wrapped in single quotes with embedded quotes
/// rewritten as `'"'"'`.
pub fn quote(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_safe_char) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

/// Render a UDA value as its attribute-token text
fn uda_value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Build the ordered token list for an add or modify invocation
///
/// Unset fields are omitted entirely, so a modify leaves them untouched.
/// Annotations are never encoded here: annotation is append-only and is
/// applied through the separate annotate sub-command once the task exists.
pub fn build_args(task: &TaskInput) -> Vec<String> {
    let mut args = Vec::new();

    args.push(format!("description:{}", quote(&task.description)));

    if let Some(priority) = task.priority {
        args.push(format!("priority:{}", priority.as_str()));
    }
    if let Some(due) = &task.due {
        args.push(format!("due:{}", quote(due)));
    }
    if let Some(project) = &task.project {
        args.push(format!("project:{}", quote(project)));
    }
    if let Some(tags) = &task.tags {
        if !tags.is_empty() {
            let joined: Vec<String> = tags.iter().map(|t| quote(t)).collect();
            args.push(format!("tags:{}", joined.join(",")));
        }
    }
    if let Some(depends) = &task.depends {
        // The engine's dependency grammar is additive per call, one
        // `depends+=` token per referenced uuid.
        for dep in depends {
            args.push(format!("depends+={}", dep));
        }
    }
    if let Some(parent) = task.parent {
        args.push(format!("parent:{}", parent));
    }
    if let Some(recur) = task.recur {
        args.push(format!("recur:{}", recur));
    }
    if let Some(scheduled) = &task.scheduled {
        args.push(format!("scheduled:{}", quote(scheduled)));
    }
    if let Some(wait) = &task.wait {
        args.push(format!("wait:{}", quote(wait)));
    }
    if let Some(until) = &task.until {
        args.push(format!("until:{}", quote(until)));
    }
    for (name, value) in &task.udas {
        if let Some(text) = uda_value_text(value) {
            args.push(format!("{}:{}", name, quote(&text)));
        }
    }

    debug!(?args, "Built mutation arguments");
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasklink_core::{Priority, Recurrence};
    use uuid::Uuid;

    #[test]
    fn test_quote_safe_value_unchanged() {
        assert_eq!(quote("work.reports"), "work.reports");
        assert_eq!(quote("2026-01-15T14:30:00Z"), "2026-01-15T14:30:00Z");
    }

    #[test]
    fn test_quote_unsafe_value() {
        assert_eq!(quote("Buy milk"), "'Buy milk'");
        assert_eq!(quote(""), "''");
        assert_eq!(quote("it's"), r#"'it'"'"'s'"#);
    }

    #[test]
    fn test_only_set_fields_produce_tokens() {
        let task = TaskInput::new("Buy milk").unwrap();
        let args = build_args(&task);
        assert_eq!(args, vec!["description:'Buy milk'".to_string()]);
    }

    #[test]
    fn test_one_token_per_set_field() {
        let task = TaskInput::new("Report")
            .unwrap()
            .with_priority(Priority::High)
            .with_project("work.reports")
            .with_due("friday")
            .with_tags(["urgent", "q1"]);

        let args = build_args(&task);
        assert_eq!(args.len(), 5);
        assert!(args.contains(&"priority:H".to_string()));
        assert!(args.contains(&"project:work.reports".to_string()));
        assert!(args.contains(&"due:friday".to_string()));
        assert!(args.contains(&"tags:urgent,q1".to_string()));
    }

    #[test]
    fn test_tags_with_unsafe_elements_quoted_individually() {
        let task = TaskInput::new("t").unwrap().with_tags(["plain", "two words"]);
        let args = build_args(&task);
        assert!(args.contains(&"tags:plain,'two words'".to_string()));
    }

    #[test]
    fn test_depends_additive_tokens() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let task = TaskInput::new("t").unwrap().with_depends([a, b]);

        let args = build_args(&task);
        assert!(args.contains(&format!("depends+={}", a)));
        assert!(args.contains(&format!("depends+={}", b)));
        // One additive token per dependency, never a comma list.
        assert_eq!(args.iter().filter(|t| t.starts_with("depends")).count(), 2);
    }

    #[test]
    fn test_annotations_never_encoded() {
        let task = TaskInput::new("t").unwrap().with_annotation("a note");
        let args = build_args(&task);
        assert!(!args.iter().any(|t| t.contains("note")));
    }

    #[test]
    fn test_uda_values_encoded() {
        let task = TaskInput::new("t")
            .unwrap()
            .with_uda("severity", "high")
            .with_uda("estimate", 2.5)
            .with_uda("skipped", serde_json::Value::Null);

        let args = build_args(&task);
        assert!(args.contains(&"severity:high".to_string()));
        assert!(args.contains(&"estimate:2.5".to_string()));
        assert!(!args.iter().any(|t| t.starts_with("skipped")));
    }

    #[test]
    fn test_recur_and_parent_tokens() {
        let parent = Uuid::new_v4();
        let task = TaskInput::new("Weekly review")
            .unwrap()
            .with_recur(Recurrence::Weekly)
            .with_parent(parent);

        let args = build_args(&task);
        assert!(args.contains(&"recur:weekly".to_string()));
        assert!(args.contains(&format!("parent:{}", parent)));
    }

    #[test]
    fn test_shell_metacharacters_stay_one_token() {
        let task = TaskInput::new("Test; rm -rf /tmp/x").unwrap();
        let args = build_args(&task);
        assert_eq!(args, vec!["description:'Test; rm -rf /tmp/x'".to_string()]);
    }
}
