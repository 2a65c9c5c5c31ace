//! Core type definitions shared across the tasklink crates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task status values as assigned by the TaskWarrior engine
///
/// `Recurring` marks a template task: the engine materializes `Pending`
/// instances from it, each carrying a `parent` reference to the template's
/// uuid. Templates themselves never transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
    Deleted,
    Waiting,
    Recurring,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Deleted => write!(f, "deleted"),
            Self::Waiting => write!(f, "waiting"),
            Self::Recurring => write!(f, "recurring"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "deleted" => Ok(Self::Deleted),
            "waiting" => Ok(Self::Waiting),
            "recurring" => Ok(Self::Recurring),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

/// Task priority levels
///
/// TaskWarrior serializes priority as `H`/`M`/`L` or the empty string; this
/// enum carries that wire mapping explicitly instead of comparing raw
/// strings by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "H")]
    High,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Low,
    #[serde(rename = "")]
    None,
}

impl Priority {
    /// Wire value accepted by the `priority:` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "H",
            Self::Medium => "M",
            Self::Low => "L",
            Self::None => "",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H" | "h" => Ok(Self::High),
            "M" | "m" => Ok(Self::Medium),
            "L" | "l" => Ok(Self::Low),
            "" => Ok(Self::None),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// Recurrence periods accepted by the `recur:` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Quarterly,
    Semiannually,
    Hourly,
    Minutely,
    Secondly,
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
            Self::Quarterly => write!(f, "quarterly"),
            Self::Semiannually => write!(f, "semiannually"),
            Self::Hourly => write!(f, "hourly"),
            Self::Minutely => write!(f, "minutely"),
            Self::Secondly => write!(f, "secondly"),
        }
    }
}

impl std::str::FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "quarterly" => Ok(Self::Quarterly),
            "semiannually" => Ok(Self::Semiannually),
            "hourly" => Ok(Self::Hourly),
            "minutely" => Ok(Self::Minutely),
            "secondly" => Ok(Self::Secondly),
            _ => Err(format!("Invalid recurrence period: {}", s)),
        }
    }
}

/// A timestamped note attached to exactly one task
///
/// Annotations are append-only: they are created via the annotate
/// sub-command and never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Creation timestamp assigned by the engine
    pub entry: DateTime<Utc>,
    /// Annotation text
    pub description: String,
}

/// A named, globally-applicable filter expression
///
/// At most one context is active at a time; "active" is a property of the
/// engine's configuration, never cached locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Unique context name
    pub name: String,
    /// TaskWarrior filter expression
    pub filter: Option<String>,
    /// Whether this context is currently active
    pub active: bool,
}

impl Context {
    pub fn new(name: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: Some(filter.into()),
            active: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            Status::Pending,
            Status::Completed,
            Status::Deleted,
            Status::Waiting,
            Status::Recurring,
        ] {
            let parsed: Status = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_priority_wire_values() {
        assert_eq!(Priority::High.as_str(), "H");
        assert_eq!(Priority::None.as_str(), "");
        assert_eq!("M".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!("".parse::<Priority>().unwrap(), Priority::None);
        assert!("X".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_serde_mapping() {
        let json = serde_json::to_string(&Priority::Low).unwrap();
        assert_eq!(json, "\"L\"");
        let back: Priority = serde_json::from_str("\"H\"").unwrap();
        assert_eq!(back, Priority::High);
    }

    #[test]
    fn test_recurrence_parsing() {
        assert_eq!("weekly".parse::<Recurrence>().unwrap(), Recurrence::Weekly);
        assert_eq!("Daily".parse::<Recurrence>().unwrap(), Recurrence::Daily);
        assert!("fortnightly".parse::<Recurrence>().is_err());
    }
}
