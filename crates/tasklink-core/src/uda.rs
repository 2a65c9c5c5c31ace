//! User Defined Attribute value types

use serde::{Deserialize, Serialize};

/// Data types the engine accepts for User Defined Attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UdaType {
    /// Free-form text
    String,
    /// Integer or float
    Numeric,
    /// Date/time in TaskWarrior format
    Date,
    /// Duration value such as `2hours`
    Duration,
    /// UUID reference to another task
    Uuid,
}

impl std::fmt::Display for UdaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Numeric => write!(f, "numeric"),
            Self::Date => write!(f, "date"),
            Self::Duration => write!(f, "duration"),
            Self::Uuid => write!(f, "uuid"),
        }
    }
}

impl std::str::FromStr for UdaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(Self::String),
            "numeric" => Ok(Self::Numeric),
            "date" => Ok(Self::Date),
            "duration" => Ok(Self::Duration),
            "uuid" => Ok(Self::Uuid),
            _ => Err(format!("Invalid UDA type: {}", s)),
        }
    }
}

/// A User Defined Attribute definition
///
/// Identity is `name`, unique within a registry. Definitions are stored in
/// the taskrc as `uda.<name>.<attribute>=<value>` lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdaDefinition {
    /// Unique UDA name, also the export field name
    pub name: String,
    /// Value type; a UDA without a resolvable type cannot be round-tripped
    #[serde(rename = "type")]
    pub uda_type: UdaType,
    /// Display label for reports
    pub label: Option<String>,
    /// Allowed values; `None` means unrestricted
    pub values: Option<Vec<String>>,
    /// Default value when unset
    pub default: Option<String>,
    /// Urgency coefficient applied when the attribute is set
    pub coefficient: Option<f64>,
}

impl UdaDefinition {
    pub fn new(name: impl Into<String>, uda_type: UdaType) -> Self {
        Self {
            name: name.into(),
            uda_type,
            label: None,
            values: None,
            default: None,
            coefficient: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = Some(coefficient);
        self
    }
}
