//! # tasklink-core
//!
//! Core types for the tasklink TaskWarrior client.
//!
//! This crate holds the value objects shared across the workspace:
//!
//! - Task mutation requests ([`TaskInput`]) and retrieval records
//!   ([`TaskRecord`])
//! - The status/priority/recurrence enumerations with their wire mappings
//! - User Defined Attribute definitions
//! - Client configuration and the unified error taxonomy
//!
//! All entities are caller-owned value objects; the integration layer in
//! `tasklink-tw` holds no entity state beyond its explicit UDA registry
//! cache.

mod config;
mod error;
mod task;
mod types;
mod uda;

pub use config::{Config, DEFAULT_OPTIONS};
pub use error::{Error, Result};
pub use task::{TaskInput, TaskRecord};
pub use types::{Annotation, Context, Priority, Recurrence, Status};
pub use uda::{UdaDefinition, UdaType};
