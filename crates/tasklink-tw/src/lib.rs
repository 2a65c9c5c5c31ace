//! # tasklink-tw
//!
//! TaskWarrior integration layer for tasklink.
//!
//! This crate provides:
//! - Task command execution abstraction
//! - Task lifecycle operations over `export`
//! - Attribute encoding for `add`/`modify`
//! - Date/duration codecs and `calc` resolution
//! - UDA registry and config management
//! - Context management

mod client;
mod command;
mod context;
pub mod dates;
pub mod encode;
mod export;
mod tasks;
mod uda;

pub use client::TaskWarrior;
pub use command::{CommandOutput, MockTaskExecutor, TaskCommand, TaskExecutor};
pub use context::ContextManager;
pub use dates::DateResolver;
pub use export::parse_export;
pub use tasks::{EngineInfo, TaskManager, DEFAULT_FILTER};
pub use uda::{UdaManager, UdaRegistry, UDA_ATTRIBUTES};
