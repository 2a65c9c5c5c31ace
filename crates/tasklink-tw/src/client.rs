//! High-level TaskWarrior client
//!
//! Composes the lifecycle, UDA, context, and date managers over one
//! shared executor. This is the usual entry point:
//!
//! ```no_run
//! use tasklink_core::{Config, TaskInput};
//! use tasklink_tw::TaskWarrior;
//!
//! # async fn demo() -> tasklink_core::Result<()> {
//! let tw = TaskWarrior::connect(Config::default()).await?;
//! let added = tw.tasks().add(&TaskInput::new("Buy milk")?).await?;
//! println!("added {}", added.uuid);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tasklink_core::{Config, Result, UdaDefinition};

use crate::command::{TaskCommand, TaskExecutor};
use crate::context::ContextManager;
use crate::dates::DateResolver;
use crate::tasks::TaskManager;
use crate::uda::{UdaManager, UdaRegistry};

/// Client facade over one TaskWarrior installation
///
/// All managers share a single executor. The UDA registry inside the
/// facade is the only cached state; it is loaded once at construction and
/// refreshed only by an explicit [`TaskWarrior::reload_udas`] call. To
/// share one client across threads, wrap the whole facade (callers
/// synchronize UDA mutations themselves, the client adds no locking).
pub struct TaskWarrior<E: TaskExecutor> {
    tasks: TaskManager<Arc<E>>,
    udas: UdaManager<Arc<E>>,
    contexts: ContextManager<Arc<E>>,
    dates: DateResolver<Arc<E>>,
}

impl TaskWarrior<TaskCommand> {
    /// Connect to the engine described by `config`
    ///
    /// Bootstraps a missing taskrc, verifies the binary is resolvable
    /// (once, here, not per call), and loads the UDA registry from the
    /// taskrc.
    pub async fn connect(config: Config) -> Result<Self> {
        let executor = TaskCommand::resolve(config).await?;
        let mut client = Self::with_executor(executor);
        client.reload_udas()?;
        Ok(client)
    }

    /// Engine version reported at connect time
    pub fn version(&self) -> Option<&str> {
        self.tasks.executor().version()
    }
}

impl<E: TaskExecutor> TaskWarrior<E> {
    /// Build a client over an arbitrary executor
    ///
    /// The UDA registry starts empty; call [`TaskWarrior::reload_udas`]
    /// once a taskrc exists.
    pub fn with_executor(executor: E) -> Self {
        let executor = Arc::new(executor);
        Self {
            tasks: TaskManager::new(executor.clone()),
            udas: UdaManager::new(executor.clone()),
            contexts: ContextManager::new(executor.clone()),
            dates: DateResolver::new(executor),
        }
    }

    /// Task lifecycle operations
    pub fn tasks(&self) -> &TaskManager<Arc<E>> {
        &self.tasks
    }

    /// Context operations
    pub fn contexts(&self) -> &ContextManager<Arc<E>> {
        &self.contexts
    }

    /// Date expression resolution
    pub fn dates(&self) -> &DateResolver<Arc<E>> {
        &self.dates
    }

    /// UDA operations
    pub fn udas(&self) -> &UdaManager<Arc<E>> {
        &self.udas
    }

    /// UDA operations requiring registry mutation (define/update/delete/reload)
    pub fn udas_mut(&mut self) -> &mut UdaManager<Arc<E>> {
        &mut self.udas
    }

    /// Reload the UDA registry from the taskrc
    ///
    /// Required after any out-of-band config change; the registry never
    /// watches the file.
    pub fn reload_udas(&mut self) -> Result<()> {
        self.udas.reload()
    }

    /// Names of every registered UDA
    pub fn uda_names(&self) -> std::collections::BTreeSet<String> {
        self.udas.names()
    }

    /// Look up a UDA definition by name
    pub fn get_uda(&self, name: &str) -> Option<&UdaDefinition> {
        self.udas.get(name)
    }

    /// Read access to the raw UDA registry
    pub fn uda_registry(&self) -> &UdaRegistry {
        self.udas.registry()
    }
}
