//! User Defined Attribute registry and management
//!
//! The registry is an explicitly owned cache of [`UdaDefinition`]s parsed
//! from `uda.<name>.<attribute>=<value>` taskrc lines. It never watches
//! the file: callers reload deliberately after any out-of-band config
//! change. Multiple adapters share one registry by composition, not
//! through hidden global state.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tasklink_core::{Error, Result, UdaDefinition, UdaType};
use tracing::{debug, instrument};

use crate::command::TaskExecutor;

/// Attribute keys a UDA definition may occupy in the taskrc
pub const UDA_ATTRIBUTES: &[&str] = &["type", "label", "values", "default", "coefficient"];

/// Cache of known UDA definitions, keyed by name
#[derive(Debug, Default)]
pub struct UdaRegistry {
    udas: HashMap<String, UdaDefinition>,
}

impl UdaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache with the definitions found in configuration text
    ///
    /// Lines are grouped by UDA name. A `uda.` line with fewer than three
    /// dot-separated key segments is malformed and ignored; a group whose
    /// `type` is missing or does not resolve is a hard error, because a
    /// UDA without a valid type cannot be round-tripped safely.
    pub fn load_from_str(&mut self, text: &str) -> Result<()> {
        let mut groups: HashMap<String, Vec<(String, String)>> = HashMap::new();

        for line in text.lines() {
            let line = line.trim();
            if !line.starts_with("uda.") {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let parts: Vec<&str> = key.split('.').collect();
            if parts.len() < 3 {
                continue;
            }
            groups
                .entry(parts[1].to_string())
                .or_default()
                .push((parts[2].to_string(), value.trim().to_string()));
        }

        let mut udas = HashMap::new();
        for (name, attrs) in groups {
            udas.insert(name.clone(), parse_group(&name, &attrs)?);
        }

        self.udas = udas;
        debug!(count = self.udas.len(), "Loaded UDA definitions");
        Ok(())
    }

    /// Replace the cache with the definitions found in a taskrc file
    pub fn load_from_taskrc(&mut self, taskrc: &Path) -> Result<()> {
        let text = std::fs::read_to_string(taskrc).map_err(|e| {
            Error::Configuration(format!("Cannot read taskrc {}: {}", taskrc.display(), e))
        })?;
        self.load_from_str(&text)
    }

    /// Look up a definition by name
    pub fn get(&self, name: &str) -> Option<&UdaDefinition> {
        self.udas.get(name)
    }

    /// Every registered UDA name
    pub fn names(&self) -> BTreeSet<String> {
        self.udas.keys().cloned().collect()
    }

    /// Whether a field name corresponds to a registered UDA
    pub fn is_uda_field(&self, name: &str) -> bool {
        self.udas.contains_key(name)
    }

    fn insert(&mut self, uda: UdaDefinition) {
        self.udas.insert(uda.name.clone(), uda);
    }

    fn remove(&mut self, name: &str) -> Option<UdaDefinition> {
        self.udas.remove(name)
    }
}

fn parse_group(name: &str, attrs: &[(String, String)]) -> Result<UdaDefinition> {
    let mut uda_type = None;
    let mut label = None;
    let mut values = None;
    let mut default = None;
    let mut coefficient = None;

    for (attr, value) in attrs {
        match attr.as_str() {
            "type" => {
                let parsed: UdaType = value.parse().map_err(|e| {
                    Error::Parse(format!("Error while parsing UDA '{}': {}", name, e))
                })?;
                uda_type = Some(parsed);
            }
            "label" => label = Some(value.clone()),
            "values" => {
                if !value.is_empty() {
                    values = Some(value.split(',').map(str::to_string).collect());
                }
            }
            "default" => default = Some(value.clone()),
            "coefficient" => {
                let parsed: f64 = value.parse().map_err(|_| {
                    Error::Parse(format!(
                        "Error while parsing UDA '{}': invalid coefficient '{}'",
                        name, value
                    ))
                })?;
                coefficient = Some(parsed);
            }
            // Presentation attributes like `indicator` are not modeled.
            _ => {}
        }
    }

    let uda_type = uda_type.ok_or_else(|| {
        Error::Parse(format!("Error while parsing UDA '{}': missing type", name))
    })?;

    Ok(UdaDefinition {
        name: name.to_string(),
        uda_type,
        label,
        values,
        default,
        coefficient,
    })
}

/// Manager combining the registry cache with `config` sub-command writes
pub struct UdaManager<E: TaskExecutor> {
    executor: E,
    registry: UdaRegistry,
}

impl<E: TaskExecutor> UdaManager<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            registry: UdaRegistry::new(),
        }
    }

    /// Reload the registry from the configured taskrc
    ///
    /// Must be called explicitly after any out-of-band config change.
    pub fn reload(&mut self) -> Result<()> {
        let taskrc = self.executor.config().taskrc.clone();
        self.registry.load_from_taskrc(&taskrc)
    }

    /// Define a new UDA or update an existing one
    ///
    /// Emits one `config` sub-command per non-empty attribute, writing
    /// `type` first. The cache is updated only after every write
    /// succeeded; a failed write leaves the registry untouched.
    #[instrument(skip(self, uda), fields(name = %uda.name))]
    pub async fn define(&mut self, uda: &UdaDefinition) -> Result<()> {
        self.write_config(&format!("uda.{}.type", uda.name), &uda.uda_type.to_string())
            .await?;

        if let Some(label) = &uda.label {
            if !label.is_empty() {
                self.write_config(&format!("uda.{}.label", uda.name), label)
                    .await?;
            }
        }
        if let Some(values) = &uda.values {
            if !values.is_empty() {
                self.write_config(&format!("uda.{}.values", uda.name), &values.join(","))
                    .await?;
            }
        }
        if let Some(default) = &uda.default {
            if !default.is_empty() {
                self.write_config(&format!("uda.{}.default", uda.name), default)
                    .await?;
            }
        }
        if let Some(coefficient) = uda.coefficient {
            self.write_config(
                &format!("uda.{}.coefficient", uda.name),
                &coefficient.to_string(),
            )
            .await?;
        }

        self.registry.insert(uda.clone());
        Ok(())
    }

    /// Update an existing UDA definition (same write path as define)
    pub async fn update(&mut self, uda: &UdaDefinition) -> Result<()> {
        self.define(uda).await
    }

    /// Delete a UDA: clear every attribute key, even unset ones, then
    /// drop it from the cache
    #[instrument(skip(self))]
    pub async fn delete(&mut self, name: &str) -> Result<()> {
        if !self.registry.is_uda_field(name) {
            return Err(Error::Configuration(format!(
                "Cannot delete unknown UDA '{}'",
                name
            )));
        }

        for attr in UDA_ATTRIBUTES {
            // Passing the key without a value asks the engine to remove
            // the entry; clearing an absent key is not an error.
            let key = format!("uda.{}.{}", name, attr);
            let output = self.executor.run(&["config", &key]).await?;
            if !output.success() {
                debug!(%key, "Config key was not present");
            }
        }

        self.registry.remove(name);
        Ok(())
    }

    async fn write_config(&self, key: &str, value: &str) -> Result<()> {
        let output = self.executor.run(&["config", key, value]).await?;
        if !output.success() {
            return Err(Error::Configuration(format!(
                "Failed to set {}: {}",
                key,
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    /// Read access to the underlying registry
    pub fn registry(&self) -> &UdaRegistry {
        &self.registry
    }

    /// Look up a definition by name
    pub fn get(&self, name: &str) -> Option<&UdaDefinition> {
        self.registry.get(name)
    }

    /// Every registered UDA name
    pub fn names(&self) -> BTreeSet<String> {
        self.registry.names()
    }
}
