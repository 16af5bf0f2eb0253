//! Configuration-key registries for pluggable components.
//!
//! Writers, file getters and metadata parsers are chosen by a `class` string
//! in the config file. Each kind keeps a [`ComponentRegistry`] from key to
//! constructor; lookups happen during validation so a typo fails before any
//! network traffic.

use thiserror::Error;
use tracing::debug;

/// A configured component key that no registry entry matches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{key}' (known: {})\n  Suggestion: check the 'class' value in the config file", known.join(", "))]
pub struct UnknownComponent {
    /// Component kind, e.g. `writer`.
    pub kind: &'static str,
    /// The key that was looked up.
    pub key: String,
    /// Keys the registry does know.
    pub known: Vec<&'static str>,
}

/// Ordered mapping from configuration key to constructor.
pub struct ComponentRegistry<C> {
    kind: &'static str,
    entries: Vec<(&'static str, C)>,
}

impl<C> ComponentRegistry<C> {
    /// Creates an empty registry for components of `kind`.
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    /// Registers `constructor` under `key`, replacing an earlier entry.
    #[must_use]
    pub fn with(mut self, key: &'static str, constructor: C) -> Self {
        debug!(kind = self.kind, key, "registering component");
        self.entries.retain(|(existing, _)| *existing != key);
        self.entries.push((key, constructor));
        self
    }

    /// Registered keys in registration order.
    #[must_use]
    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(key, _)| *key).collect()
    }

    /// Looks up the constructor for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownComponent`] when `key` is not registered.
    pub fn get(&self, key: &str) -> Result<&C, UnknownComponent> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, constructor)| constructor)
            .ok_or_else(|| UnknownComponent {
                kind: self.kind,
                key: key.to_string(),
                known: self.keys(),
            })
    }
}
