//! Procedure registry.
//!
//! Maps case-sensitive procedure names to handlers. Built before the host
//! starts and moved into it, so the dispatch loop only ever reads it.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::procedure::{Procedure, ProcedureError, TypedProcedure};

/// Registry of named procedures.
#[derive(Default)]
pub struct ProcedureRegistry {
    procedures: HashMap<String, Box<dyn Procedure>>,
}

impl ProcedureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any earlier registration.
    pub fn register<P>(&mut self, name: impl Into<String>, handler: P)
    where
        P: Procedure + 'static,
    {
        let name = name.into();
        if self.procedures.insert(name.clone(), Box::new(handler)).is_some() {
            debug!(procedure = %name, "Replaced existing procedure");
        } else {
            debug!(procedure = %name, "Registered procedure");
        }
    }

    /// Register a handler with typed positional arguments and result.
    ///
    /// ```
    /// # use linerpc_host::ProcedureRegistry;
    /// let mut registry = ProcedureRegistry::new();
    /// registry.register_fn("add", |(a, b): (i64, i64)| Ok(a + b));
    /// assert!(registry.contains("add"));
    /// ```
    pub fn register_fn<F, A, R>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(A) -> Result<R, ProcedureError> + Send + Sync + 'static,
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
    {
        let name = name.into();
        let procedure = TypedProcedure::new(name.clone(), handler);
        self.register(name, procedure);
    }

    /// Look up the handler registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&dyn Procedure> {
        self.procedures.get(name).map(|p| &**p)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.procedures.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

impl fmt::Debug for ProcedureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureRegistry")
            .field("procedures", &self.names())
            .finish()
    }
}
