//! Shared per-endpoint registry table
//!
//! The capture registry is a singleton per endpoint: every connection
//! addressing the same device must observe the same project hierarchy. The
//! hub owns that table explicitly and hands out shared handles, so the
//! lookup lives with whoever composes the connections instead of in hidden
//! module state.

use crate::registry::{CaptureApi, MemoryRegistry};
use anyhow::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Builds the registry handle for a newly seen endpoint.
///
/// The default factory runs an in-memory device; a real device-client
/// adapter plugs in here without touching the staged connection.
pub type RegistryFactory = Box<dyn Fn(&str) -> Result<Arc<dyn CaptureApi>> + Send + Sync>;

/// Owner of the endpoint → registry table shared by all staged connections.
pub struct DeviceHub {
    devices: DashMap<String, Arc<dyn CaptureApi>>,
    factory: RegistryFactory,
}

impl DeviceHub {
    /// Hub backed by in-memory registries, one per endpoint.
    pub fn in_memory() -> Self {
        Self::with_factory(Box::new(|_| {
            Ok(Arc::new(MemoryRegistry::new()) as Arc<dyn CaptureApi>)
        }))
    }

    pub fn with_factory(factory: RegistryFactory) -> Self {
        Self {
            devices: DashMap::new(),
            factory,
        }
    }

    /// Get or create the registry for `endpoint`.
    ///
    /// The same endpoint always yields the same handle; the entry lock keeps
    /// first contact atomic when connections race. A factory failure creates
    /// no table entry, so the endpoint can be retried.
    pub fn connect(&self, endpoint: &str) -> Result<Arc<dyn CaptureApi>> {
        match self.devices.entry(endpoint.to_string()) {
            Entry::Occupied(occupied) => Ok(Arc::clone(occupied.get())),
            Entry::Vacant(vacant) => {
                debug!(endpoint, "first contact, creating device registry");
                let device = (self.factory)(endpoint)?;
                vacant.insert(Arc::clone(&device));
                Ok(device)
            }
        }
    }

    /// Endpoints with an established registry.
    pub fn endpoints(&self) -> Vec<String> {
        self.devices.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl Default for DeviceHub {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[test]
    fn test_same_endpoint_yields_same_handle() {
        let hub = DeviceHub::in_memory();

        let first = hub.connect("192.168.1.100").unwrap();
        let second = hub.connect("192.168.1.100").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = hub.connect("192.168.1.101").unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(hub.endpoints().len(), 2);
    }

    #[test]
    fn test_factory_failure_creates_no_entry() {
        let hub = DeviceHub::with_factory(Box::new(|endpoint| {
            bail!("no route to {endpoint}")
        }));

        assert!(hub.connect("E1").is_err());
        assert!(hub.endpoints().is_empty());
    }
}
