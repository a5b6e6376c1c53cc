//! Per-vendor in-flight guard.
//!
//! Two overlapping syncs for the same vendor would diff against stale
//! state and interleave writes, so the engine takes a lease before the
//! loader runs and holds it until the run is finalized. A second caller
//! fails fast rather than queueing.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Shared registry of vendors with a sync in flight.
#[derive(Clone, Default)]
pub struct VendorGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl VendorGuard {
    /// Create an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease for a vendor.
    ///
    /// Returns `None` if a sync for this vendor is already in flight. The
    /// lease is released when the returned value drops.
    pub fn acquire(&self, vendor: &str) -> Option<VendorLease> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !in_flight.insert(vendor.to_string()) {
            return None;
        }
        Some(VendorLease {
            vendor: vendor.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }
}

/// RAII lease over one vendor's sync slot.
pub struct VendorLease {
    vendor: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for VendorLease {
    fn drop(&mut self) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&self.vendor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_is_exclusive_per_vendor() {
        let guard = VendorGuard::new();

        let lease = guard.acquire("acme").expect("first acquire should win");
        assert!(guard.acquire("acme").is_none());

        // A different vendor is unaffected.
        assert!(guard.acquire("globex").is_some());

        drop(lease);
        assert!(guard.acquire("acme").is_some());
    }

    #[test]
    fn test_clones_share_the_registry() {
        let guard = VendorGuard::new();
        let clone = guard.clone();

        let _lease = guard.acquire("acme").expect("acquire should win");
        assert!(clone.acquire("acme").is_none());
    }
}
