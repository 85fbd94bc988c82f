use crate::error::IngestError;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Owners with a run in progress. Cloning shares the set.
#[derive(Debug, Clone, Default)]
pub struct Leases {
    held: Arc<Mutex<HashSet<String>>>,
}

impl Leases {
    pub fn new() -> Self {
        Self::default()
    }

    fn held(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked.
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn acquire(&self, owner_id: &str) -> Result<Lease, IngestError> {
        if !self.held().insert(owner_id.to_string()) {
            return Err(IngestError::UploadInProgress(owner_id.to_string()));
        }

        Ok(Lease {
            owner_id: owner_id.to_string(),
            leases: self.clone(),
        })
    }

    pub fn is_held(&self, owner_id: &str) -> bool {
        self.held().contains(owner_id)
    }
}

/// Released on drop.
#[derive(Debug)]
pub struct Lease {
    owner_id: String,
    leases: Leases,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.leases.held().remove(&self.owner_id);
    }
}
