//! Single-flight guard for publish attempts
//!
//! An in-process registry of artifact ids currently being published. It is
//! not a distributed lock: two processes publishing the same artifact are
//! not coordinated.

use crate::core::error::PublishError;
use crate::core::traits::ArtifactId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Registry of in-flight artifact ids
#[derive(Debug, Default)]
pub struct SingleFlight {
    in_flight: Mutex<HashSet<ArtifactId>>,
}

impl SingleFlight {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark `id` as in flight
    ///
    /// The returned permit releases the id when dropped, so every exit path
    /// of the holder (including cancellation of its future) frees it.
    ///
    /// # Errors
    ///
    /// `PublishError::AlreadyInProgress` if another holder has `id`.
    pub fn acquire(self: &Arc<Self>, id: ArtifactId) -> Result<InFlightPermit, PublishError> {
        if !self.lock().insert(id) {
            return Err(PublishError::AlreadyInProgress { id });
        }

        tracing::debug!(artifact_id = %id, "single-flight guard acquired");
        Ok(InFlightPermit {
            registry: Arc::clone(self),
            id,
            released: false,
        })
    }

    pub fn is_held(&self, id: ArtifactId) -> bool {
        self.lock().contains(&id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().len()
    }

    fn release(&self, id: ArtifactId) {
        if self.lock().remove(&id) {
            tracing::debug!(artifact_id = %id, "single-flight guard released");
        }
    }

    // A panic while holding the lock cannot leave the set half-updated
    fn lock(&self) -> MutexGuard<'_, HashSet<ArtifactId>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Release handle for one in-flight id
#[derive(Debug)]
pub struct InFlightPermit {
    registry: Arc<SingleFlight>,
    id: ArtifactId,
    released: bool,
}

impl InFlightPermit {
    /// Release the id now. Calling it again is a no-op.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.registry.release(self.id);
        }
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.release();
    }
}
