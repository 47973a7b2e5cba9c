//! A thread-safe in-memory storage for the active artifact bundle.
use std::sync::{Arc, RwLock};

use crate::artifacts::ArtifactBundle;

/// `ArtifactStore` holds the active [`ArtifactBundle`] and allows concurrent access for readers
/// and writers.
///
/// Readers take an `Arc` snapshot and never observe a partially replaced bundle.
#[derive(Default)]
pub struct ArtifactStore {
    bundle: RwLock<Option<Arc<ArtifactBundle>>>,
}

impl ArtifactStore {
    /// Create an empty store. Predictions fail with [`Error::ArtifactsMissing`](crate::Error::ArtifactsMissing)
    /// until a bundle is set.
    pub fn new() -> Self {
        Self {
            bundle: RwLock::new(None),
        }
    }

    /// Create a store with `bundle` already active.
    pub fn with_bundle(bundle: Arc<ArtifactBundle>) -> Self {
        Self {
            bundle: RwLock::new(Some(bundle)),
        }
    }

    /// Snapshot of the active bundle, if any.
    pub fn get_bundle(&self) -> Option<Arc<ArtifactBundle>> {
        // Err() is only possible if a writer panicked while holding the lock. Using .ok()? here to
        // not crash the app.
        let bundle = self.bundle.read().ok()?;
        bundle.clone()
    }

    /// Activate a new bundle, returning the previous one.
    pub fn set_bundle(&self, bundle: Arc<ArtifactBundle>) -> Option<Arc<ArtifactBundle>> {
        log::info!(target: "revenue_predictor",
                   fingerprint:? = bundle.fingerprint();
                   "activating model artifacts");

        let mut slot = self.bundle.write().ok()?;
        std::mem::replace(&mut slot, Some(bundle))
    }
}
