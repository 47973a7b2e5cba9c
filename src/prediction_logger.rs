//! Hook for persisting prediction events.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RawRecord;

/// Emitted for every successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEvent {
    /// The record as received.
    pub input: RawRecord,
    /// Clamped prediction returned to the caller.
    pub predicted_revenue: f64,
    /// Time spent encoding and invoking the model.
    pub inference_time_ms: f64,
    /// When the prediction completed.
    pub timestamp: DateTime<Utc>,
    /// Name of the model that produced the prediction.
    pub model_name: String,
    /// Fingerprint of the bundle that produced the prediction.
    pub fingerprint: Option<String>,
}

/// Receives prediction events, e.g. to save them to a data warehouse.
///
/// Logging happens on the prediction path, so implementations should be fast and must not panic.
/// Any failure to persist an event is the logger's concern.
pub trait PredictionLogger {
    /// Record a single prediction event.
    fn log_prediction(&self, event: PredictionEvent);
}

pub(crate) struct NoopPredictionLogger;
impl PredictionLogger for NoopPredictionLogger {
    fn log_prediction(&self, _event: PredictionEvent) {}
}

impl<T: Fn(PredictionEvent)> PredictionLogger for T {
    fn log_prediction(&self, event: PredictionEvent) {
        self(event);
    }
}
