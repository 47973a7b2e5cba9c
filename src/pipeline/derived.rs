//! First pipeline stage: event totals and ratios.
use crate::{Error, RawRecord, Result};

use super::FeatureFrame;

/// Event-count features derived from `event_1`, `event_2` and `event_3`.
///
/// Negative counts are a known data-quality condition. They are carried through the same
/// arithmetic as positive counts, without clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    /// `event_1` count.
    pub event_1: f64,
    /// `event_2` count.
    pub event_2: f64,
    /// `event_3` after null normalisation.
    pub event_3: f64,
    /// Sum of the three counts.
    pub total_events: f64,
    /// `event_1 / (total_events + 1)`.
    pub event_1_ratio: f64,
    /// `event_2 / (total_events + 1)`.
    pub event_2_ratio: f64,
    /// `event_3 / (total_events + 1)`.
    pub event_3_ratio: f64,
}

impl DerivedFeatures {
    /// Compute derived features. A missing `event_3` counts as `0`.
    ///
    /// Ratios use `total_events + 1` as the denominator, with no special cases. Counts summing to
    /// zero still keep their signed ratios.
    ///
    /// ```
    /// # use revenue_predictor::pipeline::DerivedFeatures;
    /// let features = DerivedFeatures::compute(10.0, 5.0, None);
    /// assert_eq!(features.total_events, 15.0);
    /// assert_eq!(features.event_1_ratio, 10.0 / 16.0);
    /// ```
    pub fn compute(event_1: f64, event_2: f64, event_3: Option<f64>) -> DerivedFeatures {
        let event_3 = event_3.unwrap_or(0.0);
        let total_events = event_1 + event_2 + event_3;

        let ratio = |event: f64| event / (total_events + 1.0);

        DerivedFeatures {
            event_1,
            event_2,
            event_3,
            total_events,
            event_1_ratio: ratio(event_1),
            event_2_ratio: ratio(event_2),
            event_3_ratio: ratio(event_3),
        }
    }

    /// Compute derived features from a record. Missing, null or non-numeric counts are `0`.
    pub fn from_record(record: &RawRecord) -> DerivedFeatures {
        DerivedFeatures::compute(
            record.number("event_1").unwrap_or(0.0),
            record.number("event_2").unwrap_or(0.0),
            record.number("event_3"),
        )
    }

    pub(crate) fn write_to(&self, frame: &mut FeatureFrame) {
        frame.set("event_1", self.event_1);
        frame.set("event_2", self.event_2);
        frame.set("event_3", self.event_3);
        frame.set("total_events", self.total_events);
        frame.set("event_1_ratio", self.event_1_ratio);
        frame.set("event_2_ratio", self.event_2_ratio);
        frame.set("event_3_ratio", self.event_3_ratio);
    }
}

/// First pipeline stage. In strict mode `event_1` and `event_2` must be numeric.
pub(crate) fn apply(record: &RawRecord, frame: &mut FeatureFrame, strict: bool) -> Result<()> {
    for field in ["event_1", "event_2"] {
        if record.number(field).is_none() {
            if strict {
                return Err(Error::MissingFeatureColumn(field.to_owned()));
            }
            log::trace!(target: "revenue_predictor", field; "event count missing, using 0");
        }
    }

    DerivedFeatures::from_record(record).write_to(frame);
    Ok(())
}
