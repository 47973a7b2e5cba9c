//! The feature-engineering pipeline that turns a [`RawRecord`] into a [`FeatureVector`].
//!
//! Stages always run in the same order:
//!
//! 1. [`derived`]: event totals and ratios.
//! 2. [`categorical`]: frequency encoding of `country`, `device_family`, `country_region` and
//!    target encoding of `country`.
//! 3. [`label`]: label encoding of `source` and (lower-cased) `platform`.
//! 4. [`assembly`]: selection of `feature_cols` in order, filling unproduced columns with `0`.
//!
//! Encoding is a pure function of the record and the [`MetadataStore`]: the same record always
//! yields a bit-identical vector, whether it is encoded alone or as part of a batch.
pub mod assembly;
pub mod categorical;
pub mod derived;
pub mod label;

mod frame;

pub use assembly::{FeatureMatrix, FeatureVector};
pub use derived::DerivedFeatures;
pub use frame::FeatureFrame;

use crate::{metadata::MetadataStore, RawRecord, Result};

/// Runs the encoding stages against a borrowed [`MetadataStore`].
///
/// Construction is free, so a pipeline is typically created per call.
#[derive(Debug, Clone, Copy)]
pub struct FeaturePipeline<'a> {
    store: &'a MetadataStore,
    strict: bool,
}

impl<'a> FeaturePipeline<'a> {
    /// Create a non-strict pipeline.
    pub fn new(store: &'a MetadataStore) -> FeaturePipeline<'a> {
        FeaturePipeline {
            store,
            strict: false,
        }
    }

    /// In strict mode unseen categories and unproduced feature columns fail the record instead of
    /// being replaced by defaults.
    pub fn strict(mut self, strict: bool) -> FeaturePipeline<'a> {
        self.strict = strict;
        self
    }

    /// Run stages 1–3 and return the named columns before alignment.
    pub fn frame(&self, record: &RawRecord) -> Result<FeatureFrame> {
        let mut frame = FeatureFrame::from_record(record);
        derived::apply(record, &mut frame, self.strict)?;
        categorical::apply(self.store.metadata(), record, &mut frame, self.strict)?;
        label::apply(self.store, record, &mut frame, self.strict)?;
        Ok(frame)
    }

    /// Encode a single record into a vector aligned to `feature_cols`.
    ///
    /// # Errors
    ///
    /// Never fails outside strict mode.
    pub fn encode(&self, record: &RawRecord) -> Result<FeatureVector> {
        let frame = self.frame(record)?;
        assembly::align(&frame, self.store.feature_cols(), self.strict)
    }

    /// Encode each record independently. The output has the same length and order as `records`.
    pub fn encode_batch(&self, records: &[RawRecord]) -> Vec<Result<FeatureVector>> {
        records.iter().map(|record| self.encode(record)).collect()
    }
}
