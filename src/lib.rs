//! Revenue prediction for app events.
//!
//! # Overview
//!
//! The crate turns a raw event record (a [`RawRecord`] of categorical and numeric fields) into a
//! numeric feature vector and feeds it to a trained regression model, returning a non-negative
//! predicted revenue.
//!
//! Encoding follows a fixed pipeline (see [`pipeline`]) driven by an [`ArtifactBundle`]: encoding
//! metadata produced at training time, the `source` and `platform` vocabularies, and the model
//! itself. The bundle is loaded once, never mutated, and shared between threads.
//!
//! A [`Predictor`] is created through [`PredictorConfig`] and serves single and batch
//! predictions. A [`PredictionLogger`] can be provided to save prediction events to your storage.
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum.
//!
//! Unseen categories and missing optional fields are not errors: they are encoded with documented
//! defaults, matching what the model saw during training. Enable strict mode in
//! [`PredictorConfig::strict()`] to have them reported instead.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging messages under
//! the `revenue_predictor` target. Consider integrating a `log`-compatible logger implementation
//! for better visibility into artifact loading and recovered anomalies.
//!
//! # Examples
//!
//! A runnable example lives in the `demos/predict` directory of the crate repository.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

pub mod artifact_fetcher;
pub mod artifact_store;
pub mod artifacts;
pub mod metadata;
pub mod model;
pub mod pipeline;

mod config;
mod error;
mod prediction_logger;
mod predictor;
mod record;
mod vocabulary;

pub use artifacts::{ArtifactBundle, ModelInfo, ModelMetrics};
pub use config::{ArtifactSource, PredictorConfig};
pub use error::{Error, Result};
pub use metadata::{EncodingMetadata, MetadataStore};
pub use pipeline::{FeatureMatrix, FeaturePipeline, FeatureVector};
pub use prediction_logger::{PredictionEvent, PredictionLogger};
pub use predictor::{clamp_revenue, Predictor};
pub use record::{FieldValue, RawRecord, REQUIRED_FIELDS};
pub use vocabulary::{CategoricalVocabulary, UNSEEN_CODE};
