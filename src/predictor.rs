use std::{sync::Arc, time::Instant};

use chrono::Utc;

use crate::{
    artifact_store::ArtifactStore,
    artifacts::{ArtifactBundle, ModelInfo},
    model::ModelError,
    pipeline::FeaturePipeline,
    prediction_logger::NoopPredictionLogger,
    Error, FeatureMatrix, FeatureVector, PredictionEvent, PredictionLogger, PredictorConfig,
    RawRecord, Result,
};

/// Serves revenue predictions from an [`ArtifactStore`].
///
/// In order to create a predictor, first create [`PredictorConfig`].
///
/// A predictor is `Send + Sync`: share it between threads behind an `Arc` or a reference. Every
/// call works against a single bundle snapshot, so a concurrent bundle replacement never mixes
/// artifacts within one call.
///
/// # Examples
/// ```no_run
/// # use revenue_predictor::{PredictorConfig, RawRecord};
/// let predictor = PredictorConfig::from_artifact_dir("models/revenue").to_predictor()?;
/// let revenue = predictor.predict(
///     &RawRecord::new()
///         .with("country", "es")
///         .with("platform", "iOS")
///         .with("event_1", 100)
///         .with("event_2", 50),
/// )?;
/// assert!(revenue >= 0.0);
/// # Ok::<(), revenue_predictor::Error>(())
/// ```
pub struct Predictor<'a> {
    artifact_store: Arc<ArtifactStore>,
    strict: bool,
    prediction_logger: Box<dyn PredictionLogger + Send + Sync + 'a>,
}

impl<'a> Predictor<'a> {
    /// Create a predictor serving whatever bundle is active in `artifact_store`. The artifact
    /// source in `config` is ignored.
    pub fn new_with_store(
        config: PredictorConfig<'a>,
        artifact_store: Arc<ArtifactStore>,
    ) -> Predictor<'a> {
        Predictor {
            artifact_store,
            strict: config.strict,
            prediction_logger: config.prediction_logger,
        }
    }

    /// Create a non-strict predictor serving `bundle`, without a prediction logger.
    pub fn from_bundle(bundle: Arc<ArtifactBundle>) -> Predictor<'static> {
        Predictor {
            artifact_store: Arc::new(ArtifactStore::with_bundle(bundle)),
            strict: false,
            prediction_logger: Box::new(NoopPredictionLogger),
        }
    }

    /// The store this predictor reads from. Use it to activate a new bundle.
    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.artifact_store
    }

    /// Predict revenue for a single record.
    ///
    /// The result is never negative: model outputs below zero (and NaN) are clamped to `0.0`.
    ///
    /// # Errors
    ///
    /// - [`Error::ArtifactsMissing`] if no bundle is active.
    /// - [`Error::ModelInvocation`] if the model fails on this record.
    /// - [`Error::UnseenCategory`] and [`Error::MissingFeatureColumn`] in strict mode only.
    pub fn predict(&self, record: &RawRecord) -> Result<f64> {
        let bundle = self.bundle()?;
        self.predict_with(&bundle, record)
    }

    /// Predict revenue for each record independently.
    ///
    /// The output has the same length and order as `records`. A failing record does not affect
    /// the others.
    pub fn predict_batch(&self, records: &[RawRecord]) -> Vec<Result<f64>> {
        let bundle = match self.bundle() {
            Ok(bundle) => bundle,
            Err(err) => return vec![Err(err); records.len()],
        };

        log::trace!(target: "revenue_predictor", records = records.len(); "predicting batch");

        records
            .iter()
            .map(|record| self.predict_with(&bundle, record))
            .collect()
    }

    /// Run the feature pipeline without invoking the model.
    pub fn encode(&self, record: &RawRecord) -> Result<FeatureVector> {
        let bundle = self.bundle()?;
        self.pipeline(&bundle).encode(record)
    }

    /// Run the feature pipeline on each record independently.
    pub fn encode_batch(&self, records: &[RawRecord]) -> Vec<Result<FeatureVector>> {
        match self.bundle() {
            Ok(bundle) => self.pipeline(&bundle).encode_batch(records),
            Err(err) => vec![Err(err); records.len()],
        }
    }

    /// Name, feature columns and metrics of the active model.
    pub fn model_info(&self) -> Result<ModelInfo> {
        Ok(self.bundle()?.model_info())
    }

    fn bundle(&self) -> Result<Arc<ArtifactBundle>> {
        self.artifact_store.get_bundle().ok_or_else(|| {
            log::warn!(target: "revenue_predictor", "predicting before model artifacts have been loaded");
            Error::ArtifactsMissing
        })
    }

    fn pipeline<'b>(&self, bundle: &'b ArtifactBundle) -> FeaturePipeline<'b> {
        FeaturePipeline::new(bundle.store()).strict(self.strict)
    }

    fn predict_with(&self, bundle: &ArtifactBundle, record: &RawRecord) -> Result<f64> {
        let started = Instant::now();

        let features = self.pipeline(bundle).encode(record).map_err(|err| {
            log::warn!(target: "revenue_predictor", input:serde = record; "failed to encode record: {:?}", err);
            err
        })?;
        let matrix = FeatureMatrix::from(features);

        let outputs = bundle.model().predict(&matrix).map_err(|err| {
            log::warn!(target: "revenue_predictor", input:serde = record; "model invocation failed: {:?}", err);
            Error::ModelInvocation(err)
        })?;
        let raw = match outputs.as_slice() {
            [value] => *value,
            _ => {
                return Err(Error::ModelInvocation(ModelError::OutputCountMismatch {
                    expected: 1,
                    found: outputs.len(),
                }))
            }
        };

        let predicted_revenue = clamp_revenue(raw);

        log::trace!(target: "revenue_predictor",
                    input:serde = record,
                    raw,
                    predicted_revenue;
                    "predicted revenue");

        self.prediction_logger.log_prediction(PredictionEvent {
            input: record.clone(),
            predicted_revenue,
            inference_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            timestamp: Utc::now(),
            model_name: bundle
                .store()
                .metadata()
                .training()
                .model_name
                .clone()
                .unwrap_or_else(|| ModelInfo::UNKNOWN_MODEL_NAME.to_owned()),
            fingerprint: bundle.fingerprint().map(str::to_owned),
        });

        Ok(predicted_revenue)
    }
}

/// Revenue is never negative. NaN is treated as no revenue.
pub fn clamp_revenue(raw: f64) -> f64 {
    if raw > 0.0 {
        raw
    } else {
        0.0
    }
}
