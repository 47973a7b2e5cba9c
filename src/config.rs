use std::{path::PathBuf, sync::Arc};

use crate::{
    artifact_fetcher::ArtifactFetcher, artifact_store::ArtifactStore, artifacts::ArtifactBundle,
    prediction_logger::NoopPredictionLogger, PredictionLogger, Predictor, Result,
};

/// Where [`PredictorConfig::to_predictor()`] loads the artifact bundle from.
#[derive(Debug, Clone)]
pub enum ArtifactSource {
    /// A directory holding the four artifact documents.
    Directory(PathBuf),
    /// Base URL of an artifact server. Documents are fetched from `{url}/{document}`.
    Url(String),
    /// A bundle that is already loaded.
    Bundle(Arc<ArtifactBundle>),
}

/// Configuration for [`Predictor`].
pub struct PredictorConfig<'a> {
    pub(crate) source: ArtifactSource,
    pub(crate) fallback_dir: Option<PathBuf>,
    pub(crate) strict: bool,
    pub(crate) prediction_logger: Box<dyn PredictionLogger + Send + Sync + 'a>,
}

impl<'a> PredictorConfig<'a> {
    /// Load artifacts from a directory on disk.
    ///
    /// ```
    /// # use revenue_predictor::PredictorConfig;
    /// PredictorConfig::from_artifact_dir("models/revenue");
    /// ```
    pub fn from_artifact_dir(dir: impl Into<PathBuf>) -> Self {
        PredictorConfig::from_source(ArtifactSource::Directory(dir.into()))
    }

    /// Fetch artifacts from an artifact server.
    pub fn from_artifact_url(base_url: impl Into<String>) -> Self {
        PredictorConfig::from_source(ArtifactSource::Url(base_url.into()))
    }

    /// Serve an already loaded bundle.
    pub fn from_bundle(bundle: Arc<ArtifactBundle>) -> Self {
        PredictorConfig::from_source(ArtifactSource::Bundle(bundle))
    }

    fn from_source(source: ArtifactSource) -> Self {
        PredictorConfig {
            source,
            fallback_dir: None,
            strict: false,
            prediction_logger: Box::new(NoopPredictionLogger),
        }
    }

    /// Directory to load artifacts from when fetching them from the artifact server fails.
    pub fn fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = Some(dir.into());
        self
    }

    /// In strict mode, unseen categories and missing feature columns fail the prediction instead
    /// of being replaced by defaults. Disabled by default.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set prediction logger to pass prediction events to your data warehouse.
    ///
    /// ```
    /// # use revenue_predictor::{PredictionEvent, PredictorConfig};
    /// let config = PredictorConfig::from_artifact_dir("models/revenue").prediction_logger(|event: PredictionEvent| {
    ///   println!("{:?}", event);
    /// });
    /// ```
    pub fn prediction_logger(
        mut self,
        prediction_logger: impl PredictionLogger + Send + Sync + 'a,
    ) -> Self {
        self.prediction_logger = Box::new(prediction_logger);
        self
    }

    /// Load the artifact bundle and create a ready [`Predictor`].
    ///
    /// # Errors
    ///
    /// Returns the loading error if the bundle cannot be read, fetched or validated. When fetching
    /// from a URL fails and a fallback directory is configured, the fallback's error is returned.
    pub fn to_predictor(self) -> Result<Predictor<'a>> {
        let bundle = self.load_bundle()?;
        let store = Arc::new(ArtifactStore::with_bundle(bundle));
        Ok(Predictor::new_with_store(self, store))
    }

    fn load_bundle(&self) -> Result<Arc<ArtifactBundle>> {
        match &self.source {
            ArtifactSource::Directory(dir) => Ok(Arc::new(ArtifactBundle::from_dir(dir)?)),
            ArtifactSource::Bundle(bundle) => Ok(bundle.clone()),
            ArtifactSource::Url(base_url) => {
                let fetched = ArtifactFetcher::new(base_url)
                    .and_then(|fetcher| fetcher.fetch_documents())
                    .and_then(|documents| ArtifactBundle::from_documents(&documents));

                match (fetched, &self.fallback_dir) {
                    (Err(err), Some(dir)) => {
                        log::warn!(target: "revenue_predictor",
                                   base_url = base_url.as_str(),
                                   fallback_dir:? = dir;
                                   "failed to load artifacts from server, falling back to disk: {:?}", err);
                        Ok(Arc::new(ArtifactBundle::from_dir(dir)?))
                    }
                    (fetched, _) => Ok(Arc::new(fetched?)),
                }
            }
        }
    }
}
