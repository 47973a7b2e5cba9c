//! The model artifact bundle: encoding metadata, vocabularies and the trained model, loaded once
//! and then only read.
use std::{fmt, path::Path};

use chrono::{DateTime, Utc};
use semver::{Comparator, Op, Prerelease, Version, VersionReq};
use serde::{Deserialize, Serialize};

use crate::{
    metadata::{EncodingMetadata, MetadataStore},
    model::{ModelSpec, RegressionModel},
    CategoricalVocabulary, Error, Result,
};

/// Encoding metadata document name.
pub const METADATA_DOCUMENT: &str = "metadata.json";
/// `source` vocabulary document name.
pub const SOURCE_VOCABULARY_DOCUMENT: &str = "le_source.json";
/// `platform` vocabulary document name.
pub const PLATFORM_VOCABULARY_DOCUMENT: &str = "le_platform.json";
/// Model document name.
pub const MODEL_DOCUMENT: &str = "model.json";

/// Metadata format versions this crate can read.
pub fn supported_format_versions() -> VersionReq {
    VersionReq {
        comparators: vec![Comparator {
            op: Op::Caret,
            major: 1,
            minor: None,
            patch: None,
            pre: Prerelease::EMPTY,
        }],
    }
}

/// Raw bytes of the four documents making up a bundle, as read from disk or fetched from an
/// artifact server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactDocuments {
    /// `metadata.json` contents.
    pub metadata: Vec<u8>,
    /// `le_source.json` contents.
    pub source_vocabulary: Vec<u8>,
    /// `le_platform.json` contents.
    pub platform_vocabulary: Vec<u8>,
    /// `model.json` contents.
    pub model: Vec<u8>,
}

impl ArtifactDocuments {
    /// Read all documents from a directory.
    pub fn read_dir(dir: impl AsRef<Path>) -> Result<ArtifactDocuments> {
        let dir = dir.as_ref();
        log::debug!(target: "revenue_predictor", dir:? = dir; "reading model artifacts");

        let read = |name: &str| -> Result<Vec<u8>> { Ok(std::fs::read(dir.join(name))?) };

        Ok(ArtifactDocuments {
            metadata: read(METADATA_DOCUMENT)?,
            source_vocabulary: read(SOURCE_VOCABULARY_DOCUMENT)?,
            platform_vocabulary: read(PLATFORM_VOCABULARY_DOCUMENT)?,
            model: read(MODEL_DOCUMENT)?,
        })
    }

    /// MD5 over all documents, length-prefixed so that moving bytes between documents changes the
    /// digest.
    pub fn fingerprint(&self) -> String {
        let mut context = md5::Context::new();
        for document in [
            &self.metadata,
            &self.source_vocabulary,
            &self.platform_vocabulary,
            &self.model,
        ] {
            context.consume((document.len() as u64).to_le_bytes());
            context.consume(document);
        }
        format!("{:x}", context.compute())
    }
}

/// Everything needed to serve predictions for one model version.
///
/// A bundle is immutable once constructed. Share it with `Arc`; multiple bundles (e.g. two model
/// versions) can coexist in one process.
pub struct ArtifactBundle {
    store: MetadataStore,
    model: Box<dyn RegressionModel>,
    fingerprint: Option<String>,
    loaded_at: DateTime<Utc>,
}

impl ArtifactBundle {
    /// Assemble a bundle from parts built in code. Such bundles have no fingerprint.
    pub fn new(store: MetadataStore, model: impl RegressionModel + 'static) -> ArtifactBundle {
        ArtifactBundle {
            store,
            model: Box::new(model),
            fingerprint: None,
            loaded_at: Utc::now(),
        }
    }

    /// Parse and validate a bundle from its documents.
    ///
    /// # Errors
    ///
    /// - [`Error::Parse`] if a document is not valid JSON or does not match its schema.
    /// - [`Error::IncompatibleFormat`] if the metadata format version is unsupported.
    /// - [`Error::InvalidArtifact`] if the documents are inconsistent with each other.
    pub fn from_documents(documents: &ArtifactDocuments) -> Result<ArtifactBundle> {
        let metadata = EncodingMetadata::from_json(&documents.metadata)?;

        let supported = supported_format_versions();
        if !supported.matches(metadata.format_version()) {
            return Err(Error::IncompatibleFormat {
                found: metadata.format_version().clone(),
                supported,
            });
        }

        let source_vocabulary =
            CategoricalVocabulary::from_json(SOURCE_VOCABULARY_DOCUMENT, &documents.source_vocabulary)?;
        let platform_vocabulary = CategoricalVocabulary::from_json(
            PLATFORM_VOCABULARY_DOCUMENT,
            &documents.platform_vocabulary,
        )?;
        let model = ModelSpec::from_json(&documents.model)?.build(metadata.feature_cols())?;

        let fingerprint = documents.fingerprint();
        log::debug!(target: "revenue_predictor",
                    fingerprint:display = fingerprint,
                    features = metadata.feature_cols().len();
                    "loaded model artifacts");

        Ok(ArtifactBundle {
            store: MetadataStore::new(metadata, source_vocabulary, platform_vocabulary),
            model,
            fingerprint: Some(fingerprint),
            loaded_at: Utc::now(),
        })
    }

    /// Read, parse and validate a bundle stored in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<ArtifactBundle> {
        ArtifactBundle::from_documents(&ArtifactDocuments::read_dir(dir)?)
    }

    /// Encoding metadata and vocabularies.
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// The trained model.
    pub fn model(&self) -> &dyn RegressionModel {
        self.model.as_ref()
    }

    /// MD5 fingerprint of the documents this bundle was loaded from.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// When the bundle was constructed.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Model metadata passthrough for the transport layer.
    pub fn model_info(&self) -> ModelInfo {
        let metadata = self.store.metadata();
        let training = metadata.training();
        ModelInfo {
            model_name: training
                .model_name
                .clone()
                .unwrap_or_else(|| ModelInfo::UNKNOWN_MODEL_NAME.to_owned()),
            features: metadata.feature_cols().to_vec(),
            metrics: ModelMetrics {
                test_mae: training.test_mae,
                test_rmse: training.test_rmse,
                test_r2: training.test_r2,
            },
            format_version: metadata.format_version().clone(),
            fingerprint: self.fingerprint.clone(),
            loaded_at: self.loaded_at,
        }
    }
}

impl fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("store", &self.store)
            .field("fingerprint", &self.fingerprint)
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}

/// Model name, feature columns and held-out metrics of the active model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name from the metadata, or [`ModelInfo::UNKNOWN_MODEL_NAME`].
    pub model_name: String,
    /// Feature columns in model order.
    pub features: Vec<String>,
    /// Held-out evaluation metrics.
    pub metrics: ModelMetrics,
    /// Metadata format version.
    pub format_version: Version,
    /// MD5 fingerprint of the artifact documents, `None` for bundles built in code.
    pub fingerprint: Option<String>,
    /// When the bundle was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl ModelInfo {
    /// Reported when the metadata does not name the model.
    pub const UNKNOWN_MODEL_NAME: &'static str = "Unknown";
}

/// Test-set metrics recorded at training time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean absolute error.
    pub test_mae: Option<f64>,
    /// Root mean squared error.
    pub test_rmse: Option<f64>,
    /// Coefficient of determination.
    pub test_r2: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::{ArtifactBundle, ArtifactDocuments, ModelInfo};
    use crate::{Error, FeatureMatrix};

    const FIXTURE_DIR: &str = "tests/data/artifacts";

    #[test]
    fn loads_fixture_bundle() {
        let bundle = ArtifactBundle::from_dir(FIXTURE_DIR).unwrap();

        assert_eq!(bundle.store().feature_cols().len(), 13);
        assert_eq!(bundle.store().source_vocabulary().encode("Organic"), 1);
        assert_eq!(bundle.store().platform_vocabulary().encode("ios"), 1);
        assert_eq!(bundle.fingerprint().map(str::len), Some(32));

        let width = bundle.store().feature_cols().len();
        let matrix = FeatureMatrix::from_rows(
            bundle.store().feature_cols().clone(),
            vec![vec![0.0; width]],
        );
        assert_eq!(bundle.model().predict(&matrix).unwrap().len(), 1);
    }

    #[test]
    fn model_info_passes_metadata_through() {
        let info = ArtifactBundle::from_dir(FIXTURE_DIR).unwrap().model_info();

        assert_eq!(info.model_name, "Linear Regression");
        assert_eq!(info.features.len(), 13);
        assert_eq!(info.metrics.test_mae, Some(0.0412));
        assert_eq!(info.metrics.test_rmse, Some(0.1337));
        assert_eq!(info.metrics.test_r2, Some(0.61));
        assert!(info.fingerprint.is_some());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let documents = ArtifactDocuments::read_dir(FIXTURE_DIR).unwrap();
        let mut edited = documents.clone();
        edited.model.push(b'\n');

        assert_eq!(documents.fingerprint(), documents.clone().fingerprint());
        assert_ne!(documents.fingerprint(), edited.fingerprint());
    }

    #[test]
    fn rejects_incompatible_format_version() {
        let mut documents = ArtifactDocuments::read_dir(FIXTURE_DIR).unwrap();
        documents.metadata = br#"{"feature_cols": [], "format_version": "2.0.0"}"#.to_vec();

        assert!(matches!(
            ArtifactBundle::from_documents(&documents),
            Err(Error::IncompatibleFormat { .. })
        ));
    }

    #[test]
    fn rejects_model_referencing_unknown_column() {
        let mut documents = ArtifactDocuments::read_dir(FIXTURE_DIR).unwrap();
        documents.model =
            br#"{"type": "linear", "intercept": 0.0, "coefficients": {"ltv_30d": 1.0}}"#.to_vec();

        assert!(matches!(
            ArtifactBundle::from_documents(&documents),
            Err(Error::InvalidArtifact(_))
        ));
    }

    #[test]
    fn reports_missing_documents() {
        assert!(matches!(
            ArtifactBundle::from_dir("tests/data/does-not-exist"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn unnamed_model_is_unknown() {
        let mut documents = ArtifactDocuments::read_dir(FIXTURE_DIR).unwrap();
        documents.metadata = br#"{"feature_cols": []}"#.to_vec();
        documents.model = br#"{"type": "linear", "intercept": 0.0}"#.to_vec();

        let info = ArtifactBundle::from_documents(&documents).unwrap().model_info();

        assert_eq!(info.model_name, ModelInfo::UNKNOWN_MODEL_NAME);
        assert_eq!(info.metrics.test_r2, None);
    }
}
