//! Encoding metadata produced at training time: frequency tables, target-mean tables and the
//! canonical feature column order.
//!
//! [`MetadataStore`] bundles the metadata with both categorical vocabularies. It is the read-only
//! context the [`FeaturePipeline`](crate::pipeline::FeaturePipeline) runs against.
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::{CategoricalVocabulary, Error};

/// Categorical fields that are frequency-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrequencyField {
    /// `country` → `country_freq`.
    Country,
    /// `device_family` → `device_family_freq`.
    DeviceFamily,
    /// `country_region` → `country_region_freq`.
    CountryRegion,
}

impl FrequencyField {
    /// All frequency-encoded fields, in encoding order.
    pub const ALL: [FrequencyField; 3] = [
        FrequencyField::Country,
        FrequencyField::DeviceFamily,
        FrequencyField::CountryRegion,
    ];

    /// Name of the raw record field.
    pub fn field(self) -> &'static str {
        match self {
            FrequencyField::Country => "country",
            FrequencyField::DeviceFamily => "device_family",
            FrequencyField::CountryRegion => "country_region",
        }
    }

    /// Name of the produced feature column.
    pub fn column(self) -> &'static str {
        match self {
            FrequencyField::Country => "country_freq",
            FrequencyField::DeviceFamily => "device_family_freq",
            FrequencyField::CountryRegion => "country_region_freq",
        }
    }
}

/// Scalar training metrics and parameters. Informational only: nothing here feeds the numeric
/// path of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Human-readable model name.
    #[serde(default)]
    pub model_name: Option<String>,
    /// Mean absolute error on the training set.
    #[serde(default)]
    pub train_mae: Option<f64>,
    /// Mean absolute error on the validation set.
    #[serde(default)]
    pub dev_mae: Option<f64>,
    /// Mean absolute error on the test set.
    #[serde(default)]
    pub test_mae: Option<f64>,
    /// Root mean squared error on the test set.
    #[serde(default)]
    pub test_rmse: Option<f64>,
    /// R² on the test set.
    #[serde(default)]
    pub test_r2: Option<f64>,
    /// Selected hyper-parameters.
    #[serde(default)]
    pub best_params: BTreeMap<String, serde_json::Value>,
    /// How the model was trained (e.g. `grid_search_cv`).
    #[serde(default)]
    pub training_method: Option<String>,
}

/// Wire representation of `metadata.json`.
#[derive(Debug, Deserialize)]
struct MetadataDocument {
    #[serde(default)]
    feature_cols: Vec<String>,
    #[serde(default)]
    country_value_counts: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    device_family_value_counts: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    country_region_value_counts: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    country_mean_revenue: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    format_version: Option<Version>,
    #[serde(flatten)]
    training: TrainingSummary,
}

/// Immutable encoding metadata loaded from `metadata.json`.
///
/// Tables are `BTreeMap`s so that anything derived from iterating them (the global mean revenue)
/// is bit-for-bit reproducible across processes.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "MetadataDocument")]
pub struct EncodingMetadata {
    feature_cols: Arc<[String]>,
    country_value_counts: Option<BTreeMap<String, u64>>,
    device_family_value_counts: Option<BTreeMap<String, u64>>,
    country_region_value_counts: Option<BTreeMap<String, u64>>,
    country_mean_revenue: Option<BTreeMap<String, f64>>,
    /// Mean of `country_mean_revenue` values, computed once. `None` if the table is absent or
    /// empty.
    global_mean_revenue: Option<f64>,
    format_version: Version,
    training: TrainingSummary,
}

impl TryFrom<MetadataDocument> for EncodingMetadata {
    type Error = Error;

    fn try_from(doc: MetadataDocument) -> Result<Self, Error> {
        let mut seen = HashSet::with_capacity(doc.feature_cols.len());
        if let Some(duplicate) = doc.feature_cols.iter().find(|col| !seen.insert(col.as_str())) {
            return Err(Error::InvalidArtifact(format!(
                "duplicate feature column {duplicate:?}"
            )));
        }

        let global_mean_revenue = doc.country_mean_revenue.as_ref().and_then(mean_of);

        Ok(EncodingMetadata {
            feature_cols: doc.feature_cols.into(),
            country_value_counts: doc.country_value_counts,
            device_family_value_counts: doc.device_family_value_counts,
            country_region_value_counts: doc.country_region_value_counts,
            country_mean_revenue: doc.country_mean_revenue,
            global_mean_revenue,
            format_version: doc.format_version.unwrap_or(EncodingMetadata::DEFAULT_FORMAT_VERSION),
            training: doc.training,
        })
    }
}

fn mean_of(table: &BTreeMap<String, f64>) -> Option<f64> {
    if table.is_empty() {
        return None;
    }
    let sum: f64 = table.values().sum();
    Some(sum / table.len() as f64)
}

impl EncodingMetadata {
    /// Format version assumed when `metadata.json` does not declare one.
    pub const DEFAULT_FORMAT_VERSION: Version = Version::new(1, 0, 0);

    /// Parse metadata from `metadata.json` contents.
    pub fn from_json(bytes: &[u8]) -> crate::Result<EncodingMetadata> {
        serde_json::from_slice(bytes).map_err(|err| Error::parse("metadata.json", err))
    }

    /// Start building metadata in code. Mostly useful in tests.
    pub fn builder(feature_cols: impl IntoIterator<Item = impl Into<String>>) -> MetadataBuilder {
        MetadataBuilder {
            doc: MetadataDocument {
                feature_cols: feature_cols.into_iter().map(Into::into).collect(),
                country_value_counts: None,
                device_family_value_counts: None,
                country_region_value_counts: None,
                country_mean_revenue: None,
                format_version: None,
                training: TrainingSummary::default(),
            },
        }
    }

    /// Canonical, ordered feature columns the model was trained on.
    pub fn feature_cols(&self) -> &Arc<[String]> {
        &self.feature_cols
    }

    /// Training-time observation counts for a frequency-encoded field, if the bundle has them.
    pub fn value_counts(&self, field: FrequencyField) -> Option<&BTreeMap<String, u64>> {
        match field {
            FrequencyField::Country => self.country_value_counts.as_ref(),
            FrequencyField::DeviceFamily => self.device_family_value_counts.as_ref(),
            FrequencyField::CountryRegion => self.country_region_value_counts.as_ref(),
        }
    }

    /// Training-time mean revenue per country, if the bundle has it.
    ///
    /// An empty table is kept as is, but yields no `country_mean_revenue` column, in strict mode
    /// too.
    pub fn country_mean_revenue(&self) -> Option<&BTreeMap<String, f64>> {
        self.country_mean_revenue.as_ref()
    }

    /// Arithmetic mean over all `country_mean_revenue` values. Used as the prior for unseen
    /// countries.
    pub fn global_mean_revenue(&self) -> Option<f64> {
        self.global_mean_revenue
    }

    /// Declared format version, [`EncodingMetadata::DEFAULT_FORMAT_VERSION`] if absent.
    pub fn format_version(&self) -> &Version {
        &self.format_version
    }

    /// Informational training summary.
    pub fn training(&self) -> &TrainingSummary {
        &self.training
    }
}

/// Builder for [`EncodingMetadata`]. See [`EncodingMetadata::builder()`].
#[derive(Debug)]
pub struct MetadataBuilder {
    doc: MetadataDocument,
}

impl MetadataBuilder {
    /// Set the count table of a frequency-encoded field.
    pub fn value_counts<K: Into<String>>(
        mut self,
        field: FrequencyField,
        counts: impl IntoIterator<Item = (K, u64)>,
    ) -> MetadataBuilder {
        let counts = Some(counts.into_iter().map(|(k, v)| (k.into(), v)).collect());
        match field {
            FrequencyField::Country => self.doc.country_value_counts = counts,
            FrequencyField::DeviceFamily => self.doc.device_family_value_counts = counts,
            FrequencyField::CountryRegion => self.doc.country_region_value_counts = counts,
        }
        self
    }

    /// Set the per-country mean revenue table.
    pub fn country_mean_revenue<K: Into<String>>(
        mut self,
        means: impl IntoIterator<Item = (K, f64)>,
    ) -> MetadataBuilder {
        self.doc.country_mean_revenue = Some(means.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    /// Set the training summary.
    pub fn training(mut self, training: TrainingSummary) -> MetadataBuilder {
        self.doc.training = training;
        self
    }

    /// Validate and build the metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArtifact`] if feature columns contain duplicates.
    ///
    /// ```
    /// # use revenue_predictor::{EncodingMetadata, Error};
    /// let metadata = EncodingMetadata::builder(["event_1", "country_mean_revenue"])
    ///     .country_mean_revenue([("es", 0.2), ("us", 0.4)])
    ///     .build()?;
    /// assert_eq!(metadata.feature_cols().len(), 2);
    ///
    /// let duplicated = EncodingMetadata::builder(["event_1", "event_1"]).build();
    /// assert!(matches!(duplicated, Err(Error::InvalidArtifact(_))));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn build(self) -> crate::Result<EncodingMetadata> {
        EncodingMetadata::try_from(self.doc)
    }
}

/// The read-only context the feature pipeline runs against: encoding metadata plus the `source`
/// and `platform` vocabularies.
///
/// Constructed once at load time and shared by reference; it is never mutated afterwards, so any
/// number of threads may encode against it concurrently.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    metadata: EncodingMetadata,
    source_vocabulary: CategoricalVocabulary,
    platform_vocabulary: CategoricalVocabulary,
}

impl MetadataStore {
    /// Combine metadata with the two vocabularies.
    pub fn new(
        metadata: EncodingMetadata,
        source_vocabulary: CategoricalVocabulary,
        platform_vocabulary: CategoricalVocabulary,
    ) -> MetadataStore {
        MetadataStore {
            metadata,
            source_vocabulary,
            platform_vocabulary,
        }
    }

    /// Encoding metadata.
    pub fn metadata(&self) -> &EncodingMetadata {
        &self.metadata
    }

    /// Shorthand for [`EncodingMetadata::feature_cols()`].
    pub fn feature_cols(&self) -> &Arc<[String]> {
        self.metadata.feature_cols()
    }

    /// Vocabulary of the `source` field.
    pub fn source_vocabulary(&self) -> &CategoricalVocabulary {
        &self.source_vocabulary
    }

    /// Vocabulary of the lower-cased `platform` field.
    pub fn platform_vocabulary(&self) -> &CategoricalVocabulary {
        &self.platform_vocabulary
    }
}
