use std::sync::Arc;

use crate::model::ModelError;

/// Represents a result type for operations in this crate.
///
/// This `Result` type is a standard Rust `Result` type where the error variant is defined by the
/// crate-specific [`Error`] enum.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing possible errors that can occur while loading artifacts or predicting.
///
/// Unseen categories and missing optional columns are not errors: the pipeline recovers from them
/// with documented defaults. They only surface as [`Error::UnseenCategory`] and
/// [`Error::MissingFeatureColumn`] when strict mode is enabled.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// No artifact bundle has been loaded into the store yet.
    #[error("model artifacts are not loaded")]
    ArtifactsMissing,

    /// An artifact document could not be parsed.
    #[error("error parsing artifact document {document}")]
    Parse {
        /// Name of the offending document (e.g., `metadata.json`).
        document: String,
        /// Underlying parse error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// The bundle declares a format version this crate cannot read.
    #[error("incompatible artifact format version {found} (supported: {supported})")]
    IncompatibleFormat {
        /// Version declared by the bundle.
        found: semver::Version,
        /// Version requirement supported by this crate.
        supported: semver::VersionReq,
    },

    /// The bundle parsed but is internally inconsistent.
    #[error("invalid artifact bundle: {0}")]
    InvalidArtifact(String),

    /// Invalid base URL for the artifact server.
    #[error("invalid artifact base_url")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// The artifact server refused our credentials.
    #[error("unauthorized, artifact server rejected the request")]
    Unauthorized,

    /// An I/O error.
    #[error(transparent)]
    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    Io(Arc<std::io::Error>),

    /// Network error.
    #[error(transparent)]
    Network(Arc<reqwest::Error>),

    /// Record lacks fields the transport boundary declares mandatory. Only returned by
    /// [`RawRecord::validate_required_fields()`](crate::RawRecord::validate_required_fields).
    #[error("missing required fields: {}", .0.join(", "))]
    MissingRequiredField(Vec<String>),

    /// A column listed in `feature_cols` was not produced by the pipeline (strict mode only).
    #[error("feature column {0:?} was not produced by the pipeline")]
    MissingFeatureColumn(String),

    /// A categorical value was not seen at training time (strict mode only).
    #[error("unseen category {value:?} for field {field:?}")]
    UnseenCategory {
        /// Record field holding the category.
        field: String,
        /// Offending value, `None` if the field was null or not a string.
        value: Option<String>,
    },

    /// The model failed to produce a prediction for this record.
    #[error("model invocation failed")]
    ModelInvocation(#[source] ModelError),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(Arc::new(value.without_url()))
    }
}

impl From<ModelError> for Error {
    fn from(value: ModelError) -> Self {
        Error::ModelInvocation(value)
    }
}

impl Error {
    pub(crate) fn parse(document: impl Into<String>, source: serde_json::Error) -> Error {
        Error::Parse {
            document: document.into(),
            source: Arc::new(source),
        }
    }
}
