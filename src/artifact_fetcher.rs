//! An HTTP client that fetches model artifacts from an artifact server.
use reqwest::{StatusCode, Url};

use crate::{
    artifacts::{
        ArtifactDocuments, METADATA_DOCUMENT, MODEL_DOCUMENT, PLATFORM_VOCABULARY_DOCUMENT,
        SOURCE_VOCABULARY_DOCUMENT,
    },
    Error, Result,
};

/// A client that fetches the four artifact documents stored under a common base URL.
pub struct ArtifactFetcher {
    // Client holds a connection pool internally, so we're reusing the client between requests.
    client: reqwest::blocking::Client,
    base_url: Url,
}

impl ArtifactFetcher {
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`] if `base_url` cannot be parsed.
    pub fn new(base_url: &str) -> Result<ArtifactFetcher> {
        // Url::join() replaces the last path segment unless the base ends with a slash.
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)
        } else {
            Url::parse(&format!("{base_url}/"))
        }
        .map_err(Error::InvalidBaseUrl)?;

        Ok(ArtifactFetcher {
            client: reqwest::blocking::Client::new(),
            base_url,
        })
    }

    /// Base URL, always ending with a slash.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch all four artifact documents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if the server rejects the request and [`Error::Network`] for
    /// other transport failures.
    pub fn fetch_documents(&self) -> Result<ArtifactDocuments> {
        log::debug!(target: "revenue_predictor", base_url:display = self.base_url; "fetching model artifacts");

        let documents = ArtifactDocuments {
            metadata: self.fetch_document(METADATA_DOCUMENT)?,
            source_vocabulary: self.fetch_document(SOURCE_VOCABULARY_DOCUMENT)?,
            platform_vocabulary: self.fetch_document(PLATFORM_VOCABULARY_DOCUMENT)?,
            model: self.fetch_document(MODEL_DOCUMENT)?,
        };

        log::debug!(target: "revenue_predictor", "successfully fetched model artifacts");

        Ok(documents)
    }

    fn fetch_document(&self, name: &str) -> Result<Vec<u8>> {
        let url = self.base_url.join(name).map_err(Error::InvalidBaseUrl)?;

        let response = self.client.get(url).send()?;

        let response = response.error_for_status().map_err(|err| {
            if matches!(
                err.status(),
                Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            ) {
                log::warn!(target: "revenue_predictor", "artifact server rejected the request. Check your credentials");
                Error::Unauthorized
            } else {
                log::warn!(target: "revenue_predictor", document = name; "received non-200 response while fetching artifacts: {:?}", err);
                Error::from(err)
            }
        })?;

        Ok(response.bytes()?.to_vec())
    }
}
