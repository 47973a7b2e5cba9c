use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Code emitted for a category that is not part of the vocabulary.
///
/// Vocabularies only assign non-negative codes, so the sentinel never collides with a valid code.
pub const UNSEEN_CODE: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VocabularyDocument {
    classes: Vec<String>,
}

/// An ordered set of known category strings built at training time. The category at position `i`
/// is assigned code `i`.
///
/// ```
/// # use revenue_predictor::CategoricalVocabulary;
/// let vocabulary = CategoricalVocabulary::from_classes(["Non-organic", "Organic"]).unwrap();
/// assert_eq!(vocabulary.encode("Organic"), 1);
/// assert_eq!(vocabulary.encode("Referral"), -1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VocabularyDocument", into = "VocabularyDocument")]
pub struct CategoricalVocabulary {
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl CategoricalVocabulary {
    /// Build a vocabulary from classes in code order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArtifact`] if a class appears more than once, since a class must
    /// map to exactly one code.
    pub fn from_classes(
        classes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<CategoricalVocabulary> {
        let classes = classes.into_iter().map(Into::into).collect::<Vec<String>>();

        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code as i64).is_some() {
                return Err(Error::InvalidArtifact(format!(
                    "duplicate vocabulary class {class:?}"
                )));
            }
        }

        Ok(CategoricalVocabulary { classes, codes })
    }

    /// Parse a vocabulary document (`{"classes": [...]}`). `name` is used in error messages.
    pub fn from_json(name: &str, bytes: &[u8]) -> Result<CategoricalVocabulary> {
        serde_json::from_slice(bytes).map_err(|err| Error::parse(name, err))
    }

    /// Code of a known category, `None` if unseen.
    pub fn lookup(&self, category: &str) -> Option<i64> {
        self.codes.get(category).copied()
    }

    /// Code of a category, or [`UNSEEN_CODE`] if it was not seen at training time.
    pub fn encode(&self, category: &str) -> i64 {
        self.lookup(category).unwrap_or(UNSEEN_CODE)
    }

    /// Known classes in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of known classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the vocabulary has no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl TryFrom<VocabularyDocument> for CategoricalVocabulary {
    type Error = Error;

    fn try_from(doc: VocabularyDocument) -> Result<Self> {
        CategoricalVocabulary::from_classes(doc.classes)
    }
}

impl From<CategoricalVocabulary> for VocabularyDocument {
    fn from(vocabulary: CategoricalVocabulary) -> Self {
        VocabularyDocument {
            classes: vocabulary.classes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CategoricalVocabulary, UNSEEN_CODE};
    use crate::Error;

    #[test]
    fn codes_follow_class_order() {
        let vocabulary =
            CategoricalVocabulary::from_json("le_platform.json", br#"{"classes": ["android", "ios"]}"#)
                .unwrap();

        assert_eq!(vocabulary.encode("android"), 0);
        assert_eq!(vocabulary.encode("ios"), 1);
        assert_eq!(vocabulary.classes(), ["android", "ios"]);
    }

    #[test]
    fn unseen_category_maps_to_sentinel() {
        let vocabulary = CategoricalVocabulary::from_classes(["Organic"]).unwrap();

        assert_eq!(vocabulary.encode("Paid"), UNSEEN_CODE);
        // Lookups are case-sensitive; normalisation is the caller's job.
        assert_eq!(vocabulary.encode("organic"), UNSEEN_CODE);
        assert_eq!(vocabulary.lookup("Paid"), None);
    }

    #[test]
    fn encoding_is_stable_across_calls() {
        let vocabulary = CategoricalVocabulary::from_classes(["a", "b", "c"]).unwrap();

        let first = vocabulary.encode("c");
        for _ in 0..10 {
            assert_eq!(vocabulary.encode("c"), first);
        }
        assert_eq!(first, 2);
    }

    #[test]
    fn rejects_duplicate_classes() {
        assert!(matches!(
            CategoricalVocabulary::from_classes(["ios", "android", "ios"]),
            Err(Error::InvalidArtifact(_))
        ));
        assert!(matches!(
            CategoricalVocabulary::from_json("le_source.json", br#"{"classes": ["x", "x"]}"#),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn serializes_back_to_classes_document() {
        let vocabulary = CategoricalVocabulary::from_classes(["b", "a"]).unwrap();

        assert_eq!(
            serde_json::to_value(&vocabulary).unwrap(),
            serde_json::json!({"classes": ["b", "a"]})
        );
    }
}
