//! Second pipeline stage: frequency and target encoding.
use crate::{
    metadata::{EncodingMetadata, FrequencyField},
    Error, RawRecord, Result,
};

use super::FeatureFrame;

/// Frequency assigned to a category that is absent from the training-time count table: the
/// category is treated as having been observed exactly once.
pub const UNSEEN_FREQUENCY: f64 = 1.0;

/// Lower-case a platform name so that encoding is insensitive to input casing.
pub fn normalize_platform(platform: &str) -> String {
    platform.to_lowercase()
}

/// Frequency encoding of a single category. `None` means the category was not seen at training
/// time.
pub fn frequency(metadata: &EncodingMetadata, field: FrequencyField, category: &str) -> Option<f64> {
    metadata
        .value_counts(field)?
        .get(category)
        .map(|count| *count as f64)
}

/// Target encoding of a country, falling back to the global mean for unseen countries.
///
/// Returns `None` only if the bundle has no (or an empty) `country_mean_revenue` table.
pub fn country_mean_revenue(metadata: &EncodingMetadata, country: Option<&str>) -> Option<f64> {
    let table = metadata.country_mean_revenue()?;
    country
        .and_then(|country| table.get(country).copied())
        .or_else(|| metadata.global_mean_revenue())
}

/// Second pipeline stage: frequency and target encoding.
///
/// A column is only produced if the record carries the field and the bundle carries the matching
/// table. A field that is present but null (or not a string) is encoded as an unseen category.
pub(crate) fn apply(
    metadata: &EncodingMetadata,
    record: &RawRecord,
    frame: &mut FeatureFrame,
    strict: bool,
) -> Result<()> {
    for field in FrequencyField::ALL {
        if !record.contains(field.field()) {
            continue;
        }
        if metadata.value_counts(field).is_none() {
            continue;
        }

        let category = record.category(field.field());
        let value = match category.and_then(|c| frequency(metadata, field, c)) {
            Some(count) => count,
            None => {
                log::trace!(target: "revenue_predictor",
                            field = field.field(),
                            category:? = category;
                            "unseen category, using default frequency");
                if strict {
                    return Err(unseen(field.field(), category));
                }
                UNSEEN_FREQUENCY
            }
        };
        frame.set(field.column(), value);
    }

    if record.contains("country") {
        let country = record.category("country");
        // An empty table is treated like an absent one.
        if let Some(table) = metadata.country_mean_revenue().filter(|t| !t.is_empty()) {
            if strict && !country.is_some_and(|c| table.contains_key(c)) {
                return Err(unseen("country", country));
            }
        }
        if let Some(value) = country_mean_revenue(metadata, country) {
            frame.set("country_mean_revenue", value);
        }
    }

    Ok(())
}

fn unseen(field: &str, category: Option<&str>) -> Error {
    Error::UnseenCategory {
        field: field.to_owned(),
        value: category.map(str::to_owned),
    }
}
