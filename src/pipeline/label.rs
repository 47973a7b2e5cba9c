//! Third pipeline stage: label encoding.
use crate::{metadata::MetadataStore, vocabulary::UNSEEN_CODE, Error, RawRecord, Result};

use super::{categorical::normalize_platform, FeatureFrame};

/// Third pipeline stage: label encoding of `source` and `platform`.
///
/// `platform` is lower-cased before lookup. Fields absent from the record produce no column;
/// null or non-string values encode as [`UNSEEN_CODE`].
pub(crate) fn apply(
    store: &MetadataStore,
    record: &RawRecord,
    frame: &mut FeatureFrame,
    strict: bool,
) -> Result<()> {
    if record.contains("source") {
        let source = record.category("source");
        let code = source.and_then(|s| store.source_vocabulary().lookup(s));
        frame.set("source_encoded", resolve("source", source, code, strict)?);
    }

    if record.contains("platform") {
        let platform = record.category("platform").map(normalize_platform);
        let code = platform
            .as_deref()
            .and_then(|p| store.platform_vocabulary().lookup(p));
        frame.set(
            "platform_encoded",
            resolve("platform", platform.as_deref(), code, strict)?,
        );
    }

    Ok(())
}

fn resolve(field: &str, category: Option<&str>, code: Option<i64>, strict: bool) -> Result<f64> {
    match code {
        Some(code) => Ok(code as f64),
        None if strict => Err(Error::UnseenCategory {
            field: field.to_owned(),
            value: category.map(str::to_owned),
        }),
        None => {
            log::trace!(target: "revenue_predictor", field, category:? = category; "unseen label");
            Ok(UNSEEN_CODE as f64)
        }
    }
}
