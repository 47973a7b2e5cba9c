use std::sync::Arc;

use revenue_predictor::{
    metadata::{EncodingMetadata, FrequencyField},
    model::ModelError,
    ArtifactBundle, CategoricalVocabulary, Error, FeatureMatrix, FieldValue, MetadataStore,
    Predictor, PredictorConfig, RawRecord, UNSEEN_CODE,
};

const ARTIFACTS_DIR: &str = "tests/data/artifacts";

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn predictor() -> Predictor<'static> {
    init();
    PredictorConfig::from_artifact_dir(ARTIFACTS_DIR)
        .to_predictor()
        .unwrap()
}

fn valid_input() -> RawRecord {
    RawRecord::new()
        .with("country", "es")
        .with("country_region", "Madrid")
        .with("source", "Organic")
        .with("platform", "iOS")
        .with("device_family", "Apple iPhone")
        .with("os_version", "14.4")
        .with("event_1", 100)
        .with("event_2", 50)
        .with("event_3", 10)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-12,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn predicts_valid_input() {
    let predictor = predictor();
    let input = valid_input();

    assert!(input.validate_required_fields().is_ok());
    // 0.01 + 160 * 0.0001 + 0.2 * 0.5 + 1 * 0.02
    assert_close(predictor.predict(&input).unwrap(), 0.146);
}

#[test]
fn vector_matches_feature_cols() {
    let predictor = predictor();
    let feature_cols = predictor.model_info().unwrap().features;

    for record in [
        valid_input(),
        RawRecord::new(),
        RawRecord::new().with("event_1", -5).with("platform", "Windows Phone"),
    ] {
        let vector = predictor.encode(&record).unwrap();
        assert_eq!(vector.len(), feature_cols.len());
        assert_eq!(vector.columns().to_vec(), feature_cols);
    }
}

#[test]
fn unseen_categories_use_fallbacks() {
    let predictor = predictor();
    let record = valid_input()
        .with("country", "xx")
        .with("country_region", "Atlantis")
        .with("device_family", "Nokia")
        .with("source", "Referral")
        .with("platform", "Android");

    let vector = predictor.encode(&record).unwrap();

    assert_eq!(vector.get("country_freq"), Some(1.0));
    assert_eq!(vector.get("country_region_freq"), Some(1.0));
    assert_eq!(vector.get("device_family_freq"), Some(1.0));
    assert_eq!(vector.get("source_encoded"), Some(UNSEEN_CODE as f64));
    // Platform is lower-cased before lookup.
    assert_eq!(vector.get("platform_encoded"), Some(0.0));
    assert_close(
        vector.get("country_mean_revenue").unwrap(),
        (0.15 + 0.2 + 0.3) / 3.0,
    );
}

#[test]
fn negative_event_counts_are_not_clamped() {
    let predictor = predictor();
    let record = valid_input()
        .with("event_1", -10)
        .with("event_2", 4)
        .with("event_3", FieldValue::Null);

    let vector = predictor.encode(&record).unwrap();

    assert_eq!(vector.get("event_3"), Some(0.0));
    assert_eq!(vector.get("total_events"), Some(-6.0));
    assert_eq!(vector.get("event_1_ratio"), Some(-10.0 / -5.0));
}

#[test]
fn unseen_country_scenario() {
    init();
    let metadata = EncodingMetadata::builder([
        "total_events",
        "event_1_ratio",
        "event_2_ratio",
        "event_3_ratio",
        "source_encoded",
        "country_mean_revenue",
    ])
    .country_mean_revenue([("es", 0.2), ("us", 0.3)])
    .build()
    .unwrap();
    let store = MetadataStore::new(
        metadata,
        CategoricalVocabulary::from_classes(["Non-organic", "Organic"]).unwrap(),
        CategoricalVocabulary::from_classes(["android", "ios"]).unwrap(),
    );
    let bundle = ArtifactBundle::new(store, |features: &FeatureMatrix| {
        Ok::<_, ModelError>(vec![-1.0; features.n_rows()])
    });
    let predictor = Predictor::from_bundle(Arc::new(bundle));
    let record = RawRecord::new()
        .with("country", "xx")
        .with("source", "Organic")
        .with("platform", "iOS")
        .with("event_1", 0)
        .with("event_2", 0)
        .with("event_3", FieldValue::Null);

    let vector = predictor.encode(&record).unwrap();

    assert_eq!(vector.values(), [0.0, 0.0, 0.0, 0.0, 1.0, 0.25]);
    assert_eq!(predictor.predict(&record).unwrap(), 0.0);
}

#[test]
fn batch_keeps_order_and_isolates_failures() {
    init();
    let store = MetadataStore::new(
        EncodingMetadata::builder(["event_1"]).build().unwrap(),
        CategoricalVocabulary::from_classes(Vec::<String>::new()).unwrap(),
        CategoricalVocabulary::from_classes(Vec::<String>::new()).unwrap(),
    );
    let bundle = ArtifactBundle::new(store, |features: &FeatureMatrix| {
        features
            .rows()
            .iter()
            .map(|row| match row[0] {
                x if x < 0.0 => Err(ModelError::Custom("cannot score".to_owned())),
                x => Ok(x / 10.0),
            })
            .collect::<Result<Vec<f64>, ModelError>>()
    });
    let predictor = Predictor::from_bundle(Arc::new(bundle));
    let records = [
        RawRecord::new().with("event_1", 10).with("event_2", 0),
        RawRecord::new().with("event_1", -1).with("event_2", 0),
        RawRecord::new().with("event_1", 30).with("event_2", 0),
    ];

    let results = predictor.predict_batch(&records);

    assert_eq!(results.len(), 3);
    assert_close(*results[0].as_ref().unwrap(), 1.0);
    assert!(matches!(results[1], Err(Error::ModelInvocation(_))));
    assert_close(*results[2].as_ref().unwrap(), 3.0);
}

#[test]
fn encoding_twice_is_bit_identical() {
    let predictor = predictor();
    let record = valid_input().with("country", "br").with("event_3", 0.3);

    let first = predictor.encode(&record).unwrap();
    let second = predictor.encode(&record).unwrap();

    let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(first.values()), bits(second.values()));
}

#[test]
fn model_info_reports_training_metadata() {
    let info = predictor().model_info().unwrap();

    assert_eq!(info.model_name, "Linear Regression");
    assert_eq!(info.features[0], "event_1");
    assert_eq!(info.metrics.test_r2, Some(0.61));

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["metrics"]["test_mae"], 0.0412);
    assert_eq!(json["format_version"], "1.0.0");
}

#[test]
fn reports_missing_required_fields() {
    let record = RawRecord::new().with("country", "es").with("event_1", 1);

    match record.validate_required_fields() {
        Err(Error::MissingRequiredField(fields)) => {
            assert!(fields.contains(&"platform".to_owned()));
            assert!(!fields.contains(&"country".to_owned()));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn strict_mode_surfaces_schema_drift() {
    init();
    let predictor = PredictorConfig::from_artifact_dir(ARTIFACTS_DIR)
        .strict(true)
        .to_predictor()
        .unwrap();

    assert!(predictor.predict(&valid_input()).is_ok());
    assert!(matches!(
        predictor.predict(&valid_input().with("device_family", "Nokia")),
        Err(Error::UnseenCategory { .. })
    ));
    assert!(matches!(
        predictor.predict(&RawRecord::new().with("event_1", 1).with("event_2", 1)),
        Err(Error::MissingFeatureColumn(_))
    ));
}

#[test]
fn parses_transport_json() {
    let predictor = predictor();
    let record: RawRecord = serde_json::from_str(
        r#"{
            "country": "es",
            "country_region": "Madrid",
            "source": "Organic",
            "platform": "iOS",
            "device_family": "Apple iPhone",
            "os_version": "14.4",
            "event_1": 100,
            "event_2": 50,
            "event_3": 10
        }"#,
    )
    .unwrap();

    assert_eq!(record, valid_input());
    assert_close(predictor.predict(&record).unwrap(), 0.146);
}

#[test]
fn frequency_tables_are_exposed() {
    let predictor = predictor();
    let info = predictor.model_info().unwrap();
    let bundle = ArtifactBundle::from_dir(ARTIFACTS_DIR).unwrap();

    assert_eq!(
        bundle
            .store()
            .metadata()
            .value_counts(FrequencyField::DeviceFamily)
            .and_then(|counts| counts.get("Samsung")),
        Some(&800)
    );
    assert_eq!(info.fingerprint.as_deref(), bundle.fingerprint());
}
