use revenue_predictor::{PredictionEvent, PredictorConfig, RawRecord};

pub fn main() -> revenue_predictor::Result<()> {
    // Configure env_logger to see predictor logs.
    env_logger::Builder::from_env(
        env_logger::Env::new().default_filter_or("revenue_predictor=debug"),
    )
    .init();

    let artifacts_dir = std::env::var("REVENUE_ARTIFACTS_DIR")
        .unwrap_or_else(|_| "tests/data/artifacts".to_owned());

    // Prefer the artifact server when configured, falling back to the local directory.
    let config = match std::env::var("REVENUE_ARTIFACTS_URL") {
        Ok(url) => PredictorConfig::from_artifact_url(url).fallback_dir(&artifacts_dir),
        Err(_) => PredictorConfig::from_artifact_dir(&artifacts_dir),
    };
    let predictor = config
        .prediction_logger(|event: PredictionEvent| {
            println!("Logging prediction event: {:?}", event);
        })
        .to_predictor()?;

    let info = predictor.model_info()?;
    println!(
        "Model: {} ({} features, test MAE {:?})",
        info.model_name,
        info.features.len(),
        info.metrics.test_mae
    );

    let record = RawRecord::new()
        .with("country", "es")
        .with("country_region", "Madrid")
        .with("source", "Organic")
        .with("platform", "iOS")
        .with("device_family", "Apple iPhone")
        .with("os_version", "14.4")
        .with("event_1", 100)
        .with("event_2", 50)
        .with("event_3", 10);

    if let Err(err) = record.validate_required_fields() {
        println!("invalid record: {}", err);
    }

    println!("Predicted revenue: {}", predictor.predict(&record)?);

    let batch = [
        record.clone(),
        record.clone().with("country", "xx").with("platform", "Android"),
        RawRecord::new().with("event_1", 3).with("event_2", 1),
    ];
    for (i, result) in predictor.predict_batch(&batch).iter().enumerate() {
        match result {
            Ok(revenue) => println!("Record {i}: {revenue}"),
            Err(err) => println!("Record {i}: error {:?}", err),
        }
    }

    Ok(())
}
