use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use revenue_predictor::{FeaturePipeline, PredictorConfig, RawRecord};

fn record(i: i64) -> RawRecord {
    RawRecord::new()
        .with("country", if i % 2 == 0 { "es" } else { "xx" })
        .with("country_region", "Madrid")
        .with("source", "Organic")
        .with("platform", "iOS")
        .with("device_family", "Apple iPhone")
        .with("os_version", "14.4")
        .with("event_1", i)
        .with("event_2", 50)
        .with("event_3", 10)
}

fn criterion_benchmark(c: &mut Criterion) {
    let predictor = PredictorConfig::from_artifact_dir("tests/data/artifacts")
        .to_predictor()
        .unwrap();
    let bundle = predictor.store().get_bundle().unwrap();
    let pipeline = FeaturePipeline::new(bundle.store());

    {
        let mut group = c.benchmark_group("single-record");
        group.throughput(Throughput::Elements(1));
        let record = record(100);
        group.bench_function("encode", |b| {
            b.iter(|| pipeline.encode(black_box(&record)))
        });
        group.bench_function("predict", |b| {
            b.iter(|| predictor.predict(black_box(&record)))
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("batch");
        let records = (0..1000).map(record).collect::<Vec<_>>();
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_function("encode_batch", |b| {
            b.iter(|| pipeline.encode_batch(black_box(&records)))
        });
        group.bench_function("predict_batch", |b| {
            b.iter(|| predictor.predict_batch(black_box(&records)))
        });
        group.finish();
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
