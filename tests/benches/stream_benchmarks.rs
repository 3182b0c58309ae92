//! # Stream Ingestion Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Envelope validation | < 5µs per small envelope |
//! | Pipeline (validate + observe + dispatch) | < 10µs with 4 subscribers |
//! | Payload decoding | < 5µs per tick |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use shared_types::{Channel, Envelope};
use stream_client::{validate_str, StreamPayload, StreamPipeline};

fn tick_wire(sequence: u64) -> String {
    Envelope::new(
        "tick",
        Channel::Market,
        sequence,
        json!({"symbol": "ES", "price": 5012.25, "bid": 5012.0, "ask": 5012.5, "volume": 12.0}),
    )
    .to_wire()
    .unwrap()
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validator");
    let valid = tick_wire(1);
    let missing_channel = r#"{"kind":"tick","sequence":1,"payload":{}}"#;

    group.bench_function("valid_tick", |b| b.iter(|| validate_str(black_box(&valid))));
    group.bench_function("missing_channel", |b| {
        b.iter(|| validate_str(black_box(missing_channel)))
    });
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for subscribers in [0usize, 1, 4, 16] {
        let pipeline = StreamPipeline::new();
        for _ in 0..subscribers {
            pipeline.subscribe(Channel::Market, |env| {
                black_box(env.sequence);
            });
        }
        let frames: Vec<String> = (1..=1_000).map(tick_wire).collect();

        group.throughput(Throughput::Elements(frames.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("process_1000", subscribers),
            &frames,
            |b, frames| {
                b.iter(|| {
                    pipeline.reset_sequence(Channel::Market);
                    for frame in frames {
                        black_box(pipeline.process_text(Channel::Market, frame));
                    }
                })
            },
        );
    }
    group.finish();
}

fn bench_decoding(c: &mut Criterion) {
    let envelope = validate_str(&tick_wire(1)).unwrap();
    c.bench_function("decode_tick_payload", |b| {
        b.iter(|| StreamPayload::decode(black_box(&envelope)))
    });
}

criterion_group!(benches, bench_validation, bench_pipeline, bench_decoding);
criterion_main!(benches);
