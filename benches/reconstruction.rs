//! Performance benchmarks for diagram reconstruction.
//!
//! Run with: `cargo bench --bench reconstruction`
//!
//! Batches are single conversations, so sizes stay in the hundreds.

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use conversation_kernel::{
    CreatorOptions, EndpointAddress, MessageForest, MessageIntent, ModelCreator, StoredMessage,
};

const ENDPOINTS: [&str; 4] = ["Web", "Sales", "Billing", "Shipping"];

/// Build a conversation where every message fans out to up to three children.
fn make_batch(message_count: usize) -> Vec<StoredMessage> {
    let mut messages: Vec<StoredMessage> = (0..message_count)
        .map(|i| {
            let sent = Utc.timestamp_opt(1_400_000_000 + i as i64, 0).unwrap();
            let processed = Utc.timestamp_opt(1_400_000_000 + i as i64 + 1, 0).unwrap();
            let from = EndpointAddress::new(ENDPOINTS[i % ENDPOINTS.len()], "host", "id");
            let to = EndpointAddress::new(ENDPOINTS[(i + 1) % ENDPOINTS.len()], "host", "id");
            let intent = if i % 3 == 0 {
                MessageIntent::Publish
            } else {
                MessageIntent::Send
            };

            let mut message = StoredMessage::new(format!("m{}", i), from, to, format!("Shop.Msg{}, Shop", i))
                .with_intent(intent)
                .with_times(sent, processed)
                .with_header("NServiceBus.Version", "5.0.0");
            if i > 0 {
                message = message.with_header("NServiceBus.RelatedTo", format!("m{}", (i - 1) / 3));
            }
            message
        })
        .collect();

    // Audit order is not causal order.
    messages.reverse();
    messages
}

/// Benchmark the full pipeline.
fn bench_create(c: &mut Criterion) {
    let creator = ModelCreator::default();
    let mut group = c.benchmark_group("create");

    for message_count in [10, 100, 500] {
        let batch = make_batch(message_count);

        group.throughput(Throughput::Elements(message_count as u64));
        group.bench_with_input(
            BenchmarkId::new("messages", message_count),
            &batch,
            |b, batch| {
                b.iter(|| {
                    let diagram = creator.create(black_box(batch)).unwrap();
                    assert_eq!(diagram.num_arrows(), batch.len());
                    diagram
                })
            },
        );
    }

    group.finish();
}

/// Benchmark forest construction and traversal alone.
fn bench_walk(c: &mut Criterion) {
    let options = CreatorOptions::default();
    let mut group = c.benchmark_group("walk");

    for message_count in [10, 100, 500] {
        let batch = make_batch(message_count);

        group.throughput(Throughput::Elements(message_count as u64));
        group.bench_with_input(
            BenchmarkId::new("messages", message_count),
            &batch,
            |b, batch| {
                b.iter(|| MessageForest::build(black_box(batch), &options).walk().count())
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_create, bench_walk);
criterion_main!(benches);
