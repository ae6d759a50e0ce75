#![forbid(unsafe_code)]

use chartnotes_core::{
    Anchor, AnchorResolver, CardLayout, DraggableResolver, HitTester, LinearCoordinates, Message,
    MessageStore, ScreenPoint, SnapshotContext, build_snapshot,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn coords() -> LinearCoordinates {
    LinearCoordinates::unbounded(4.0, 2.0, 2000.0)
        .with_time_range(0.0, 10_000.0)
        .with_value_range(0.0, 1000.0)
}

fn populated_store(count: usize) -> MessageStore {
    let mut store = MessageStore::new();
    for index in 0..count {
        let time = (index as f64) * 7.5;
        let value = ((index * 37) % 900) as f64;
        store.add(
            Message::new(format!("m{index}"), Anchor::new(time, value))
                .with_username("bench")
                .with_text("lorem ipsum"),
        );
    }
    store
}

fn dragged_resolver(store: &MessageStore) -> AnchorResolver {
    let mut draggable = DraggableResolver::new();
    for (index, message) in store.iter().enumerate().filter(|(index, _)| index % 3 == 0) {
        let start = ScreenPoint::new(0.0, 0.0);
        draggable.begin_drag(message, start);
        draggable.continue_drag(message, ScreenPoint::new(12.0, -((index % 7) as f64)));
        draggable.end_drag(message);
    }
    AnchorResolver::Draggable(draggable)
}

fn bench_hit_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("chartnotes/hit_test");
    let coords = coords();
    let layout = CardLayout::default();

    for count in [16_usize, 128, 1024] {
        let store = populated_store(count);
        let fixed = AnchorResolver::Fixed;
        let draggable = dragged_resolver(&store);

        group.bench_with_input(BenchmarkId::new("fixed_miss", count), &count, |b, _| {
            let tester = HitTester::new(&fixed, &coords, layout);
            b.iter(|| black_box(tester.message_at(store.iter(), ScreenPoint::new(-50.0, -50.0))));
        });

        group.bench_with_input(BenchmarkId::new("draggable_last", count), &count, |b, _| {
            let tester = HitTester::new(&draggable, &coords, layout);
            let last = store.iter().last().and_then(|message| tester.bounds_of(message));
            let probe = last.map_or(ScreenPoint::new(0.0, 0.0), |bounds| bounds.origin());
            b.iter(|| black_box(tester.message_at(store.iter(), probe)));
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("chartnotes/snapshot");
    let coords = coords();
    let layout = CardLayout::default();
    let context = SnapshotContext {
        visible: true,
        ..SnapshotContext::default()
    };

    for count in [16_usize, 256] {
        let store = populated_store(count);
        let resolver = dragged_resolver(&store);
        group.bench_with_input(BenchmarkId::new("build", count), &count, |b, _| {
            b.iter(|| {
                let snapshot = build_snapshot(&store, &resolver, &coords, &layout, context);
                black_box(snapshot.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hit_test, bench_snapshot);
criterion_main!(benches);
