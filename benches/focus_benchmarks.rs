//! Performance benchmarks for the Axiom focus core
//!
//! Focus transitions run on every click and every window map, so ring
//! traversal and focus churn must stay cheap even with many clients.

use axiom_focus::backend::RecordingBackend;
use axiom_focus::{
    AxiomFocusConfig, ClientHints, ClientId, FocusFlags, FocusManager, GroupId, ScreenId,
    Timestamp,
};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

const SCREEN: ScreenId = ScreenId(0);

fn populated(count: u64) -> FocusManager<RecordingBackend> {
    let mut manager = FocusManager::new(RecordingBackend::new(), AxiomFocusConfig::default());
    manager.add_screen(SCREEN, 0);
    for id in 1..=count {
        manager.client_created(ClientId(id), SCREEN, ClientHints::default(), Timestamp(id as u32));
    }
    manager
}

/// Benchmark ring traversal when most clients are blocked by a modal dialog
fn bench_ring_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_traversal");

    for count in [10u64, 50, 100, 500].iter() {
        let mut manager = FocusManager::new(RecordingBackend::new(), AxiomFocusConfig::default());
        manager.add_screen(SCREEN, 0);
        let grouped = ClientHints {
            group: Some(GroupId(1)),
            ..ClientHints::default()
        };
        for id in 1..=*count {
            manager.client_created(ClientId(id), SCREEN, grouped.clone(), Timestamp(id as u32));
        }
        let modal = ClientHints {
            modal: true,
            ..grouped
        };
        let modal_id = ClientId(count + 1);
        manager.client_created(modal_id, SCREEN, modal, Timestamp(*count as u32 + 1));

        group.bench_function(format!("next_with_{}_blocked", count), |b| {
            b.iter(|| black_box(manager.next(black_box(modal_id), FocusFlags::NONE)));
        });
    }

    group.finish();
}

/// Benchmark click-driven focus churn including grab hand-over
fn bench_focus_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("focus_churn");

    for count in [10u64, 100].iter() {
        group.bench_function(format!("clicks_across_{}_clients", count), |b| {
            b.iter_batched(
                || populated(*count),
                |mut manager| {
                    for step in 0..100u64 {
                        let target = ClientId(step % count + 1);
                        manager.button_press(target, Timestamp(10_000 + step as u32));
                    }
                    black_box(manager.get_focus())
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark destroy hand-off, which re-runs focus_top each time
fn bench_destroy_handoff(c: &mut Criterion) {
    c.bench_function("destroy_focused_100", |b| {
        b.iter_batched(
            || populated(100),
            |mut manager| {
                for step in 0..50u32 {
                    if let Some(focused) = manager.get_focus() {
                        manager.unmanage_client(focused, Timestamp(20_000 + step));
                    }
                }
                black_box(manager.ring(SCREEN).len())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_ring_traversal,
    bench_focus_churn,
    bench_destroy_handoff
);
criterion_main!(benches);
