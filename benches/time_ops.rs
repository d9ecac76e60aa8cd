use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tempo_stream::{Clock, FastClock, PaceConfig, Pacer, QuantaClock, StdClock, TokioClock};

/// Clock read, conversion to active time and extrapolation of the expected-bytes curve:
/// the fixed cost every paced tick pays before it touches the queue.
fn expected_bytes<C: Clock>(c: &mut Criterion, name: &str, clock: C) {
    let mut group = c.benchmark_group("expected_bytes");
    let mut pacer = Pacer::with_clock(PaceConfig::per_second(1_000_000.0), clock).unwrap();
    group.bench_function(BenchmarkId::new(name, "running"), |b| {
        b.iter(|| pacer.expected_bytes_at(pacer.clock().now()));
    });
    pacer.pause();
    group.bench_function(BenchmarkId::new(name, "paused"), |b| {
        b.iter(|| pacer.expected_bytes_at(pacer.clock().now()));
    });
    group.finish();
}

fn timeline(c: &mut Criterion) {
    let q_clock = quanta::Clock::new();
    let _quanta_thread = quanta::Upkeep::new_with_clock(Duration::from_micros(10), q_clock.clone())
        .start()
        .unwrap();

    expected_bytes(c, "std", StdClock::default());
    expected_bytes(c, "tokio", TokioClock::default());
    expected_bytes(c, "quanta", QuantaClock::default());
    expected_bytes(c, "quanta-fast", FastClock::new(q_clock));
}

criterion_group!(time_benches, timeline);
criterion_main!(time_benches);
