use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use tempo_stream::{ManualClock, PaceConfig, Pacer, QuantaClock, Tick, Trigger};

const PAYLOAD: usize = 1 << 20;

/// Runs a full transfer on a manual clock, jumping straight to every tick deadline.
fn transfer(pacer: &mut Pacer<Arc<ManualClock>>) -> usize {
    let mut delivered = 0;
    loop {
        match pacer.tick() {
            Tick::Data(chunk) => delivered += chunk.len(),
            Tick::Wait(Trigger::After(delay)) => pacer.clock().advance(delay),
            Tick::End => return delivered,
            other => panic!("unexpected {other:?}"),
        }
    }
}

fn bench_transfer(c: &mut Criterion) {
    let payload = Bytes::from(vec![0xa5u8; PAYLOAD]);
    let mut group = c.benchmark_group("transfer");
    group.throughput(Throughput::Bytes(PAYLOAD as u64)).sample_size(50);

    for (name, config) in [
        ("passthrough", PaceConfig::unlimited()),
        ("paced-100ms", PaceConfig::per_second(1_000_000.0)),
        (
            "paced-1ms",
            PaceConfig::per_second(1_000_000.0).with_period(Duration::from_millis(1)),
        ),
    ] {
        group.bench_function(name, |b| {
            b.iter_batched(
                || {
                    let clock = Arc::new(ManualClock::default());
                    let mut pacer = Pacer::with_clock(config, clock).unwrap();
                    // many small writes so reads have to coalesce
                    for chunk in 0..PAYLOAD / 4096 {
                        pacer
                            .write(payload.slice(chunk * 4096..(chunk + 1) * 4096))
                            .unwrap();
                    }
                    pacer.end();
                    pacer
                },
                |mut pacer| black_box(transfer(&mut pacer)),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_idle_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group
        .throughput(Throughput::Elements(1))
        .sample_size(100)
        .bench_function("not-due-quanta-clock", |b| {
            let mut pacer =
                Pacer::with_clock(PaceConfig::per_second(1000.0), QuantaClock::default())
                    .unwrap();
            pacer.write(vec![0u8; 1024]).unwrap();
            b.iter(|| black_box(pacer.tick()));
        })
        .bench_function("rate-change-manual-clock", |b| {
            let clock = ManualClock::default();
            let mut pacer = Pacer::with_clock(PaceConfig::per_second(1000.0), &clock).unwrap();
            let mut rate = 1000.0;
            b.iter(|| {
                clock.advance(Duration::from_micros(10));
                rate = if rate == 1000.0 { 2000.0 } else { 1000.0 };
                pacer.set_rate(black_box(rate)).unwrap();
            });
        });
    group.finish();
}

criterion_group!(benches, bench_transfer, bench_idle_tick);
criterion_main!(benches);
