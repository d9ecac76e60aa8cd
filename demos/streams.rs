use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tempo_stream::PaceConfig;
use tempo_stream::futures::{Event, paced};
use tokio::task::JoinSet;

/// Ten paced streams at different rates; the slowest gets throttled further halfway
/// through and one of them is paused for a second.
#[tokio::main(flavor = "multi_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let start = tokio::time::Instant::now();
    let mut handles = JoinSet::new();
    for i in 1..=10u32 {
        let (handle, mut stream) = paced(PaceConfig::per_second(f64::from(i) * 1000.0)).unwrap();
        handle.write(Bytes::from(vec![b'x'; 5_000])).unwrap();
        handle.end();

        let control = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            match i {
                1 => control.set_rate(500.0).unwrap(),
                5 => {
                    control.pause_stream();
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    control.resume_stream();
                }
                _ => {}
            }
        });

        handles.spawn(async move {
            let mut received = 0;
            while let Some(Event::Data(chunk)) = stream.next().await {
                received += chunk.len();
                println!(
                    "[stream={i}] chunk={} received={received}, elapsed={:?}",
                    chunk.len(),
                    start.elapsed()
                );
            }
            println!(
                "[stream={i}] done, flowed for {:?}",
                handle.total_time().unwrap()
            );
        });
    }

    handles.join_all().await;
    println!("Completed in {:?}", start.elapsed());
}
