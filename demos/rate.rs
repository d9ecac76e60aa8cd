use std::time::Duration;

use futures::StreamExt;
use nonzero_ext::nonzero;
use tempo_stream::PaceConfig;
use tempo_stream::futures::{Event, PaceStreamExt};
use tokio::io::AsyncWriteExt;
use tokio_stream::wrappers::ReceiverStream;

/// Prints a file at 10 bytes per second, one burst per second.
///
/// `cargo run --example rate -- [path]`, defaults to this file.
#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/demos/rate.rs").to_owned());
    let contents = tokio::fs::read(&path).await?;
    eprintln!("Reading {path} at a constant rate of 10 B/s, one burst every second");

    let (tx, rx) = tokio::sync::mpsc::channel::<Vec<u8>>(4);
    tokio::spawn(async move {
        for line in contents.split_inclusive(|b| *b == b'\n') {
            if tx.send(line.to_vec()).await.is_err() {
                break;
            }
        }
    });

    let config = PaceConfig::per_second(10.0).with_period_ms(nonzero!(1000u64));
    let mut paced = std::pin::pin!(
        ReceiverStream::new(rx)
            .paced(config)
            .map_err(std::io::Error::from)?
    );
    let handle = paced.handle();

    let mut stdout = tokio::io::stdout();
    let mut total = 0;
    while let Some(event) = paced.next().await {
        match event {
            Event::Data(chunk) => {
                total += chunk.len();
                stdout.write_all(&chunk).await?;
                stdout.flush().await?;
            }
            Event::End => break,
        }
    }
    let flowed = handle.total_time().unwrap_or(Duration::ZERO);
    eprintln!("\nTotal length: {total} bytes in {flowed:?}");
    Ok(())
}
