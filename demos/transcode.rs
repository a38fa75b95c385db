//! Transcode example.
//!
//! Feeds one second of synthetic 48kHz stereo audio through the encoder,
//! muting halfway, and prints what the delegate receives.
//!
//! Run with: RUST_LOG=stream_mulaw=debug cargo run --example transcode

use std::sync::Arc;

use stream_mulaw::{AudioEncoder, ChannelDelegate, EncoderOutput, MockSource};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (tx, mut rx) = mpsc::channel::<EncoderOutput>(64);
    let delegate = Arc::new(ChannelDelegate::with_name("demo", tx));

    let encoder = AudioEncoder::builder()
        .delegate(&delegate)
        .on_event(|e| tracing::warn!(?e, "encoder event"))
        .build()?;

    encoder.start();
    encoder.sync().await?;

    let mut source = MockSource::new(48000, 2);
    for i in 0..50 {
        if i == 25 {
            println!("Muting...");
            encoder.set_muted(true);
            encoder.sync().await?;
        }
        encoder.encode(source.sine(440.0, 20));

        // Drain as we go so the bounded channel never fills
        while let Ok(output) = rx.try_recv() {
            match output {
                EncoderOutput::FormatChanged(descriptor) => {
                    println!(
                        "Format: {:?} {}Hz/{}ch",
                        descriptor.encoding, descriptor.sample_rate, descriptor.channels
                    );
                }
                EncoderOutput::Sample(buffer) => {
                    let silent = buffer.data.iter().all(|&b| b == 0xFF);
                    println!(
                        "{:>6.3}s  {} bytes{}",
                        buffer.timing.presentation_timestamp.as_secs_f64(),
                        buffer.data.len(),
                        if silent { "  (silence)" } else { "" }
                    );
                }
            }
        }
    }

    encoder.stop();
    let stats = encoder.stats();
    encoder.shutdown().await?;

    println!("Stats: {:?}", stats);

    Ok(())
}
