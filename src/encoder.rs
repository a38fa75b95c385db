//! Public encoder handle.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::builder::AudioEncoderBuilder;
use crate::config::Profile;
use crate::delegate::EncoderDelegate;
use crate::format::SourceFormat;
use crate::lifecycle::LifecycleState;
use crate::pipeline::{EncodeDriver, EncoderCommand};
use crate::sample::SampleBuffer;
use crate::settings::{Settings, SettingsUpdate};
use crate::stats::{EncoderStats, StatsCounters};
use crate::TranscodeError;

/// Streaming PCM to 8kHz mono mu-law encoder.
///
/// The `AudioEncoder` is returned by [`AudioEncoderBuilder::build()`].
/// [`encode()`](Self::encode) runs synchronously on the calling thread and
/// hands output to the delegate before returning. Lifecycle and settings
/// methods return immediately; a background task applies them in the order
/// they were called.
///
/// # Lifecycle
///
/// 1. Created `Idle` by [`AudioEncoderBuilder::build()`]
/// 2. [`start()`](Self::start) begins accepting buffers
/// 3. [`stop()`](Self::stop) releases the conversion session
/// 4. [`start()`](Self::start) again renegotiates from the next buffer
///
/// Use [`sync()`](Self::sync) to wait until earlier commands have been
/// applied.
///
/// # Example
///
/// ```ignore
/// let encoder = AudioEncoder::builder().delegate(&delegate).build()?;
///
/// encoder.start();
/// encoder.sync().await?;
///
/// for buffer in capture {
///     encoder.encode(buffer);
/// }
///
/// encoder.stop();
/// encoder.shutdown().await?;
/// ```
pub struct AudioEncoder {
    driver: Arc<Mutex<EncodeDriver>>,
    commands: mpsc::UnboundedSender<EncoderCommand>,
    worker: Option<JoinHandle<()>>,
    counters: Arc<StatsCounters>,
}

impl AudioEncoder {
    /// Creates a new builder for configuring an encoder.
    pub fn builder() -> AudioEncoderBuilder {
        AudioEncoderBuilder::new()
    }

    pub(crate) fn new(
        driver: Arc<Mutex<EncodeDriver>>,
        commands: mpsc::UnboundedSender<EncoderCommand>,
        worker: JoinHandle<()>,
        counters: Arc<StatsCounters>,
    ) -> Self {
        Self {
            driver,
            commands,
            worker: Some(worker),
            counters,
        }
    }

    /// Encodes one buffer of PCM audio.
    ///
    /// Returns `true` if encoded output was produced and handed to the
    /// delegate. Buffers are dropped while the encoder is not running, when
    /// they carry no format or no data, or when conversion fails.
    pub fn encode(&self, buffer: SampleBuffer) -> bool {
        self.driver.lock().encode(buffer)
    }

    /// Begin accepting buffers.
    pub fn start(&self) {
        self.send(EncoderCommand::Start);
    }

    /// Stop accepting buffers and release the conversion session.
    pub fn stop(&self) {
        self.send(EncoderCommand::Stop);
    }

    /// Release the conversion session and negotiated formats without
    /// changing the lifecycle state.
    pub fn invalidate(&self) {
        self.send(EncoderCommand::Invalidate);
    }

    /// Mute or unmute. Muted input is encoded as silence.
    pub fn set_muted(&self, muted: bool) {
        self.send(EncoderCommand::Update(SettingsUpdate::Muted(muted)));
    }

    /// Set the target bitrate. Applied to a live session immediately.
    pub fn set_bitrate(&self, bitrate: u32) {
        self.send(EncoderCommand::Update(SettingsUpdate::Bitrate(bitrate)));
    }

    /// Record a profile hint.
    pub fn set_profile(&self, profile: Profile) {
        self.send(EncoderCommand::Update(SettingsUpdate::Profile(profile)));
    }

    /// Record a sample rate hint.
    pub fn set_sample_rate(&self, sample_rate: u32) {
        self.send(EncoderCommand::Update(SettingsUpdate::SampleRate(sample_rate)));
    }

    /// Record a channel count hint.
    pub fn set_channels(&self, channels: u16) {
        self.send(EncoderCommand::Update(SettingsUpdate::Channels(channels)));
    }

    /// Set the delegate that receives encoded output.
    ///
    /// Only a weak reference is kept; output is discarded once the caller
    /// drops the delegate. Takes effect for the next encode call.
    pub fn set_delegate<D: EncoderDelegate + 'static>(&self, delegate: &Arc<D>) {
        let delegate: Arc<dyn EncoderDelegate> = delegate.clone();
        self.driver.lock().set_delegate(Arc::downgrade(&delegate));
    }

    /// Remove the delegate.
    pub fn clear_delegate(&self) {
        self.driver.lock().clear_delegate();
    }

    /// Waits until every command sent before this call has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`TranscodeError::WorkerClosed`] if the control worker is gone.
    pub async fn sync(&self) -> Result<(), TranscodeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(EncoderCommand::Sync(reply_tx))
            .map_err(|_| TranscodeError::WorkerClosed)?;
        reply_rx.await.map_err(|_| TranscodeError::WorkerClosed)
    }

    /// Current settings.
    pub fn settings(&self) -> Settings {
        self.driver.lock().settings()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.driver.lock().state()
    }

    /// Returns `true` if buffers are being accepted.
    pub fn is_running(&self) -> bool {
        self.driver.lock().is_running()
    }

    /// The negotiated source format, if any.
    pub fn source_format(&self) -> Option<SourceFormat> {
        self.driver.lock().source_format()
    }

    /// Returns `true` if a conversion session is live.
    pub fn has_session(&self) -> bool {
        self.driver.lock().has_session()
    }

    /// Bitrate of the live conversion session, if any.
    pub fn session_bitrate(&self) -> Option<u32> {
        self.driver.lock().session_bitrate()
    }

    /// Returns current encoder statistics.
    pub fn stats(&self) -> EncoderStats {
        self.counters.snapshot()
    }

    /// Applies all pending commands and waits for the control worker to exit.
    ///
    /// # Errors
    ///
    /// Returns [`TranscodeError::WorkerClosed`] if the worker panicked.
    pub async fn shutdown(mut self) -> Result<(), TranscodeError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        // Closing the channel ends the worker after it drains
        let (closed_tx, _) = mpsc::unbounded_channel();
        drop(std::mem::replace(&mut self.commands, closed_tx));
        worker.await.map_err(|_| TranscodeError::WorkerClosed)
    }

    fn send(&self, command: EncoderCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!("encoder worker closed; command discarded");
        }
    }
}

impl std::fmt::Debug for AudioEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEncoder")
            .field("driver", &*self.driver.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn buffer() -> SampleBuffer {
        SampleBuffer::from_i16(&[500i16; 320], 16000, 1, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_start_then_encode() {
        let encoder = AudioEncoder::builder().build().unwrap();
        assert!(!encoder.encode(buffer()));

        encoder.start();
        encoder.sync().await.unwrap();
        assert!(encoder.is_running());
        assert!(encoder.encode(buffer()));

        let stats = encoder.stats();
        assert_eq!(stats.buffers_encoded, 1);
        assert_eq!(stats.frames_dropped, 1);
    }

    #[tokio::test]
    async fn test_settings_applied_in_order() {
        let encoder = AudioEncoder::builder().build().unwrap();
        encoder.set_muted(true);
        encoder.set_bitrate(32_000);
        encoder.set_channels(2);
        encoder.set_sample_rate(48000);
        encoder.set_profile(Profile::LowLatency);
        encoder.sync().await.unwrap();

        let settings = encoder.settings();
        assert!(settings.muted);
        assert_eq!(settings.bitrate, 32_000);
        assert_eq!(settings.channels, 2);
        assert_eq!(settings.sample_rate, Some(48000));
        assert_eq!(settings.profile, Profile::LowLatency);
    }

    #[tokio::test]
    async fn test_shutdown_drains_commands() {
        let encoder = AudioEncoder::builder().build().unwrap();
        encoder.start();
        let driver = encoder.driver.clone();
        encoder.shutdown().await.unwrap();
        assert!(driver.lock().is_running());
    }
}
