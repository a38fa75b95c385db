//! Builder pattern for `AudioEncoder`.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::delegate::EncoderDelegate;
use crate::encoder::AudioEncoder;
use crate::engine::{EngineFactory, SoftwareEngineFactory};
use crate::pipeline::{ControlWorker, EncodeDriver};
use crate::stats::StatsCounters;
use crate::{event_callback, EncoderConfig, EncoderEvent, EventCallback, TranscodeError};

/// Builder for configuring and creating an [`AudioEncoder`].
///
/// Use [`AudioEncoder::builder()`] to create a new builder.
///
/// # Example
///
/// ```ignore
/// use stream_mulaw::{AudioEncoder, ChannelDelegate, EncoderOutput};
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
///
/// let (tx, mut rx) = mpsc::channel::<EncoderOutput>(64);
/// let delegate = Arc::new(ChannelDelegate::new(tx));
///
/// let encoder = AudioEncoder::builder()
///     .delegate(&delegate)
///     .on_event(|e| tracing::warn!(?e, "encoder event"))
///     .build()?;
///
/// encoder.start();
/// ```
#[must_use]
pub struct AudioEncoderBuilder {
    /// Encoder configuration.
    config: EncoderConfig,
    /// Builds conversion engines.
    factory: Arc<dyn EngineFactory>,
    /// Weak reference to the caller's delegate.
    delegate: Option<Weak<dyn EncoderDelegate>>,
    /// Event callback.
    event_callback: Option<EventCallback>,
}

impl Default for AudioEncoderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEncoderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: EncoderConfig::default(),
            factory: Arc::new(SoftwareEngineFactory),
            delegate: None,
            event_callback: None,
        }
    }

    /// Set custom encoder configuration.
    pub fn with_config(mut self, config: EncoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the factory used to build conversion engines.
    ///
    /// Default: [`SoftwareEngineFactory`]
    pub fn engine_factory<F: EngineFactory + 'static>(mut self, factory: F) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    /// Set the delegate that receives encoded output.
    ///
    /// Only a weak reference is kept; the caller owns the delegate.
    pub fn delegate<D: EncoderDelegate + 'static>(mut self, delegate: &Arc<D>) -> Self {
        let delegate: Arc<dyn EncoderDelegate> = delegate.clone();
        self.delegate = Some(Arc::downgrade(&delegate));
        self
    }

    /// Set a callback to receive runtime events.
    ///
    /// Events include negotiated formats, dropped buffers, and session failures.
    ///
    /// The callback runs while the encoder's state lock is held, so it must
    /// not call methods on the [`AudioEncoder`] it is registered with. See
    /// [`EventCallback`] for details.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(EncoderEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    /// Create the encoder in the `Idle` state.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - No tokio runtime is available for the control worker
    pub fn build(self) -> Result<AudioEncoder, TranscodeError> {
        self.config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TranscodeError::NoRuntime)?;

        let counters = Arc::new(StatsCounters::default());
        let mut driver = EncodeDriver::new(self.config, self.factory, counters.clone());
        driver.set_event_callback(self.event_callback);
        if let Some(delegate) = self.delegate {
            driver.set_delegate(delegate);
        }
        let driver = Arc::new(Mutex::new(driver));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let worker = ControlWorker::new(driver.clone());
        let worker_handle = runtime.spawn(async move {
            worker.run(command_rx).await;
        });

        Ok(AudioEncoder::new(driver, command_tx, worker_handle, counters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LifecycleState;

    #[test]
    fn test_builder_default() {
        let builder = AudioEncoderBuilder::new();
        assert!(builder.delegate.is_none());
        assert!(builder.event_callback.is_none());
        assert_eq!(builder.config.frames_per_packet, 960);
    }

    #[test]
    fn test_build_without_runtime_fails() {
        let result = AudioEncoder::builder().build();
        assert!(matches!(result, Err(TranscodeError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_config() {
        let config = EncoderConfig {
            frames_per_packet: 0,
            ..Default::default()
        };
        let result = AudioEncoder::builder().with_config(config).build();
        assert!(matches!(result, Err(TranscodeError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_build_starts_idle() {
        let encoder = AudioEncoder::builder().build().unwrap();
        assert_eq!(encoder.state(), LifecycleState::Idle);
        assert!(!encoder.is_running());
    }
}
