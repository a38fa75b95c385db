//! Per-buffer encode cycle and the state it runs against.

use std::sync::{Arc, Weak};

use crate::config::EncoderConfig;
use crate::delegate::EncoderDelegate;
use crate::engine::{ConverterSession, EngineFactory};
use crate::format::{DestinationFormat, FormatNegotiator, LinearResampler, SourceFormat};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::pipeline::{OutputStaging, StagedInput, StagedSupplier};
use crate::sample::{frames_to_duration, EncodedSampleBuffer, SampleBuffer, SampleTiming};
use crate::settings::{LiveAction, Settings, SettingsStore, SettingsUpdate};
use crate::stats::StatsCounters;
use crate::{DropReason, EncoderEvent, EventCallback};

/// All mutable encoder state.
///
/// Every method runs under the encoder's state lock, so encode calls and
/// control commands are serialized against each other.
pub(crate) struct EncodeDriver {
    config: EncoderConfig,
    lifecycle: Lifecycle,
    settings: SettingsStore,
    negotiator: FormatNegotiator,
    session: ConverterSession,
    delegate: Option<Weak<dyn EncoderDelegate>>,
    event_callback: Option<EventCallback>,
    counters: Arc<StatsCounters>,
}

impl EncodeDriver {
    pub fn new(
        config: EncoderConfig,
        factory: Arc<dyn EngineFactory>,
        counters: Arc<StatsCounters>,
    ) -> Self {
        let destination = DestinationFormat::mulaw(config.frames_per_packet);
        Self {
            settings: SettingsStore::new(Settings::from_config(&config)),
            negotiator: FormatNegotiator::new(destination),
            session: ConverterSession::new(factory),
            lifecycle: Lifecycle::default(),
            delegate: None,
            event_callback: None,
            counters,
            config,
        }
    }

    pub fn set_event_callback(&mut self, callback: Option<EventCallback>) {
        self.event_callback = callback;
    }

    pub fn set_delegate(&mut self, delegate: Weak<dyn EncoderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn settings(&self) -> Settings {
        self.settings.current().clone()
    }

    pub fn source_format(&self) -> Option<SourceFormat> {
        self.negotiator.source()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_active()
    }

    pub fn session_bitrate(&self) -> Option<u32> {
        self.session.bitrate()
    }

    pub fn start(&mut self) {
        if self.lifecycle.start() {
            tracing::info!("encoder started");
        } else {
            tracing::debug!("start ignored; encoder already running");
        }
    }

    /// Stops the encoder and releases the session and negotiated formats.
    pub fn stop(&mut self) {
        if !self.lifecycle.stop() {
            tracing::debug!(state = ?self.lifecycle.state(), "stop ignored; encoder not running");
            return;
        }
        self.session.dispose();
        self.negotiator.invalidate();
        tracing::info!("encoder stopped");
    }

    /// Releases the session and negotiated formats without changing state.
    pub fn invalidate(&mut self) {
        self.session.dispose();
        self.negotiator.invalidate();
        tracing::debug!("encoder invalidated");
    }

    pub fn apply_settings(&mut self, update: SettingsUpdate) {
        for action in self.settings.apply(update) {
            match action {
                LiveAction::SetBitrate(bitrate) => {
                    if !self.session.set_bitrate(bitrate) {
                        tracing::debug!(bitrate, "no live session; bitrate applies to the next one");
                    }
                }
            }
        }
    }

    /// Encodes one buffer. Returns `true` if the delegate was handed output.
    pub fn encode(&mut self, buffer: SampleBuffer) -> bool {
        match self.try_encode(buffer) {
            Ok(encoded) => {
                self.deliver(encoded);
                true
            }
            Err(reason) => {
                StatsCounters::incr(&self.counters.frames_dropped);
                tracing::trace!(?reason, "input buffer dropped");
                self.emit(EncoderEvent::FrameDropped { reason });
                false
            }
        }
    }

    fn try_encode(&mut self, buffer: SampleBuffer) -> Result<EncodedSampleBuffer, DropReason> {
        if !self.lifecycle.is_running() {
            return Err(DropReason::NotRunning);
        }

        let SampleBuffer {
            format,
            data,
            timing,
        } = buffer;
        let format = format.ok_or(DropReason::MissingFormat)?;
        let mut data = data
            .filter(|list| !list.is_empty())
            .ok_or(DropReason::MissingData)?;

        let source = match self.negotiator.source() {
            Some(source) => source,
            None => {
                let source = self.negotiator.negotiate(&format);
                StatsCounters::incr(&self.counters.negotiations);
                self.emit(EncoderEvent::FormatNegotiated { format: source });
                source
            }
        };

        let settings = self.settings.current();
        if settings.muted {
            data.zero_fill();
        }
        let bitrate = settings.bitrate;
        let input_frames = data
            .buffers
            .first()
            .map_or(0, |buffer| buffer.data.len() / source.bytes_per_frame.max(1));

        let staged = StagedInput::stage(data, self.counters.clone());

        let destination = self.negotiator.destination();
        match self.session.ensure_session(
            &source,
            &destination,
            &self.config.codec_priority,
            bitrate,
        ) {
            Ok(true) => StatsCounters::incr(&self.counters.sessions_created),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "conversion session unavailable; dropping buffer");
                self.emit(EncoderEvent::SessionUnavailable {
                    error: e.to_string(),
                });
                return Err(DropReason::SessionUnavailable);
            }
        }

        let capacity = self.output_capacity(&source, input_frames);
        let mut output = OutputStaging::allocate(capacity, self.counters.clone());
        let mut supplier = StagedSupplier::new(staged);

        let status = self
            .session
            .fill(&mut supplier, &mut output)
            .ok_or(DropReason::SessionUnavailable)?;

        if !supplier.is_consumed() {
            tracing::debug!(pulls = supplier.pulls(), "fill finished without pulling input");
        }
        drop(supplier);

        if !status.is_success() {
            tracing::warn!(status = status.code(), "fill cycle failed");
            return Err(DropReason::FillFailed {
                status: status.code(),
            });
        }
        if output.is_empty() {
            return Err(DropReason::NoOutput);
        }

        let delegate = self.delegate.as_ref().and_then(Weak::upgrade);
        let descriptor = self.negotiator.destination_descriptor(|descriptor| {
            if let Some(delegate) = &delegate {
                delegate.on_format_changed(descriptor);
            }
        });

        let bytes = output.take_bytes();
        let sample_count = bytes.len() / destination.bytes_per_frame.max(1) as usize;
        let duration = frames_to_duration(sample_count as u64, destination.sample_rate);

        Ok(EncodedSampleBuffer {
            descriptor,
            data: Arc::new(bytes),
            timing: SampleTiming::new(timing.presentation_timestamp, duration),
            sample_count,
        })
    }

    /// Output buffer size for one fill.
    ///
    /// Large enough for the whole staged input once encoded, capped at the
    /// configured maximum, and never below the engine's maximum output packet
    /// size. Falls back to the configured maximum when the query fails or
    /// reports zero.
    fn output_capacity(&self, source: &SourceFormat, input_frames: usize) -> usize {
        let destination = self.negotiator.destination();
        let required = LinearResampler::output_bound(
            input_frames,
            source.sample_rate,
            destination.sample_rate,
        ) * destination.bytes_per_frame as usize;
        let error = match self.session.max_output_packet_size() {
            Ok(size) if size > 0 => {
                return size.max(required.min(self.config.max_packet_size));
            }
            Ok(_) => "engine reported a zero packet size".to_string(),
            Err(e) => e.to_string(),
        };
        let fallback_bytes = self.config.max_packet_size;
        tracing::warn!(%error, fallback_bytes, "using fallback output buffer size");
        StatsCounters::incr(&self.counters.output_size_fallbacks);
        self.emit(EncoderEvent::OutputSizeFallback {
            fallback_bytes,
            error,
        });
        fallback_bytes
    }

    fn deliver(&self, encoded: EncodedSampleBuffer) {
        StatsCounters::incr(&self.counters.buffers_encoded);
        match self.delegate.as_ref().and_then(Weak::upgrade) {
            Some(delegate) => delegate.on_encoded_sample(encoded),
            None => tracing::trace!(bytes = encoded.data.len(), "no delegate; encoded output discarded"),
        }
    }

    fn emit(&self, event: EncoderEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }
}

impl std::fmt::Debug for EncodeDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodeDriver")
            .field("state", &self.lifecycle.state())
            .field("settings", self.settings.current())
            .field("source", &self.negotiator.source())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        CodecDescription, ConversionEngine, FillStatus, SoftwareEngineFactory,
    };
    use crate::format::FormatDescriptor;
    use crate::pipeline::InputSupplier;
    use crate::TranscodeError;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingDelegate {
        formats: Mutex<Vec<FormatDescriptor>>,
        samples: Mutex<Vec<EncodedSampleBuffer>>,
    }

    impl EncoderDelegate for RecordingDelegate {
        fn on_format_changed(&self, descriptor: &FormatDescriptor) {
            self.formats.lock().push(*descriptor);
        }

        fn on_encoded_sample(&self, buffer: EncodedSampleBuffer) {
            self.samples.lock().push(buffer);
        }
    }

    fn driver_with(factory: Arc<dyn EngineFactory>) -> (EncodeDriver, Arc<StatsCounters>) {
        let counters = Arc::new(StatsCounters::default());
        let driver = EncodeDriver::new(EncoderConfig::default(), factory, counters.clone());
        (driver, counters)
    }

    fn running_driver() -> (EncodeDriver, Arc<RecordingDelegate>, Arc<StatsCounters>) {
        let (mut driver, counters) = driver_with(Arc::new(SoftwareEngineFactory));
        let delegate = Arc::new(RecordingDelegate::default());
        let dyn_delegate: Arc<dyn EncoderDelegate> = delegate.clone();
        driver.set_delegate(Arc::downgrade(&dyn_delegate));
        driver.start();
        (driver, delegate, counters)
    }

    fn speech_20ms(pts_ms: u64) -> SampleBuffer {
        SampleBuffer::from_i16(&[1000i16; 320], 16000, 1, Duration::from_millis(pts_ms))
    }

    #[test]
    fn test_encode_when_idle_drops() {
        let (mut driver, counters) = driver_with(Arc::new(SoftwareEngineFactory));
        assert!(!driver.encode(speech_20ms(0)));
        let stats = counters.snapshot();
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.negotiations, 0);
        assert!(driver.source_format().is_none());
    }

    #[test]
    fn test_encode_delivers_160_bytes() {
        let (mut driver, delegate, counters) = running_driver();
        assert!(driver.encode(speech_20ms(40)));

        let samples = delegate.samples.lock();
        assert_eq!(samples.len(), 1);
        let sample = &samples[0];
        assert_eq!(sample.data.len(), 160);
        assert_eq!(sample.sample_count, 160);
        assert_eq!(sample.timing.presentation_timestamp, Duration::from_millis(40));
        assert_eq!(sample.timing.duration, Some(Duration::from_millis(20)));
        assert_eq!(delegate.formats.lock().len(), 1);

        let stats = counters.snapshot();
        assert_eq!(stats.buffers_encoded, 1);
        assert_eq!(stats.sessions_created, 1);
        assert_eq!(stats.staged_live(), 0);
        assert_eq!(stats.output_live(), 0);
    }

    #[test]
    fn test_long_buffers_are_encoded_whole() {
        let (mut driver, delegate, counters) = running_driver();
        for i in 0..5u64 {
            let pts = Duration::from_millis(200 * i);
            let buffer = SampleBuffer::from_i16(&[1000i16; 3200], 16000, 1, pts);
            assert!(driver.encode(buffer));
        }

        let samples = delegate.samples.lock();
        assert_eq!(samples.len(), 5);
        for (i, sample) in samples.iter().enumerate() {
            assert_eq!(sample.data.len(), 1600);
            assert_eq!(sample.timing.duration, Some(Duration::from_millis(200)));
            assert_eq!(
                sample.timing.presentation_timestamp,
                Duration::from_millis(200 * i as u64)
            );
        }
        assert_eq!(counters.snapshot().output_size_fallbacks, 0);
    }

    #[test]
    fn test_muted_long_buffer_after_unmuted_is_silent() {
        let (mut driver, delegate, _counters) = running_driver();
        let speech = || SampleBuffer::from_i16(&[3000i16; 3200], 16000, 1, Duration::ZERO);

        assert!(driver.encode(speech()));
        driver.apply_settings(SettingsUpdate::Muted(true));
        assert!(driver.encode(speech()));

        let samples = delegate.samples.lock();
        assert!(samples[0].data.iter().all(|&b| b != 0xFF));
        assert_eq!(samples[1].data.len(), 1600);
        assert!(samples[1].data.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_input_beyond_max_packet_size_drops() {
        let counters = Arc::new(StatsCounters::default());
        let config = EncoderConfig {
            max_packet_size: 1000,
            ..Default::default()
        };
        let mut driver =
            EncodeDriver::new(config, Arc::new(SoftwareEngineFactory), counters.clone());
        driver.start();

        let buffer = SampleBuffer::from_i16(&[1000i16; 3200], 16000, 1, Duration::ZERO);
        assert!(!driver.encode(buffer));
        assert!(driver.encode(speech_20ms(200)));

        let stats = counters.snapshot();
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.buffers_encoded, 1);
        assert_eq!(stats.staged_live(), 0);
    }

    #[test]
    fn test_missing_format_or_data_never_negotiates() {
        let (mut driver, delegate, counters) = running_driver();

        let mut no_format = speech_20ms(0);
        no_format.format = None;
        assert!(!driver.encode(no_format));

        let mut no_data = speech_20ms(0);
        no_data.data = None;
        assert!(!driver.encode(no_data));

        let empty = SampleBuffer::from_i16(&[], 16000, 1, Duration::ZERO);
        assert!(!driver.encode(empty));

        assert!(driver.source_format().is_none());
        assert!(!driver.has_session());
        assert!(delegate.samples.lock().is_empty());
        assert_eq!(counters.snapshot().frames_dropped, 3);
    }

    #[test]
    fn test_first_format_wins_until_invalidate() {
        let (mut driver, _delegate, counters) = running_driver();
        driver.encode(speech_20ms(0));
        driver.encode(SampleBuffer::from_i16(&[0i16; 960], 48000, 2, Duration::ZERO));
        assert_eq!(driver.source_format().map(|s| s.sample_rate), Some(16000));
        assert_eq!(counters.snapshot().negotiations, 1);

        driver.invalidate();
        assert!(driver.is_running());
        assert!(!driver.has_session());
        driver.encode(SampleBuffer::from_i16(&[0i16; 960], 48000, 2, Duration::ZERO));
        assert_eq!(driver.source_format().map(|s| s.sample_rate), Some(48000));
        assert_eq!(counters.snapshot().negotiations, 2);
    }

    #[test]
    fn test_muted_input_encodes_silence() {
        let (mut driver, delegate, _counters) = running_driver();
        driver.apply_settings(SettingsUpdate::Muted(true));
        driver.encode(speech_20ms(0));

        let samples = delegate.samples.lock();
        assert!(samples[0].data.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_stop_releases_session_and_drops() {
        let (mut driver, delegate, _counters) = running_driver();
        driver.encode(speech_20ms(0));
        assert!(driver.has_session());

        driver.stop();
        assert_eq!(driver.state(), LifecycleState::Stopped);
        assert!(!driver.has_session());
        assert!(driver.source_format().is_none());
        assert!(!driver.encode(speech_20ms(20)));

        driver.start();
        assert!(driver.encode(speech_20ms(40)));
        assert_eq!(delegate.samples.lock().len(), 2);
        assert_eq!(delegate.formats.lock().len(), 1);
    }

    #[test]
    fn test_bitrate_reaches_live_session() {
        let (mut driver, _delegate, _counters) = running_driver();
        driver.apply_settings(SettingsUpdate::Bitrate(48_000));
        assert_eq!(driver.session_bitrate(), None);

        driver.encode(speech_20ms(0));
        assert_eq!(driver.session_bitrate(), Some(48_000));

        driver.apply_settings(SettingsUpdate::Bitrate(32_000));
        assert_eq!(driver.session_bitrate(), Some(32_000));
    }

    #[test]
    fn test_dropped_delegate_is_not_called() {
        let (mut driver, counters) = driver_with(Arc::new(SoftwareEngineFactory));
        let delegate: Arc<dyn EncoderDelegate> = Arc::new(RecordingDelegate::default());
        driver.set_delegate(Arc::downgrade(&delegate));
        drop(delegate);
        driver.start();

        assert!(driver.encode(speech_20ms(0)));
        assert_eq!(counters.snapshot().buffers_encoded, 1);
    }

    struct FailingFactory;

    impl EngineFactory for FailingFactory {
        fn create(
            &self,
            codec: &CodecDescription,
            _source: &SourceFormat,
            _destination: &DestinationFormat,
            _bitrate: u32,
        ) -> Result<Box<dyn ConversionEngine>, TranscodeError> {
            Err(TranscodeError::codec_unavailable(&codec.name, "unavailable in test"))
        }
    }

    #[test]
    fn test_session_failure_drops_with_event() {
        let (mut driver, counters) = driver_with(Arc::new(FailingFactory));
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        driver.set_event_callback(Some(crate::event_callback(move |e| {
            events_clone.lock().push(e);
        })));
        driver.start();

        assert!(!driver.encode(speech_20ms(0)));
        let events = events.lock();
        assert!(events
            .iter()
            .any(|e| matches!(e, EncoderEvent::SessionUnavailable { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            EncoderEvent::FrameDropped {
                reason: DropReason::SessionUnavailable
            }
        )));
        assert_eq!(counters.snapshot().staged_live(), 0);
    }

    struct StubEngine {
        codec: CodecDescription,
        max_size: Result<usize, TranscodeError>,
        status: FillStatus,
        bytes: usize,
    }

    impl ConversionEngine for StubEngine {
        fn codec(&self) -> &CodecDescription {
            &self.codec
        }

        fn max_output_packet_size(&self) -> Result<usize, TranscodeError> {
            self.max_size.clone()
        }

        fn bitrate(&self) -> u32 {
            64_000
        }

        fn set_bitrate(&mut self, _bitrate: u32) -> Result<(), TranscodeError> {
            Ok(())
        }

        fn fill(&mut self, supplier: &mut dyn InputSupplier, output: &mut OutputStaging) -> FillStatus {
            drop(supplier.supply(1));
            output.write(&vec![0x7F; self.bytes]);
            self.status
        }
    }

    struct StubFactory {
        max_size: Result<usize, TranscodeError>,
        status: FillStatus,
        bytes: usize,
    }

    impl EngineFactory for StubFactory {
        fn create(
            &self,
            codec: &CodecDescription,
            _source: &SourceFormat,
            _destination: &DestinationFormat,
            _bitrate: u32,
        ) -> Result<Box<dyn ConversionEngine>, TranscodeError> {
            Ok(Box::new(StubEngine {
                codec: codec.clone(),
                max_size: self.max_size.clone(),
                status: self.status,
                bytes: self.bytes,
            }))
        }
    }

    #[test]
    fn test_size_query_failure_uses_fallback() {
        let (mut driver, counters) = driver_with(Arc::new(StubFactory {
            max_size: Err(TranscodeError::PropertyQuery {
                property: "max_output_packet_size",
            }),
            status: FillStatus::OK,
            bytes: 2000,
        }));
        driver.start();

        assert!(driver.encode(speech_20ms(0)));
        let stats = counters.snapshot();
        assert_eq!(stats.output_size_fallbacks, 1);
        assert_eq!(stats.buffers_encoded, 1);
    }

    #[test]
    fn test_fill_failure_drops() {
        let (mut driver, counters) = driver_with(Arc::new(StubFactory {
            max_size: Ok(960),
            status: FillStatus::FORMAT_MISMATCH,
            bytes: 10,
        }));
        driver.start();

        assert!(!driver.encode(speech_20ms(0)));
        let stats = counters.snapshot();
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.staged_live(), 0);
        assert_eq!(stats.output_live(), 0);
    }

    #[test]
    fn test_positive_status_counts_as_success() {
        let (mut driver, counters) = driver_with(Arc::new(StubFactory {
            max_size: Ok(960),
            status: FillStatus(7),
            bytes: 160,
        }));
        driver.start();

        assert!(driver.encode(speech_20ms(0)));
        assert_eq!(counters.snapshot().buffers_encoded, 1);
    }

    #[test]
    fn test_empty_output_drops() {
        let (mut driver, _counters) = driver_with(Arc::new(StubFactory {
            max_size: Ok(960),
            status: FillStatus::OK,
            bytes: 0,
        }));
        driver.start();
        assert!(!driver.encode(speech_20ms(0)));
    }
}
