//! Mutable encoder parameters and their reconciliation into a live session.
//!
//! Settings are plain data. Applying an update returns the [`LiveAction`]s
//! the caller must perform on the conversion session, computed by the pure
//! [`reconcile`] function, so no side effect hides behind an assignment.

use crate::config::{EncoderConfig, Profile};

/// Current encoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Zero-fill input before conversion. Read on every encode call.
    pub muted: bool,
    /// Target bitrate in bits per second. Pushed into a live session.
    pub bitrate: u32,
    /// Profile hint. Recorded only.
    pub profile: Profile,
    /// Channel count hint. Recorded only.
    pub channels: u16,
    /// Sample rate hint in Hz. Recorded only.
    pub sample_rate: Option<u32>,
}

impl Settings {
    /// Initial settings for `config`.
    pub fn from_config(config: &EncoderConfig) -> Self {
        Self {
            muted: false,
            bitrate: config.default_bitrate,
            profile: Profile::default(),
            channels: config.default_channels,
            sample_rate: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&EncoderConfig::default())
    }
}

/// A single settings mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsUpdate {
    /// Mute or unmute.
    Muted(bool),
    /// Change the bitrate.
    Bitrate(u32),
    /// Change the profile hint.
    Profile(Profile),
    /// Change the channel count hint.
    Channels(u16),
    /// Change the sample rate hint.
    SampleRate(u32),
}

/// An effect a settings change has on a live conversion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveAction {
    /// Set the bitrate property of the live engine.
    SetBitrate(u32),
}

/// Computes the live-session actions implied by moving from `before` to
/// `after`.
///
/// Mute is read per encode call and the profile, channel, and sample-rate
/// hints are not reconciled into a session, so only bitrate produces an
/// action.
pub fn reconcile(before: &Settings, after: &Settings) -> Vec<LiveAction> {
    let mut actions = Vec::new();
    if before.bitrate != after.bitrate {
        actions.push(LiveAction::SetBitrate(after.bitrate));
    }
    actions
}

/// Holds the settings and applies updates.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    settings: Settings,
}

impl SettingsStore {
    /// Creates a store with the given initial settings.
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// The current settings.
    pub fn current(&self) -> &Settings {
        &self.settings
    }

    /// Applies `update` and returns the live actions it requires.
    pub fn apply(&mut self, update: SettingsUpdate) -> Vec<LiveAction> {
        let before = self.settings.clone();
        match update {
            SettingsUpdate::Muted(muted) => self.settings.muted = muted,
            SettingsUpdate::Bitrate(bitrate) => self.settings.bitrate = bitrate,
            SettingsUpdate::Profile(profile) => self.settings.profile = profile,
            SettingsUpdate::Channels(channels) => self.settings.channels = channels,
            SettingsUpdate::SampleRate(rate) => self.settings.sample_rate = Some(rate),
        }
        if matches!(
            update,
            SettingsUpdate::Profile(_) | SettingsUpdate::Channels(_) | SettingsUpdate::SampleRate(_)
        ) {
            tracing::debug!(?update, "setting recorded; not applied to the conversion session");
        }
        reconcile(&before, &self.settings)
    }
}
