//! Control task that applies lifecycle and settings commands.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::pipeline::EncodeDriver;
use crate::settings::SettingsUpdate;

/// Command sent to the control worker.
#[derive(Debug)]
pub(crate) enum EncoderCommand {
    /// Begin accepting encode calls.
    Start,
    /// Stop and release the session.
    Stop,
    /// Release the session and negotiated formats.
    Invalidate,
    /// Apply a settings change.
    Update(SettingsUpdate),
    /// Reply once every earlier command has been applied.
    Sync(oneshot::Sender<()>),
}

/// Applies commands to the shared driver in the order they were sent.
pub(crate) struct ControlWorker {
    driver: Arc<Mutex<EncodeDriver>>,
}

impl ControlWorker {
    pub fn new(driver: Arc<Mutex<EncodeDriver>>) -> Self {
        Self { driver }
    }

    fn apply(&self, command: EncoderCommand) {
        match command {
            EncoderCommand::Start => self.driver.lock().start(),
            EncoderCommand::Stop => self.driver.lock().stop(),
            EncoderCommand::Invalidate => self.driver.lock().invalidate(),
            EncoderCommand::Update(update) => self.driver.lock().apply_settings(update),
            EncoderCommand::Sync(reply) => {
                // Receiver may have given up waiting
                let _ = reply.send(());
            }
        }
    }

    /// Runs until every command sender is dropped.
    pub async fn run(self, mut commands: mpsc::UnboundedReceiver<EncoderCommand>) {
        while let Some(command) = commands.recv().await {
            tracing::trace!(?command, "applying encoder command");
            self.apply(command);
        }
        tracing::debug!("encoder control worker exiting");
    }
}
