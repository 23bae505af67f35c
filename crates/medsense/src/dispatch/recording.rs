//! In-memory channels that record what they were asked to do.
//!
//! Used by tests and by `medsense check`, which shows what would be sent
//! without showing it.

use std::sync::{Arc, Mutex, PoisonError};

use super::{AlertChannel, Reminder, Tone, TonePlayer};
use crate::error::{Error, Result};

/// Records delivered reminders. Clones share the record.
#[derive(Debug, Clone)]
pub struct RecordingChannel {
    name: &'static str,
    fail: bool,
    log: Arc<Mutex<Vec<Reminder>>>,
}

impl RecordingChannel {
    /// A channel that accepts every reminder.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fail: false,
            log: Arc::default(),
        }
    }

    /// A channel that rejects every reminder without recording it.
    #[must_use]
    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    /// Reminders delivered so far.
    #[must_use]
    pub fn delivered(&self) -> Vec<Reminder> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AlertChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn deliver(&self, reminder: &Reminder) -> Result<()> {
        if self.fail {
            return Err(Error::alert_channel(self.name, "rejected"));
        }
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reminder.clone());
        Ok(())
    }
}

/// Records played tones. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingTone {
    fail: bool,
    log: Arc<Mutex<Vec<Tone>>>,
}

impl RecordingTone {
    /// A player that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A player that always fails, as with no output device.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            log: Arc::default(),
        }
    }

    /// Tones played so far.
    #[must_use]
    pub fn played(&self) -> Vec<Tone> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TonePlayer for RecordingTone {
    fn play(&self, tone: &Tone) -> Result<()> {
        if self.fail {
            return Err(Error::audio("no output device"));
        }
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*tone);
        Ok(())
    }
}
