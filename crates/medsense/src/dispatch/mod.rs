//! Alert delivery.
//!
//! A due reminder goes to exactly one primary channel and, independently, to
//! the tone player. The primary channel is the system notification when the
//! permission gate is open; otherwise, or when the notification fails, it is
//! the blocking alert. Nothing here returns an error to the caller: every
//! failure is logged and the remaining effects still run.

pub mod channels;
pub mod recording;
pub mod tone;

use tracing::{debug, error, warn};

pub use channels::{AlertChannel, BlockingAlert, NativeNotification};
#[cfg(feature = "audio")]
pub use tone::SineTonePlayer;
pub use tone::{default_tone_player, sine_samples, SilentTone, Tone, TonePlayer};

use crate::config::AlertConfig;
use crate::medication::Medication;

/// Notification title for a medication.
#[must_use]
pub fn notification_title(name: &str) -> String {
    format!("Time for {name}!")
}

/// Notification body for a dosage.
#[must_use]
pub fn notification_body(dosage: &str) -> String {
    format!("Dosage: {dosage}. Take now for your health.")
}

/// Text of the blocking alert.
#[must_use]
pub fn fallback_alert_text(time: &str, dosage: &str, name: &str) -> String {
    format!("⏰ REMINDER: It's {time}. Time to take {dosage} of {name}.")
}

/// One reminder to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// Medication id.
    pub medication_id: String,
    /// Medication name.
    pub name: String,
    /// Dosage text.
    pub dosage: String,
    /// Scheduled time that came due.
    pub time: String,
}

impl Reminder {
    /// Build a reminder for `medication` at `time`.
    #[must_use]
    pub fn new(medication: &Medication, time: &str) -> Self {
        Self {
            medication_id: medication.id.clone(),
            name: medication.name.clone(),
            dosage: medication.dosage.clone(),
            time: time.to_string(),
        }
    }

    /// Notification title.
    #[must_use]
    pub fn title(&self) -> String {
        notification_title(&self.name)
    }

    /// Notification body.
    #[must_use]
    pub fn body(&self) -> String {
        notification_body(&self.dosage)
    }

    /// Blocking alert text.
    #[must_use]
    pub fn fallback_text(&self) -> String {
        fallback_alert_text(&self.time, &self.dosage, &self.name)
    }
}

/// What a dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Channel that delivered the reminder, if any did.
    pub channel: Option<&'static str>,
    /// Whether the native notification was attempted and failed.
    pub fell_back: bool,
    /// Whether the tone played.
    pub tone_played: bool,
}

/// Routes reminders to channels.
#[derive(Debug)]
pub struct AlertDispatcher {
    native: Box<dyn AlertChannel>,
    fallback: Box<dyn AlertChannel>,
    tone: Option<(Box<dyn TonePlayer>, Tone)>,
}

impl AlertDispatcher {
    /// Create a dispatcher with the given primary channels and no tone.
    #[must_use]
    pub fn new(native: Box<dyn AlertChannel>, fallback: Box<dyn AlertChannel>) -> Self {
        Self {
            native,
            fallback,
            tone: None,
        }
    }

    /// Play `tone` with every reminder.
    #[must_use]
    pub fn with_tone(mut self, player: Box<dyn TonePlayer>, tone: Tone) -> Self {
        self.tone = Some((player, tone));
        self
    }

    /// Create the production dispatcher described by `config`.
    #[must_use]
    pub fn from_config(config: &AlertConfig) -> Self {
        let fallback = if config.dialogs_enabled {
            BlockingAlert::default()
        } else {
            BlockingAlert::terminal_only()
        };
        let dispatcher = Self::new(
            Box::new(NativeNotification::new(config.notification_icon.clone())),
            Box::new(fallback),
        );
        if config.tone_enabled {
            dispatcher.with_tone(default_tone_player(), Tone::from_config(config))
        } else {
            dispatcher
        }
    }

    /// Deliver a reminder for `medication` at `time`.
    ///
    /// `notifications_enabled` is the state of the permission gate.
    pub fn dispatch(
        &self,
        medication: &Medication,
        time: &str,
        notifications_enabled: bool,
    ) -> DispatchReport {
        let reminder = Reminder::new(medication, time);
        debug!(
            medication_id = %reminder.medication_id,
            time = %reminder.time,
            notifications_enabled,
            "Dispatching reminder"
        );

        let mut fell_back = false;
        let channel = if notifications_enabled {
            match self.native.deliver(&reminder) {
                Ok(()) => Some(self.native.name()),
                Err(e) => {
                    warn!(
                        channel = self.native.name(),
                        medication_id = %reminder.medication_id,
                        "Notification failed, using fallback: {e}"
                    );
                    fell_back = true;
                    self.deliver_fallback(&reminder)
                }
            }
        } else {
            self.deliver_fallback(&reminder)
        };

        DispatchReport {
            channel,
            fell_back,
            tone_played: self.play_tone(),
        }
    }

    fn deliver_fallback(&self, reminder: &Reminder) -> Option<&'static str> {
        match self.fallback.deliver(reminder) {
            Ok(()) => Some(self.fallback.name()),
            Err(e) => {
                error!(
                    channel = self.fallback.name(),
                    medication_id = %reminder.medication_id,
                    "Reminder could not be delivered: {e}"
                );
                None
            }
        }
    }

    fn play_tone(&self) -> bool {
        let Some((player, tone)) = &self.tone else {
            return false;
        };
        match player.play(tone) {
            Ok(()) => true,
            Err(e) => {
                debug!("Reminder tone not played: {e}");
                false
            }
        }
    }
}
