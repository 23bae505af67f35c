//! Primary alert channels.

use std::io::Write;

use tracing::{debug, warn};

use super::Reminder;
use crate::error::{Error, Result};
use crate::platform;

/// Title of the modal reminder dialog.
const DIALOG_TITLE: &str = "medsense";

/// A way of putting a reminder in front of the user.
pub trait AlertChannel: Send + Sync + std::fmt::Debug {
    /// Short channel name for logs.
    fn name(&self) -> &'static str;

    /// Deliver the reminder.
    ///
    /// # Errors
    ///
    /// Returns an error if the reminder was not shown.
    fn deliver(&self, reminder: &Reminder) -> Result<()>;
}

/// A system notification.
#[derive(Debug, Clone, Default)]
pub struct NativeNotification {
    icon: Option<String>,
}

impl NativeNotification {
    /// Create a notification channel using `icon` where the backend supports it.
    #[must_use]
    pub fn new(icon: Option<String>) -> Self {
        Self { icon }
    }
}

impl AlertChannel for NativeNotification {
    fn name(&self) -> &'static str {
        "notification"
    }

    fn deliver(&self, reminder: &Reminder) -> Result<()> {
        if !platform::notifications_available() {
            return Err(Error::alert_channel(
                self.name(),
                "no notification backend available",
            ));
        }
        platform::show_notification(&reminder.title(), &reminder.body(), self.icon.as_deref())
    }
}

/// A modal dialog, or the terminal when no dialog can be shown.
///
/// The dialog waits for the user, so this channel blocks until the reminder
/// is acknowledged.
#[derive(Debug, Clone, Copy)]
pub struct BlockingAlert {
    use_dialog: bool,
}

impl Default for BlockingAlert {
    fn default() -> Self {
        Self { use_dialog: true }
    }
}

impl BlockingAlert {
    /// A blocking alert that only ever writes to the terminal.
    #[must_use]
    pub fn terminal_only() -> Self {
        Self { use_dialog: false }
    }
}

impl AlertChannel for BlockingAlert {
    fn name(&self) -> &'static str {
        "dialog"
    }

    fn deliver(&self, reminder: &Reminder) -> Result<()> {
        let text = reminder.fallback_text();

        if self.use_dialog && platform::dialogs_available() {
            match platform::show_blocking_alert(DIALOG_TITLE, &text) {
                Ok(()) => return Ok(()),
                Err(e) => warn!("Reminder dialog failed, printing instead: {e}"),
            }
        }

        debug!(medication_id = %reminder.medication_id, "Writing reminder to terminal");
        write_terminal(&mut std::io::stdout().lock(), &text)
    }
}

fn write_terminal(out: &mut impl Write, text: &str) -> Result<()> {
    writeln!(out, "\x07{text}")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder() -> Reminder {
        Reminder {
            medication_id: "a1".to_string(),
            name: "Aspirin".to_string(),
            dosage: "100mg".to_string(),
            time: "08:00".to_string(),
        }
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(NativeNotification::default().name(), "notification");
        assert_eq!(BlockingAlert::default().name(), "dialog");
    }

    #[test]
    fn test_write_terminal() {
        let mut out = Vec::new();
        write_terminal(&mut out, &reminder().fallback_text()).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Time to take 100mg of Aspirin."));
        assert!(printed.ends_with('\n'));
    }

    #[test]
    fn test_terminal_only_alert_delivers() {
        assert!(BlockingAlert::terminal_only().deliver(&reminder()).is_ok());
    }
}
