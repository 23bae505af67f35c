//! The native notification backend for the current OS.
//!
//! Linux and macOS each have their own crate; everything else gets a stub
//! that reports notifications and dialogs as unavailable.

use crate::error::{Error, Result};

#[cfg(target_os = "linux")]
use medsense_linux as native;

#[cfg(target_os = "macos")]
use medsense_mac as native;

/// Human-readable platform name.
#[must_use]
pub fn name() -> &'static str {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        native::platform_name()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        std::env::consts::OS
    }
}

/// Run backend start-up checks.
///
/// # Errors
///
/// Returns an error if the backend refuses to initialize.
pub fn init() -> Result<()> {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        native::init().map_err(|e| Error::platform(e.to_string()))
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        Ok(())
    }
}

/// Whether system notifications can be shown.
#[must_use]
pub fn notifications_available() -> bool {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        native::notifications_available()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        false
    }
}

/// Whether a modal dialog can be shown.
#[must_use]
pub fn dialogs_available() -> bool {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        native::dialogs_available()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        false
    }
}

/// Show a system notification.
///
/// # Errors
///
/// Returns [`Error::AlertChannel`] if the backend is missing or fails.
pub fn show_notification(title: &str, body: &str, icon: Option<&str>) -> Result<()> {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        native::show_notification(title, body, icon)
            .map_err(|e| Error::alert_channel("notification", e.to_string()))
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        let _ = (title, body, icon);
        Err(Error::alert_channel(
            "notification",
            format!("not supported on {}", name()),
        ))
    }
}

/// Show a modal dialog and wait for it to be dismissed.
///
/// # Errors
///
/// Returns [`Error::AlertChannel`] if no dialog helper is available or it fails.
pub fn show_blocking_alert(title: &str, message: &str) -> Result<()> {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        native::show_blocking_alert(title, message)
            .map_err(|e| Error::alert_channel("dialog", e.to_string()))
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        let _ = (title, message);
        Err(Error::alert_channel(
            "dialog",
            format!("not supported on {}", name()),
        ))
    }
}

/// Steps for getting notifications working on this platform.
#[must_use]
pub fn notification_instructions() -> &'static str {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        native::get_notification_instructions()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        "System notifications are not supported on this platform; reminders are printed to the terminal."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_not_empty() {
        assert!(!name().is_empty());
    }

    #[test]
    fn test_init() {
        assert!(init().is_ok());
    }

    #[test]
    fn test_instructions_not_empty() {
        let text = notification_instructions();
        assert!(!text.is_empty());
    }

    #[test]
    fn test_notification_errors_name_channel() {
        // With no helper installed the error must identify the channel.
        if notifications_available() {
            return;
        }
        let err = show_notification("t", "b", None).unwrap_err();
        assert!(err.to_string().contains("notification"));
    }
}
