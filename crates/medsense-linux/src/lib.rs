//! Linux-specific implementation for medsense
//!
//! This crate provides the Linux notification backend: desktop notifications
//! through `notify-send` and modal reminder dialogs through `zenity` or
//! `kdialog`.

#![cfg(target_os = "linux")]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod notifications;

pub use notifications::{
    dialogs_available, notifications_available, show_blocking_alert, show_notification,
    NotifyError,
};

/// Initialize Linux-specific components
///
/// # Errors
///
/// Returns an error if initialization fails
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!(
        notify_send = notifications_available(),
        dialogs = dialogs_available(),
        "Initializing Linux notification backend"
    );
    Ok(())
}

/// Get platform name
#[must_use]
pub fn platform_name() -> &'static str {
    "Linux"
}

/// Get instructions for enabling desktop notifications.
#[must_use]
pub fn get_notification_instructions() -> &'static str {
    r"Desktop notifications on Linux are shown with 'notify-send'.

1. Install libnotify (e.g. 'apt install libnotify-bin' or 'dnf install libnotify')
2. Make sure a notification daemon is running in your desktop session
3. Run 'medsense notifications enable' to allow medsense to use it

Without notify-send, reminders fall back to a 'zenity' or 'kdialog' dialog."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert!(init().is_ok());
    }

    #[test]
    fn test_platform_name() {
        assert_eq!(platform_name(), "Linux");
    }

    #[test]
    fn test_notification_instructions() {
        let instructions = get_notification_instructions();
        assert!(instructions.contains("notify-send"));
        assert!(instructions.contains("medsense notifications enable"));
    }
}
