//! Notification permission status on macOS.
//!
//! Notification Center decides per-application whether scripts may post
//! notifications. There is no API to query that decision from a command-line
//! tool, so the status reported here only covers whether the scripting
//! bridge is usable; the user's consent is recorded by medsense itself.

use crate::notifications::notifications_available;

/// Information about the notification capability on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionStatus {
    /// Whether notifications can be posted at all.
    pub is_available: bool,

    /// Human-readable description of the status.
    pub description: String,
}

impl PermissionStatus {
    /// Create a new available status.
    #[must_use]
    pub fn available() -> Self {
        Self {
            is_available: true,
            description: "Notifications can be posted via osascript".to_string(),
        }
    }

    /// Create a new unavailable status.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            is_available: false,
            description: "osascript was not found on PATH".to_string(),
        }
    }
}

/// Check the notification capability.
#[must_use]
pub fn check_permission() -> PermissionStatus {
    if notifications_available() {
        PermissionStatus::available()
    } else {
        PermissionStatus::unavailable()
    }
}

/// Get instructions for how to allow notifications.
#[must_use]
pub fn get_notification_instructions() -> &'static str {
    r"To receive medication reminders as notifications:

1. Open System Settings (or System Preferences on older macOS)
2. Go to Notifications
3. Find 'Script Editor' (notifications from osascript are posted under it)
4. Enable 'Allow Notifications' and choose 'Alerts' as the style
5. Run 'medsense notifications enable'

If notifications stay hidden, reminders still appear as dialogs."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_status_available() {
        let status = PermissionStatus::available();
        assert!(status.is_available);
        assert!(!status.description.is_empty());
    }

    #[test]
    fn test_permission_status_unavailable() {
        let status = PermissionStatus::unavailable();
        assert!(!status.is_available);
        assert!(status.description.contains("osascript"));
    }

    #[test]
    fn test_get_notification_instructions() {
        let instructions = get_notification_instructions();
        assert!(instructions.contains("Notifications"));
        assert!(instructions.contains("medsense notifications enable"));
    }

    #[test]
    fn test_check_permission_returns_valid_status() {
        // Depends on the host; the description is always set.
        let status = check_permission();
        assert!(!status.description.is_empty());
    }
}
