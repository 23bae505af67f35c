//! macOS-specific implementation for medsense.
//!
//! This crate provides the macOS notification backend: Notification Center
//! notifications and modal reminder dialogs, both driven through AppleScript.

#![cfg(target_os = "macos")]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod notifications;
pub mod permissions;

pub use notifications::{
    dialogs_available, notifications_available, show_blocking_alert, show_notification,
    NotifyError,
};
pub use permissions::{check_permission, get_notification_instructions, PermissionStatus};

/// Initialize macOS-specific components.
///
/// # Errors
///
/// Returns an error if initialization fails.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let status = check_permission();
    tracing::info!(
        available = status.is_available,
        "Initializing macOS notification backend"
    );
    Ok(())
}

/// Get the platform name.
#[must_use]
pub fn platform_name() -> &'static str {
    "macOS"
}
