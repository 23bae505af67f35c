//! Notifications and modal dialogs on macOS.
//!
//! Both go through `osascript`, which is present on every macOS install and
//! does not require an app bundle.

use std::process::Command;

use thiserror::Error;
use tracing::{debug, trace};

/// The AppleScript runner.
const OSASCRIPT: &str = "osascript";

/// Errors that can occur while showing a notification or dialog.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// `osascript` is not available.
    #[error("{0} is not installed")]
    ToolMissing(&'static str),

    /// `osascript` could not be spawned.
    #[error("failed to run {tool}: {source}")]
    SpawnFailed {
        /// Name of the helper program.
        tool: &'static str,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The script exited unsuccessfully.
    #[error("{tool} exited with {status}")]
    CommandFailed {
        /// Name of the helper program.
        tool: &'static str,
        /// Exit status as reported by the OS.
        status: String,
    },
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Check whether notifications can be shown.
#[must_use]
pub fn notifications_available() -> bool {
    which::which(OSASCRIPT).is_ok()
}

/// Check whether modal dialogs can be shown.
#[must_use]
pub fn dialogs_available() -> bool {
    notifications_available()
}

/// Show a Notification Center notification.
///
/// `icon` is ignored: `display notification` always uses the icon of the
/// calling process.
///
/// # Errors
///
/// Returns an error if `osascript` is missing or the script fails.
pub fn show_notification(title: &str, body: &str, icon: Option<&str>) -> Result<()> {
    if icon.is_some() {
        trace!("Notification icons are not supported by osascript, ignoring");
    }
    debug!(title, "Sending notification");
    run_script(&notification_script(title, body))
}

/// Show a modal dialog and wait until the user dismisses it.
///
/// # Errors
///
/// Returns an error if `osascript` is missing or the script fails.
pub fn show_blocking_alert(title: &str, message: &str) -> Result<()> {
    debug!(title, "Showing reminder dialog");
    run_script(&dialog_script(title, message))
}

fn run_script(script: &str) -> Result<()> {
    if !notifications_available() {
        return Err(NotifyError::ToolMissing(OSASCRIPT));
    }

    let status = Command::new(OSASCRIPT)
        .args(["-e", script])
        .status()
        .map_err(|source| NotifyError::SpawnFailed {
            tool: OSASCRIPT,
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(NotifyError::CommandFailed {
            tool: OSASCRIPT,
            status: status.to_string(),
        })
    }
}

/// Quote a string as an AppleScript string literal.
#[must_use]
pub fn applescript_quote(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Build the `display notification` script.
#[must_use]
pub fn notification_script(title: &str, body: &str) -> String {
    format!(
        "display notification {} with title {} sound name \"Glass\"",
        applescript_quote(body),
        applescript_quote(title)
    )
}

/// Build the `display dialog` script.
#[must_use]
pub fn dialog_script(title: &str, message: &str) -> String {
    format!(
        "display dialog {} with title {} buttons {{\"OK\"}} default button \"OK\" with icon caution",
        applescript_quote(message),
        applescript_quote(title)
    )
}
