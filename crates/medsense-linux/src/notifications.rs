//! Desktop notifications and modal dialogs on Linux.
//!
//! Both effects shell out to the freedesktop helpers. Nothing here links
//! against D-Bus directly; a missing helper is reported as
//! [`NotifyError::ToolMissing`] so the caller can pick another channel.

use std::process::Command;

use thiserror::Error;
use tracing::{debug, trace};

/// Helper used for desktop notifications.
const NOTIFY_SEND: &str = "notify-send";

/// Dialog helpers, tried in order.
const DIALOG_TOOLS: &[&str] = &["zenity", "kdialog"];

/// Application name reported to the notification daemon.
const APP_NAME: &str = "medsense";

/// Errors that can occur while showing a notification or dialog.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The helper program is not installed.
    #[error("{0} is not installed")]
    ToolMissing(&'static str),

    /// The helper program could not be spawned.
    #[error("failed to run {tool}: {source}")]
    SpawnFailed {
        /// Name of the helper program.
        tool: &'static str,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The helper program exited unsuccessfully.
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

/// Check whether desktop notifications can be shown.
#[must_use]
pub fn notifications_available() -> bool {
    which::which(NOTIFY_SEND).is_ok()
}

/// Check whether a modal dialog helper is installed.
#[must_use]
pub fn dialogs_available() -> bool {
    find_dialog_tool().is_some()
}

/// Show a desktop notification.
///
/// # Errors
///
/// Returns an error if `notify-send` is missing or fails.
pub fn show_notification(title: &str, body: &str, icon: Option<&str>) -> Result<()> {
    if !notifications_available() {
        return Err(NotifyError::ToolMissing(NOTIFY_SEND));
    }

    debug!(title, "Sending desktop notification");
    run(NOTIFY_SEND, &notify_send_args(title, body, icon))
}

/// Show a modal dialog and wait until the user dismisses it.
///
/// # Errors
///
/// Returns an error if no dialog helper is installed or the helper fails.
pub fn show_blocking_alert(title: &str, message: &str) -> Result<()> {
    let tool = find_dialog_tool().ok_or(NotifyError::ToolMissing(DIALOG_TOOLS[0]))?;

    debug!(tool, title, "Showing reminder dialog");
    run(tool, &dialog_args(tool, title, message))
}

fn find_dialog_tool() -> Option<&'static str> {
    DIALOG_TOOLS
        .iter()
        .copied()
        .find(|tool| which::which(tool).is_ok())
}

fn run(tool: &'static str, args: &[String]) -> Result<()> {
    trace!(tool, ?args, "Spawning helper");
    let status = Command::new(tool)
        .args(args)
        .status()
        .map_err(|source| NotifyError::SpawnFailed { tool, source })?;

    if status.success() {
        Ok(())
    } else {
        Err(NotifyError::CommandFailed {
            tool,
            status: status.to_string(),
        })
    }
}

/// Build the argument list for `notify-send`.
#[must_use]
pub fn notify_send_args(title: &str, body: &str, icon: Option<&str>) -> Vec<String> {
    let mut args = vec![format!("--app-name={APP_NAME}"), "--urgency=critical".to_string()];
    if let Some(icon) = icon {
        args.push(format!("--icon={icon}"));
    }
    args.push(title.to_string());
    args.push(body.to_string());
    args
}

/// Build the argument list for the given dialog helper.
#[must_use]
pub fn dialog_args(tool: &str, title: &str, message: &str) -> Vec<String> {
    match tool {
        "kdialog" => vec![
            "--title".to_string(),
            title.to_string(),
            "--msgbox".to_string(),
            message.to_string(),
        ],
        _ => vec![
            "--info".to_string(),
            format!("--title={title}"),
            format!("--text={message}"),
            "--no-markup".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_send_args_without_icon() {
        let args = notify_send_args("Time for Aspirin!", "Dosage: 100mg.", None);
        assert_eq!(args[0], "--app-name=medsense");
        assert!(!args.iter().any(|a| a.starts_with("--icon")));
        assert_eq!(args[args.len() - 2], "Time for Aspirin!");
        assert_eq!(args[args.len() - 1], "Dosage: 100mg.");
    }

    #[test]
    fn test_notify_send_args_with_icon() {
        let args = notify_send_args("t", "b", Some("appointment-soon"));
        assert!(args.contains(&"--icon=appointment-soon".to_string()));
    }

    #[test]
    fn test_zenity_args() {
        let args = dialog_args("zenity", "Medication reminder", "Take 1 pill");
        assert_eq!(args[0], "--info");
        assert!(args.contains(&"--title=Medication reminder".to_string()));
        assert!(args.contains(&"--text=Take 1 pill".to_string()));
    }

    #[test]
    fn test_kdialog_args() {
        let args = dialog_args("kdialog", "Medication reminder", "Take 1 pill");
        assert_eq!(
            args,
            vec!["--title", "Medication reminder", "--msgbox", "Take 1 pill"]
        );
    }

    #[test]
    fn test_notify_error_display() {
        assert_eq!(
            NotifyError::ToolMissing("notify-send").to_string(),
            "notify-send is not installed"
        );
        let err = NotifyError::CommandFailed {
            tool: "zenity",
            status: "exit status: 1".to_string(),
        };
        assert!(err.to_string().contains("zenity"));
    }

    #[test]
    fn test_availability_checks_do_not_panic() {
        // Depends on the host; only verify the lookups run.
        let _ = notifications_available();
        let _ = dialogs_available();
    }
}
