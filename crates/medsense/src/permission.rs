//! Notification permission.
//!
//! Whether reminders use system notifications depends on two things: the
//! platform backend being present, and the user having agreed. The agreement
//! is recorded in the storage metadata table so every `medsense` process sees
//! the same answer.

use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::storage::Storage;

/// Metadata key holding the recorded consent.
pub const CONSENT_KEY: &str = "notification_permission";

/// Permission to show system notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// Notifications may be shown.
    Granted,
    /// The user refused, or notifications cannot be shown here.
    Denied,
    /// The user has not been asked.
    #[default]
    Undetermined,
}

impl PermissionState {
    /// Stable string form, as stored in metadata.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "default",
        }
    }

    /// Combine backend availability with the recorded consent.
    #[must_use]
    pub fn resolve(backend_available: bool, consent: Self) -> Self {
        if backend_available {
            consent
        } else {
            Self::Denied
        }
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            "default" | "undetermined" => Ok(Self::Undetermined),
            other => Err(Error::platform(format!(
                "unknown notification permission '{other}'"
            ))),
        }
    }
}

/// Read the recorded consent. Unreadable values count as undetermined.
///
/// # Errors
///
/// Returns an error if the metadata query fails.
pub fn recorded_consent(storage: &Storage) -> Result<PermissionState> {
    let value = storage.get_meta(CONSENT_KEY)?;
    Ok(value
        .and_then(|v| v.parse().ok())
        .unwrap_or(PermissionState::Undetermined))
}

/// Record the user's consent. `Undetermined` forgets any earlier answer.
///
/// # Errors
///
/// Returns an error if the metadata write fails.
pub fn record_consent(storage: &Storage, state: PermissionState) -> Result<()> {
    match state {
        PermissionState::Undetermined => {
            storage.delete_meta(CONSENT_KEY)?;
        }
        state => storage.set_meta(CONSENT_KEY, state.as_str())?,
    }
    debug!(permission = %state, "Recorded notification consent");
    Ok(())
}

/// Asks the user whether notifications may be shown.
pub trait PermissionPrompt: Send + std::fmt::Debug {
    /// Ask and return the answer. Never returns `Undetermined` unless the
    /// user could not be asked.
    fn ask(&mut self) -> PermissionState;
}

/// A yes/no question on the terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl PermissionPrompt for TerminalPrompt {
    fn ask(&mut self) -> PermissionState {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        ask_yes_no(&mut stdin.lock(), &mut stdout)
    }
}

/// Ask the consent question on arbitrary streams.
pub fn ask_yes_no(input: &mut impl BufRead, output: &mut impl Write) -> PermissionState {
    let question = "Allow medsense to show medication reminders as system notifications? [y/N] ";
    if write!(output, "{question}").and_then(|()| output.flush()).is_err() {
        return PermissionState::Undetermined;
    }

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => PermissionState::Undetermined,
        Ok(_) => match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => PermissionState::Granted,
            _ => PermissionState::Denied,
        },
    }
}

/// Decides whether the dispatcher may use system notifications.
///
/// Opens only on a grant. A denial or an unanswered prompt leaves it as it
/// was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGate {
    state: PermissionState,
    enabled: bool,
}

impl PermissionGate {
    /// Create a gate from the current permission state.
    #[must_use]
    pub fn new(state: PermissionState) -> Self {
        Self {
            state,
            enabled: state == PermissionState::Granted,
        }
    }

    /// A gate that never opens.
    #[must_use]
    pub fn closed() -> Self {
        Self::new(PermissionState::Denied)
    }

    /// Whether notifications may be used.
    #[must_use]
    pub fn notifications_enabled(&self) -> bool {
        self.enabled
    }

    /// The last known permission state.
    #[must_use]
    pub fn state(&self) -> PermissionState {
        self.state
    }

    /// Whether the user still needs to be asked.
    #[must_use]
    pub fn needs_prompt(&self) -> bool {
        self.state == PermissionState::Undetermined
    }

    /// Apply an answer. Returns whether the gate is now open.
    pub fn apply(&mut self, answer: PermissionState) -> bool {
        if answer != PermissionState::Undetermined {
            self.state = answer;
        }
        if answer == PermissionState::Granted {
            self.enabled = true;
            info!("System notifications enabled");
        }
        self.enabled
    }

    /// Ask the user and apply the answer.
    pub fn request_permission(&mut self, prompt: &mut dyn PermissionPrompt) -> PermissionState {
        let answer = prompt.ask();
        self.apply(answer);
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Debug)]
    struct Answer(PermissionState);

    impl PermissionPrompt for Answer {
        fn ask(&mut self) -> PermissionState {
            self.0
        }
    }

    #[test]
    fn test_gate_initial_state() {
        assert!(PermissionGate::new(PermissionState::Granted).notifications_enabled());
        assert!(!PermissionGate::new(PermissionState::Denied).notifications_enabled());
        assert!(!PermissionGate::new(PermissionState::Undetermined).notifications_enabled());
        assert!(PermissionGate::new(PermissionState::Undetermined).needs_prompt());
    }

    #[test]
    fn test_request_grant_opens_gate() {
        let mut gate = PermissionGate::new(PermissionState::Undetermined);
        let answer = gate.request_permission(&mut Answer(PermissionState::Granted));

        assert_eq!(answer, PermissionState::Granted);
        assert!(gate.notifications_enabled());
        assert!(!gate.needs_prompt());
    }

    #[test]
    fn test_request_denial_keeps_gate_closed() {
        let mut gate = PermissionGate::new(PermissionState::Undetermined);
        gate.request_permission(&mut Answer(PermissionState::Denied));

        assert!(!gate.notifications_enabled());
        assert_eq!(gate.state(), PermissionState::Denied);
    }

    #[test]
    fn test_unanswered_prompt_changes_nothing() {
        let mut gate = PermissionGate::new(PermissionState::Undetermined);
        assert!(!gate.apply(PermissionState::Undetermined));
        assert!(gate.needs_prompt());
    }

    #[test]
    fn test_closed_gate() {
        let gate = PermissionGate::closed();
        assert!(!gate.notifications_enabled());
        assert!(!gate.needs_prompt());
    }

    #[test]
    fn test_resolve_requires_backend() {
        assert_eq!(
            PermissionState::resolve(false, PermissionState::Granted),
            PermissionState::Denied
        );
        assert_eq!(
            PermissionState::resolve(true, PermissionState::Granted),
            PermissionState::Granted
        );
        assert_eq!(
            PermissionState::resolve(true, PermissionState::Undetermined),
            PermissionState::Undetermined
        );
    }

    #[test]
    fn test_state_string_forms() {
        for state in [
            PermissionState::Granted,
            PermissionState::Denied,
            PermissionState::Undetermined,
        ] {
            assert_eq!(state.as_str().parse::<PermissionState>().unwrap(), state);
        }
        assert!("maybe".parse::<PermissionState>().is_err());
    }

    #[test]
    fn test_consent_roundtrip() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(
            recorded_consent(&storage).unwrap(),
            PermissionState::Undetermined
        );

        record_consent(&storage, PermissionState::Granted).unwrap();
        assert_eq!(recorded_consent(&storage).unwrap(), PermissionState::Granted);

        record_consent(&storage, PermissionState::Undetermined).unwrap();
        assert_eq!(
            recorded_consent(&storage).unwrap(),
            PermissionState::Undetermined
        );
    }

    #[test]
    fn test_garbage_consent_is_undetermined() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set_meta(CONSENT_KEY, "perhaps").unwrap();
        assert_eq!(
            recorded_consent(&storage).unwrap(),
            PermissionState::Undetermined
        );
    }

    #[test]
    fn test_ask_yes_no() {
        let mut out = Vec::new();
        assert_eq!(
            ask_yes_no(&mut Cursor::new("y\n"), &mut out),
            PermissionState::Granted
        );
        assert!(String::from_utf8(out).unwrap().contains("[y/N]"));

        let mut out = Vec::new();
        assert_eq!(
            ask_yes_no(&mut Cursor::new("YES\n"), &mut out),
            PermissionState::Granted
        );
        assert_eq!(
            ask_yes_no(&mut Cursor::new("\n"), &mut out),
            PermissionState::Denied
        );
        assert_eq!(
            ask_yes_no(&mut Cursor::new(""), &mut out),
            PermissionState::Undetermined
        );
    }
}
