//! `medsense` - Personal medication reminders for the desktop
//!
//! This library keeps a list of medications with their daily dose times in a
//! local `SQLite` slot, watches the clock, and alerts the user when a dose is
//! due through a system notification, a modal dialog, or the terminal, with
//! an optional tone.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod medication;
pub mod permission;
pub mod platform;
pub mod scheduler;
pub mod service;
pub mod storage;
pub mod store;

pub use config::Config;
pub use dispatch::{AlertDispatcher, DispatchReport};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use medication::{Medication, NewMedication, ScheduleTime};
pub use permission::{PermissionGate, PermissionState};
pub use scheduler::{Clock, DueAlert, ReminderScheduler, SystemClock};
pub use service::{ReminderHandle, ReminderService};
pub use storage::{Storage, StorageStats};
pub use store::RecordStore;
