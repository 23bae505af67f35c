//! Reminder scheduling.
//!
//! The scheduler is pure comparison logic: each [`ReminderScheduler::poll`]
//! takes the current local time and a snapshot of the medication list and
//! returns the alerts that became due. A [`SuppressionSet`] keyed by
//! `(day, medication id, time)` makes every scheduled time fire at most once
//! per day no matter how often the loop polls within that minute.
//!
//! Times are compared as local wall-clock minutes. Nothing is persisted: a
//! restart forgets what already fired today, and a minute during which no
//! poll ran is never revisited.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{debug, trace};

use crate::medication::{Medication, ScheduleTime};

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// The current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// The system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Create a clock reading `now`.
    #[must_use]
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Set the time.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Move the time forward.
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// Identifies one scheduled dose on one day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    /// Local calendar day.
    pub day: NaiveDate,
    /// Medication id.
    pub medication_id: String,
    /// Scheduled time string, as stored on the medication.
    pub time: String,
}

/// Alerts already fired today.
#[derive(Debug, Default)]
pub struct SuppressionSet {
    day: Option<NaiveDate>,
    fired: HashSet<AlertKey>,
}

impl SuppressionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the set when `now` falls on a different day than the last
    /// observed one. Returns `true` if entries were dropped.
    pub fn reset_if_new_day(&mut self, now: NaiveDateTime) -> bool {
        let today = now.date();
        if self.day == Some(today) {
            return false;
        }
        let dropped = !self.fired.is_empty();
        if dropped {
            debug!(
                previous_day = ?self.day,
                %today,
                cleared = self.fired.len(),
                "Day boundary, clearing fired reminders"
            );
        }
        self.fired.clear();
        self.day = Some(today);
        dropped
    }

    /// Record a key. Returns `false` if it was already present.
    pub fn insert(&mut self, key: AlertKey) -> bool {
        self.fired.insert(key)
    }

    /// Whether a key has fired.
    #[must_use]
    pub fn contains(&self, key: &AlertKey) -> bool {
        self.fired.contains(key)
    }

    /// Number of fired keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fired.len()
    }

    /// Whether nothing has fired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    /// The day the set currently covers.
    #[must_use]
    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }
}

/// A scheduled dose whose time has arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueAlert {
    /// Snapshot of the medication at poll time.
    pub medication: Medication,
    /// The scheduled time that matched.
    pub time: String,
    /// The local day it fired on.
    pub day: NaiveDate,
}

/// Every `(medication, time)` pair scheduled for the minute of `now`,
/// ignoring what already fired.
pub fn scheduled_at(
    now: NaiveDateTime,
    medications: &[Medication],
) -> impl Iterator<Item = (&Medication, &str)> {
    let current = ScheduleTime::from_datetime(now).to_string();
    medications.iter().flat_map(move |med| {
        let current = current.clone();
        med.times
            .iter()
            .filter(move |time| **time == current)
            .map(move |time| (med, time.as_str()))
    })
}

/// Detects due reminders and suppresses repeats.
#[derive(Debug, Default)]
pub struct ReminderScheduler {
    suppression: SuppressionSet,
}

impl ReminderScheduler {
    /// Create a scheduler with nothing fired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the schedule at `now`.
    ///
    /// Starts with a day-boundary reset, then returns each pair scheduled for
    /// the current minute that has not fired today.
    pub fn poll(&mut self, now: NaiveDateTime, medications: &[Medication]) -> Vec<DueAlert> {
        self.reset_if_new_day(now);
        let day = now.date();

        let due: Vec<DueAlert> = scheduled_at(now, medications)
            .filter_map(|(med, time)| {
                let key = AlertKey {
                    day,
                    medication_id: med.id.clone(),
                    time: time.to_string(),
                };
                self.suppression.insert(key).then(|| DueAlert {
                    medication: med.clone(),
                    time: time.to_string(),
                    day,
                })
            })
            .collect();

        trace!(%now, due = due.len(), fired_today = self.suppression.len(), "Polled schedule");
        due
    }

    /// Clear the suppression set if `now` is on a new day.
    pub fn reset_if_new_day(&mut self, now: NaiveDateTime) -> bool {
        self.suppression.reset_if_new_day(now)
    }

    /// The suppression set.
    #[must_use]
    pub fn suppression(&self) -> &SuppressionSet {
        &self.suppression
    }
}
