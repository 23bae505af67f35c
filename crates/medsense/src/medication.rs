//! Medication records.
//!
//! The serialized form uses camelCase keys and RFC 3339 timestamps, so a
//! payload exported from the browser version of the app loads unchanged.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A medication the user takes on a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    /// Opaque identifier, assigned at creation and never changed.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Dosage, free text (e.g. "100mg").
    pub dosage: String,
    /// How often, free text (e.g. "twice daily").
    #[serde(default)]
    pub frequency: String,
    /// What the medication is for.
    #[serde(default)]
    pub explanation: String,
    /// Known side effects.
    #[serde(default)]
    pub side_effects: String,
    /// Scheduled times of day, `HH:MM`.
    #[serde(default)]
    pub times: Vec<String>,
    /// When the user last acknowledged taking it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_taken: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// The fields a user supplies when adding a medication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewMedication {
    /// Display name.
    pub name: String,
    /// Dosage, free text.
    pub dosage: String,
    /// How often, free text.
    pub frequency: String,
    /// What the medication is for.
    pub explanation: String,
    /// Known side effects.
    pub side_effects: String,
    /// Scheduled times of day, `HH:MM`.
    pub times: Vec<String>,
}

impl NewMedication {
    /// Check the record before it enters the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or any time is not `HH:MM`.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidMedication {
                message: "name must not be empty".to_string(),
            });
        }
        for time in &self.times {
            ScheduleTime::from_str(time)?;
        }
        Ok(())
    }
}

impl Medication {
    /// Build a stored record from user input.
    #[must_use]
    pub fn from_new(new: NewMedication, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            dosage: new.dosage,
            frequency: new.frequency,
            explanation: new.explanation,
            side_effects: new.side_effects,
            times: new.times,
            last_taken: None,
            created_at,
        }
    }

    /// The next scheduled time strictly after `current`, wrapping to the
    /// earliest time tomorrow. Unparsable stored times are ignored.
    #[must_use]
    pub fn next_time_after(&self, current: ScheduleTime) -> Option<ScheduleTime> {
        let mut valid: Vec<ScheduleTime> = self
            .times
            .iter()
            .filter_map(|t| t.parse().ok())
            .collect();
        valid.sort_unstable();
        valid
            .iter()
            .copied()
            .find(|t| *t > current)
            .or_else(|| valid.first().copied())
    }
}

/// Remove repeated times, keeping the first occurrence of each.
#[must_use]
pub fn dedupe_times(times: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    times
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// A validated time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleTime {
    hour: u8,
    minute: u8,
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([01][0-9]|2[0-3]):([0-5][0-9])$").expect("static pattern is valid")
    })
}

impl ScheduleTime {
    /// Build a schedule time, returning `None` when out of range.
    #[must_use]
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Midnight, the first minute of a day.
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };

    /// Truncate a wall-clock time to its minute.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_time(time: NaiveTime) -> Self {
        // hour() < 24 and minute() < 60 by construction of NaiveTime
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    /// Truncate a local date-time to its minute.
    #[must_use]
    pub fn from_datetime(now: NaiveDateTime) -> Self {
        Self::from_time(now.time())
    }

    /// Hour component, 0-23.
    #[must_use]
    pub const fn hour(self) -> u8 {
        self.hour
    }

    /// Minute component, 0-59.
    #[must_use]
    pub const fn minute(self) -> u8 {
        self.minute
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ScheduleTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = time_pattern()
            .captures(s)
            .ok_or_else(|| Error::InvalidTime {
                value: s.to_string(),
            })?;
        let invalid = || Error::InvalidTime {
            value: s.to_string(),
        };
        let hour = caps[1].parse().map_err(|_| invalid())?;
        let minute = caps[2].parse().map_err(|_| invalid())?;
        Ok(Self { hour, minute })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(times: &[&str]) -> Medication {
        Medication::from_new(
            NewMedication {
                name: "Aspirin".to_string(),
                dosage: "100mg".to_string(),
                times: times.iter().map(ToString::to_string).collect(),
                ..Default::default()
            },
            "a1".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_schedule_time_parse_valid() {
        let t: ScheduleTime = "08:05".parse().unwrap();
        assert_eq!(t.hour(), 8);
        assert_eq!(t.minute(), 5);
        assert_eq!(t.to_string(), "08:05");

        assert!("00:00".parse::<ScheduleTime>().is_ok());
        assert!("23:59".parse::<ScheduleTime>().is_ok());
    }

    #[test]
    fn test_schedule_time_parse_rejects_unpadded_and_out_of_range() {
        for bad in ["8:00", "24:00", "12:60", "12:5", "noon", "", " 08:00", "08:00:00"] {
            let err = bad.parse::<ScheduleTime>().unwrap_err();
            assert!(matches!(err, Error::InvalidTime { .. }), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_schedule_time_from_datetime_truncates() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(7, 9, 59)
            .unwrap();
        assert_eq!(ScheduleTime::from_datetime(now).to_string(), "07:09");
    }

    #[test]
    fn test_schedule_time_new_bounds() {
        assert!(ScheduleTime::new(23, 59).is_some());
        assert!(ScheduleTime::new(24, 0).is_none());
        assert!(ScheduleTime::new(0, 60).is_none());
        assert_eq!(ScheduleTime::new(0, 0), Some(ScheduleTime::MIDNIGHT));
    }

    #[test]
    fn test_new_medication_validate() {
        let mut new = NewMedication {
            name: "Metformin".to_string(),
            times: vec!["08:00".to_string()],
            ..Default::default()
        };
        assert!(new.validate().is_ok());

        new.times.push("8pm".to_string());
        assert!(matches!(new.validate(), Err(Error::InvalidTime { .. })));

        new.times.clear();
        new.name = "   ".to_string();
        assert!(matches!(
            new.validate(),
            Err(Error::InvalidMedication { .. })
        ));
    }

    #[test]
    fn test_dedupe_times_keeps_first_occurrence() {
        let times = vec!["20:00", "08:00", "20:00", "08:00"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dedupe_times(times), vec!["20:00", "08:00"]);
    }

    #[test]
    fn test_next_time_after() {
        let med = sample(&["20:00", "08:00", "bogus"]);
        let at = |s: &str| s.parse::<ScheduleTime>().unwrap();

        assert_eq!(med.next_time_after(at("07:00")), Some(at("08:00")));
        assert_eq!(med.next_time_after(at("08:00")), Some(at("20:00")));
        assert_eq!(med.next_time_after(at("21:00")), Some(at("08:00")));
        assert_eq!(sample(&[]).next_time_after(at("08:00")), None);
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let med = sample(&["08:00"]);
        let json = serde_json::to_string(&med).unwrap();
        assert!(json.contains("\"sideEffects\""));
        assert!(json.contains("\"createdAt\""));
        assert!(!json.contains("lastTaken"));
    }

    #[test]
    fn test_deserialize_browser_payload() {
        let json = r#"{
            "id": "k3j9x0a1b",
            "name": "Lisinopril",
            "dosage": "10mg",
            "frequency": "Once daily",
            "explanation": "Blood pressure",
            "sideEffects": "Dizziness",
            "times": ["09:00"],
            "lastTaken": "2024-05-01T09:02:11.123Z",
            "createdAt": "2024-04-01T12:00:00.000Z"
        }"#;
        let med: Medication = serde_json::from_str(json).unwrap();
        assert_eq!(med.id, "k3j9x0a1b");
        assert_eq!(med.side_effects, "Dizziness");
        assert!(med.last_taken.is_some());
    }
}
