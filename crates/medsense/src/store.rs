//! The medication record store.
//!
//! [`RecordStore`] owns the in-memory medication list and mirrors it to one
//! storage slot. Every mutation rewrites the whole slot. Reads are best
//! effort: an absent or malformed payload yields an empty list and a
//! warning, never an error.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::medication::{dedupe_times, Medication, NewMedication};
use crate::storage::Storage;

/// Outcome of decoding a slot payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotPayload {
    /// The slot has never been written.
    Absent,
    /// The slot held a valid medication list.
    Valid(Vec<Medication>),
    /// The slot held something that is not a medication list.
    Malformed(String),
}

impl SlotPayload {
    /// Decode a raw slot value.
    #[must_use]
    pub fn decode(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Absent,
            Some(text) => match serde_json::from_str::<Vec<Medication>>(text) {
                Ok(records) => Self::Valid(records),
                Err(e) => Self::Malformed(e.to_string()),
            },
        }
    }
}

/// In-memory medication list mirrored to a storage slot.
#[derive(Debug)]
pub struct RecordStore {
    storage: Storage,
    slot_key: String,
    records: Vec<Medication>,
    /// BLAKE3 of the payload last read or written.
    fingerprint: Option<blake3::Hash>,
    dedupe_times: bool,
}

impl RecordStore {
    /// Open the store and load the persisted list.
    #[must_use]
    pub fn open(storage: Storage, slot_key: impl Into<String>) -> Self {
        let mut store = Self {
            storage,
            slot_key: slot_key.into(),
            records: Vec::new(),
            fingerprint: None,
            dedupe_times: true,
        };
        store.records = store.load();
        store
    }

    /// Set whether repeated times within one medication are dropped on add.
    #[must_use]
    pub fn with_dedupe_times(mut self, dedupe: bool) -> Self {
        self.dedupe_times = dedupe;
        self
    }

    /// Read the persisted list.
    ///
    /// Absent and malformed payloads yield an empty list; a storage failure
    /// is logged and also yields an empty list.
    pub fn load(&mut self) -> Vec<Medication> {
        let raw = match self.storage.read_slot(&self.slot_key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, slot = %self.slot_key, "Failed to read medications");
                return Vec::new();
            }
        };
        self.fingerprint = raw.as_deref().map(|r| blake3::hash(r.as_bytes()));

        match SlotPayload::decode(raw.as_deref()) {
            SlotPayload::Absent => {
                debug!(slot = %self.slot_key, "No saved medications");
                Vec::new()
            }
            SlotPayload::Valid(records) => {
                debug!(count = records.len(), "Loaded medications");
                records
            }
            SlotPayload::Malformed(reason) => {
                warn!(%reason, slot = %self.slot_key, "Failed to load medications, starting empty");
                Vec::new()
            }
        }
    }

    /// Persist the given list, replacing the slot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn save(&mut self, records: &[Medication]) -> Result<()> {
        let payload = serde_json::to_string(records)?;
        self.storage.write_slot(&self.slot_key, &payload)?;
        self.fingerprint = Some(blake3::hash(payload.as_bytes()));
        debug!(count = records.len(), "Saved medications");
        Ok(())
    }

    fn commit(&mut self, records: Vec<Medication>) -> Result<()> {
        self.save(&records)?;
        self.records = records;
        Ok(())
    }

    /// Re-read the slot if another process changed it.
    ///
    /// Returns `true` when the in-memory list was replaced. A malformed
    /// payload keeps the current list.
    pub fn refresh(&mut self) -> bool {
        let raw = match self.storage.read_slot(&self.slot_key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to re-read medications");
                return false;
            }
        };
        let fingerprint = raw.as_deref().map(|r| blake3::hash(r.as_bytes()));
        if fingerprint == self.fingerprint {
            return false;
        }
        self.fingerprint = fingerprint;

        match SlotPayload::decode(raw.as_deref()) {
            SlotPayload::Absent => {
                self.records.clear();
                true
            }
            SlotPayload::Valid(records) => {
                info!(count = records.len(), "Medication list changed on disk");
                self.records = records;
                true
            }
            SlotPayload::Malformed(reason) => {
                warn!(%reason, "Ignoring malformed medication list");
                false
            }
        }
    }

    /// All records, in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Medication] {
        &self.records
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Medication> {
        self.records.iter().find(|m| m.id == id)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a batch of medications, returning the ids assigned to them.
    ///
    /// # Errors
    ///
    /// Returns an error if any record fails validation (nothing is added)
    /// or the save fails.
    pub fn add(&mut self, new: Vec<NewMedication>, now: DateTime<Utc>) -> Result<Vec<String>> {
        for med in &new {
            med.validate()?;
        }

        let dedupe = self.dedupe_times;
        let added: Vec<Medication> = new
            .into_iter()
            .map(|mut med| {
                if dedupe {
                    med.times = dedupe_times(med.times);
                }
                Medication::from_new(med, self.fresh_id(), now)
            })
            .collect();
        let ids: Vec<String> = added.iter().map(|m| m.id.clone()).collect();

        let records = with_added(&self.records, added);
        self.commit(records)?;
        info!(?ids, "Added medications");
        Ok(ids)
    }

    /// Remove a medication.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MedicationNotFound`] for an unknown id, or an error if
    /// the save fails.
    pub fn remove(&mut self, id: &str) -> Result<Medication> {
        let removed = self.get(id).cloned().ok_or_else(|| Error::not_found(id))?;
        self.commit(without(&self.records, id))?;
        info!(medication_id = id, "Removed medication");
        Ok(removed)
    }

    /// Record that a medication was taken at `when`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MedicationNotFound`] for an unknown id, or an error if
    /// the save fails.
    pub fn mark_taken(&mut self, id: &str, when: DateTime<Utc>) -> Result<()> {
        if self.get(id).is_none() {
            return Err(Error::not_found(id));
        }
        self.commit(with_taken(&self.records, id, when))?;
        info!(medication_id = id, "Marked medication taken");
        Ok(())
    }

    /// Serialize the current list, as stored in the slot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Replace the list with a JSON payload.
    ///
    /// Unlike [`RecordStore::load`], a malformed payload is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a medication list, two records
    /// share an id, or the save fails.
    pub fn import(&mut self, json: &str) -> Result<usize> {
        let records: Vec<Medication> = serde_json::from_str(json)?;
        if let Some(id) = first_duplicate_id(&records) {
            return Err(Error::DuplicateId { id: id.to_string() });
        }
        let count = records.len();
        self.commit(records)?;
        info!(count, "Imported medications");
        Ok(count)
    }

    /// Borrow the underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().simple().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

/// The first id that appears more than once in `records`.
#[must_use]
pub fn first_duplicate_id(records: &[Medication]) -> Option<&str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|m| m.id.as_str())
        .find(|id| !seen.insert(*id))
}

/// `records` followed by `added`.
#[must_use]
pub fn with_added(records: &[Medication], added: Vec<Medication>) -> Vec<Medication> {
    records.iter().cloned().chain(added).collect()
}

/// `records` without the record `id`.
#[must_use]
pub fn without(records: &[Medication], id: &str) -> Vec<Medication> {
    records.iter().filter(|m| m.id != id).cloned().collect()
}

/// `records` with `last_taken` of record `id` set to `when`.
#[must_use]
pub fn with_taken(records: &[Medication], id: &str, when: DateTime<Utc>) -> Vec<Medication> {
    records
        .iter()
        .map(|m| {
            if m.id == id {
                Medication {
                    last_taken: Some(when),
                    ..m.clone()
                }
            } else {
                m.clone()
            }
        })
        .collect()
}
