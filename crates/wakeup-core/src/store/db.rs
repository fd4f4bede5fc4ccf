//! Persistent storage for the wake-up cycle using redb.
//!
//! # Table design
//!
//! Values are JSON-encoded records. Keys:
//!
//! ```text
//! subscribers    [ subscriber uuid: 16 bytes ]
//! call_attempts  [ slot_ms: u64 big-endian (8 bytes) | subscriber uuid: 16 bytes ]
//! contacts       [ requester uuid: 16 bytes | target uuid: 16 bytes ]
//! ```
//!
//! Because the slot timestamp occupies the high bytes of an attempt key in
//! big-endian encoding, all attempts of one slot are contiguous and a single
//! range scan `slot_lower(slot)..=slot_upper(slot)` returns exactly them.
//! The same key also makes (slot, subscriber) unique, which is what turns
//! `create_attempt` into an idempotent operation.

use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Result, WakeupError};
use crate::model::{CallAttempt, ContactRelation, ContactStatus, Subscriber};
use crate::slot::Slot;

use super::{FinalizeSummary, WakeupStore};

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

type BytesTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

const SUBSCRIBERS: BytesTable = TableDefinition::new("subscribers");
const CALL_ATTEMPTS: BytesTable = TableDefinition::new("call_attempts");
const CONTACTS: BytesTable = TableDefinition::new("contacts");

type Row = (Vec<u8>, Vec<u8>);

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

/// Slot millis with the sign bit flipped, so byte order matches time order
/// on both sides of the epoch.
fn slot_prefix(slot: Slot) -> [u8; 8] {
    ((slot.timestamp_millis() as u64) ^ (1 << 63)).to_be_bytes()
}

fn attempt_key(slot: Slot, subscriber: Uuid) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..8].copy_from_slice(&slot_prefix(slot));
    key[8..].copy_from_slice(subscriber.as_bytes());
    key
}

/// Smallest attempt key of `slot` (nil subscriber UUID).
fn slot_lower(slot: Slot) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..8].copy_from_slice(&slot_prefix(slot));
    key
}

/// Largest attempt key of `slot`: the suffix `0xff` × 16 is greater than
/// any valid UUID.
fn slot_upper(slot: Slot) -> [u8; 24] {
    let mut key = slot_lower(slot);
    key[8..].fill(0xff);
    key
}

fn contact_key(requester: Uuid, target: Uuid) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(requester.as_bytes());
    key[16..].copy_from_slice(target.as_bytes());
    key
}

// ---------------------------------------------------------------------------
// Codec / scan helpers
// ---------------------------------------------------------------------------

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn collect_all<T>(table: &T) -> Result<Vec<Row>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let mut rows = Vec::new();
    for entry in table.iter().map_err(WakeupError::store)? {
        let (k, v) = entry.map_err(WakeupError::store)?;
        rows.push((k.value().to_vec(), v.value().to_vec()));
    }
    Ok(rows)
}

fn collect_range<T>(table: &T, lo: &[u8], hi: &[u8]) -> Result<Vec<Row>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let mut rows = Vec::new();
    for entry in table.range(lo..=hi).map_err(WakeupError::store)? {
        let (k, v) = entry.map_err(WakeupError::store)?;
        rows.push((k.value().to_vec(), v.value().to_vec()));
    }
    Ok(rows)
}

fn decode_rows<T: DeserializeOwned>(rows: &[Row]) -> Result<Vec<T>> {
    rows.iter().map(|(_, v)| decode(v)).collect()
}

// ---------------------------------------------------------------------------
// WakeupDb
// ---------------------------------------------------------------------------

/// redb-backed [`WakeupStore`].
pub struct WakeupDb {
    db: Database,
}

impl WakeupDb {
    /// Open or create the redb database at `path`.
    ///
    /// Creates all tables if they don't already exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(WakeupError::store)?;
        let wt = db.begin_write().map_err(WakeupError::store)?;
        for def in [SUBSCRIBERS, CALL_ATTEMPTS, CONTACTS] {
            wt.open_table(def).map_err(WakeupError::store)?;
        }
        wt.commit().map_err(WakeupError::store)?;
        Ok(Self { db })
    }

    /// Run `f` in one write transaction and commit if it succeeds.
    /// An error drops the transaction, which aborts it.
    fn write<R>(&self, f: impl FnOnce(&WriteTransaction) -> Result<R>) -> Result<R> {
        let wt = self.db.begin_write().map_err(WakeupError::store)?;
        let out = f(&wt)?;
        wt.commit().map_err(WakeupError::store)?;
        Ok(out)
    }

    fn read_all<T: DeserializeOwned>(&self, def: BytesTable) -> Result<Vec<T>> {
        let rt = self.db.begin_read().map_err(WakeupError::store)?;
        let table = rt.open_table(def).map_err(WakeupError::store)?;
        decode_rows(&collect_all(&table)?)
    }

    fn read_one<T: DeserializeOwned>(&self, def: BytesTable, key: &[u8]) -> Result<Option<T>> {
        let rt = self.db.begin_read().map_err(WakeupError::store)?;
        let table = rt.open_table(def).map_err(WakeupError::store)?;
        let raw = table
            .get(key)
            .map_err(WakeupError::store)?
            .map(|g| g.value().to_vec());
        raw.map(|r| decode(&r)).transpose()
    }

    /// Read-modify-write a single attempt inside one transaction.
    fn update_attempt(
        &self,
        slot: Slot,
        subscriber: Uuid,
        f: impl FnOnce(&mut CallAttempt),
    ) -> Result<()> {
        let key = attempt_key(slot, subscriber);
        self.write(|wt| {
            let mut table = wt.open_table(CALL_ATTEMPTS).map_err(WakeupError::store)?;
            let raw = table
                .get(key.as_slice())
                .map_err(WakeupError::store)?
                .map(|g| g.value().to_vec());
            let Some(raw) = raw else {
                return Err(WakeupError::AttemptNotFound {
                    subscriber: subscriber.to_string(),
                    slot: slot.to_string(),
                });
            };
            let mut attempt: CallAttempt = decode(&raw)?;
            f(&mut attempt);
            attempt.updated_at = Utc::now();
            table
                .insert(key.as_slice(), encode(&attempt)?.as_slice())
                .map_err(WakeupError::store)?;
            Ok(())
        })
    }
}

impl WakeupStore for WakeupDb {
    fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
        let value = encode(subscriber)?;
        self.write(|wt| {
            let mut table = wt.open_table(SUBSCRIBERS).map_err(WakeupError::store)?;
            let existing: Vec<Subscriber> = decode_rows(&collect_all(&table)?)?;
            if existing
                .iter()
                .any(|s| s.username == subscriber.username || s.id == subscriber.id)
            {
                return Err(WakeupError::SubscriberExists(subscriber.username.clone()));
            }
            table
                .insert(subscriber.id.as_bytes().as_slice(), value.as_slice())
                .map_err(WakeupError::store)?;
            Ok(())
        })
    }

    fn update_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
        let value = encode(subscriber)?;
        self.write(|wt| {
            let mut table = wt.open_table(SUBSCRIBERS).map_err(WakeupError::store)?;
            let key = subscriber.id.as_bytes();
            let exists = table
                .get(key.as_slice())
                .map_err(WakeupError::store)?
                .is_some();
            if !exists {
                return Err(WakeupError::SubscriberNotFound(subscriber.id.to_string()));
            }
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(WakeupError::store)?;
            Ok(())
        })
    }

    fn get_subscriber(&self, id: Uuid) -> Result<Option<Subscriber>> {
        self.read_one(SUBSCRIBERS, id.as_bytes().as_slice())
    }

    fn find_subscriber(&self, username: &str) -> Result<Option<Subscriber>> {
        Ok(self
            .list_subscribers()?
            .into_iter()
            .find(|s| s.username == username))
    }

    fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        let mut all: Vec<Subscriber> = self.read_all(SUBSCRIBERS)?;
        all.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(all)
    }

    fn select_due(&self, slot: Slot) -> Result<Vec<Subscriber>> {
        let slot_time = slot.time_of_day();
        Ok(self
            .list_subscribers()?
            .into_iter()
            .filter(|s| s.is_due_at(slot_time))
            .collect())
    }

    fn create_attempt(&self, slot: Slot, subscriber: Uuid) -> Result<CallAttempt> {
        let key = attempt_key(slot, subscriber);
        self.write(|wt| {
            let mut table = wt.open_table(CALL_ATTEMPTS).map_err(WakeupError::store)?;
            let raw = table
                .get(key.as_slice())
                .map_err(WakeupError::store)?
                .map(|g| g.value().to_vec());
            if let Some(raw) = raw {
                return decode(&raw);
            }
            let attempt = CallAttempt::new(subscriber, slot);
            table
                .insert(key.as_slice(), encode(&attempt)?.as_slice())
                .map_err(WakeupError::store)?;
            Ok(attempt)
        })
    }

    fn get_attempt(&self, slot: Slot, subscriber: Uuid) -> Result<Option<CallAttempt>> {
        self.read_one(CALL_ATTEMPTS, attempt_key(slot, subscriber).as_slice())
    }

    fn attempts_for_slot(&self, slot: Slot) -> Result<Vec<CallAttempt>> {
        let rt = self.db.begin_read().map_err(WakeupError::store)?;
        let table = rt.open_table(CALL_ATTEMPTS).map_err(WakeupError::store)?;
        decode_rows(&collect_range(&table, &slot_lower(slot), &slot_upper(slot))?)
    }

    fn attempts_for_subscriber(&self, subscriber: Uuid) -> Result<Vec<CallAttempt>> {
        Ok(self
            .list_attempts()?
            .into_iter()
            .filter(|a| a.subscriber_id == subscriber)
            .collect())
    }

    fn list_attempts(&self) -> Result<Vec<CallAttempt>> {
        self.read_all(CALL_ATTEMPTS)
    }

    fn record_dispatch(
        &self,
        slot: Slot,
        subscriber: Uuid,
        redial: bool,
        error_code: Option<&str>,
    ) -> Result<()> {
        self.update_attempt(slot, subscriber, |attempt| {
            if redial {
                attempt.retry_count += 1;
            }
            attempt.error_code = error_code.map(str::to_string);
        })
    }

    fn mark_answered(&self, slot: Slot, subscriber: Uuid) -> Result<()> {
        self.update_attempt(slot, subscriber, |attempt| attempt.answered = true)
    }

    fn mark_snoozed(&self, slot: Slot) -> Result<Vec<Uuid>> {
        let (lo, hi) = (slot_lower(slot), slot_upper(slot));
        self.write(|wt| {
            let mut table = wt.open_table(CALL_ATTEMPTS).map_err(WakeupError::store)?;
            let rows = collect_range(&table, &lo, &hi)?;
            let mut unanswered = Vec::new();
            for (key, raw) in rows {
                let mut attempt: CallAttempt = decode(&raw)?;
                if attempt.answered {
                    continue;
                }
                unanswered.push(attempt.subscriber_id);
                if !attempt.snoozed {
                    attempt.snoozed = true;
                    attempt.updated_at = Utc::now();
                    table
                        .insert(key.as_slice(), encode(&attempt)?.as_slice())
                        .map_err(WakeupError::store)?;
                }
            }
            Ok(unanswered)
        })
    }

    fn insert_contact(&self, contact: &ContactRelation) -> Result<()> {
        let key = contact_key(contact.requester, contact.target);
        let value = encode(contact)?;
        self.write(|wt| {
            let mut table = wt.open_table(CONTACTS).map_err(WakeupError::store)?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(WakeupError::store)?;
            Ok(())
        })
    }

    fn contacts_for_slot(
        &self,
        slot: Slot,
        status: ContactStatus,
    ) -> Result<Vec<ContactRelation>> {
        let rt = self.db.begin_read().map_err(WakeupError::store)?;
        let attempts = rt.open_table(CALL_ATTEMPTS).map_err(WakeupError::store)?;
        let participants: HashSet<Uuid> =
            decode_rows::<CallAttempt>(&collect_range(&attempts, &slot_lower(slot), &slot_upper(slot))?)?
                .into_iter()
                .map(|a| a.subscriber_id)
                .collect();
        if participants.is_empty() {
            return Ok(Vec::new());
        }

        let contacts = rt.open_table(CONTACTS).map_err(WakeupError::store)?;
        let mut matching: Vec<ContactRelation> = decode_rows::<ContactRelation>(&collect_all(&contacts)?)?
            .into_iter()
            .filter(|c| c.status == status && participants.contains(&c.requester))
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matching)
    }

    fn finalize_slot(&self, slot: Slot) -> Result<FinalizeSummary> {
        let (lo, hi) = (slot_lower(slot), slot_upper(slot));
        self.write(|wt| {
            let participants: Vec<Uuid> = {
                let attempts = wt.open_table(CALL_ATTEMPTS).map_err(WakeupError::store)?;
                decode_rows::<CallAttempt>(&collect_range(&attempts, &lo, &hi)?)?
                    .into_iter()
                    .map(|a| a.subscriber_id)
                    .collect()
            };

            let mut summary = FinalizeSummary {
                participants: participants.len(),
                ..FinalizeSummary::default()
            };
            let mut subscribers = wt.open_table(SUBSCRIBERS).map_err(WakeupError::store)?;
            for id in &participants {
                let key = id.as_bytes();
                let raw = subscribers
                    .get(key.as_slice())
                    .map_err(WakeupError::store)?
                    .map(|g| g.value().to_vec());
                // Subscriber removed out from under the cycle; nothing to reset.
                let Some(raw) = raw else { continue };

                let mut subscriber: Subscriber = decode(&raw)?;
                let mut changed = false;
                if subscriber.any_match {
                    subscriber.any_match = false;
                    summary.any_match_cleared += 1;
                    changed = true;
                }
                if !subscriber.recurring && subscriber.alarm_on {
                    subscriber.alarm_on = false;
                    summary.alarm_cleared += 1;
                    changed = true;
                }
                if changed {
                    subscribers
                        .insert(key.as_slice(), encode(&subscriber)?.as_slice())
                        .map_err(WakeupError::store)?;
                }
            }
            Ok(summary)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
