//! Event Store
//!
//! Owns the authoritative events (by id) and the derived date index. All
//! mutation goes through `create`, `update`, `move_to` and `remove`, which
//! validate first and then touch both structures together. After every call:
//!
//! - every id in a date bucket resolves to an event with that date,
//! - every event sits in exactly one bucket,
//! - no bucket is empty.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::models::ReleaseEvent;
use crate::core::{CoreError, CoreResult, EventId};

/// Dual-indexed collection of release events
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events_by_id: HashMap<EventId, ReleaseEvent>,
    ids_by_date: BTreeMap<NaiveDate, Vec<EventId>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store by creating each event in order.
    pub fn from_events<I>(events: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = ReleaseEvent>,
    {
        let mut store = Self::new();
        for event in events {
            store.create(event)?;
        }
        Ok(store)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Inserts a new event at the end of its date bucket.
    pub fn create(&mut self, event: ReleaseEvent) -> CoreResult<()> {
        if self.events_by_id.contains_key(event.id()) {
            return Err(CoreError::DuplicateIdentifier(event.id().to_string()));
        }

        let id = event.id().to_string();
        self.ids_by_date
            .entry(event.date)
            .or_default()
            .push(id.clone());
        self.events_by_id.insert(id, event);
        Ok(())
    }

    /// Removes an event and returns it.
    pub fn remove(&mut self, id: &str) -> CoreResult<ReleaseEvent> {
        let date = self
            .events_by_id
            .get(id)
            .map(|event| event.date)
            .ok_or_else(|| CoreError::EventNotFound(id.to_string()))?;

        self.detach_from_bucket(date, id);
        self.events_by_id
            .remove(id)
            .ok_or_else(|| CoreError::EventNotFound(id.to_string()))
    }

    /// Replaces the stored event with the same id and returns the previous
    /// version. A date change moves the id to the end of the new bucket; an
    /// unchanged date keeps its bucket position.
    pub fn update(&mut self, event: ReleaseEvent) -> CoreResult<ReleaseEvent> {
        let old_date = self
            .events_by_id
            .get(event.id())
            .map(|old| old.date)
            .ok_or_else(|| CoreError::EventNotFound(event.id().to_string()))?;

        let id = event.id().to_string();
        if old_date != event.date {
            self.detach_from_bucket(old_date, &id);
            self.ids_by_date
                .entry(event.date)
                .or_default()
                .push(id.clone());
        }

        self.events_by_id
            .insert(id.clone(), event)
            .ok_or(CoreError::EventNotFound(id))
    }

    /// Reschedules an event to `date`.
    pub fn move_to(&mut self, id: &str, date: NaiveDate) -> CoreResult<ReleaseEvent> {
        let mut moved = self
            .events_by_id
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::EventNotFound(id.to_string()))?;
        moved.date = date;
        self.update(moved)
    }

    fn detach_from_bucket(&mut self, date: NaiveDate, id: &str) {
        if let Some(bucket) = self.ids_by_date.get_mut(&date) {
            bucket.retain(|existing| existing != id);
            if bucket.is_empty() {
                self.ids_by_date.remove(&date);
                debug!("Pruned empty date bucket {}", date);
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get(&self, id: &str) -> Option<&ReleaseEvent> {
        self.events_by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.events_by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.events_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events_by_id.is_empty()
    }

    /// Events on `date` in insertion order.
    pub fn events_for_date(&self, date: NaiveDate) -> Vec<&ReleaseEvent> {
        self.ids_by_date
            .get(&date)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.events_by_id.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Events dated within `start..=end`, chronological and in bucket order
    /// within a day. Filters the events themselves rather than the buckets.
    pub fn events_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<&ReleaseEvent> {
        let (start, end) = if start > end {
            warn!("Reversed date range {}..{}, swapping", start, end);
            (end, start)
        } else {
            (start, end)
        };

        let mut hits: Vec<&ReleaseEvent> = self
            .events_by_id
            .values()
            .filter(|event| event.date >= start && event.date <= end)
            .collect();
        hits.sort_by_key(|event| (event.date, self.bucket_position(event)));
        hits
    }

    fn bucket_position(&self, event: &ReleaseEvent) -> usize {
        self.ids_by_date
            .get(&event.date)
            .and_then(|ids| ids.iter().position(|id| id == event.id()))
            .unwrap_or(usize::MAX)
    }

    /// All events, chronological and in bucket order within a day.
    pub fn events(&self) -> Vec<&ReleaseEvent> {
        self.ids_by_date
            .values()
            .flat_map(|ids| ids.iter().filter_map(|id| self.events_by_id.get(id)))
            .collect()
    }

    /// Dates that have at least one event.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.ids_by_date.keys().copied()
    }

    /// Read-only view of the date index.
    pub fn date_index(&self) -> &BTreeMap<NaiveDate, Vec<EventId>> {
        &self.ids_by_date
    }

    /// Distinct content types used by at least one event, sorted.
    pub fn content_types_in_use(&self) -> BTreeSet<&str> {
        self.events_by_id
            .values()
            .map(|event| event.content_type.as_str())
            .collect()
    }

    /// Verifies the index invariants, describing the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen: HashMap<&str, NaiveDate> = HashMap::new();
        for (date, ids) in &self.ids_by_date {
            if ids.is_empty() {
                return Err(format!("empty bucket for {date}"));
            }
            for id in ids {
                let event = self
                    .events_by_id
                    .get(id)
                    .ok_or_else(|| format!("bucket {date} references missing event {id}"))?;
                if event.date != *date {
                    return Err(format!(
                        "event {id} is dated {} but indexed under {date}",
                        event.date
                    ));
                }
                if let Some(previous) = seen.insert(id.as_str(), *date) {
                    return Err(format!("event {id} indexed under {previous} and {date}"));
                }
            }
        }
        if seen.len() != self.events_by_id.len() {
            return Err(format!(
                "{} events but {} indexed ids",
                self.events_by_id.len(),
                seen.len()
            ));
        }
        Ok(())
    }
}
