//! Serialization layer for stores without a native pending-pair constraint.
//!
//! [`GuardedStore`] wraps any [`BookingStore`] and takes a per-pair mutex
//! around insert so the existence check and the write behave as one step.
//! Stores that enforce the rule themselves (a partial unique index, or the
//! in-memory stores here) do not need the wrapper.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{Booking, BookingId, PropertyId, UserId};
use super::repository::{BookingFilter, BookingRecord, BookingStore, StoreError};

type PairKey = (UserId, PropertyId);

/// Lazily grown table of one mutex per (student, property) pair.
///
/// Lock ordering: the table mutex is never held while a pair mutex is
/// taken, so the two levels cannot deadlock.
#[derive(Debug, Default)]
pub struct PairLockTable {
    slots: Mutex<HashMap<PairKey, Arc<Mutex<()>>>>,
}

impl PairLockTable {
    fn slot(&self, key: PairKey) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().expect("pair lock table poisoned");
        slots.entry(key).or_default().clone()
    }
}

/// [`BookingStore`] decorator enforcing one live pending request per
/// (student, property) pair.
#[derive(Debug)]
pub struct GuardedStore<S> {
    inner: S,
    locks: PairLockTable,
}

impl<S> GuardedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            locks: PairLockTable::default(),
        }
    }
}

impl<S: BookingStore> BookingStore for GuardedStore<S> {
    fn insert(&self, booking: Booking) -> Result<BookingRecord, StoreError> {
        let slot = self
            .locks
            .slot((booking.student.clone(), booking.property.clone()));
        let _held = slot.lock().expect("pair lock poisoned");

        let pending =
            BookingFilter::pending_pair(booking.student.clone(), booking.property.clone());
        if !self.inner.find(&pending)?.is_empty() {
            return Err(StoreError::DuplicatePending);
        }
        self.inner.insert(booking)
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<BookingRecord>, StoreError> {
        self.inner.fetch(id)
    }

    fn update(
        &self,
        id: &BookingId,
        expected_version: u64,
        next: Booking,
    ) -> Result<BookingRecord, StoreError> {
        // Transitions never create a pending booking, so updates pass
        // straight through.
        self.inner.update(id, expected_version, next)
    }

    fn find(&self, filter: &BookingFilter) -> Result<Vec<BookingRecord>, StoreError> {
        self.inner.find(filter)
    }
}
