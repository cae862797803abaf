use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::bookings::domain::{
    Actor, Booking, BookingId, BookingStatus, CancellingParty, PropertyId, Role, UserId,
};
use crate::bookings::intake::BookingSubmission;
use crate::bookings::repository::{
    AuthError, Authenticator, BookingFilter, BookingNotice, BookingNotifier, BookingRecord,
    BookingStore, DirectoryError, NotifyError, OwnershipDirectory, StoreError,
};
use crate::bookings::{booking_router, BookingApi, BookingService};

pub(super) fn student() -> Actor {
    Actor {
        id: UserId("stu-1".to_string()),
        role: Role::Student,
    }
}

pub(super) fn other_student() -> Actor {
    Actor {
        id: UserId("stu-2".to_string()),
        role: Role::Student,
    }
}

pub(super) fn landlord() -> Actor {
    Actor {
        id: UserId("lld-1".to_string()),
        role: Role::Landlord,
    }
}

pub(super) fn other_landlord() -> Actor {
    Actor {
        id: UserId("lld-2".to_string()),
        role: Role::Landlord,
    }
}

pub(super) fn admin() -> Actor {
    Actor {
        id: UserId("adm-1".to_string()),
        role: Role::Admin,
    }
}

pub(super) fn property() -> PropertyId {
    PropertyId("prop-7".to_string())
}

pub(super) fn submission() -> BookingSubmission {
    BookingSubmission {
        property_id: property(),
        check_in: NaiveDate::from_ymd_opt(2026, 9, 1),
        check_out: NaiveDate::from_ymd_opt(2027, 5, 31),
        total_price: Some(7_650.0),
        notes: Some("Two quiet tenants, no pets.".to_string()),
    }
}

pub(super) fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn pending_booking(id: &str) -> Booking {
    Booking {
        id: BookingId(id.to_string()),
        property: property(),
        student: student().id,
        landlord: landlord().id,
        status: BookingStatus::Pending,
        check_in: NaiveDate::from_ymd_opt(2026, 9, 1),
        check_out: NaiveDate::from_ymd_opt(2027, 5, 31),
        total_price: Some(7_650.0),
        notes: None,
        cancelled_by: None,
        cancelled_at: None,
    }
}

pub(super) fn booking_with_status(id: &str, status: BookingStatus) -> Booking {
    let mut booking = pending_booking(id);
    booking.status = status;
    if status == BookingStatus::Cancelled {
        booking.cancelled_by = Some(CancellingParty::Student);
        booking.cancelled_at = Some(fixed_time());
    }
    booking
}

pub(super) fn build_service() -> (
    BookingService<MemoryStore, MemoryDirectory, MemoryNotifier>,
    Arc<MemoryStore>,
    Arc<MemoryDirectory>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(MemoryDirectory::default());
    directory.assign(property(), landlord().id);
    let notifier = Arc::new(MemoryNotifier::default());
    let service = BookingService::new(store.clone(), directory.clone(), notifier.clone());
    (service, store, directory, notifier)
}

pub(super) fn booking_router_with_service(
    service: BookingService<MemoryStore, MemoryDirectory, MemoryNotifier>,
) -> axum::Router {
    let api = BookingApi::new(Arc::new(service), Arc::new(StaticAuth::with_known_actors()));
    booking_router(Arc::new(api))
}

/// In-memory store with the pending-pair rule enforced natively, the way a
/// database partial unique index would.
#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) records: Arc<Mutex<HashMap<BookingId, BookingRecord>>>,
}

impl BookingStore for MemoryStore {
    fn insert(&self, booking: Booking) -> Result<BookingRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let duplicate = guard.values().any(|record| {
            record.booking.status == BookingStatus::Pending
                && record.booking.student == booking.student
                && record.booking.property == booking.property
        });
        if duplicate {
            return Err(StoreError::DuplicatePending);
        }
        let now = Utc::now();
        let record = BookingRecord {
            booking,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        guard.insert(record.booking.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<BookingRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(
        &self,
        id: &BookingId,
        expected_version: u64,
        next: Booking,
    ) -> Result<BookingRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        if record.version != expected_version {
            return Err(StoreError::Conflict);
        }
        record.booking = next;
        record.version += 1;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn find(&self, filter: &BookingFilter) -> Result<Vec<BookingRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        let mut matches: Vec<_> = guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.booking.id.0.cmp(&b.booking.id.0));
        Ok(matches)
    }
}

/// Store with no uniqueness enforcement at all; exercises the guard
/// wrapper.
#[derive(Default, Clone)]
pub(super) struct PlainStore {
    pub(super) records: Arc<Mutex<HashMap<BookingId, BookingRecord>>>,
}

impl BookingStore for PlainStore {
    fn insert(&self, booking: Booking) -> Result<BookingRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let now = Utc::now();
        let record = BookingRecord {
            booking,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        guard.insert(record.booking.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<BookingRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(
        &self,
        id: &BookingId,
        expected_version: u64,
        next: Booking,
    ) -> Result<BookingRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        if record.version != expected_version {
            return Err(StoreError::Conflict);
        }
        record.booking = next;
        record.version += 1;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn find(&self, filter: &BookingFilter) -> Result<Vec<BookingRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

/// Store whose updates always lose the version race.
#[derive(Default, Clone)]
pub(super) struct StaleStore {
    pub(super) inner: MemoryStore,
}

impl BookingStore for StaleStore {
    fn insert(&self, booking: Booking) -> Result<BookingRecord, StoreError> {
        self.inner.insert(booking)
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<BookingRecord>, StoreError> {
        self.inner.fetch(id)
    }

    fn update(
        &self,
        _id: &BookingId,
        _expected_version: u64,
        _next: Booking,
    ) -> Result<BookingRecord, StoreError> {
        Err(StoreError::Conflict)
    }

    fn find(&self, filter: &BookingFilter) -> Result<Vec<BookingRecord>, StoreError> {
        self.inner.find(filter)
    }
}

pub(super) struct UnavailableStore;

impl BookingStore for UnavailableStore {
    fn insert(&self, _booking: Booking) -> Result<BookingRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &BookingId) -> Result<Option<BookingRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _id: &BookingId,
        _expected_version: u64,
        _next: Booking,
    ) -> Result<BookingRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn find(&self, _filter: &BookingFilter) -> Result<Vec<BookingRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDirectory {
    owners: Arc<Mutex<HashMap<PropertyId, UserId>>>,
}

impl MemoryDirectory {
    pub(super) fn assign(&self, property: PropertyId, owner: UserId) {
        self.owners
            .lock()
            .expect("directory mutex poisoned")
            .insert(property, owner);
    }
}

impl OwnershipDirectory for MemoryDirectory {
    fn owner_of(&self, property: &PropertyId) -> Result<Option<UserId>, DirectoryError> {
        Ok(self
            .owners
            .lock()
            .expect("directory mutex poisoned")
            .get(property)
            .cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    notices: Arc<Mutex<Vec<BookingNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn notices(&self) -> Vec<BookingNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl BookingNotifier for MemoryNotifier {
    fn notify(&self, notice: BookingNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl BookingNotifier for FailingNotifier {
    fn notify(&self, _notice: BookingNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct StaticAuth {
    actors: HashMap<String, Actor>,
}

impl StaticAuth {
    pub(super) fn with_known_actors() -> Self {
        let mut actors = HashMap::new();
        actors.insert("stu-1-token".to_string(), student());
        actors.insert("stu-2-token".to_string(), other_student());
        actors.insert("lld-1-token".to_string(), landlord());
        actors.insert("lld-2-token".to_string(), other_landlord());
        actors.insert("adm-1-token".to_string(), admin());
        Self { actors }
    }
}

impl Authenticator for StaticAuth {
    fn authenticate(&self, bearer: Option<&str>) -> Result<Actor, AuthError> {
        let token = bearer.ok_or(AuthError::MissingCredentials)?;
        self.actors
            .get(token)
            .cloned()
            .ok_or(AuthError::UnknownCredentials)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
