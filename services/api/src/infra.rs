use campusnest::bookings::{
    Actor, AuthError, Authenticator, Booking, BookingFilter, BookingId, BookingNotice,
    BookingNotifier, BookingRecord, BookingStore, DirectoryError, NotifyError, OwnershipDirectory,
    PropertyId, Role, StoreError, UserId,
};
use chrono::{NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// HashMap-backed booking store. It has no native pending-pair constraint,
/// so the wiring wraps it in `GuardedStore`.
#[derive(Default, Clone)]
pub(crate) struct InMemoryBookingStore {
    records: Arc<Mutex<HashMap<BookingId, BookingRecord>>>,
}

impl BookingStore for InMemoryBookingStore {
    fn insert(&self, booking: Booking) -> Result<BookingRecord, StoreError> {
        let mut guard = self.records.lock().expect("booking store mutex poisoned");
        if guard.contains_key(&booking.id) {
            return Err(StoreError::Conflict);
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
        let guard = self.records.lock().expect("booking store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(
        &self,
        id: &BookingId,
        expected_version: u64,
        next: Booking,
    ) -> Result<BookingRecord, StoreError> {
        let mut guard = self.records.lock().expect("booking store mutex poisoned");
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        if record.version != expected_version {
            return Err(StoreError::Conflict);
        }
        debug_assert!(next.cancellation_fields_consistent());
        record.booking = next;
        record.version += 1;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn find(&self, filter: &BookingFilter) -> Result<Vec<BookingRecord>, StoreError> {
        let guard = self.records.lock().expect("booking store mutex poisoned");
        let mut matches: Vec<_> = guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.booking.id.0.cmp(&b.booking.id.0))
        });
        Ok(matches)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryOwnershipDirectory {
    owners: Arc<Mutex<HashMap<PropertyId, UserId>>>,
}

impl InMemoryOwnershipDirectory {
    pub(crate) fn assign(&self, property: PropertyId, owner: UserId) {
        self.owners
            .lock()
            .expect("directory mutex poisoned")
            .insert(property, owner);
    }
}

impl OwnershipDirectory for InMemoryOwnershipDirectory {
    fn owner_of(&self, property: &PropertyId) -> Result<Option<UserId>, DirectoryError> {
        let guard = self.owners.lock().expect("directory mutex poisoned");
        Ok(guard.get(property).cloned())
    }
}

/// Notifier that lands deliveries in the service log. A transport-backed
/// edition slots in behind the same trait.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifier;

impl BookingNotifier for LoggingNotifier {
    fn notify(&self, notice: BookingNotice) -> Result<(), NotifyError> {
        tracing::info!(
            template = %notice.template,
            booking = %notice.booking_id.0,
            recipient = %notice.recipient.0,
            "booking notice dispatched"
        );
        Ok(())
    }
}

/// Notifier that keeps deliveries around for inspection; the demo prints
/// them once the walkthrough finishes.
#[derive(Default, Clone)]
pub(crate) struct CollectingNotifier {
    notices: Arc<Mutex<Vec<BookingNotice>>>,
}

impl CollectingNotifier {
    pub(crate) fn notices(&self) -> Vec<BookingNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl BookingNotifier for CollectingNotifier {
    fn notify(&self, notice: BookingNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Bearer-token authenticator over a fixed account table. Stands in for
/// the campus identity provider during demos and local runs.
pub(crate) struct StaticTokenAuthenticator {
    actors: HashMap<String, Actor>,
}

impl StaticTokenAuthenticator {
    pub(crate) fn with_demo_accounts() -> Self {
        let mut actors = HashMap::new();
        actors.insert("student-sam-token".to_string(), demo_student());
        actors.insert("student-ines-token".to_string(), demo_second_student());
        actors.insert("landlord-ada-token".to_string(), demo_landlord());
        actors.insert(
            "admin-root-token".to_string(),
            Actor {
                id: UserId("admin-root".to_string()),
                role: Role::Admin,
            },
        );
        Self { actors }
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, bearer: Option<&str>) -> Result<Actor, AuthError> {
        let token = bearer.ok_or(AuthError::MissingCredentials)?;
        self.actors
            .get(token)
            .cloned()
            .ok_or(AuthError::UnknownCredentials)
    }
}

pub(crate) fn demo_student() -> Actor {
    Actor {
        id: UserId("student-sam".to_string()),
        role: Role::Student,
    }
}

pub(crate) fn demo_second_student() -> Actor {
    Actor {
        id: UserId("student-ines".to_string()),
        role: Role::Student,
    }
}

pub(crate) fn demo_landlord() -> Actor {
    Actor {
        id: UserId("landlord-ada".to_string()),
        role: Role::Landlord,
    }
}

/// Listings the demo accounts can book straight away.
pub(crate) fn seed_demo_properties(directory: &InMemoryOwnershipDirectory) {
    directory.assign(PropertyId("maple-12".to_string()), demo_landlord().id);
    directory.assign(PropertyId("birch-4".to_string()), demo_landlord().id);
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
