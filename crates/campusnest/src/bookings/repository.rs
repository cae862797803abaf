//! Persistence and outbound ports for the booking workflow.
//!
//! The service talks to storage, property ownership, authentication and
//! notification through the traits below so deployments can swap in real
//! backends. In-memory editions live with the API shell and the test
//! fixtures.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::domain::{Actor, Booking, BookingId, BookingStatus, PropertyId, UserId};

/// Stored booking plus bookkeeping the store maintains on every write.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub booking: Booking,
    /// Bumped by one on every successful update.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn view(&self) -> BookingView {
        BookingView {
            booking_id: self.booking.id.clone(),
            property_id: self.booking.property.clone(),
            student_id: self.booking.student.clone(),
            landlord_id: self.booking.landlord.clone(),
            status: self.booking.status.label(),
            check_in: self.booking.check_in,
            check_out: self.booking.check_out,
            total_price: self.booking.total_price,
            notes: self.booking.notes.clone(),
            cancelled_by: self.booking.cancelled_by.map(|party| party.label()),
            cancelled_at: self.booking.cancelled_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read model handed to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub booking_id: BookingId,
    pub property_id: PropertyId,
    pub student_id: UserId,
    pub landlord_id: UserId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Conjunctive match over stored bookings. `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub student: Option<UserId>,
    pub landlord: Option<UserId>,
    pub property: Option<PropertyId>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    /// Filter backing the one-pending-request rule for a (student, property)
    /// pair.
    pub fn pending_pair(student: UserId, property: PropertyId) -> Self {
        Self {
            student: Some(student),
            landlord: None,
            property: Some(property),
            status: Some(BookingStatus::Pending),
        }
    }

    pub fn matches(&self, record: &BookingRecord) -> bool {
        let booking = &record.booking;
        self.student
            .as_ref()
            .map_or(true, |student| booking.student == *student)
            && self
                .landlord
                .as_ref()
                .map_or(true, |landlord| booking.landlord == *landlord)
            && self
                .property
                .as_ref()
                .map_or(true, |property| booking.property == *property)
            && self.status.map_or(true, |status| booking.status == status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The insert would leave two live pending requests for one
    /// (student, property) pair.
    #[error("a pending booking already exists for this student and property")]
    DuplicatePending,
    #[error("booking was modified concurrently")]
    Conflict,
    #[error("booking does not exist")]
    NotFound,
    #[error("booking store unavailable: {0}")]
    Unavailable(String),
}

/// Booking persistence.
///
/// `insert` must be atomic with respect to the pending-pair rule: when a
/// pending booking for the same (student, property) pair is already stored,
/// it fails with [`StoreError::DuplicatePending`] and stores nothing, even
/// under concurrent inserts. Backends that cannot promise this wrap
/// themselves in [`super::guard::GuardedStore`].
pub trait BookingStore: Send + Sync {
    fn insert(&self, booking: Booking) -> Result<BookingRecord, StoreError>;

    fn fetch(&self, id: &BookingId) -> Result<Option<BookingRecord>, StoreError>;

    /// Replace the stored booking if its version still equals
    /// `expected_version`. Fails with [`StoreError::Conflict`] when another
    /// writer got there first.
    fn update(
        &self,
        id: &BookingId,
        expected_version: u64,
        next: Booking,
    ) -> Result<BookingRecord, StoreError>;

    fn find(&self, filter: &BookingFilter) -> Result<Vec<BookingRecord>, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("property directory unavailable: {0}")]
    Unavailable(String),
}

/// Resolves the landlord responsible for a property at request time. The
/// answer is copied into the booking and never consulted again for that
/// booking.
pub trait OwnershipDirectory: Send + Sync {
    fn owner_of(&self, property: &PropertyId) -> Result<Option<UserId>, DirectoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer credentials")]
    MissingCredentials,
    #[error("credentials do not match a known account")]
    UnknownCredentials,
}

/// Turns presented credentials into an [`Actor`].
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, bearer: Option<&str>) -> Result<Actor, AuthError>;
}

/// Notification queued for a tenancy party after a booking changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingNotice {
    pub template: String,
    pub booking_id: BookingId,
    pub recipient: UserId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Outbound notification channel. Delivery runs after the booking write
/// lands, so a failure here never rolls the booking back.
pub trait BookingNotifier: Send + Sync {
    fn notify(&self, notice: BookingNotice) -> Result<(), NotifyError>;
}
