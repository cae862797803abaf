use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{Actor, BookingId, BookingStatus, CancellingParty, Role};
use super::intake::{BookingLimits, BookingSubmission, IntakeValidator, ValidationError};
use super::lifecycle::{self, BookingAction, TransitionError};
use super::policy::{self, AccessDenied, BookingOperation};
use super::repository::{
    BookingFilter, BookingNotice, BookingNotifier, BookingRecord, BookingStore, DirectoryError,
    NotifyError, OwnershipDirectory, StoreError,
};

/// Service composing intake validation, the access policy, the state
/// machine, and the persistence ports.
pub struct BookingService<S, D, N> {
    store: Arc<S>,
    directory: Arc<D>,
    notifier: Arc<N>,
    validator: IntakeValidator,
}

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_booking_id() -> BookingId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("bkg-{id:06}"))
}

impl<S, D, N> BookingService<S, D, N>
where
    S: BookingStore + 'static,
    D: OwnershipDirectory + 'static,
    N: BookingNotifier + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<D>, notifier: Arc<N>) -> Self {
        Self::with_limits(store, directory, notifier, BookingLimits::default())
    }

    pub fn with_limits(
        store: Arc<S>,
        directory: Arc<D>,
        notifier: Arc<N>,
        limits: BookingLimits,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            validator: IntakeValidator::with_limits(limits),
        }
    }

    /// Open a new booking request on behalf of a student.
    ///
    /// The managing landlord is resolved from the directory here and frozen
    /// into the booking; later ownership changes do not touch it.
    pub fn request_booking(
        &self,
        actor: &Actor,
        submission: BookingSubmission,
    ) -> Result<BookingRecord, BookingServiceError> {
        policy::authorize_request(actor)?;

        // Fields before lookups: a malformed submission is refused before
        // the directory is consulted.
        self.validator.screen(&submission)?;

        let landlord = self
            .directory
            .owner_of(&submission.property_id)?
            .ok_or(BookingServiceError::NotFound(MissingEntity::Property))?;

        let mut booking = self.validator.validate(submission, &actor.id, &landlord)?;
        booking.id = next_booking_id();

        let stored = self.store.insert(booking)?;

        let mut details = BTreeMap::new();
        details.insert("property".to_string(), stored.booking.property.0.clone());
        details.insert("student".to_string(), stored.booking.student.0.clone());
        self.notifier.notify(BookingNotice {
            template: "booking_requested".to_string(),
            booking_id: stored.booking.id.clone(),
            recipient: stored.booking.landlord.clone(),
            details,
        })?;

        Ok(stored)
    }

    /// Approve a pending booking as its managing landlord.
    pub fn approve_booking(
        &self,
        actor: &Actor,
        id: &BookingId,
    ) -> Result<BookingRecord, BookingServiceError> {
        self.transition_booking(actor, id, BookingAction::Approve)
    }

    /// Reject a pending booking as its managing landlord.
    pub fn reject_booking(
        &self,
        actor: &Actor,
        id: &BookingId,
    ) -> Result<BookingRecord, BookingServiceError> {
        self.transition_booking(actor, id, BookingAction::Reject)
    }

    /// Cancel a pending or approved booking as either tenancy party.
    pub fn cancel_booking(
        &self,
        actor: &Actor,
        id: &BookingId,
    ) -> Result<BookingRecord, BookingServiceError> {
        self.transition_booking(actor, id, BookingAction::Cancel)
    }

    /// Fetch one booking, policy-gated to its tenancy parties and admins.
    pub fn booking(
        &self,
        actor: &Actor,
        id: &BookingId,
    ) -> Result<BookingRecord, BookingServiceError> {
        let record = self
            .store
            .fetch(id)?
            .ok_or(BookingServiceError::NotFound(MissingEntity::Booking))?;
        policy::authorize(actor, &record.booking, BookingOperation::Read)?;
        Ok(record)
    }

    /// List the bookings visible to the actor. Students see their own
    /// requests, landlords the requests against their properties, admins
    /// everything.
    pub fn bookings_for(&self, actor: &Actor) -> Result<Vec<BookingRecord>, BookingServiceError> {
        let filter = match actor.role {
            Role::Student => BookingFilter {
                student: Some(actor.id.clone()),
                ..BookingFilter::default()
            },
            Role::Landlord => BookingFilter {
                landlord: Some(actor.id.clone()),
                ..BookingFilter::default()
            },
            Role::Admin => BookingFilter::default(),
        };
        Ok(self.store.find(&filter)?)
    }

    fn transition_booking(
        &self,
        actor: &Actor,
        id: &BookingId,
        action: BookingAction,
    ) -> Result<BookingRecord, BookingServiceError> {
        let record = self
            .store
            .fetch(id)?
            .ok_or(BookingServiceError::NotFound(MissingEntity::Booking))?;

        // Identity before state: an actor outside the tenancy is refused
        // before the booking's status is considered.
        policy::authorize(actor, &record.booking, operation_for(action))?;

        let next = lifecycle::transition(&record.booking, action, actor, Utc::now())?;
        let stored = self.store.update(id, record.version, next)?;

        self.notify_transition(&stored)?;
        Ok(stored)
    }

    fn notify_transition(&self, record: &BookingRecord) -> Result<(), NotifyError> {
        let booking = &record.booking;
        let (template, recipient) = match booking.cancelled_by {
            Some(CancellingParty::Student) => ("booking_cancelled", booking.landlord.clone()),
            Some(CancellingParty::Landlord) => ("booking_cancelled", booking.student.clone()),
            None => (
                match booking.status {
                    BookingStatus::Approved => "booking_approved",
                    _ => "booking_rejected",
                },
                booking.student.clone(),
            ),
        };

        let mut details = BTreeMap::new();
        details.insert("status".to_string(), booking.status.label().to_string());
        if let Some(party) = booking.cancelled_by {
            details.insert("cancelled_by".to_string(), party.label().to_string());
        }

        self.notifier.notify(BookingNotice {
            template: template.to_string(),
            booking_id: booking.id.clone(),
            recipient,
            details,
        })
    }
}

fn operation_for(action: BookingAction) -> BookingOperation {
    match action {
        BookingAction::Approve => BookingOperation::Approve,
        BookingAction::Reject => BookingOperation::Reject,
        BookingAction::Cancel => BookingOperation::Cancel,
    }
}

/// The booking or property a request referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingEntity {
    Booking,
    Property,
}

impl MissingEntity {
    pub const fn label(self) -> &'static str {
        match self {
            MissingEntity::Booking => "booking",
            MissingEntity::Property => "property",
        }
    }
}

impl fmt::Display for MissingEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error raised by the booking service.
#[derive(Debug, thiserror::Error)]
pub enum BookingServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Denied(#[from] AccessDenied),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("{0} not found")]
    NotFound(MissingEntity),
    #[error("a pending booking already exists for this student and property")]
    DuplicateRequest,
    #[error("booking was modified concurrently; retry the request")]
    Conflict,
    #[error("booking backend unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for BookingServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicatePending => BookingServiceError::DuplicateRequest,
            StoreError::Conflict => BookingServiceError::Conflict,
            StoreError::NotFound => BookingServiceError::NotFound(MissingEntity::Booking),
            StoreError::Unavailable(reason) => BookingServiceError::Unavailable(reason),
        }
    }
}

impl From<DirectoryError> for BookingServiceError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Unavailable(reason) => BookingServiceError::Unavailable(reason),
        }
    }
}
