use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for persisted bookings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

/// Identifier wrapper for advertised properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// Identifier wrapper for marketplace users, students and landlords alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Role an authenticated caller holds in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student,
    Landlord,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Landlord => "landlord",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An authenticated caller, as produced by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

/// Lifecycle states a booking request moves through.
///
/// `Rejected` and `Cancelled` are terminal; `Approved` accepts only
/// cancellation. Nothing ever returns a booking to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Rejected | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side of the tenancy cancelled a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellingParty {
    Student,
    Landlord,
}

impl CancellingParty {
    pub const fn label(self) -> &'static str {
        match self {
            CancellingParty::Student => "student",
            CancellingParty::Landlord => "landlord",
        }
    }
}

/// One student's request to rent one property.
///
/// `landlord` records the owner of `property` at the moment the booking was
/// created and is never re-derived afterwards, even if the property changes
/// hands; every later authorization decision compares against this frozen
/// reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub property: PropertyId,
    pub student: UserId,
    pub landlord: UserId,
    pub status: BookingStatus,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub total_price: Option<f64>,
    pub notes: Option<String>,
    pub cancelled_by: Option<CancellingParty>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn belongs_to_student(&self, user: &UserId) -> bool {
        &self.student == user
    }

    pub fn managed_by_landlord(&self, user: &UserId) -> bool {
        &self.landlord == user
    }

    /// Cancellation metadata is present exactly when the booking is
    /// cancelled, on both sides of the equivalence.
    pub fn cancellation_fields_consistent(&self) -> bool {
        match self.status {
            BookingStatus::Cancelled => self.cancelled_by.is_some() && self.cancelled_at.is_some(),
            _ => self.cancelled_by.is_none() && self.cancelled_at.is_none(),
        }
    }
}
