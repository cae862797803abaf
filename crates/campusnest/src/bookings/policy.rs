//! Access policy for the booking workflow.
//!
//! The policy answers one question: may this actor perform this operation
//! on this booking? It looks only at roles and at the student/landlord ids
//! frozen into the booking record, never at the booking status. Status
//! legality is the state machine's concern.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::domain::{Actor, Booking, Role};

/// Operations the policy gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingOperation {
    Read,
    Approve,
    Reject,
    Cancel,
}

impl BookingOperation {
    pub const fn label(self) -> &'static str {
        match self {
            BookingOperation::Read => "read",
            BookingOperation::Approve => "approve",
            BookingOperation::Reject => "reject",
            BookingOperation::Cancel => "cancel",
        }
    }
}

impl fmt::Display for BookingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("only students may request bookings")]
    StudentRoleRequired,
    #[error("only the managing landlord may {0} a booking")]
    LandlordRoleRequired(BookingOperation),
    #[error("booking belongs to a different student")]
    NotBookingStudent,
    #[error("booking is managed by a different landlord")]
    NotManagingLandlord,
    #[error("actor is not a party to this tenancy")]
    NotTenancyParty,
}

/// Gate for creating a new booking request. Only students place requests;
/// landlords and admins work through the moderation operations instead.
pub fn authorize_request(actor: &Actor) -> Result<(), AccessDenied> {
    match actor.role {
        Role::Student => Ok(()),
        Role::Landlord | Role::Admin => Err(AccessDenied::StudentRoleRequired),
    }
}

/// Gate for operations on an existing booking.
pub fn authorize(
    actor: &Actor,
    booking: &Booking,
    operation: BookingOperation,
) -> Result<(), AccessDenied> {
    match operation {
        BookingOperation::Read => match actor.role {
            Role::Admin => Ok(()),
            Role::Student if booking.belongs_to_student(&actor.id) => Ok(()),
            Role::Landlord if booking.managed_by_landlord(&actor.id) => Ok(()),
            _ => Err(AccessDenied::NotTenancyParty),
        },
        BookingOperation::Approve | BookingOperation::Reject => match actor.role {
            Role::Landlord if booking.managed_by_landlord(&actor.id) => Ok(()),
            Role::Landlord => Err(AccessDenied::NotManagingLandlord),
            Role::Student | Role::Admin => Err(AccessDenied::LandlordRoleRequired(operation)),
        },
        BookingOperation::Cancel => match actor.role {
            Role::Student if booking.belongs_to_student(&actor.id) => Ok(()),
            Role::Student => Err(AccessDenied::NotBookingStudent),
            Role::Landlord if booking.managed_by_landlord(&actor.id) => Ok(()),
            Role::Landlord => Err(AccessDenied::NotManagingLandlord),
            Role::Admin => Err(AccessDenied::NotTenancyParty),
        },
    }
}
