use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::domain::{Actor, Booking, BookingStatus, CancellingParty, Role};

/// Requested mutation of an existing booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingAction {
    Approve,
    Reject,
    Cancel,
}

impl BookingAction {
    pub const fn label(self) -> &'static str {
        match self {
            BookingAction::Approve => "approve",
            BookingAction::Reject => "reject",
            BookingAction::Cancel => "cancel",
        }
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rejections handed back by the state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("booking is {status}; {action} is not allowed from this state")]
    InvalidState {
        status: BookingStatus,
        action: BookingAction,
    },
    #[error("{role} actor may not {action} this booking")]
    Forbidden { role: Role, action: BookingAction },
}

/// Decide whether `action` is legal for `booking` and compute the result.
///
/// Pure: the same (booking, action, actor) triple always yields the same
/// decision; `at` only stamps the cancellation timestamp. State legality is
/// checked before actor identity, so a terminal booking reports
/// `InvalidState` no matter who asks. Callers wanting ownership checks to
/// run first consult the access policy before calling in here; the actor
/// gate below is a second, independent derivation of the transition table.
pub fn transition(
    booking: &Booking,
    action: BookingAction,
    actor: &Actor,
    at: DateTime<Utc>,
) -> Result<Booking, TransitionError> {
    if booking.status.is_terminal() {
        return Err(TransitionError::InvalidState {
            status: booking.status,
            action,
        });
    }

    match action {
        BookingAction::Approve | BookingAction::Reject => {
            if booking.status != BookingStatus::Pending {
                return Err(TransitionError::InvalidState {
                    status: booking.status,
                    action,
                });
            }
            if actor.role != Role::Landlord || !booking.managed_by_landlord(&actor.id) {
                return Err(TransitionError::Forbidden {
                    role: actor.role,
                    action,
                });
            }

            let mut next = booking.clone();
            next.status = match action {
                BookingAction::Approve => BookingStatus::Approved,
                _ => BookingStatus::Rejected,
            };
            Ok(next)
        }
        BookingAction::Cancel => {
            // Pending and approved bookings are both cancellable.
            let party = match cancelling_party(booking, actor) {
                Some(party) => party,
                None => {
                    return Err(TransitionError::Forbidden {
                        role: actor.role,
                        action,
                    })
                }
            };

            let mut next = booking.clone();
            next.status = BookingStatus::Cancelled;
            next.cancelled_by = Some(party);
            next.cancelled_at = Some(at);
            Ok(next)
        }
    }
}

/// Maps an actor onto the side of the tenancy entitled to cancel, if any.
fn cancelling_party(booking: &Booking, actor: &Actor) -> Option<CancellingParty> {
    match actor.role {
        Role::Student if booking.belongs_to_student(&actor.id) => Some(CancellingParty::Student),
        Role::Landlord if booking.managed_by_landlord(&actor.id) => Some(CancellingParty::Landlord),
        _ => None,
    }
}
