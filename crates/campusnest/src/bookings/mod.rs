//! Booking lifecycle workflow for the CampusNest rental marketplace.
//!
//! A student opens a booking request against a listed property; the managing
//! landlord approves or rejects it; either party may cancel before the
//! tenancy ends. The modules here split that flow into intake validation,
//! a pure state machine, an access policy, a duplicate-request guard, and
//! the persistence and HTTP surfaces that tie them together.

pub mod domain;
pub mod guard;
pub mod intake;
pub mod lifecycle;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, Booking, BookingId, BookingStatus, CancellingParty, PropertyId, Role, UserId,
};
pub use guard::GuardedStore;
pub use intake::{BookingLimits, BookingSubmission, IntakeValidator, ValidationError};
pub use lifecycle::{transition, BookingAction, TransitionError};
pub use policy::{authorize, authorize_request, AccessDenied, BookingOperation};
pub use repository::{
    AuthError, Authenticator, BookingFilter, BookingNotice, BookingNotifier, BookingRecord,
    BookingStore, BookingView, DirectoryError, NotifyError, OwnershipDirectory, StoreError,
};
pub use router::{booking_router, BookingApi};
pub use service::{BookingService, BookingServiceError, MissingEntity};
