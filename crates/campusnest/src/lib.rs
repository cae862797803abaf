//! Core library for the CampusNest student rental marketplace.
//!
//! The interesting machinery lives in [`bookings`]: the lifecycle of a
//! rental request from creation through approval, rejection, or
//! cancellation, plus the guarantees that hold it together under
//! concurrent callers. Configuration, telemetry, and app-level error
//! plumbing round out the crate so the service shell stays thin.

pub mod bookings;
pub mod config;
pub mod error;
pub mod telemetry;
