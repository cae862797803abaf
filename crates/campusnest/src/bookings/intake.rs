use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Booking, BookingId, BookingStatus, PropertyId, UserId};

/// Inbound payload for a new booking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSubmission {
    pub property_id: PropertyId,
    #[serde(default)]
    pub check_in: Option<NaiveDate>,
    #[serde(default)]
    pub check_out: Option<NaiveDate>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validation errors raised while checking a submission's fields.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("a property reference is required")]
    MissingProperty,
    #[error("check-out date {check_out} must fall strictly after check-in {check_in}")]
    DatesOutOfOrder {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    #[error("notes exceed the {limit} character limit ({found} characters)")]
    NotesTooLong { limit: usize, found: usize },
    #[error("total price must be a finite, non-negative amount (found {found})")]
    InvalidPrice { found: f64 },
}

const DEFAULT_MAX_NOTE_CHARS: usize = 500;

/// Field bounds applied during intake.
#[derive(Debug, Clone, Copy)]
pub struct BookingLimits {
    pub max_note_chars: usize,
}

impl Default for BookingLimits {
    fn default() -> Self {
        Self {
            max_note_chars: DEFAULT_MAX_NOTE_CHARS,
        }
    }
}

/// Validates submissions and shapes them into pending bookings.
#[derive(Debug, Clone, Default)]
pub struct IntakeValidator {
    limits: BookingLimits,
}

impl IntakeValidator {
    pub fn with_limits(limits: BookingLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &BookingLimits {
        &self.limits
    }

    /// Check the submission's fields alone.
    ///
    /// The service runs this before resolving the property's owner, so
    /// field problems surface as validation errors even when the
    /// reference matches no listed property.
    pub fn screen(&self, submission: &BookingSubmission) -> Result<(), ValidationError> {
        if submission.property_id.0.trim().is_empty() {
            return Err(ValidationError::MissingProperty);
        }

        if let (Some(check_in), Some(check_out)) = (submission.check_in, submission.check_out) {
            if check_out <= check_in {
                return Err(ValidationError::DatesOutOfOrder {
                    check_in,
                    check_out,
                });
            }
        }

        if let Some(price) = submission.total_price {
            if !price.is_finite() || price < 0.0 {
                return Err(ValidationError::InvalidPrice { found: price });
            }
        }

        if let Some(notes) = &submission.notes {
            let found = notes.chars().count();
            if found > self.limits.max_note_chars {
                return Err(ValidationError::NotesTooLong {
                    limit: self.limits.max_note_chars,
                    found,
                });
            }
        }

        Ok(())
    }

    /// Check field bounds and produce a pending booking for the student.
    ///
    /// Pure: no I/O happens here. The returned booking carries a
    /// placeholder id; the service assigns the real one right before the
    /// insert. `landlord` must already be the resolved owner of the
    /// property; it is stored verbatim and never re-derived.
    pub fn validate(
        &self,
        submission: BookingSubmission,
        student: &UserId,
        landlord: &UserId,
    ) -> Result<Booking, ValidationError> {
        self.screen(&submission)?;

        Ok(Booking {
            id: BookingId("pending".to_string()),
            property: submission.property_id,
            student: student.clone(),
            landlord: landlord.clone(),
            status: BookingStatus::Pending,
            check_in: submission.check_in,
            check_out: submission.check_out,
            total_price: submission.total_price,
            notes: submission.notes,
            cancelled_by: None,
            cancelled_at: None,
        })
    }
}
