use crate::models::BookingKind;

/// Errors raised by the booking submitter collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("slot {slot} is already booked with {provider}")]
    SlotTaken { provider: String, slot: String },
    #[error("booking rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("invalid booking kind: '{0}'. Must be one of: hospital, doctor, pharmacy, lab")]
    InvalidBookingKind(String),
    #[error("invalid time slot: '{0}' (expected e.g. '10:00 AM')")]
    InvalidTimeSlot(String),
    #[error("time slot '{0}' appears more than once in the grid")]
    DuplicateTimeSlot(String),
    #[error("time grid must contain at least one slot")]
    EmptyTimeGrid,
    #[error("invalid price: '{0}'")]
    InvalidPrice(String),
    #[error("duplicate id '{id}' in {scope}")]
    DuplicateId { scope: String, id: String },
    #[error("no {kind} with id '{id}'")]
    UnknownParent { kind: BookingKind, id: String },
    #[error("failed to read catalog file: {0}")]
    CatalogRead(std::io::Error),
    #[error("failed to parse catalog: {0}")]
    CatalogParse(serde_json::Error),
    #[error("{0} booking is not ready to confirm")]
    NotReady(BookingKind),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

pub type BookingResult<T> = std::result::Result<T, BookingError>;
