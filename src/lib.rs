//! Booking wizard engine for hospital, doctor, pharmacy and lab bookings.
//!
//! The engine is UI-free: a [`Selection`] holds the session state,
//! [`Wizard`] moves it between steps, [`derivation`] computes what to show,
//! and a [`BookingSubmitter`] receives the finished booking.

pub mod catalog;
pub mod config;
pub mod derivation;
pub mod error;
pub mod models;
pub mod selection;
pub mod store;
pub mod submitter;
pub mod wizard;

pub use catalog::{CatalogProvider, InMemoryCatalog};
pub use config::AppConfig;
pub use error::{BookingError, BookingResult, SubmissionError};
pub use models::{BookingKind, Doctor, Entity, Facility, LabTest, Medicine, SubItem, TimeGrid, TimeSlot};
pub use selection::{ChosenMedicine, Selection};
pub use store::{SelectionStore, SubmissionStatus};
pub use submitter::{BookingConfirmation, BookingPayload, BookingSubmitter, InMemorySubmitter};
pub use wizard::{can_confirm, reset, Wizard, WizardAction};
