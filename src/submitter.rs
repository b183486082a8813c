//! Booking submission boundary.
//!
//! The engine hands a finalized [`BookingPayload`] to a [`BookingSubmitter`].
//! [`InMemorySubmitter`] keeps confirmed bookings in memory and refuses to
//! double-book a doctor or lab slot.

use crate::derivation::{self, MedicineLine};
use crate::error::{BookingError, BookingResult, SubmissionError};
use crate::models::{format_price, BookingKind, Doctor, Entity, Facility, LabTest, TimeSlot};
use crate::selection::Selection;
use crate::wizard::can_confirm;
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Everything a booking needs, built only from a confirmable selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BookingPayload {
    Hospital {
        hospital: Facility,
        doctor: Doctor,
        slot: TimeSlot,
    },
    Doctor {
        doctor: Doctor,
        slot: TimeSlot,
    },
    Pharmacy {
        pharmacy: Facility,
        lines: Vec<MedicineLine>,
        total: Decimal,
    },
    Lab {
        lab: Facility,
        tests: Vec<LabTest>,
        total: Decimal,
        slot: TimeSlot,
    },
}

impl BookingPayload {
    pub fn from_selection(selection: &Selection) -> BookingResult<Self> {
        let not_ready = || BookingError::NotReady(selection.kind());
        if !can_confirm(selection) {
            return Err(not_ready());
        }

        let slot = selection.chosen_time_slot().cloned();
        let payload = match (selection.chosen_entity(), selection.kind()) {
            (Some(Entity::Hospital(hospital)), BookingKind::Hospital) => BookingPayload::Hospital {
                hospital: hospital.clone(),
                doctor: selection.chosen_doctor().cloned().ok_or_else(not_ready)?,
                slot: slot.ok_or_else(not_ready)?,
            },
            (Some(Entity::Doctor(doctor)), BookingKind::Doctor) => BookingPayload::Doctor {
                doctor: doctor.clone(),
                slot: slot.ok_or_else(not_ready)?,
            },
            (Some(Entity::Pharmacy(pharmacy)), BookingKind::Pharmacy) => BookingPayload::Pharmacy {
                pharmacy: pharmacy.clone(),
                lines: derivation::selected_medicines_view(selection),
                total: derivation::medicines_total(selection),
            },
            (Some(Entity::Lab(lab)), BookingKind::Lab) => BookingPayload::Lab {
                lab: lab.clone(),
                tests: derivation::selected_tests_view(selection),
                total: derivation::tests_total(selection),
                slot: slot.ok_or_else(not_ready)?,
            },
            _ => return Err(not_ready()),
        };
        Ok(payload)
    }

    pub fn kind(&self) -> BookingKind {
        match self {
            BookingPayload::Hospital { .. } => BookingKind::Hospital,
            BookingPayload::Doctor { .. } => BookingKind::Doctor,
            BookingPayload::Pharmacy { .. } => BookingKind::Pharmacy,
            BookingPayload::Lab { .. } => BookingKind::Lab,
        }
    }

    pub fn slot(&self) -> Option<&TimeSlot> {
        match self {
            BookingPayload::Hospital { slot, .. }
            | BookingPayload::Doctor { slot, .. }
            | BookingPayload::Lab { slot, .. } => Some(slot),
            BookingPayload::Pharmacy { .. } => None,
        }
    }

    /// Who is being booked: the doctor for doctor and hospital visits,
    /// otherwise the pharmacy or lab.
    pub fn provider_name(&self) -> &str {
        match self {
            BookingPayload::Hospital { doctor, .. } | BookingPayload::Doctor { doctor, .. } => {
                &doctor.name
            }
            BookingPayload::Pharmacy { pharmacy, .. } => &pharmacy.name,
            BookingPayload::Lab { lab, .. } => &lab.name,
        }
    }

    /// One-line human readable description.
    pub fn summary(&self) -> String {
        match self {
            BookingPayload::Hospital {
                hospital,
                doctor,
                slot,
            } => format!("{} ({}) at {}, {}", doctor.name, doctor.specialty, hospital.name, slot),
            BookingPayload::Doctor { doctor, slot } => {
                format!("{} ({}), {}", doctor.name, doctor.specialty, slot)
            }
            BookingPayload::Pharmacy {
                pharmacy,
                lines,
                total,
            } => {
                let items: u32 = lines.iter().map(|l| l.quantity).sum();
                format!("{} item(s) from {}, total {}", items, pharmacy.name, format_price(*total))
            }
            BookingPayload::Lab {
                lab,
                tests,
                total,
                slot,
            } => format!(
                "{} test(s) at {}, {}, total {}",
                tests.len(),
                lab.name,
                slot,
                format_price(*total)
            ),
        }
    }

    fn slot_key(&self) -> Option<(String, TimeSlot)> {
        match self {
            BookingPayload::Hospital { doctor, slot, .. } | BookingPayload::Doctor { doctor, slot } => {
                Some((format!("doctor:{}", doctor.id), slot.clone()))
            }
            BookingPayload::Lab { lab, slot, .. } => Some((format!("lab:{}", lab.id), slot.clone())),
            BookingPayload::Pharmacy { .. } => None,
        }
    }
}

/// Receipt for a booking accepted by a submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConfirmation {
    pub confirmation_id: String,
    pub kind: BookingKind,
    pub summary: String,
    pub created_at: DateTime<Local>,
}

impl BookingConfirmation {
    pub fn new(payload: &BookingPayload) -> Self {
        BookingConfirmation {
            confirmation_id: Uuid::new_v4().to_string(),
            kind: payload.kind(),
            summary: payload.summary(),
            created_at: Local::now(),
        }
    }
}

/// Side-effecting end of the wizard.
pub trait BookingSubmitter {
    fn submit(&mut self, payload: &BookingPayload) -> Result<BookingConfirmation, SubmissionError>;
}

#[derive(Debug, Clone)]
pub struct BookingRecord {
    pub payload: BookingPayload,
    pub confirmation: BookingConfirmation,
}

/// Keeps confirmed bookings in memory, keyed by confirmation id.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubmitter {
    bookings: IndexMap<String, BookingRecord>,
}

impl InMemorySubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All bookings, oldest first.
    pub fn bookings(&self) -> Vec<&BookingRecord> {
        self.bookings.values().collect()
    }

    pub fn get(&self, confirmation_id: &str) -> Option<&BookingRecord> {
        self.bookings.get(confirmation_id)
    }

    /// Cancel a booking, freeing its slot.
    pub fn cancel(&mut self, confirmation_id: &str) -> bool {
        let removed = self.bookings.shift_remove(confirmation_id).is_some();
        if removed {
            tracing::info!(confirmation_id, "booking cancelled");
        }
        removed
    }

    fn is_slot_taken(&self, payload: &BookingPayload) -> bool {
        let Some(wanted) = payload.slot_key() else {
            return false;
        };
        self.bookings
            .values()
            .any(|record| record.payload.slot_key().as_ref() == Some(&wanted))
    }
}

impl BookingSubmitter for InMemorySubmitter {
    fn submit(&mut self, payload: &BookingPayload) -> Result<BookingConfirmation, SubmissionError> {
        if self.is_slot_taken(payload) {
            let slot = payload.slot().map(|s| s.label().to_string()).unwrap_or_default();
            return Err(SubmissionError::SlotTaken {
                provider: payload.provider_name().to_string(),
                slot,
            });
        }

        let confirmation = BookingConfirmation::new(payload);
        tracing::info!(
            confirmation_id = %confirmation.confirmation_id,
            kind = %confirmation.kind,
            "booking confirmed"
        );
        self.bookings.insert(
            confirmation.confirmation_id.clone(),
            BookingRecord {
                payload: payload.clone(),
                confirmation: confirmation.clone(),
            },
        );
        Ok(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogProvider, InMemoryCatalog};
    use crate::models::{SubItem, TimeGrid};
    use crate::wizard::{reset, Wizard};

    fn doctor_booking(catalog: &InMemoryCatalog, doctor_id: &str, slot: &str) -> Selection {
        let w = Wizard::new(catalog, TimeGrid::default());
        let doctor = catalog.find_entity(BookingKind::Doctor, doctor_id).unwrap();
        let s = w.select_entity(&reset(BookingKind::Doctor), &doctor);
        w.select_time_slot(&s, slot)
    }

    #[test]
    fn payload_requires_confirmable_selection() {
        assert!(matches!(
            BookingPayload::from_selection(&reset(BookingKind::Lab)),
            Err(BookingError::NotReady(BookingKind::Lab))
        ));
    }

    #[test]
    fn pharmacy_payload_carries_lines_and_total() {
        let catalog = InMemoryCatalog::demo();
        let w = Wizard::new(&catalog, TimeGrid::default());
        let medplus = catalog.find_entity(BookingKind::Pharmacy, "p1").unwrap();
        let s = w.select_entity(&reset(BookingKind::Pharmacy), &medplus);

        let Some(SubItem::Medicine(para)) = catalog.find_sub_item(BookingKind::Pharmacy, "p1", "m1") else {
            panic!("demo catalog lost paracetamol");
        };
        let s = w.toggle_medicine(&s, &para);
        let s = w.set_medicine_quantity(&s, "m1", 2);
        let payload = BookingPayload::from_selection(&s).unwrap();
        assert!(payload.slot().is_none());
        match payload {
            BookingPayload::Pharmacy { lines, total, .. } => {
                assert_eq!(lines.len(), 1);
                assert_eq!(total, Decimal::from(75));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn double_booking_a_doctor_slot_is_rejected() {
        let catalog = InMemoryCatalog::demo();
        let mut submitter = InMemorySubmitter::new();
        let payload = BookingPayload::from_selection(&doctor_booking(&catalog, "d5", "10:00 AM")).unwrap();

        let first = submitter.submit(&payload).unwrap();
        assert_eq!(first.kind, BookingKind::Doctor);
        assert!(matches!(
            submitter.submit(&payload),
            Err(SubmissionError::SlotTaken { .. })
        ));

        let other_slot = BookingPayload::from_selection(&doctor_booking(&catalog, "d5", "11:00 AM")).unwrap();
        assert!(submitter.submit(&other_slot).is_ok());
        assert_eq!(submitter.bookings().len(), 2);
    }

    #[test]
    fn cancel_frees_the_slot() {
        let catalog = InMemoryCatalog::demo();
        let mut submitter = InMemorySubmitter::new();
        let payload = BookingPayload::from_selection(&doctor_booking(&catalog, "d6", "02:00 PM")).unwrap();

        let confirmation = submitter.submit(&payload).unwrap();
        assert!(submitter.get(&confirmation.confirmation_id).is_some());
        assert!(submitter.cancel(&confirmation.confirmation_id));
        assert!(!submitter.cancel(&confirmation.confirmation_id));
        assert!(submitter.submit(&payload).is_ok());
    }

    #[test]
    fn payload_serializes_with_kind_tag() {
        let catalog = InMemoryCatalog::demo();
        let payload = BookingPayload::from_selection(&doctor_booking(&catalog, "d5", "09:00 AM")).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "doctor");
        assert_eq!(json["slot"]["label"], "09:00 AM");
        assert!(payload.summary().contains("Dr. Anita Desai"));
    }
}
