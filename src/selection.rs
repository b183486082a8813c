//! Wizard session state.

use crate::models::{BookingKind, Doctor, Entity, LabTest, Medicine, TimeSlot};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChosenMedicine {
    pub medicine: Medicine,
    pub quantity: u32,
}

/// The mutable state of one booking wizard session.
///
/// Fields are read-only outside the crate; every change is made by the
/// transition functions in [`crate::wizard`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub(crate) kind: BookingKind,
    pub(crate) step: u8,
    pub(crate) chosen_entity: Option<Entity>,
    pub(crate) chosen_doctor: Option<Doctor>,
    pub(crate) chosen_medicines: IndexMap<String, ChosenMedicine>,
    pub(crate) chosen_tests: IndexMap<String, LabTest>,
    pub(crate) chosen_time_slot: Option<TimeSlot>,
    pub(crate) search_term: String,
}

impl Selection {
    /// A fresh session for `kind` at step 1 with nothing chosen.
    pub fn new(kind: BookingKind) -> Self {
        Selection {
            kind,
            step: 1,
            chosen_entity: None,
            chosen_doctor: None,
            chosen_medicines: IndexMap::new(),
            chosen_tests: IndexMap::new(),
            chosen_time_slot: None,
            search_term: String::new(),
        }
    }

    pub fn kind(&self) -> BookingKind {
        self.kind
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn chosen_entity(&self) -> Option<&Entity> {
        self.chosen_entity.as_ref()
    }

    pub fn chosen_doctor(&self) -> Option<&Doctor> {
        self.chosen_doctor.as_ref()
    }

    pub fn chosen_medicines(&self) -> &IndexMap<String, ChosenMedicine> {
        &self.chosen_medicines
    }

    /// Quantity of a selected medicine, if selected.
    pub fn medicine_quantity(&self, medicine_id: &str) -> Option<u32> {
        self.chosen_medicines.get(medicine_id).map(|c| c.quantity)
    }

    pub fn chosen_tests(&self) -> &IndexMap<String, LabTest> {
        &self.chosen_tests
    }

    pub fn chosen_time_slot(&self) -> Option<&TimeSlot> {
        self.chosen_time_slot.as_ref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Drop every choice below the top-level entity.
    pub(crate) fn clear_sub_selections(&mut self) {
        self.chosen_doctor = None;
        self.chosen_medicines.clear();
        self.chosen_tests.clear();
        self.chosen_time_slot = None;
    }
}
