//! Step transitions for the booking wizard.
//!
//! Every transition is a pure function from the current [`Selection`] to the
//! next one. Actions that are not valid in the current state, and references
//! to items the catalog does not list, leave the selection unchanged.
//!
//! | kind     | step 1          | step 2                             | step 3      |
//! |----------|-----------------|------------------------------------|-------------|
//! | hospital | pick hospital   | pick doctor                        | pick time   |
//! | doctor   | pick doctor     | pick time                          |             |
//! | pharmacy | pick pharmacy   | toggle medicines, set quantities   |             |
//! | lab      | pick lab        | toggle tests, then pick time       |             |

use crate::catalog::CatalogProvider;
use crate::derivation;
use crate::models::{BookingKind, Doctor, Entity, LabTest, Medicine, SubItem, TimeGrid};
use crate::selection::{ChosenMedicine, Selection};

/// A user action, routed through [`Wizard::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardAction {
    SelectEntity(Entity),
    SelectDoctor(Doctor),
    ToggleMedicine(Medicine),
    SetMedicineQuantity { medicine_id: String, delta: i32 },
    ToggleTest(LabTest),
    SelectTimeSlot(String),
    GoBack,
    SetSearchTerm(String),
    ChangeKind(BookingKind),
    Reset,
}

/// A fresh selection for `kind`.
pub fn reset(kind: BookingKind) -> Selection {
    Selection::new(kind)
}

/// Whether the selection holds everything its kind needs to be booked.
pub fn can_confirm(selection: &Selection) -> bool {
    let has_entity = selection.chosen_entity.is_some();
    let has_slot = selection.chosen_time_slot.is_some();

    match selection.kind {
        BookingKind::Hospital => has_entity && selection.chosen_doctor.is_some() && has_slot,
        BookingKind::Doctor => {
            let same_doctor = matches!(
                (&selection.chosen_entity, &selection.chosen_doctor),
                (Some(Entity::Doctor(entity)), Some(doctor)) if entity.id == doctor.id
            );
            same_doctor && has_slot
        }
        BookingKind::Pharmacy => has_entity && !selection.chosen_medicines.is_empty(),
        BookingKind::Lab => has_entity && !selection.chosen_tests.is_empty() && has_slot,
    }
}

fn ignore(selection: &Selection, action: &str, reason: &str) -> Selection {
    tracing::debug!(
        kind = %selection.kind,
        step = selection.step,
        action,
        reason,
        "ignoring wizard action"
    );
    selection.clone()
}

/// Transition engine bound to a catalog and a time grid.
#[derive(Debug, Clone)]
pub struct Wizard<C> {
    catalog: C,
    grid: TimeGrid,
}

impl<C: CatalogProvider> Wizard<C> {
    pub fn new(catalog: C, grid: TimeGrid) -> Self {
        Wizard { catalog, grid }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Apply one action.
    pub fn apply(&self, selection: &Selection, action: WizardAction) -> Selection {
        match action {
            WizardAction::SelectEntity(entity) => self.select_entity(selection, &entity),
            WizardAction::SelectDoctor(doctor) => self.select_doctor(selection, &doctor),
            WizardAction::ToggleMedicine(medicine) => self.toggle_medicine(selection, &medicine),
            WizardAction::SetMedicineQuantity { medicine_id, delta } => {
                self.set_medicine_quantity(selection, &medicine_id, delta)
            }
            WizardAction::ToggleTest(test) => self.toggle_test(selection, &test),
            WizardAction::SelectTimeSlot(label) => self.select_time_slot(selection, &label),
            WizardAction::GoBack => self.go_back(selection),
            WizardAction::SetSearchTerm(term) => self.set_search_term(selection, &term),
            WizardAction::ChangeKind(kind) => self.change_kind(selection, kind),
            WizardAction::Reset => reset(selection.kind),
        }
    }

    /// Pick the top-level entity at step 1 and move to step 2.
    ///
    /// Re-picking the entity already chosen keeps the sub-selections made
    /// before going back; picking another one discards them.
    pub fn select_entity(&self, selection: &Selection, entity: &Entity) -> Selection {
        if selection.step != 1 {
            return ignore(selection, "select_entity", "not at step 1");
        }
        if let (BookingKind::Doctor, Entity::Doctor(doctor)) = (selection.kind, entity) {
            return self.select_doctor(selection, doctor);
        }
        if entity.kind() != selection.kind {
            return ignore(selection, "select_entity", "entity of another kind");
        }
        if self.catalog.find_entity(selection.kind, entity.id()).as_ref() != Some(entity) {
            return ignore(selection, "select_entity", "entity not in catalog");
        }

        let mut next = selection.clone();
        if next.chosen_entity.as_ref().map(Entity::id) != Some(entity.id()) {
            next.clear_sub_selections();
        }
        next.chosen_entity = Some(entity.clone());
        next.search_term.clear();
        next.step = 2;
        next
    }

    /// Pick a doctor: a hospital's doctor at hospital step 2, or the doctor
    /// being booked for the doctor flow.
    pub fn select_doctor(&self, selection: &Selection, doctor: &Doctor) -> Selection {
        match selection.kind {
            BookingKind::Hospital => {
                if selection.step != 2 {
                    return ignore(selection, "select_doctor", "not at step 2");
                }
                let Some(hospital) = &selection.chosen_entity else {
                    return ignore(selection, "select_doctor", "no hospital chosen");
                };
                let offered = matches!(
                    self.catalog.find_sub_item(BookingKind::Hospital, hospital.id(), &doctor.id),
                    Some(SubItem::Doctor(found)) if found == *doctor
                );
                if !offered {
                    return ignore(selection, "select_doctor", "doctor not at chosen hospital");
                }

                let mut next = selection.clone();
                next.chosen_doctor = Some(doctor.clone());
                next.chosen_time_slot = None;
                next.search_term.clear();
                next.step = 3;
                next
            }
            BookingKind::Doctor => {
                let offered = matches!(
                    self.catalog.find_entity(BookingKind::Doctor, &doctor.id),
                    Some(Entity::Doctor(found)) if found == *doctor
                );
                if !offered {
                    return ignore(selection, "select_doctor", "doctor not in catalog");
                }

                let mut next = selection.clone();
                if next.chosen_doctor.as_ref() != Some(doctor) {
                    next.chosen_time_slot = None;
                }
                next.chosen_entity = Some(Entity::Doctor(doctor.clone()));
                next.chosen_doctor = Some(doctor.clone());
                next.search_term.clear();
                next.step = 2;
                next
            }
            BookingKind::Pharmacy | BookingKind::Lab => {
                ignore(selection, "select_doctor", "kind has no doctors")
            }
        }
    }

    /// Add a medicine with quantity 1, or remove it if already chosen.
    pub fn toggle_medicine(&self, selection: &Selection, medicine: &Medicine) -> Selection {
        if selection.kind != BookingKind::Pharmacy || selection.step != 2 {
            return ignore(selection, "toggle_medicine", "not at pharmacy step 2");
        }
        let Some(pharmacy) = &selection.chosen_entity else {
            return ignore(selection, "toggle_medicine", "no pharmacy chosen");
        };
        let offered = matches!(
            self.catalog.find_sub_item(BookingKind::Pharmacy, pharmacy.id(), &medicine.id),
            Some(SubItem::Medicine(found)) if found == *medicine
        );
        if !offered {
            return ignore(selection, "toggle_medicine", "medicine not at chosen pharmacy");
        }

        let mut next = selection.clone();
        if next.chosen_medicines.shift_remove(&medicine.id).is_none() {
            next.chosen_medicines.insert(
                medicine.id.clone(),
                ChosenMedicine {
                    medicine: medicine.clone(),
                    quantity: 1,
                },
            );
        }
        next
    }

    /// Adjust the quantity of a chosen medicine. The quantity never drops
    /// below 1; removal goes through [`Wizard::toggle_medicine`].
    pub fn set_medicine_quantity(&self, selection: &Selection, medicine_id: &str, delta: i32) -> Selection {
        if selection.kind != BookingKind::Pharmacy {
            return ignore(selection, "set_medicine_quantity", "not a pharmacy booking");
        }
        let Some(current) = selection.chosen_medicines.get(medicine_id) else {
            return ignore(selection, "set_medicine_quantity", "medicine not selected");
        };

        let quantity = (i64::from(current.quantity) + i64::from(delta)).max(1);
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let mut next = selection.clone();
        if let Some(chosen) = next.chosen_medicines.get_mut(medicine_id) {
            chosen.quantity = quantity;
        }
        next
    }

    /// Add a test, or remove it if already chosen.
    pub fn toggle_test(&self, selection: &Selection, test: &LabTest) -> Selection {
        if selection.kind != BookingKind::Lab || selection.step != 2 {
            return ignore(selection, "toggle_test", "not at lab step 2");
        }
        let Some(lab) = &selection.chosen_entity else {
            return ignore(selection, "toggle_test", "no lab chosen");
        };
        let offered = matches!(
            self.catalog.find_sub_item(BookingKind::Lab, lab.id(), &test.id),
            Some(SubItem::Test(found)) if found == *test
        );
        if !offered {
            return ignore(selection, "toggle_test", "test not at chosen lab");
        }

        let mut next = selection.clone();
        if next.chosen_tests.shift_remove(&test.id).is_none() {
            next.chosen_tests.insert(test.id.clone(), test.clone());
        }
        next
    }

    /// Pick a time slot while the time grid is shown. Does not change step.
    pub fn select_time_slot(&self, selection: &Selection, label: &str) -> Selection {
        if !derivation::show_time_grid(selection) {
            return ignore(selection, "select_time_slot", "time grid not shown");
        }
        let Some(slot) = self.grid.find(label) else {
            return ignore(selection, "select_time_slot", "slot not in grid");
        };

        let mut next = selection.clone();
        next.chosen_time_slot = Some(slot.clone());
        next
    }

    /// Step back, never below step 1.
    ///
    /// Pharmacy and lab bookings keep their chosen items so moving forward
    /// again restores them. Hospital and doctor bookings drop the choices
    /// made on the step being left, since the list shown there depends on
    /// the earlier pick.
    pub fn go_back(&self, selection: &Selection) -> Selection {
        if selection.step <= 1 {
            return selection.clone();
        }

        let mut next = selection.clone();
        next.step -= 1;
        next.search_term.clear();

        match (next.kind, next.step) {
            (BookingKind::Hospital, 2) => {
                next.chosen_doctor = None;
                next.chosen_time_slot = None;
            }
            (BookingKind::Hospital, 1) | (BookingKind::Doctor, 1) => {
                next.chosen_entity = None;
                next.clear_sub_selections();
            }
            _ => {}
        }
        next
    }

    pub fn set_search_term(&self, selection: &Selection, term: &str) -> Selection {
        let mut next = selection.clone();
        next.search_term = term.to_string();
        next
    }

    /// Switch booking kind; any change of kind starts over.
    pub fn change_kind(&self, selection: &Selection, kind: BookingKind) -> Selection {
        if selection.kind == kind {
            return selection.clone();
        }
        reset(kind)
    }
}
