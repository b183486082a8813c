//! Read-only values derived from a selection and the catalog.
//!
//! Nothing here mutates its inputs; the same inputs always give the same
//! output.

use crate::catalog::CatalogProvider;
use crate::models::{BookingKind, Doctor, Entity, LabTest, Medicine, SubItem};
use crate::selection::Selection;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedicineLine {
    pub medicine: Medicine,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// The list shown at the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Entities(Vec<Entity>),
    SubItems(Vec<SubItem>),
    None,
}

fn matches_term(term: &str, fields: &[&str]) -> bool {
    fields.iter().any(|field| field.to_lowercase().contains(term))
}

fn normalized(term: &str) -> Option<String> {
    let term = term.trim();
    (!term.is_empty()).then(|| term.to_lowercase())
}

fn entity_matches(entity: &Entity, term: &str) -> bool {
    match entity {
        Entity::Doctor(d) => matches_term(term, &[d.name.as_str(), d.location_label.as_str(), d.specialty.as_str()]),
        Entity::Hospital(f) | Entity::Pharmacy(f) | Entity::Lab(f) => {
            matches_term(term, &[f.name.as_str(), f.location_label.as_str()])
        }
    }
}

fn sub_item_matches(item: &SubItem, term: &str) -> bool {
    match item {
        SubItem::Doctor(d) => matches_term(term, &[d.name.as_str(), d.specialty.as_str()]),
        SubItem::Medicine(m) => matches_term(term, &[m.name.as_str()]),
        SubItem::Test(t) => matches_term(term, &[t.name.as_str()]),
    }
}

/// Entities of `kind` whose name or location (or specialty, for doctors)
/// contains `search_term`, ignoring case. A blank term returns everything.
pub fn filtered_entities<C: CatalogProvider + ?Sized>(
    catalog: &C,
    kind: BookingKind,
    search_term: &str,
) -> Vec<Entity> {
    let entities = catalog.list_entities(kind);
    match normalized(search_term) {
        Some(term) => entities.into_iter().filter(|e| entity_matches(e, &term)).collect(),
        None => entities,
    }
}

/// Sub-items of `parent_id` filtered by the same rule as [`filtered_entities`].
pub fn filtered_sub_items<C: CatalogProvider + ?Sized>(
    catalog: &C,
    kind: BookingKind,
    parent_id: &str,
    search_term: &str,
) -> Vec<SubItem> {
    let items = catalog.list_sub_items(kind, parent_id);
    match normalized(search_term) {
        Some(term) => items.into_iter().filter(|i| sub_item_matches(i, &term)).collect(),
        None => items,
    }
}

/// Chosen medicines with their line totals, in the order they were picked.
pub fn selected_medicines_view(selection: &Selection) -> Vec<MedicineLine> {
    if selection.kind() != BookingKind::Pharmacy {
        return Vec::new();
    }
    selection
        .chosen_medicines()
        .values()
        .map(|chosen| MedicineLine {
            medicine: chosen.medicine.clone(),
            quantity: chosen.quantity,
            line_total: chosen.medicine.unit_price * Decimal::from(chosen.quantity),
        })
        .collect()
}

pub fn medicines_total(selection: &Selection) -> Decimal {
    selected_medicines_view(selection)
        .iter()
        .map(|line| line.line_total)
        .sum()
}

pub fn selected_tests_view(selection: &Selection) -> Vec<LabTest> {
    if selection.kind() != BookingKind::Lab {
        return Vec::new();
    }
    selection.chosen_tests().values().cloned().collect()
}

pub fn tests_total(selection: &Selection) -> Decimal {
    selected_tests_view(selection).iter().map(|t| t.price).sum()
}

/// Doctors working at the chosen hospital, joined on hospital id.
pub fn hospital_doctors<C: CatalogProvider + ?Sized>(selection: &Selection, catalog: &C) -> Vec<Doctor> {
    match (selection.kind(), selection.chosen_entity()) {
        (BookingKind::Hospital, Some(Entity::Hospital(hospital))) => catalog
            .list_entities(BookingKind::Doctor)
            .into_iter()
            .filter_map(|e| match e {
                Entity::Doctor(d) if d.hospital_id.as_deref() == Some(hospital.id.as_str()) => Some(d),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Whether the time grid is offered at the current step.
pub fn show_time_grid(selection: &Selection) -> bool {
    match selection.kind() {
        BookingKind::Hospital => selection.step() == 3,
        BookingKind::Doctor => selection.step() == 2,
        BookingKind::Lab => selection.step() == 2 && !selection.chosen_tests().is_empty(),
        BookingKind::Pharmacy => false,
    }
}

/// What the current step lists, under the current search term.
pub fn visible_listing<C: CatalogProvider + ?Sized>(selection: &Selection, catalog: &C) -> Listing {
    let term = selection.search_term();
    let kind = selection.kind();

    if selection.step() == 1 {
        return Listing::Entities(filtered_entities(catalog, kind, term));
    }

    match (kind, selection.step(), selection.chosen_entity()) {
        (BookingKind::Hospital, 2, Some(parent))
        | (BookingKind::Pharmacy, 2, Some(parent))
        | (BookingKind::Lab, 2, Some(parent)) => {
            Listing::SubItems(filtered_sub_items(catalog, kind, parent.id(), term))
        }
        _ => Listing::None,
    }
}
