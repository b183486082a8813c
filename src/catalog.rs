//! Catalog of bookable providers.
//!
//! The wizard only needs the read side (`CatalogProvider`); `InMemoryCatalog`
//! is the bundled implementation, seeded from code or from a JSON file.

use crate::error::{BookingError, BookingResult};
use crate::models::{BookingKind, Doctor, Entity, Facility, LabTest, Medicine, SubItem};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// Read-only source of entities and their sub-items.
///
/// Implementations return an empty list, never an error, when no data exists.
pub trait CatalogProvider {
    fn list_entities(&self, kind: BookingKind) -> Vec<Entity>;

    fn list_sub_items(&self, kind: BookingKind, parent_id: &str) -> Vec<SubItem>;

    /// Find an entity of `kind` by id.
    fn find_entity(&self, kind: BookingKind, id: &str) -> Option<Entity> {
        self.list_entities(kind).into_iter().find(|e| e.id() == id)
    }

    /// Find a sub-item of the given parent by id.
    fn find_sub_item(&self, kind: BookingKind, parent_id: &str, id: &str) -> Option<SubItem> {
        self.list_sub_items(kind, parent_id)
            .into_iter()
            .find(|item| item.id() == id)
    }
}

impl<C: CatalogProvider + ?Sized> CatalogProvider for &C {
    fn list_entities(&self, kind: BookingKind) -> Vec<Entity> {
        (**self).list_entities(kind)
    }

    fn list_sub_items(&self, kind: BookingKind, parent_id: &str) -> Vec<SubItem> {
        (**self).list_sub_items(kind, parent_id)
    }
}

/// In-memory catalog keyed by id, preserving insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    hospitals: IndexMap<String, Facility>,
    doctors: IndexMap<String, Doctor>,
    pharmacies: IndexMap<String, Facility>,
    labs: IndexMap<String, Facility>,
    medicines: IndexMap<String, IndexMap<String, Medicine>>,
    tests: IndexMap<String, IndexMap<String, LabTest>>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    hospitals: Vec<Facility>,
    #[serde(default)]
    doctors: Vec<Doctor>,
    #[serde(default)]
    pharmacies: Vec<PharmacyRecord>,
    #[serde(default)]
    labs: Vec<LabRecord>,
}

#[derive(Debug, Deserialize)]
struct PharmacyRecord {
    #[serde(flatten)]
    facility: Facility,
    #[serde(default)]
    medicines: Vec<Medicine>,
}

#[derive(Debug, Deserialize)]
struct LabRecord {
    #[serde(flatten)]
    facility: Facility,
    #[serde(default)]
    tests: Vec<LabTest>,
}

fn insert_unique<T>(map: &mut IndexMap<String, T>, scope: &str, id: &str, value: T) -> BookingResult<()> {
    if map.contains_key(id) {
        return Err(BookingError::DuplicateId {
            scope: scope.to_string(),
            id: id.to_string(),
        });
    }
    map.insert(id.to_string(), value);
    Ok(())
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hospital(&mut self, hospital: Facility) -> BookingResult<()> {
        let id = hospital.id.clone();
        insert_unique(&mut self.hospitals, "hospitals", &id, hospital)
    }

    /// Add a doctor. A doctor with a `hospital_id` must reference a hospital
    /// that is already in the catalog.
    pub fn add_doctor(&mut self, doctor: Doctor) -> BookingResult<()> {
        if let Some(hospital_id) = &doctor.hospital_id {
            if !self.hospitals.contains_key(hospital_id) {
                return Err(BookingError::UnknownParent {
                    kind: BookingKind::Hospital,
                    id: hospital_id.clone(),
                });
            }
        }
        let id = doctor.id.clone();
        insert_unique(&mut self.doctors, "doctors", &id, doctor)
    }

    pub fn add_pharmacy(&mut self, pharmacy: Facility) -> BookingResult<()> {
        let id = pharmacy.id.clone();
        insert_unique(&mut self.pharmacies, "pharmacies", &id, pharmacy)?;
        self.medicines.insert(id, IndexMap::new());
        Ok(())
    }

    pub fn add_lab(&mut self, lab: Facility) -> BookingResult<()> {
        let id = lab.id.clone();
        insert_unique(&mut self.labs, "labs", &id, lab)?;
        self.tests.insert(id, IndexMap::new());
        Ok(())
    }

    pub fn add_medicine(&mut self, pharmacy_id: &str, medicine: Medicine) -> BookingResult<()> {
        let stock = self
            .medicines
            .get_mut(pharmacy_id)
            .ok_or_else(|| BookingError::UnknownParent {
                kind: BookingKind::Pharmacy,
                id: pharmacy_id.to_string(),
            })?;
        let id = medicine.id.clone();
        insert_unique(stock, &format!("medicines of {}", pharmacy_id), &id, medicine)
    }

    pub fn add_test(&mut self, lab_id: &str, test: LabTest) -> BookingResult<()> {
        let menu = self
            .tests
            .get_mut(lab_id)
            .ok_or_else(|| BookingError::UnknownParent {
                kind: BookingKind::Lab,
                id: lab_id.to_string(),
            })?;
        let id = test.id.clone();
        insert_unique(menu, &format!("tests of {}", lab_id), &id, test)
    }

    /// Parse a catalog from JSON.
    ///
    /// Prices may be numbers or currency strings; they are normalized to
    /// decimals here and nowhere else.
    pub fn from_json(json: &str) -> BookingResult<Self> {
        let file: CatalogFile = serde_json::from_str(json).map_err(BookingError::CatalogParse)?;
        let mut catalog = InMemoryCatalog::new();

        for hospital in file.hospitals {
            catalog.add_hospital(hospital)?;
        }
        for doctor in file.doctors {
            catalog.add_doctor(doctor)?;
        }
        for record in file.pharmacies {
            let id = record.facility.id.clone();
            catalog.add_pharmacy(record.facility)?;
            for medicine in record.medicines {
                catalog.add_medicine(&id, medicine)?;
            }
        }
        for record in file.labs {
            let id = record.facility.id.clone();
            catalog.add_lab(record.facility)?;
            for test in record.tests {
                catalog.add_test(&id, test)?;
            }
        }

        tracing::debug!(
            hospitals = catalog.hospitals.len(),
            doctors = catalog.doctors.len(),
            pharmacies = catalog.pharmacies.len(),
            labs = catalog.labs.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Read and parse a catalog JSON file.
    pub fn load(path: &Path) -> BookingResult<Self> {
        let json = std::fs::read_to_string(path).map_err(BookingError::CatalogRead)?;
        Self::from_json(&json)
    }

    /// Small built-in catalog for the demo and for tests.
    pub fn demo() -> Self {
        let mut catalog = InMemoryCatalog::new();
        catalog.seed_demo();
        catalog
    }

    fn seed_demo(&mut self) {
        fn facility(id: &str, name: &str, location: &str) -> Facility {
            Facility {
                id: id.to_string(),
                name: name.to_string(),
                location_label: location.to_string(),
            }
        }
        fn doctor(id: &str, name: &str, specialty: &str, location: &str, hospital: Option<&str>) -> Doctor {
            Doctor {
                id: id.to_string(),
                name: name.to_string(),
                specialty: specialty.to_string(),
                location_label: location.to_string(),
                hospital_id: hospital.map(str::to_string),
            }
        }

        self.hospitals.insert("h1".into(), facility("h1", "Apollo Hospital", "Chennai"));
        self.hospitals.insert("h2".into(), facility("h2", "Fortis Hospital", "Bengaluru"));
        self.hospitals.insert("h3".into(), facility("h3", "AIIMS", "New Delhi"));

        for d in [
            doctor("d1", "Dr. Kumar", "Cardiology", "Chennai", Some("h1")),
            doctor("d2", "Dr. Priya Sharma", "Dermatology", "Chennai", Some("h1")),
            doctor("d3", "Dr. Rao", "Orthopedics", "Bengaluru", Some("h2")),
            doctor("d4", "Dr. Mehta", "Neurology", "New Delhi", Some("h3")),
            doctor("d5", "Dr. Anita Desai", "Pediatrics", "Mumbai", None),
            doctor("d6", "Dr. Iyer", "General Medicine", "Pune", None),
        ] {
            self.doctors.insert(d.id.clone(), d);
        }

        self.pharmacies.insert("p1".into(), facility("p1", "MedPlus", "Hyderabad"));
        self.pharmacies.insert("p2".into(), facility("p2", "Apollo Pharmacy", "Chennai"));

        let medicine = |id: &str, name: &str, price: i64| Medicine {
            id: id.to_string(),
            name: name.to_string(),
            unit_price: price.into(),
        };
        self.medicines.insert(
            "p1".into(),
            [
                medicine("m1", "Paracetamol", 25),
                medicine("m2", "Amoxicillin", 120),
                medicine("m3", "Cetirizine", 40),
            ]
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect(),
        );
        self.medicines.insert(
            "p2".into(),
            [medicine("m1", "Ibuprofen", 35), medicine("m2", "Vitamin D3", 210)]
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect(),
        );

        self.labs.insert("l1".into(), facility("l1", "City Diagnostics", "Mumbai"));
        self.labs.insert("l2".into(), facility("l2", "Thyrocare", "Navi Mumbai"));

        let test = |id: &str, name: &str, price: i64| LabTest {
            id: id.to_string(),
            name: name.to_string(),
            price: price.into(),
        };
        self.tests.insert(
            "l1".into(),
            [
                test("t1", "CBC", 350),
                test("t2", "Lipid Profile", 800),
                test("t3", "HbA1c", 550),
            ]
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect(),
        );
        self.tests.insert(
            "l2".into(),
            [test("t1", "Thyroid Profile", 600)]
                .into_iter()
                .map(|t| (t.id.clone(), t))
                .collect(),
        );
    }
}

impl CatalogProvider for InMemoryCatalog {
    fn list_entities(&self, kind: BookingKind) -> Vec<Entity> {
        match kind {
            BookingKind::Hospital => self.hospitals.values().cloned().map(Entity::Hospital).collect(),
            BookingKind::Doctor => self.doctors.values().cloned().map(Entity::Doctor).collect(),
            BookingKind::Pharmacy => self.pharmacies.values().cloned().map(Entity::Pharmacy).collect(),
            BookingKind::Lab => self.labs.values().cloned().map(Entity::Lab).collect(),
        }
    }

    fn list_sub_items(&self, kind: BookingKind, parent_id: &str) -> Vec<SubItem> {
        match kind {
            BookingKind::Hospital => self
                .doctors
                .values()
                .filter(|d| d.hospital_id.as_deref() == Some(parent_id))
                .cloned()
                .map(SubItem::Doctor)
                .collect(),
            BookingKind::Pharmacy => self
                .medicines
                .get(parent_id)
                .map(|stock| stock.values().cloned().map(SubItem::Medicine).collect())
                .unwrap_or_default(),
            BookingKind::Lab => self
                .tests
                .get(parent_id)
                .map(|menu| menu.values().cloned().map(SubItem::Test).collect())
                .unwrap_or_default(),
            BookingKind::Doctor => Vec::new(),
        }
    }
}
