//! Data models for the booking wizard.
//!
//! This module defines the core data structures used throughout the engine:
//! - BookingKind: which of the four booking flows a session runs
//! - Entity / SubItem: catalog records, tagged by kind
//! - TimeSlot / TimeGrid: the fixed set of bookable time labels
//! - Price helpers: parsing at the data boundary and display formatting

use crate::error::{BookingError, BookingResult};
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const CURRENCY_SYMBOL: &str = "₹";

const TIME_LABEL_FORMAT: &str = "%I:%M %p";

pub const DEFAULT_TIME_SLOTS: [&str; 8] = [
    "09:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "02:00 PM", "03:00 PM", "04:00 PM", "05:00 PM",
];

/// The four booking flows.
///
/// The kind is fixed for the lifetime of a wizard session; switching kind
/// starts a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    Hospital,
    Doctor,
    Pharmacy,
    Lab,
}

impl BookingKind {
    pub const ALL: [BookingKind; 4] = [
        BookingKind::Hospital,
        BookingKind::Doctor,
        BookingKind::Pharmacy,
        BookingKind::Lab,
    ];

    pub fn name(&self) -> &str {
        match self {
            BookingKind::Hospital => "HOSPITAL",
            BookingKind::Doctor => "DOCTOR",
            BookingKind::Pharmacy => "PHARMACY",
            BookingKind::Lab => "LAB",
        }
    }

    /// Last step of the wizard for this kind.
    pub fn max_step(&self) -> u8 {
        match self {
            BookingKind::Hospital => 3,
            BookingKind::Doctor | BookingKind::Pharmacy | BookingKind::Lab => 2,
        }
    }
}

impl FromStr for BookingKind {
    type Err = BookingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "hospital" => Ok(BookingKind::Hospital),
            "doctor" => Ok(BookingKind::Doctor),
            "pharmacy" => Ok(BookingKind::Pharmacy),
            "lab" => Ok(BookingKind::Lab),
            _ => Err(BookingError::InvalidBookingKind(value.to_string())),
        }
    }
}

impl fmt::Display for BookingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_lowercase())
    }
}

/// A hospital, pharmacy or lab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub location_label: String,
}

/// A doctor, either standalone or employed by a hospital.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub location_label: String,
    #[serde(default)]
    pub hospital_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabTest {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: Decimal,
}

/// A top-level bookable target, tagged by the kind it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    Hospital(Facility),
    Doctor(Doctor),
    Pharmacy(Facility),
    Lab(Facility),
}

impl Entity {
    pub fn kind(&self) -> BookingKind {
        match self {
            Entity::Hospital(_) => BookingKind::Hospital,
            Entity::Doctor(_) => BookingKind::Doctor,
            Entity::Pharmacy(_) => BookingKind::Pharmacy,
            Entity::Lab(_) => BookingKind::Lab,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Hospital(f) | Entity::Pharmacy(f) | Entity::Lab(f) => &f.id,
            Entity::Doctor(d) => &d.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Hospital(f) | Entity::Pharmacy(f) | Entity::Lab(f) => &f.name,
            Entity::Doctor(d) => &d.name,
        }
    }

    pub fn location_label(&self) -> &str {
        match self {
            Entity::Hospital(f) | Entity::Pharmacy(f) | Entity::Lab(f) => &f.location_label,
            Entity::Doctor(d) => &d.location_label,
        }
    }
}

/// An item offered by an entity: a hospital's doctor, a pharmacy's
/// medicine or a lab's test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SubItem {
    Doctor(Doctor),
    Medicine(Medicine),
    Test(LabTest),
}

impl SubItem {
    pub fn id(&self) -> &str {
        match self {
            SubItem::Doctor(d) => &d.id,
            SubItem::Medicine(m) => &m.id,
            SubItem::Test(t) => &t.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SubItem::Doctor(d) => &d.name,
            SubItem::Medicine(m) => &m.name,
            SubItem::Test(t) => &t.name,
        }
    }
}

/// A bookable time of day, identified by its label (e.g. "10:00 AM").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TimeSlot {
    label: String,
    time: NaiveTime,
}

impl TimeSlot {
    /// Parse a slot label. Case and surrounding whitespace are ignored and
    /// the stored label is normalized to `HH:MM AM`.
    pub fn parse(label: &str) -> BookingResult<Self> {
        let time = NaiveTime::parse_from_str(label.trim(), TIME_LABEL_FORMAT)
            .map_err(|_| BookingError::InvalidTimeSlot(label.to_string()))?;

        Ok(TimeSlot {
            label: time.format(TIME_LABEL_FORMAT).to_string(),
            time,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// The fixed, ordered set of time slots a wizard offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeGrid {
    slots: Vec<TimeSlot>,
}

impl TimeGrid {
    /// Build a grid from labels, rejecting unparsable and duplicate labels.
    pub fn from_labels<I, S>(labels: I) -> BookingResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut slots: Vec<TimeSlot> = Vec::new();
        for label in labels {
            let slot = TimeSlot::parse(label.as_ref())?;
            if slots.iter().any(|s| s.time == slot.time) {
                return Err(BookingError::DuplicateTimeSlot(slot.label));
            }
            slots.push(slot);
        }

        if slots.is_empty() {
            return Err(BookingError::EmptyTimeGrid);
        }

        Ok(TimeGrid { slots })
    }

    /// Look up the grid slot matching `label`.
    pub fn find(&self, label: &str) -> Option<&TimeSlot> {
        let wanted = TimeSlot::parse(label).ok()?;
        self.slots.iter().find(|s| s.time == wanted.time)
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for TimeGrid {
    fn default() -> Self {
        let slots = DEFAULT_TIME_SLOTS
            .iter()
            .filter_map(|label| TimeSlot::parse(label).ok())
            .collect();
        TimeGrid { slots }
    }
}

/// Normalize a price that may carry a currency prefix or thousands
/// separators (e.g. "₹1,200.50", "Rs. 450").
///
/// Everything before the first digit is dropped, then every character that
/// is not a digit or `.` is removed. A minus sign in the prefix or an
/// exponent after the first digit is rejected.
pub fn parse_price(raw: &str) -> BookingResult<Decimal> {
    let invalid = || BookingError::InvalidPrice(raw.to_string());
    let start = raw.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
    let (prefix, amount) = raw.split_at(start);

    if prefix.contains('-') || amount.contains(['e', 'E']) {
        return Err(invalid());
    }

    let digits: String = amount
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    Decimal::from_str(&digits).map_err(|_| invalid())
}

/// Display-only price formatting.
pub fn format_price(price: Decimal) -> String {
    format!("{}{:.2}", CURRENCY_SYMBOL, price)
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(serde_json::Number),
        Text(String),
    }

    match RawPrice::deserialize(deserializer)? {
        RawPrice::Number(n) => number_price(&n.to_string()).map_err(serde::de::Error::custom),
        RawPrice::Text(s) => parse_price(&s).map_err(serde::de::Error::custom),
    }
}

/// A JSON number taken as-is, exponent form included. Negative amounts are
/// rejected.
fn number_price(raw: &str) -> BookingResult<Decimal> {
    let invalid = || BookingError::InvalidPrice(raw.to_string());
    let price = if raw.contains(['e', 'E']) {
        Decimal::from_scientific(raw).map_err(|_| invalid())?
    } else {
        Decimal::from_str(raw).map_err(|_| invalid())?
    };

    if price.is_sign_negative() && !price.is_zero() {
        return Err(invalid());
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_kind_parses_case_insensitively() {
        assert_eq!("Pharmacy".parse::<BookingKind>().unwrap(), BookingKind::Pharmacy);
        assert_eq!(" lab ".parse::<BookingKind>().unwrap(), BookingKind::Lab);
        assert!(matches!(
            "clinic".parse::<BookingKind>(),
            Err(BookingError::InvalidBookingKind(_))
        ));
    }

    #[test]
    fn max_step_per_kind() {
        assert_eq!(BookingKind::Hospital.max_step(), 3);
        assert_eq!(BookingKind::Doctor.max_step(), 2);
        assert_eq!(BookingKind::Pharmacy.max_step(), 2);
        assert_eq!(BookingKind::Lab.max_step(), 2);
    }

    #[test]
    fn time_slot_label_is_normalized() {
        let slot = TimeSlot::parse("9:30 am").unwrap();
        assert_eq!(slot.label(), "09:30 AM");
        assert_eq!(slot.time(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(TimeSlot::parse("25:00").is_err());
    }

    #[test]
    fn time_grid_rejects_duplicates_and_empty() {
        assert!(matches!(
            TimeGrid::from_labels(["10:00 AM", "10:00 am"]),
            Err(BookingError::DuplicateTimeSlot(_))
        ));
        assert!(matches!(
            TimeGrid::from_labels(Vec::<String>::new()),
            Err(BookingError::EmptyTimeGrid)
        ));
    }

    #[test]
    fn default_grid_has_every_default_label() {
        let grid = TimeGrid::default();
        assert_eq!(grid.len(), DEFAULT_TIME_SLOTS.len());
        assert_eq!(grid.find("10:00 AM").unwrap().label(), "10:00 AM");
        assert!(grid.find("01:00 PM").is_none());
    }

    #[test]
    fn parse_price_strips_currency_and_separators() {
        assert_eq!(parse_price("₹1,200.50").unwrap(), Decimal::new(120050, 2));
        assert_eq!(parse_price("Rs. 450").unwrap(), Decimal::from(450));
        assert_eq!(parse_price("300").unwrap(), Decimal::from(300));
        assert!(parse_price("free").is_err());
    }

    #[test]
    fn parse_price_rejects_negative_and_exponent_forms() {
        assert!(matches!(parse_price("-25"), Err(BookingError::InvalidPrice(_))));
        assert!(matches!(parse_price("-₹25"), Err(BookingError::InvalidPrice(_))));
        assert!(matches!(parse_price("1e-7"), Err(BookingError::InvalidPrice(_))));
        assert!(matches!(parse_price("2E3"), Err(BookingError::InvalidPrice(_))));
    }

    #[test]
    fn numeric_price_is_read_exactly() {
        let m: Medicine =
            serde_json::from_str(r#"{"id":"m1","name":"Trace","unit_price":1e-7}"#).unwrap();
        assert_eq!(m.unit_price, Decimal::new(1, 7));

        let negative = serde_json::from_str::<Medicine>(r#"{"id":"m1","name":"Refund","unit_price":-25}"#);
        assert!(negative.is_err());

        let negative_text =
            serde_json::from_str::<LabTest>(r#"{"id":"t1","name":"CBC","price":"-₹25"}"#);
        assert!(negative_text.is_err());
    }

    #[test]
    fn medicine_price_accepts_number_or_string() {
        let m: Medicine =
            serde_json::from_str(r#"{"id":"m1","name":"Paracetamol","unit_price":"₹25"}"#).unwrap();
        assert_eq!(m.unit_price, Decimal::from(25));

        let t: LabTest =
            serde_json::from_str(r#"{"id":"t1","name":"CBC","price":350.5}"#).unwrap();
        assert_eq!(t.price, Decimal::new(3505, 1));
    }

    #[test]
    fn format_price_uses_two_decimals() {
        assert_eq!(format_price(Decimal::from(40)), "₹40.00");
    }

    #[test]
    fn entity_accessors_follow_variant() {
        let doctor = Doctor {
            id: "d1".into(),
            name: "Dr. Kumar".into(),
            specialty: "Cardiology".into(),
            location_label: "Chennai".into(),
            hospital_id: None,
        };
        let entity = Entity::Doctor(doctor);
        assert_eq!(entity.kind(), BookingKind::Doctor);
        assert_eq!(entity.id(), "d1");
        assert_eq!(entity.location_label(), "Chennai");
    }
}
