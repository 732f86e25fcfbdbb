//! A standing instruction to take a medicine on a given weekday.

use crate::names::normalize_entity_name;
use crate::types::{weekday_from_number, PrescriptionId};
use crate::{Error, Result};
use chrono::Weekday;

/// A user's prescription. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prescription {
    id: PrescriptionId,
    medicine_name: String,
    dosage: u32,
    weekday: u8,
}

impl Prescription {
    /// Build a prescription.
    ///
    /// The medicine name is normalized and title-cased; dosage must be
    /// positive and weekday must be in 1..=7 (Monday = 1).
    pub fn new(id: PrescriptionId, medicine_name: &str, dosage: i64, weekday: i64) -> Result<Self> {
        let medicine_name =
            normalize_entity_name(medicine_name).ok_or(Error::InvalidMedicineName)?;
        let dosage = u32::try_from(dosage)
            .ok()
            .filter(|d| *d > 0)
            .ok_or(Error::InvalidDoses)?;
        let weekday = u8::try_from(weekday)
            .ok()
            .filter(|w| (1..=7).contains(w))
            .ok_or(Error::InvalidWeekday)?;

        Ok(Self {
            id,
            medicine_name,
            dosage,
            weekday,
        })
    }

    pub fn id(&self) -> PrescriptionId {
        self.id
    }

    pub fn medicine_name(&self) -> &str {
        &self.medicine_name
    }

    pub fn dosage(&self) -> u32 {
        self.dosage
    }

    /// Weekday number, Monday = 1
    pub fn weekday(&self) -> u8 {
        self.weekday
    }

    pub fn chrono_weekday(&self) -> Weekday {
        // Range checked on construction
        weekday_from_number(self.weekday).unwrap_or(Weekday::Mon)
    }
}
