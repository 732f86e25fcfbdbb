//! Medicines kept in the household first-aid kit.

use crate::names::{normalize_entity_name, normalize_lowercase_entry};
use crate::types::{today, MedicineId, UserId};
use crate::{Error, Result, User};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Longest accepted note, in characters
pub const MAX_NOTE_LENGTH: usize = 500;

/// Most lines a note may span
pub const MAX_NOTE_LINES: usize = 5;

/// Everything needed to build a [`Medicine`] apart from its id and notes
#[derive(Clone, Debug)]
pub struct MedicineFields {
    pub name: String,
    pub manufacturer: String,
    pub illnesses: Vec<String>,
    pub substances: Vec<String>,
    pub recommended_age: i64,
    pub doses: i64,
    pub doses_left: i64,
    pub expiration_date: NaiveDate,
    pub recipients: Vec<UserId>,
}

/// A single medicine package
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Medicine {
    id: MedicineId,
    name: String,
    manufacturer: String,
    illnesses: BTreeSet<String>,
    substances: BTreeSet<String>,
    recommended_age: u32,
    doses: u32,
    doses_left: u32,
    expiration_date: NaiveDate,
    recipients: BTreeSet<UserId>,
    notes: BTreeMap<UserId, String>,
}

impl Medicine {
    /// Validate `fields` and build a medicine with no notes.
    pub fn new(id: MedicineId, fields: MedicineFields) -> Result<Self> {
        let name = normalize_entity_name(&fields.name).ok_or(Error::InvalidMedicineName)?;
        let manufacturer =
            normalize_entity_name(&fields.manufacturer).ok_or(Error::InvalidManufacturerName)?;
        let illnesses = lowercase_set(&fields.illnesses, Error::InvalidIllnessName)?;
        let substances = lowercase_set(&fields.substances, Error::InvalidSubstanceName)?;

        let recommended_age = u32::try_from(fields.recommended_age).map_err(|_| Error::InvalidAge)?;
        let doses = positive(fields.doses).ok_or(Error::InvalidDoses)?;
        let doses_left = positive(fields.doses_left).ok_or(Error::InvalidDoses)?;
        if doses_left > doses {
            return Err(Error::TooManyDosesLeft);
        }

        let mut medicine = Self {
            id,
            name,
            manufacturer,
            illnesses,
            substances,
            recommended_age,
            doses,
            doses_left,
            expiration_date: fields.expiration_date,
            recipients: BTreeSet::new(),
            notes: BTreeMap::new(),
        };
        for recipient in fields.recipients {
            medicine.add_recipient(recipient);
        }
        Ok(medicine)
    }

    pub fn id(&self) -> MedicineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn illnesses(&self) -> &BTreeSet<String> {
        &self.illnesses
    }

    pub fn substances(&self) -> &BTreeSet<String> {
        &self.substances
    }

    pub fn recommended_age(&self) -> u32 {
        self.recommended_age
    }

    pub fn doses(&self) -> u32 {
        self.doses
    }

    pub fn doses_left(&self) -> u32 {
        self.doses_left
    }

    pub fn expiration_date(&self) -> NaiveDate {
        self.expiration_date
    }

    pub fn recipients(&self) -> &BTreeSet<UserId> {
        &self.recipients
    }

    pub fn add_recipient(&mut self, user_id: UserId) {
        self.recipients.insert(user_id);
    }

    /// Remove a recipient, returning whether it was present.
    pub fn remove_recipient(&mut self, user_id: UserId) -> bool {
        self.recipients.remove(&user_id)
    }

    pub fn is_recipient(&self, user_id: UserId) -> bool {
        self.recipients.contains(&user_id)
    }

    /// Normalized fields; `Medicine::new` on them rebuilds this medicine minus its notes.
    pub fn fields(&self) -> MedicineFields {
        MedicineFields {
            name: self.name.clone(),
            manufacturer: self.manufacturer.clone(),
            illnesses: self.illnesses.iter().cloned().collect(),
            substances: self.substances.iter().cloned().collect(),
            recommended_age: i64::from(self.recommended_age),
            doses: i64::from(self.doses),
            doses_left: i64::from(self.doses_left),
            expiration_date: self.expiration_date,
            recipients: self.recipients.iter().copied().collect(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_on(today())
    }

    /// Expired strictly after the expiration date.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        today > self.expiration_date
    }

    /// Take `count` doses on behalf of `user`.
    pub fn take_doses(&mut self, count: u32, user: &User) -> Result<()> {
        self.take_doses_on(count, user, today())
    }

    /// Take `count` doses on behalf of `user` as of `today`.
    ///
    /// Checks run in a fixed order: expiry, allergy, age, supply. The first
    /// failing check is reported and nothing is decremented.
    pub fn take_doses_on(&mut self, count: u32, user: &User, today: NaiveDate) -> Result<()> {
        self.check_dose(count, user, today)?;
        self.doses_left -= count;
        tracing::debug!(
            medicine = self.id,
            user = user.id(),
            count,
            doses_left = self.doses_left,
            "Took doses"
        );
        Ok(())
    }

    /// Whether `user` could take a single dose today.
    pub fn can_be_taken_by(&self, user: &User) -> bool {
        self.check_dose(1, user, today()).is_ok()
    }

    fn check_dose(&self, count: u32, user: &User, today: NaiveDate) -> Result<()> {
        if self.is_expired_on(today) {
            return Err(Error::ExpiredMedicine);
        }

        // BTreeSet intersection is already sorted
        let allergens: Vec<&str> = self
            .substances
            .intersection(user.allergies())
            .map(String::as_str)
            .collect();
        if !allergens.is_empty() {
            return Err(Error::AllergyWarning(allergens.join(", ")));
        }

        let age = user.age_on(today);
        if i64::from(self.recommended_age) > i64::from(age) {
            return Err(Error::AgeWarning {
                recommended: self.recommended_age,
                age,
            });
        }

        if self.doses_left < count {
            return Err(Error::NotEnoughDoses {
                left: self.doses_left,
                requested: count,
            });
        }
        Ok(())
    }

    pub fn notes(&self) -> &BTreeMap<UserId, String> {
        &self.notes
    }

    pub fn note(&self, author_id: UserId) -> Option<&str> {
        self.notes.get(&author_id).map(String::as_str)
    }

    /// Create or replace the note written by `author_id`.
    pub fn set_note(&mut self, author_id: UserId, content: &str) -> Result<()> {
        if content.is_empty() {
            return Err(Error::EmptyNote);
        }
        if content.matches('\n').count() >= MAX_NOTE_LINES {
            return Err(Error::TooManyLinesInNote {
                max: MAX_NOTE_LINES,
            });
        }
        if content.chars().count() > MAX_NOTE_LENGTH {
            return Err(Error::NoteTooLong {
                max: MAX_NOTE_LENGTH,
            });
        }
        self.notes.insert(author_id, content.to_string());
        Ok(())
    }

    /// Remove the note written by `author_id`, if any.
    pub fn del_note(&mut self, author_id: UserId) {
        self.notes.remove(&author_id);
    }

    /// Replace the whole notes map, e.g. when carrying notes over to an edited medicine.
    pub(crate) fn replace_notes(&mut self, notes: BTreeMap<UserId, String>) {
        self.notes = notes;
    }
}

fn positive(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| *v > 0)
}

fn lowercase_set(entries: &[String], invalid: Error) -> Result<BTreeSet<String>> {
    let mut set = BTreeSet::new();
    for entry in entries {
        match normalize_lowercase_entry(entry) {
            Ok(Some(entry)) => {
                set.insert(entry);
            }
            Ok(None) => {}
            Err(_) => return Err(invalid),
        }
    }
    if set.is_empty() {
        return Err(Error::EmptyList);
    }
    Ok(set)
}
