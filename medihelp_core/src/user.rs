//! Household members: name, age, illnesses, allergies and prescriptions.

use crate::names::{normalize_entity_name, normalize_lowercase_entry};
use crate::types::{lowest_free_id, today, PrescriptionId, UserId};
use crate::{Error, Prescription, Result};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Editable part of a user, as entered in a form or read from a file
#[derive(Clone, Debug)]
pub struct UserProfile {
    pub name: String,
    pub birth_date: NaiveDate,
    pub illnesses: Vec<String>,
    pub allergies: Vec<String>,
}

/// A user of the system
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: String,
    birth_date: NaiveDate,
    illnesses: BTreeSet<String>,
    allergies: BTreeSet<String>,
    prescriptions: BTreeMap<PrescriptionId, Prescription>,
}

impl User {
    /// Create a user with no illnesses, allergies or prescriptions.
    pub fn new(id: UserId, name: &str, birth_date: NaiveDate) -> Result<Self> {
        let mut user = Self {
            id,
            name: String::new(),
            birth_date,
            illnesses: BTreeSet::new(),
            allergies: BTreeSet::new(),
            prescriptions: BTreeMap::new(),
        };
        user.set_name(name)?;
        user.set_birth_date(birth_date)?;
        Ok(user)
    }

    /// Create a user from a profile, adding every illness and allergy.
    pub fn from_profile(id: UserId, profile: &UserProfile) -> Result<Self> {
        let mut user = Self::new(id, &profile.name, profile.birth_date)?;
        for illness in &profile.illnesses {
            user.add_illness(illness)?;
        }
        for allergy in &profile.allergies {
            user.add_allergy(allergy)?;
        }
        Ok(user)
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the name; it is normalized, title-cased and must be 1..=16 characters.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.name = normalize_entity_name(name).ok_or(Error::InvalidUserName)?;
        Ok(())
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    /// Set the birth date, refusing dates in the future.
    pub fn set_birth_date(&mut self, birth_date: NaiveDate) -> Result<()> {
        if birth_date > today() {
            return Err(Error::InvalidBirthdate);
        }
        self.birth_date = birth_date;
        Ok(())
    }

    /// Age in full years as of today.
    pub fn age(&self) -> i32 {
        self.age_on(today())
    }

    /// Age in full years as of `today`.
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        let mut age = today.year() - self.birth_date.year();
        if (today.month(), today.day()) < (self.birth_date.month(), self.birth_date.day()) {
            age -= 1;
        }
        age
    }

    /// Everything but the prescriptions.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            birth_date: self.birth_date,
            illnesses: self.illnesses.iter().cloned().collect(),
            allergies: self.allergies.iter().cloned().collect(),
        }
    }

    pub fn illnesses(&self) -> &BTreeSet<String> {
        &self.illnesses
    }

    /// Add an illness. All-whitespace entries are ignored.
    pub fn add_illness(&mut self, illness: &str) -> Result<()> {
        let illness = normalize_lowercase_entry(illness).map_err(|_| Error::InvalidIllnessName)?;
        if let Some(illness) = illness {
            self.illnesses.insert(illness);
        }
        Ok(())
    }

    /// Remove an illness, returning whether it was present.
    pub fn remove_illness(&mut self, illness: &str) -> bool {
        self.illnesses.remove(illness)
    }

    pub fn allergies(&self) -> &BTreeSet<String> {
        &self.allergies
    }

    /// Add a substance the user is allergic to. All-whitespace entries are ignored.
    pub fn add_allergy(&mut self, substance: &str) -> Result<()> {
        let substance =
            normalize_lowercase_entry(substance).map_err(|_| Error::InvalidSubstanceName)?;
        if let Some(substance) = substance {
            self.allergies.insert(substance);
        }
        Ok(())
    }

    /// Remove an allergy, returning whether it was present.
    pub fn remove_allergy(&mut self, substance: &str) -> bool {
        self.allergies.remove(substance)
    }

    pub fn prescriptions(&self) -> &BTreeMap<PrescriptionId, Prescription> {
        &self.prescriptions
    }

    pub fn add_prescription(&mut self, prescription: Prescription) -> Result<()> {
        if self.prescriptions.contains_key(&prescription.id()) {
            return Err(Error::IdAlreadyInUse(prescription.id()));
        }
        tracing::debug!(user = self.id, prescription = prescription.id(), "Added prescription");
        self.prescriptions.insert(prescription.id(), prescription);
        Ok(())
    }

    pub fn remove_prescription(&mut self, prescription_id: PrescriptionId) -> Result<Prescription> {
        self.prescriptions
            .remove(&prescription_id)
            .ok_or(Error::NoSuchIdInUserPrescriptions(prescription_id))
    }

    /// Lowest prescription id not used by this user.
    pub fn next_prescription_id(&self) -> PrescriptionId {
        lowest_free_id(self.prescriptions.keys().copied())
    }

    /// Move all prescriptions from `other` into this user, replacing any with the same id.
    pub(crate) fn take_prescriptions_from(&mut self, other: &mut User) {
        self.prescriptions.append(&mut other.prescriptions);
    }
}
