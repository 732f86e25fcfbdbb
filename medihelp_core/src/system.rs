//! The façade front ends talk to.
//!
//! `System` owns both databases, remembers which medicines file is open and
//! whether it has unsaved changes. The users file lives at a fixed path and is
//! rewritten after every user or prescription change.

use crate::medicine::{Medicine, MedicineFields};
use crate::types::{MedicineId, PrescriptionId, UserId};
use crate::user::UserProfile;
use crate::{Config, Error, MedicinesDatabase, Prescription, Result, User, UsersDatabase};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct System {
    medicines_database: MedicinesDatabase,
    users_database: UsersDatabase,
    users_file_path: PathBuf,
    medicines_file_path: Option<PathBuf>,
    medicines_file_saved: bool,
}

impl System {
    /// Create an empty system whose users are stored at `users_file_path`.
    pub fn new(users_file_path: impl Into<PathBuf>) -> Self {
        Self {
            medicines_database: MedicinesDatabase::new(),
            users_database: UsersDatabase::new(),
            users_file_path: users_file_path.into(),
            medicines_file_path: None,
            medicines_file_saved: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.data.users_path())
    }

    pub fn medicines_database(&self) -> &MedicinesDatabase {
        &self.medicines_database
    }

    pub fn users_database(&self) -> &UsersDatabase {
        &self.users_database
    }

    pub fn medicines(&self) -> &BTreeMap<MedicineId, Medicine> {
        self.medicines_database.medicines()
    }

    pub fn users(&self) -> &BTreeMap<UserId, User> {
        self.users_database.users()
    }

    pub fn users_file_path(&self) -> &Path {
        &self.users_file_path
    }

    pub fn medicines_file_path(&self) -> Option<&Path> {
        self.medicines_file_path.as_deref()
    }

    /// False while the medicines database has changes not yet written to a file.
    pub fn medicines_file_saved(&self) -> bool {
        self.medicines_file_saved
    }

    pub fn medicines_database_loaded(&self) -> bool {
        self.medicines_file_path.is_some()
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    pub fn load_users_data(&mut self) -> Result<()> {
        self.users_database
            .read_from_file(&self.users_file_path)
            .map_err(|e| Error::DataLoading(Box::new(e)))?;
        tracing::info!(
            "Loaded {} users from {:?}",
            self.users_database.len(),
            self.users_file_path
        );
        Ok(())
    }

    pub fn save_users_data(&self) -> Result<()> {
        self.users_database
            .write_to_file(&self.users_file_path)
            .map_err(|e| Error::DataSaving(Box::new(e)))?;
        tracing::info!("Saved users to {:?}", self.users_file_path);
        Ok(())
    }

    /// Replace the medicines database with the contents of `path`.
    ///
    /// The database is cleared first. If reading fails it stays empty and
    /// the previously opened path is kept.
    pub fn load_medicines_database_from(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.medicines_database.clear();
        if let Err(e) = self.medicines_database.read_from_file(path) {
            tracing::warn!(
                "Failed to load medicines from {:?}: {}. Medicines database left empty.",
                path,
                e
            );
            return Err(Error::DataLoading(Box::new(e)));
        }
        self.medicines_file_path = Some(path.to_path_buf());
        self.medicines_file_saved = true;
        tracing::info!(
            "Loaded {} medicines from {:?}",
            self.medicines_database.len(),
            path
        );
        Ok(())
    }

    /// Write the medicines database to `path`, or to the opened file if `path` is `None`.
    ///
    /// When no file was open yet, `path` becomes the opened file.
    pub fn save_medicines_database(&mut self, path: Option<&Path>) -> Result<()> {
        let target = match (path, &self.medicines_file_path) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(current)) => current.clone(),
            (None, None) => return Err(Error::NoFileOpened),
        };
        self.medicines_database
            .write_to_file(&target)
            .map_err(|e| Error::DataSaving(Box::new(e)))?;
        self.medicines_file_saved = true;
        if self.medicines_file_path.is_none() {
            self.medicines_file_path = Some(target.clone());
        }
        tracing::info!("Saved medicines to {:?}", target);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Medicines
    // ------------------------------------------------------------------

    /// Add a medicine under the lowest free id and return that id.
    pub fn add_medicine(&mut self, fields: MedicineFields) -> Result<MedicineId> {
        let id = self.medicines_database.next_free_id();
        let medicine = Medicine::new(id, fields)?;
        self.medicines_database.add_medicine(medicine)?;
        self.medicines_file_saved = false;
        tracing::debug!(medicine = id, "Added medicine");
        Ok(id)
    }

    /// Replace a medicine with one built from `fields`, keeping its id and notes.
    pub fn change_medicine(&mut self, medicine_id: MedicineId, fields: MedicineFields) -> Result<()> {
        let old = self
            .medicines_database
            .get(medicine_id)
            .ok_or(Error::MedicineDoesNotExist(medicine_id))?;
        let mut medicine = Medicine::new(medicine_id, fields)?;
        medicine.replace_notes(old.notes().clone());

        self.medicines_database.delete_medicine(medicine_id)?;
        self.medicines_database.add_medicine(medicine)?;
        self.medicines_file_saved = false;
        tracing::debug!(medicine = medicine_id, "Changed medicine");
        Ok(())
    }

    pub fn del_medicine(&mut self, medicine_id: MedicineId) -> Result<()> {
        if self.medicines_database.get(medicine_id).is_none() {
            return Err(Error::MedicineDoesNotExist(medicine_id));
        }
        self.medicines_database.delete_medicine(medicine_id)?;
        self.medicines_file_saved = false;
        tracing::debug!(medicine = medicine_id, "Deleted medicine");
        Ok(())
    }

    /// Take one dose of a medicine on behalf of a user.
    pub fn take_dose(&mut self, medicine_id: MedicineId, user_id: UserId) -> Result<()> {
        let medicine = self
            .medicines_database
            .get_mut(medicine_id)
            .ok_or(Error::MedicineDoesNotExist(medicine_id))?;
        let user = self
            .users_database
            .get(user_id)
            .ok_or(Error::UserDoesNotExist(user_id))?;
        medicine.take_doses(1, user)?;
        self.medicines_file_saved = false;
        Ok(())
    }

    pub fn set_note(&mut self, medicine_id: MedicineId, author_id: UserId, content: &str) -> Result<()> {
        self.note_target(medicine_id, author_id)?
            .set_note(author_id, content)?;
        self.medicines_file_saved = false;
        Ok(())
    }

    pub fn del_note(&mut self, medicine_id: MedicineId, author_id: UserId) -> Result<()> {
        self.note_target(medicine_id, author_id)?.del_note(author_id);
        self.medicines_file_saved = false;
        Ok(())
    }

    fn note_target(&mut self, medicine_id: MedicineId, author_id: UserId) -> Result<&mut Medicine> {
        if self.users_database.get(author_id).is_none() {
            return Err(Error::UserDoesNotExist(author_id));
        }
        self.medicines_database
            .get_mut(medicine_id)
            .ok_or(Error::MedicineDoesNotExist(medicine_id))
    }

    /// Medicines listing `user_id` as a recipient.
    pub fn medicines_for(&self, user_id: UserId) -> Vec<&Medicine> {
        self.medicines()
            .values()
            .filter(|m| m.is_recipient(user_id))
            .collect()
    }

    pub fn valid_medicines(&self) -> Vec<&Medicine> {
        self.medicines().values().filter(|m| !m.is_expired()).collect()
    }

    pub fn expired_medicines(&self) -> Vec<&Medicine> {
        self.medicines().values().filter(|m| m.is_expired()).collect()
    }

    // ------------------------------------------------------------------
    // Users and prescriptions
    // ------------------------------------------------------------------

    /// Register a new user under the lowest free id and persist the users file.
    pub fn add_user(&mut self, profile: &UserProfile) -> Result<UserId> {
        let id = self.users_database.next_free_id();
        self.users_database.add_user(User::from_profile(id, profile)?)?;
        self.save_users_data()?;
        Ok(id)
    }

    /// Replace a user's profile, keeping their prescriptions, and persist the users file.
    pub fn change_user(&mut self, user_id: UserId, profile: &UserProfile) -> Result<()> {
        self.user(user_id)?;
        let mut user = User::from_profile(user_id, profile)?;
        user.take_prescriptions_from(self.user_mut(user_id)?);
        self.users_database.replace_user(user)?;
        self.save_users_data()
    }

    /// Add a prescription under the user's lowest free prescription id.
    pub fn add_prescription(
        &mut self,
        user_id: UserId,
        medicine_name: &str,
        dosage: i64,
        weekday: i64,
    ) -> Result<PrescriptionId> {
        let user = self.user_mut(user_id)?;
        let id = user.next_prescription_id();
        user.add_prescription(Prescription::new(id, medicine_name, dosage, weekday)?)?;
        self.save_users_data()?;
        Ok(id)
    }

    /// Replace a prescription with a new one carrying the same id.
    pub fn change_prescription(
        &mut self,
        user_id: UserId,
        prescription_id: PrescriptionId,
        medicine_name: &str,
        dosage: i64,
        weekday: i64,
    ) -> Result<()> {
        let user = self.user_mut(user_id)?;
        let prescription = Prescription::new(prescription_id, medicine_name, dosage, weekday)?;
        user.remove_prescription(prescription_id)?;
        user.add_prescription(prescription)?;
        self.save_users_data()
    }

    pub fn del_prescription(&mut self, user_id: UserId, prescription_id: PrescriptionId) -> Result<()> {
        self.user_mut(user_id)?.remove_prescription(prescription_id)?;
        self.save_users_data()
    }

    /// Every user's prescriptions for a weekday (Monday = 1).
    pub fn prescriptions_on(&self, weekday: u8) -> Vec<(&User, &Prescription)> {
        self.users()
            .values()
            .flat_map(|user| {
                user.prescriptions()
                    .values()
                    .filter(move |p| p.weekday() == weekday)
                    .map(move |p| (user, p))
            })
            .collect()
    }

    fn user(&self, user_id: UserId) -> Result<&User> {
        self.users_database
            .get(user_id)
            .ok_or(Error::UserDoesNotExist(user_id))
    }

    fn user_mut(&mut self, user_id: UserId) -> Result<&mut User> {
        self.users_database
            .get_mut(user_id)
            .ok_or(Error::UserDoesNotExist(user_id))
    }
}

impl Default for System {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

