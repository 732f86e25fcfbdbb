//! Keyed collection of users and its JSON file format.

use crate::storage;
use crate::types::{lowest_free_id, parse_date, PrescriptionId, UserId, DATE_FORMAT};
use crate::user::UserProfile;
use crate::{Error, Prescription, Result, User};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct PrescriptionRecord {
    id: PrescriptionId,
    medicine_name: String,
    dosage: i64,
    weekday: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct UserRecord {
    id: UserId,
    name: String,
    birth_date: String,
    illnesses: Vec<String>,
    allergies: Vec<String>,
    prescriptions: Vec<PrescriptionRecord>,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        UserRecord {
            id: user.id(),
            name: user.name().to_string(),
            birth_date: user.birth_date().format(DATE_FORMAT).to_string(),
            illnesses: user.illnesses().iter().cloned().collect(),
            allergies: user.allergies().iter().cloned().collect(),
            prescriptions: user
                .prescriptions()
                .values()
                .map(|p| PrescriptionRecord {
                    id: p.id(),
                    medicine_name: p.medicine_name().to_string(),
                    dosage: i64::from(p.dosage()),
                    weekday: i64::from(p.weekday()),
                })
                .collect(),
        }
    }
}

impl TryFrom<UserRecord> for User {
    type Error = Error;

    fn try_from(record: UserRecord) -> Result<Self> {
        let profile = UserProfile {
            name: record.name,
            birth_date: parse_date(&record.birth_date)?,
            illnesses: record.illnesses,
            allergies: record.allergies,
        };
        let mut user = User::from_profile(record.id, &profile)?;
        for p in record.prescriptions {
            user.add_prescription(Prescription::new(p.id, &p.medicine_name, p.dosage, p.weekday)?)?;
        }
        Ok(user)
    }
}

/// All users of the system, keyed by id
#[derive(Clone, Debug, Default)]
pub struct UsersDatabase {
    users: BTreeMap<UserId, User>,
}

impl UsersDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &BTreeMap<UserId, User> {
        &self.users
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn get_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn add_user(&mut self, user: User) -> Result<()> {
        if self.users.contains_key(&user.id()) {
            return Err(Error::IdAlreadyInUse(user.id()));
        }
        self.users.insert(user.id(), user);
        Ok(())
    }

    pub fn delete_user(&mut self, id: UserId) -> Result<User> {
        self.users.remove(&id).ok_or(Error::NoSuchIdInDatabase(id))
    }

    /// Swap in `user` for the existing user with the same id, returning the old one.
    pub fn replace_user(&mut self, user: User) -> Result<User> {
        let old = self.delete_user(user.id())?;
        self.users.insert(user.id(), user);
        Ok(old)
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }

    /// Lowest id not used by any user.
    pub fn next_free_id(&self) -> UserId {
        lowest_free_id(self.users.keys().copied())
    }

    pub fn read_from_file(&mut self, path: &Path) -> Result<()> {
        let contents = storage::read_locked(path)?;
        self.read_from(contents.as_slice(), path)
    }

    /// Read users from a JSON array; `source` names the input in errors.
    ///
    /// A document that is not an array is reported at position 0, a bad item
    /// at its 1-based position. Nothing is added unless every item is valid.
    pub fn read_from<R: Read>(&mut self, reader: R, source: &Path) -> Result<()> {
        let items: Vec<serde_json::Value> =
            serde_json::from_reader(reader).map_err(|e| Error::malformed(source, 0, e.into()))?;

        let mut staged = BTreeMap::new();
        for (i, item) in items.into_iter().enumerate() {
            let item_number = i + 1;
            let user = serde_json::from_value::<UserRecord>(item)
                .map_err(Error::from)
                .and_then(User::try_from)
                .and_then(|user| {
                    let id = user.id();
                    if self.users.contains_key(&id) || staged.contains_key(&id) {
                        Err(Error::IdAlreadyInUse(id))
                    } else {
                        Ok(user)
                    }
                })
                .map_err(|e| Error::malformed(source, item_number, e))?;
            staged.insert(user.id(), user);
        }

        tracing::debug!("Read {} users from {:?}", staged.len(), source);
        self.users.append(&mut staged);
        Ok(())
    }

    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        storage::write_atomically(path, |writer| self.write_to(writer))
    }

    /// Write the database as an indented JSON array, sorted by id.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let records: Vec<UserRecord> = self.users.values().map(UserRecord::from).collect();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        records.serialize(&mut serializer)?;
        writer.write_all(b"\n")?;
        tracing::debug!("Wrote {} users", records.len());
        Ok(())
    }
}
