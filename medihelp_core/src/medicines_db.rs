//! Keyed collection of medicines and its CSV file format.
//!
//! The header row is row 1, so the first medicine lives on row 2. Every
//! failure while reading is reported as [`Error::MalformedData`] carrying the
//! file path and the row number.

use crate::cells;
use crate::medicine::{Medicine, MedicineFields};
use crate::storage;
use crate::types::{lowest_free_id, parse_date, MedicineId, DATE_FORMAT};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

/// A row of the medicines file, in column order
#[derive(Debug, Serialize, Deserialize)]
struct MedicineRow {
    id: MedicineId,
    name: String,
    manufacturer: String,
    illnesses: String,
    recipients: String,
    substances: String,
    recommended_age: i64,
    doses: i64,
    doses_left: i64,
    expiration_date: String,
    notes: String,
}

impl TryFrom<&Medicine> for MedicineRow {
    type Error = Error;

    fn try_from(medicine: &Medicine) -> Result<Self> {
        Ok(MedicineRow {
            id: medicine.id(),
            name: medicine.name().to_string(),
            manufacturer: medicine.manufacturer().to_string(),
            illnesses: cells::encode_string_set(medicine.illnesses())?,
            recipients: cells::encode_id_set(medicine.recipients())?,
            substances: cells::encode_string_set(medicine.substances())?,
            recommended_age: i64::from(medicine.recommended_age()),
            doses: i64::from(medicine.doses()),
            doses_left: i64::from(medicine.doses_left()),
            expiration_date: medicine.expiration_date().format(DATE_FORMAT).to_string(),
            notes: cells::encode_notes(medicine.notes())?,
        })
    }
}

impl TryFrom<MedicineRow> for Medicine {
    type Error = Error;

    fn try_from(row: MedicineRow) -> Result<Self> {
        let fields = MedicineFields {
            name: row.name,
            manufacturer: row.manufacturer,
            illnesses: cells::decode_string_set(&row.illnesses)?,
            substances: cells::decode_string_set(&row.substances)?,
            recommended_age: row.recommended_age,
            doses: row.doses,
            doses_left: row.doses_left,
            expiration_date: parse_date(&row.expiration_date)?,
            recipients: cells::decode_id_set(&row.recipients)?,
        };
        let mut medicine = Medicine::new(row.id, fields)?;
        for (author, note) in cells::decode_notes(&row.notes)? {
            medicine.set_note(author, &note)?;
        }
        Ok(medicine)
    }
}

/// All medicines registered in the system, keyed by id
#[derive(Clone, Debug, Default)]
pub struct MedicinesDatabase {
    medicines: BTreeMap<MedicineId, Medicine>,
}

impl MedicinesDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn medicines(&self) -> &BTreeMap<MedicineId, Medicine> {
        &self.medicines
    }

    pub fn get(&self, id: MedicineId) -> Option<&Medicine> {
        self.medicines.get(&id)
    }

    pub fn get_mut(&mut self, id: MedicineId) -> Option<&mut Medicine> {
        self.medicines.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.medicines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.medicines.is_empty()
    }

    pub fn add_medicine(&mut self, medicine: Medicine) -> Result<()> {
        if self.medicines.contains_key(&medicine.id()) {
            return Err(Error::IdAlreadyInUse(medicine.id()));
        }
        self.medicines.insert(medicine.id(), medicine);
        Ok(())
    }

    pub fn delete_medicine(&mut self, id: MedicineId) -> Result<Medicine> {
        self.medicines
            .remove(&id)
            .ok_or(Error::NoSuchIdInDatabase(id))
    }

    pub fn clear(&mut self) {
        self.medicines.clear();
    }

    /// Lowest id not used by any medicine.
    pub fn next_free_id(&self) -> MedicineId {
        lowest_free_id(self.medicines.keys().copied())
    }

    /// Read medicines from the CSV file at `path` and add them to the database.
    pub fn read_from_file(&mut self, path: &Path) -> Result<()> {
        let contents = storage::read_locked(path)?;
        self.read_from(contents.as_slice(), path)
    }

    /// Read medicines in CSV form from `reader`; `source` names the input in errors.
    ///
    /// Nothing is added unless the whole input is valid.
    pub fn read_from<R: Read>(&mut self, reader: R, source: &Path) -> Result<()> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|e| Error::malformed(source, 1, e.into()))?
            .clone();

        let mut staged = BTreeMap::new();
        for (i, record) in reader.records().enumerate() {
            let row_number = i + 2;
            let medicine = record
                .map_err(Error::from)
                .and_then(|record| Ok(record.deserialize::<MedicineRow>(Some(&headers))?))
                .and_then(Medicine::try_from)
                .and_then(|medicine| {
                    let id = medicine.id();
                    if self.medicines.contains_key(&id) || staged.contains_key(&id) {
                        Err(Error::IdAlreadyInUse(id))
                    } else {
                        Ok(medicine)
                    }
                })
                .map_err(|e| Error::malformed(source, row_number, e))?;
            staged.insert(medicine.id(), medicine);
        }

        tracing::debug!("Read {} medicines from {:?}", staged.len(), source);
        self.medicines.append(&mut staged);
        Ok(())
    }

    /// Rewrite the CSV file at `path` with the whole database.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        storage::write_atomically(path, |writer| self.write_to(writer))
    }

    /// Write the database in CSV form, sorted by id.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        if self.medicines.is_empty() {
            writer.write_record(HEADER)?;
        }
        for medicine in self.medicines.values() {
            writer.serialize(MedicineRow::try_from(medicine)?)?;
        }
        writer.flush()?;
        tracing::debug!("Wrote {} medicines", self.medicines.len());
        Ok(())
    }
}

/// Column order of the medicines file
pub const HEADER: [&str; 11] = [
    "id",
    "name",
    "manufacturer",
    "illnesses",
    "recipients",
    "substances",
    "recommended_age",
    "doses",
    "doses_left",
    "expiration_date",
    "notes",
];
