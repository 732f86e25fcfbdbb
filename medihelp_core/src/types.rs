//! Shared identifiers and calendar helpers.

use chrono::{Local, NaiveDate, Weekday};

/// Identifier of a medicine inside a [`crate::MedicinesDatabase`]
pub type MedicineId = u32;

/// Identifier of a user inside a [`crate::UsersDatabase`]
pub type UserId = u32;

/// Identifier of a prescription, unique within its owning user
pub type PrescriptionId = u32;

/// Date format used by every data file
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| crate::Error::InvalidDate(value.to_string()))
}

/// Map a 1-based weekday number (Monday = 1) to [`Weekday`].
pub fn weekday_from_number(number: u8) -> Option<Weekday> {
    match number {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Lowest non-negative id not present in `used`.
pub(crate) fn lowest_free_id<I>(used: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    let used: std::collections::BTreeSet<u32> = used.into_iter().collect();
    (0..).find(|id| !used.contains(id)).unwrap_or(0)
}
