//! Normalization of free-text names.
//!
//! Names end up inside comma-joined lists and CSV cells, so a small set of
//! characters is refused outright.

use crate::{Error, Result};

/// Characters that may never appear in a name
pub const FORBIDDEN_CHARACTERS: [char; 4] = ['\'', '"', '\n', ','];

/// Longest accepted medicine, manufacturer or user name
pub const MAX_NAME_LENGTH: usize = 16;

/// Trim surrounding whitespace and refuse forbidden characters.
pub fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.contains(&FORBIDDEN_CHARACTERS[..]) {
        return Err(Error::IllegalCharactersInName);
    }
    Ok(name.to_string())
}

/// Normalize every entry, dropping the ones that end up empty.
///
/// A forbidden character in any entry fails the whole call.
pub fn normalize_list_of_names<I, S>(names: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized = Vec::new();
    for name in names {
        let name = normalize_name(name.as_ref())?;
        if !name.is_empty() {
            normalized.push(name);
        }
    }
    Ok(normalized)
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut previous_is_letter = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }
    result
}

/// Normalize and title-case a medicine, manufacturer or user name.
///
/// Returns `None` if the name contains forbidden characters or does not fit
/// in 1..=16 characters; callers map that to their own error kind.
pub fn normalize_entity_name(name: &str) -> Option<String> {
    let name = normalize_name(name).ok()?;
    let length = name.chars().count();
    if length == 0 || length > MAX_NAME_LENGTH {
        return None;
    }
    Some(title_case(&name))
}

/// Lower-case and normalize a list entry (illness, substance, allergy).
///
/// `Ok(None)` means the entry was all whitespace and should be dropped.
pub(crate) fn normalize_lowercase_entry(entry: &str) -> Result<Option<String>> {
    let entry = normalize_name(&entry.to_lowercase())?;
    Ok(if entry.is_empty() { None } else { Some(entry) })
}
