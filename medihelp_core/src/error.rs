//! Error types for the medihelp_core library.

use std::io;
use std::path::PathBuf;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for medihelp_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------
    /// Medicine (or prescribed medicine) name is empty, too long or contains illegal characters
    #[error("Invalid medicine name. It must be 1 to 16 characters long and cannot contain ' \" , or newlines.")]
    InvalidMedicineName,

    #[error("Invalid manufacturer name. It must be 1 to 16 characters long and cannot contain ' \" , or newlines.")]
    InvalidManufacturerName,

    #[error("Invalid illness name. It cannot contain ' \" , or newlines.")]
    InvalidIllnessName,

    #[error("Invalid substance name. It cannot contain ' \" , or newlines.")]
    InvalidSubstanceName,

    #[error("Invalid user name. It must be 1 to 16 characters long and cannot contain ' \" , or newlines.")]
    InvalidUserName,

    #[error("Number of doses must be greater than zero.")]
    InvalidDoses,

    #[error("Number of doses left cannot exceed the number of doses in the package.")]
    TooManyDosesLeft,

    #[error("Age must be greater or equal to zero.")]
    InvalidAge,

    #[error("Birth date cannot be in the future.")]
    InvalidBirthdate,

    #[error("Weekday must be a number from 1 to 7.")]
    InvalidWeekday,

    /// A list that must hold at least one entry ended up empty after normalization
    #[error("List cannot be empty.")]
    EmptyList,

    #[error("Name contains illegal characters (' \" , or newline).")]
    IllegalCharactersInName,

    #[error("Note cannot be longer than {max} characters.")]
    NoteTooLong { max: usize },

    #[error("Note cannot be empty.")]
    EmptyNote,

    #[error("Note cannot have more than {max} lines.")]
    TooManyLinesInNote { max: usize },

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------
    #[error("Medicine with ID {0} does not exist.")]
    MedicineDoesNotExist(u32),

    #[error("User with ID {0} does not exist.")]
    UserDoesNotExist(u32),

    #[error("There is no entry with ID {0} in the database.")]
    NoSuchIdInDatabase(u32),

    #[error("User has no prescription with ID {0}.")]
    NoSuchIdInUserPrescriptions(u32),

    #[error("ID {0} is already in use.")]
    IdAlreadyInUse(u32),

    // ------------------------------------------------------------------
    // Dose-taking refusals
    // ------------------------------------------------------------------
    /// Carries the sorted, comma-joined list of matched allergens
    #[error("You are allergic to: {0}.")]
    AllergyWarning(String),

    #[error("This medicine is recommended from the age of {recommended}, you are {age}.")]
    AgeWarning { recommended: u32, age: i32 },

    #[error("Not enough doses left ({left} left, {requested} requested).")]
    NotEnoughDoses { left: u32, requested: u32 },

    #[error("This medicine has expired.")]
    ExpiredMedicine,

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------
    #[error("Failed to load data: {0}")]
    DataLoading(#[source] Box<Error>),

    #[error("Failed to save data: {0}")]
    DataSaving(#[source] Box<Error>),

    #[error("No medicines file is opened.")]
    NoFileOpened,

    /// A file could not be parsed; `index` is the 1-based row (CSV) or item (JSON) number
    #[error("Malformed data in {path:?} at position {index}: {source}")]
    MalformedData {
        path: PathBuf,
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// A container cell could not be decoded
    #[error("Invalid cell value {0:?}")]
    InvalidCell(String),

    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the expected refusals of a dose (allergy, age, supply, expiry).
    ///
    /// These are not failures of the program and front ends should present
    /// them as warnings to the user.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Error::AllergyWarning(_)
                | Error::AgeWarning { .. }
                | Error::NotEnoughDoses { .. }
                | Error::ExpiredMedicine
        )
    }

    /// Wrap a file-level failure with its path and position.
    pub(crate) fn malformed(path: impl Into<PathBuf>, index: usize, source: Error) -> Self {
        Error::MalformedData {
            path: path.into(),
            index,
            source: Box::new(source),
        }
    }
}
