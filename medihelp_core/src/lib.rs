#![forbid(unsafe_code)]

//! Domain model and persistence for the MediHelp household medicine tracker.
//!
//! This crate provides:
//! - Domain entities (medicines, users, prescriptions) with validation
//! - Keyed databases with CSV (medicines) and JSON (users) persistence
//! - The [`System`] façade used by front ends

pub mod types;
pub mod error;
pub mod names;
pub mod prescription;
pub mod user;
pub mod medicine;
pub mod cells;
pub mod storage;
pub mod medicines_db;
pub mod users_db;
pub mod system;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::{MedicineId, PrescriptionId, UserId};
pub use names::{normalize_list_of_names, normalize_name};
pub use prescription::Prescription;
pub use user::{User, UserProfile};
pub use medicine::{Medicine, MedicineFields};
pub use medicines_db::MedicinesDatabase;
pub use users_db::UsersDatabase;
pub use system::System;
pub use config::Config;
