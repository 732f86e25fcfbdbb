use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use medihelp_core::types::{parse_date, weekday_from_number};
use medihelp_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medihelp")]
#[command(about = "Household medicine tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Medicines file to open instead of the configured one
    #[arg(long, global = true)]
    medicines: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List medicines (valid first, then expired)
    Medicines {
        /// Only medicines this user is a recipient of
        #[arg(long)]
        user: Option<UserId>,
    },

    /// Add a medicine and save the medicines file
    AddMedicine {
        #[arg(long)]
        name: String,
        #[arg(long)]
        manufacturer: String,
        #[arg(long = "illness", required = true)]
        illnesses: Vec<String>,
        #[arg(long = "substance", required = true)]
        substances: Vec<String>,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        recommended_age: i64,
        #[arg(long, allow_negative_numbers = true)]
        doses: i64,
        /// Defaults to a full package
        #[arg(long, allow_negative_numbers = true)]
        doses_left: Option<i64>,
        /// Expiration date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        expires: NaiveDate,
        #[arg(long = "recipient")]
        recipients: Vec<UserId>,
    },

    /// Change a medicine; omitted options keep their current value
    EditMedicine {
        id: MedicineId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        manufacturer: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        doses_left: Option<i64>,
        #[arg(long, value_parser = parse_date_arg)]
        expires: Option<NaiveDate>,
        /// Replaces the recipient list
        #[arg(long = "recipient")]
        recipients: Vec<UserId>,
    },

    /// Delete a medicine
    DelMedicine { id: MedicineId },

    /// Take one dose of a medicine
    TakeDose {
        id: MedicineId,
        #[arg(long)]
        user: UserId,
    },

    /// Write or replace your note on a medicine
    SetNote {
        id: MedicineId,
        #[arg(long)]
        user: UserId,
        text: String,
    },

    /// Delete your note on a medicine
    DelNote {
        id: MedicineId,
        #[arg(long)]
        user: UserId,
    },

    /// List users
    Users,

    /// Register a user
    AddUser {
        #[arg(long)]
        name: String,
        /// Birth date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        birth_date: NaiveDate,
        #[arg(long = "illness")]
        illnesses: Vec<String>,
        #[arg(long = "allergy")]
        allergies: Vec<String>,
    },

    /// Change a user's profile; prescriptions are kept
    EditUser {
        id: UserId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = parse_date_arg)]
        birth_date: Option<NaiveDate>,
        /// Replaces the allergy list
        #[arg(long = "allergy")]
        allergies: Vec<String>,
    },

    /// Add a prescription to a user
    AddPrescription {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        medicine: String,
        #[arg(long, allow_negative_numbers = true)]
        dosage: i64,
        /// Weekday number, Monday = 1
        #[arg(long, allow_negative_numbers = true)]
        weekday: i64,
    },

    /// Remove a prescription from a user
    DelPrescription {
        #[arg(long)]
        user: UserId,
        id: PrescriptionId,
    },

    /// Show prescriptions grouped by weekday
    Calendar {
        /// Only this weekday (Monday = 1)
        #[arg(long)]
        weekday: Option<u8>,
    },
}

fn parse_date_arg(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(value).map_err(|e| e.to_string())
}

fn main() {
    // Initialize logging
    medihelp_core::logging::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        if e.is_warning() {
            eprintln!("Warning: {}", e);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    let medicines_path = cli
        .medicines
        .unwrap_or_else(|| config.data.medicines_path());

    let mut system = System::from_config(&config);
    if system.users_file_path().exists() {
        system.load_users_data()?;
    } else {
        tracing::info!("No users file at {:?}, starting empty", system.users_file_path());
    }
    if medicines_path.exists() {
        system.load_medicines_database_from(&medicines_path)?;
    } else {
        tracing::info!("No medicines file at {:?}, starting empty", medicines_path);
    }

    match cli.command {
        Commands::Medicines { user } => cmd_medicines(&system, user),
        Commands::AddMedicine {
            name,
            manufacturer,
            illnesses,
            substances,
            recommended_age,
            doses,
            doses_left,
            expires,
            recipients,
        } => {
            let fields = MedicineFields {
                name,
                manufacturer,
                illnesses,
                substances,
                recommended_age,
                doses,
                doses_left: doses_left.unwrap_or(doses),
                expiration_date: expires,
                recipients,
            };
            let id = system.add_medicine(fields)?;
            save_medicines(&mut system, &medicines_path)?;
            println!("✓ Added medicine {} ({})", id, system.medicines()[&id].name());
            Ok(())
        }
        Commands::EditMedicine {
            id,
            name,
            manufacturer,
            doses_left,
            expires,
            recipients,
        } => {
            let mut fields = system
                .medicines()
                .get(&id)
                .ok_or(Error::MedicineDoesNotExist(id))?
                .fields();
            if let Some(name) = name {
                fields.name = name;
            }
            if let Some(manufacturer) = manufacturer {
                fields.manufacturer = manufacturer;
            }
            if let Some(doses_left) = doses_left {
                fields.doses_left = doses_left;
            }
            if let Some(expires) = expires {
                fields.expiration_date = expires;
            }
            if !recipients.is_empty() {
                fields.recipients = recipients;
            }
            system.change_medicine(id, fields)?;
            save_medicines(&mut system, &medicines_path)?;
            println!("✓ Updated medicine {}", id);
            Ok(())
        }
        Commands::DelMedicine { id } => {
            system.del_medicine(id)?;
            save_medicines(&mut system, &medicines_path)?;
            println!("✓ Deleted medicine {}", id);
            Ok(())
        }
        Commands::TakeDose { id, user } => {
            system.take_dose(id, user)?;
            save_medicines(&mut system, &medicines_path)?;
            let medicine = &system.medicines()[&id];
            println!(
                "✓ Took one dose of {} ({} of {} left)",
                medicine.name(),
                medicine.doses_left(),
                medicine.doses()
            );
            Ok(())
        }
        Commands::SetNote { id, user, text } => {
            system.set_note(id, user, &text)?;
            save_medicines(&mut system, &medicines_path)?;
            println!("✓ Note saved");
            Ok(())
        }
        Commands::DelNote { id, user } => {
            system.del_note(id, user)?;
            save_medicines(&mut system, &medicines_path)?;
            println!("✓ Note deleted");
            Ok(())
        }
        Commands::Users => {
            cmd_users(&system);
            Ok(())
        }
        Commands::AddUser {
            name,
            birth_date,
            illnesses,
            allergies,
        } => {
            let profile = UserProfile {
                name,
                birth_date,
                illnesses,
                allergies,
            };
            let id = system.add_user(&profile)?;
            println!("✓ Added user {} ({})", id, system.users()[&id].name());
            Ok(())
        }
        Commands::EditUser {
            id,
            name,
            birth_date,
            allergies,
        } => {
            let mut profile = system
                .users()
                .get(&id)
                .ok_or(Error::UserDoesNotExist(id))?
                .profile();
            if let Some(name) = name {
                profile.name = name;
            }
            if let Some(birth_date) = birth_date {
                profile.birth_date = birth_date;
            }
            if !allergies.is_empty() {
                profile.allergies = allergies;
            }
            system.change_user(id, &profile)?;
            println!("✓ Updated user {}", id);
            Ok(())
        }
        Commands::AddPrescription {
            user,
            medicine,
            dosage,
            weekday,
        } => {
            let id = system.add_prescription(user, &medicine, dosage, weekday)?;
            println!("✓ Added prescription {}", id);
            Ok(())
        }
        Commands::DelPrescription { user, id } => {
            system.del_prescription(user, id)?;
            println!("✓ Removed prescription {}", id);
            Ok(())
        }
        Commands::Calendar { weekday } => cmd_calendar(&system, weekday),
    }
}

fn save_medicines(system: &mut System, path: &std::path::Path) -> Result<()> {
    if system.medicines_database_loaded() {
        system.save_medicines_database(None)
    } else {
        system.save_medicines_database(Some(path))
    }
}

fn cmd_medicines(system: &System, user: Option<UserId>) -> Result<()> {
    let user = match user {
        Some(id) => Some(
            system
                .users()
                .get(&id)
                .ok_or(Error::UserDoesNotExist(id))?,
        ),
        None => None,
    };
    let visible = |m: &&Medicine| user.map_or(true, |u| m.is_recipient(u.id()));

    let valid: Vec<&Medicine> = system.valid_medicines().into_iter().filter(visible).collect();
    let expired: Vec<&Medicine> = system.expired_medicines().into_iter().filter(visible).collect();

    if valid.is_empty() && expired.is_empty() {
        println!("No medicines.");
        return Ok(());
    }

    for medicine in valid {
        display_medicine(system, medicine, user);
    }
    if !expired.is_empty() {
        println!("── Expired ──────────────────────────────");
        for medicine in expired {
            display_medicine(system, medicine, user);
        }
    }
    Ok(())
}

fn display_medicine(system: &System, medicine: &Medicine, user: Option<&User>) {
    println!(
        "[{}] {} ({})",
        medicine.id(),
        medicine.name(),
        medicine.manufacturer()
    );
    println!("  For: {}", join(medicine.illnesses()));
    println!("  Contains: {}", join(medicine.substances()));
    println!(
        "  Doses: {}/{}  Age: {}+  Expires: {}",
        medicine.doses_left(),
        medicine.doses(),
        medicine.recommended_age(),
        medicine.expiration_date()
    );
    if let Some(user) = user {
        if !medicine.can_be_taken_by(user) {
            println!("  ⚠ Not suitable for {} right now", user.name());
        }
    }
    for (author, note) in medicine.notes() {
        let author = system
            .users()
            .get(author)
            .map(|u| u.name().to_string())
            .unwrap_or_else(|| format!("user {}", author));
        println!("  Note from {}: {}", author, note.replace('\n', " / "));
    }
    println!();
}

fn cmd_users(system: &System) {
    if system.users().is_empty() {
        println!("No users.");
        return;
    }
    for user in system.users().values() {
        println!("[{}] {} (age {})", user.id(), user.name(), user.age());
        if !user.illnesses().is_empty() {
            println!("  Illnesses: {}", join(user.illnesses()));
        }
        if !user.allergies().is_empty() {
            println!("  Allergies: {}", join(user.allergies()));
        }
        for p in user.prescriptions().values() {
            println!(
                "  Prescription {}: {} x{} on {}",
                p.id(),
                p.medicine_name(),
                p.dosage(),
                p.chrono_weekday()
            );
        }
    }
}

fn cmd_calendar(system: &System, weekday: Option<u8>) -> Result<()> {
    let days: Vec<u8> = match weekday {
        Some(day) if weekday_from_number(day).is_some() => vec![day],
        Some(_) => return Err(Error::InvalidWeekday),
        None => (1..=7).collect(),
    };

    for day in days {
        let Some(name) = weekday_from_number(day) else {
            continue;
        };
        println!("{}:", name);
        let entries = system.prescriptions_on(day);
        if entries.is_empty() {
            println!("  -");
        }
        for (user, p) in entries {
            println!("  {}: {} x{}", user.name(), p.medicine_name(), p.dosage());
        }
    }
    Ok(())
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
