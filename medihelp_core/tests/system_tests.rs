//! End-to-end tests for the `System` façade.
//!
//! These tests verify:
//! - Loading and saving of both data files
//! - Id allocation and dirty-state tracking
//! - Dose taking, notes and prescription management

use chrono::NaiveDate;
use medihelp_core::{Error, Medicine, MedicineFields, System, UserProfile};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const USERS: &str = r#"[
    {
        "id": 0,
        "name": "Dad",
        "birth_date": "1982-07-12",
        "illnesses": ["cold", "xyz"],
        "allergies": ["nicotine", "sugar"],
        "prescriptions": [
            {"id": 0, "medicine_name": "Med2", "dosage": 2, "weekday": 7},
            {"id": 1, "medicine_name": "Med1", "dosage": 1, "weekday": 2}
        ]
    },
    {
        "id": 1,
        "name": "Mom",
        "birth_date": "1985-08-04",
        "illnesses": ["illness2"],
        "allergies": [],
        "prescriptions": [
            {"id": 0, "medicine_name": "Med3", "dosage": 3, "weekday": 2}
        ]
    },
    {
        "id": 2,
        "name": "Child",
        "birth_date": "2018-01-02",
        "illnesses": ["diabetes"],
        "allergies": ["this", "that"],
        "prescriptions": []
    }
]"#;

const MEDICINES: &str = "id,name,manufacturer,illnesses,recipients,substances,recommended_age,doses,doses_left,expiration_date,notes
0,Ivermectin,Polfarm,\"[\"\"illness1\"\",\"\"illness2\"\"]\",\"[0,1,2]\",\"[\"\"caffeine\"\",\"\"nicotine\"\"]\",0,10,6,2099-12-31,\"{\"\"1\"\":\"\"Hello World1\"\"}\"
1,Paracetamol,Usdrugs,{'cold'},{0},\"{'weed', 'stuff'}\",12,5,5,2099-01-03,{}
";

fn setup() -> (TempDir, System) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    medihelp_core::logging::init_test();
    let users_path = temp_dir.path().join("users.json");
    fs::write(&users_path, USERS).unwrap();
    let mut system = System::new(&users_path);
    system.load_users_data().unwrap();
    (temp_dir, system)
}

fn write_medicines(dir: &Path) -> PathBuf {
    let path = dir.join("medicines.csv");
    fs::write(&path, MEDICINES).unwrap();
    path
}

fn ids(list: Vec<&Medicine>) -> Vec<u32> {
    list.iter().map(|m| m.id()).collect()
}

fn aspirin() -> MedicineFields {
    MedicineFields {
        name: "aspirin".into(),
        manufacturer: "bayer".into(),
        illnesses: vec!["Headache".into()],
        substances: vec!["acetylsalicylic acid".into()],
        recommended_age: 0,
        doses: 20,
        doses_left: 20,
        expiration_date: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
        recipients: vec![0, 1],
    }
}

#[test]
fn test_new_system_state() {
    let system = System::new("users.json");
    assert!(system.medicines().is_empty());
    assert!(system.users().is_empty());
    assert_eq!(system.medicines_file_path(), None);
    assert!(system.medicines_file_saved());
    assert!(!system.medicines_database_loaded());
}

#[test]
fn test_load_users_data() {
    let (_dir, system) = setup();
    assert_eq!(system.users().len(), 3);
    let dad = &system.users()[&0];
    assert_eq!(dad.name(), "Dad");
    assert_eq!(dad.prescriptions().len(), 2);
    assert_eq!(dad.prescriptions()[&0].medicine_name(), "Med2");
}

#[test]
fn test_load_users_data_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("users.json");
    fs::write(&path, "Malformed data").unwrap();

    let mut system = System::new(&path);
    match system.load_users_data() {
        Err(Error::DataLoading(source)) => {
            assert!(matches!(*source, Error::MalformedData { index: 0, .. }))
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_load_users_data_missing_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut system = System::new(temp_dir.path().join("missing.json"));
    assert!(matches!(system.load_users_data(), Err(Error::DataLoading(_))));
}

#[test]
fn test_load_medicines_database() {
    let (dir, mut system) = setup();
    let path = write_medicines(dir.path());

    system.load_medicines_database_from(&path).unwrap();
    assert!(system.medicines_database_loaded());
    assert_eq!(system.medicines_file_path(), Some(path.as_path()));
    assert!(system.medicines_file_saved());
    assert_eq!(system.medicines().len(), 2);
    assert_eq!(system.medicines()[&0].note(1), Some("Hello World1"));
}

#[test]
fn test_failed_medicines_load_leaves_database_empty() {
    let (dir, mut system) = setup();
    let good = write_medicines(dir.path());
    system.load_medicines_database_from(&good).unwrap();

    let bad = dir.path().join("bad.csv");
    fs::write(&bad, "Malformed data\nMalformed data").unwrap();
    assert!(matches!(
        system.load_medicines_database_from(&bad),
        Err(Error::DataLoading(_))
    ));
    assert!(system.medicines().is_empty());
    assert_eq!(system.medicines_file_path(), Some(good.as_path()));
}

#[test]
fn test_empty_name_cell_is_row_two() {
    let (dir, mut system) = setup();
    let path = dir.path().join("medicines.csv");
    fs::write(
        &path,
        "id,name,manufacturer,illnesses,recipients,substances,recommended_age,doses,doses_left,expiration_date,notes
0,,Polfarm,{'cold'},{0},{'nicotine'},0,10,6,2099-12-31,{}
",
    )
    .unwrap();

    match system.load_medicines_database_from(&path) {
        Err(Error::DataLoading(source)) => match *source {
            Error::MalformedData { index, path: reported, .. } => {
                assert_eq!(index, 2);
                assert_eq!(reported, path);
            }
            other => panic!("unexpected source: {:?}", other),
        },
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_save_without_file_fails() {
    let (_dir, mut system) = setup();
    assert!(matches!(
        system.save_medicines_database(None),
        Err(Error::NoFileOpened)
    ));
}

#[test]
fn test_save_adopts_path_when_nothing_open() {
    let (dir, mut system) = setup();
    let path = dir.path().join("new.csv");
    system.add_medicine(aspirin()).unwrap();
    assert!(!system.medicines_file_saved());

    system.save_medicines_database(Some(path.as_path())).unwrap();
    assert!(system.medicines_file_saved());
    assert_eq!(system.medicines_file_path(), Some(path.as_path()));

    // Saving elsewhere afterwards keeps the opened file
    let copy = dir.path().join("copy.csv");
    system.save_medicines_database(Some(copy.as_path())).unwrap();
    assert_eq!(system.medicines_file_path(), Some(path.as_path()));
    assert_eq!(fs::read(&path).unwrap(), fs::read(&copy).unwrap());
}

#[test]
fn test_failed_medicines_save_keeps_state() {
    let (dir, mut system) = setup();
    let path = write_medicines(dir.path());
    system.load_medicines_database_from(&path).unwrap();
    system.add_medicine(aspirin()).unwrap();

    // A directory cannot be replaced by the rewritten file
    let target = dir.path().join("taken");
    fs::create_dir(&target).unwrap();
    assert!(matches!(
        system.save_medicines_database(Some(target.as_path())),
        Err(Error::DataSaving(_))
    ));
    assert!(!system.medicines_file_saved());
    assert_eq!(system.medicines_file_path(), Some(path.as_path()));
    assert!(target.is_dir());
}

#[test]
fn test_failed_first_save_does_not_adopt_path() {
    let (dir, mut system) = setup();
    system.add_medicine(aspirin()).unwrap();

    assert!(matches!(
        system.save_medicines_database(Some(dir.path())),
        Err(Error::DataSaving(_))
    ));
    assert!(!system.medicines_file_saved());
    assert_eq!(system.medicines_file_path(), None);
    assert!(!system.medicines_database_loaded());
}

#[test]
fn test_failed_users_save() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut system = System::new(temp_dir.path());
    assert!(matches!(system.save_users_data(), Err(Error::DataSaving(_))));

    let profile = UserProfile {
        name: "grandma".into(),
        birth_date: NaiveDate::from_ymd_opt(1950, 3, 1).unwrap(),
        illnesses: vec![],
        allergies: vec![],
    };
    assert!(matches!(system.add_user(&profile), Err(Error::DataSaving(_))));
    assert!(temp_dir.path().is_dir());
}

#[test]
fn test_save_and_reload_roundtrip() {
    let (dir, mut system) = setup();
    let path = write_medicines(dir.path());
    system.load_medicines_database_from(&path).unwrap();
    system.set_note(1, 2, "Keep away\nfrom kids").unwrap();
    let before = system.medicines().clone();

    system.save_medicines_database(None).unwrap();
    system.load_medicines_database_from(&path).unwrap();
    assert_eq!(system.medicines(), &before);
}

#[test]
fn test_add_medicine_uses_lowest_free_id() {
    let (_dir, mut system) = setup();
    assert_eq!(system.add_medicine(aspirin()).unwrap(), 0);
    assert_eq!(system.add_medicine(aspirin()).unwrap(), 1);

    system.del_medicine(0).unwrap();
    assert_eq!(system.add_medicine(aspirin()).unwrap(), 0);
    assert_eq!(system.add_medicine(aspirin()).unwrap(), 2);
}

#[test]
fn test_add_invalid_medicine_inserts_nothing() {
    let (_dir, mut system) = setup();
    let mut fields = aspirin();
    fields.doses_left = 21;
    assert!(matches!(
        system.add_medicine(fields),
        Err(Error::TooManyDosesLeft)
    ));
    assert!(system.medicines().is_empty());
    assert!(system.medicines_file_saved());
}

#[test]
fn test_change_medicine_keeps_notes() {
    let (_dir, mut system) = setup();
    let id = system.add_medicine(aspirin()).unwrap();
    system.set_note(id, 1, "Only after meals").unwrap();

    let mut fields = aspirin();
    fields.name = "aspirin forte".into();
    fields.doses_left = 3;
    system.change_medicine(id, fields).unwrap();

    let medicine = &system.medicines()[&id];
    assert_eq!(medicine.name(), "Aspirin Forte");
    assert_eq!(medicine.doses_left(), 3);
    assert_eq!(medicine.note(1), Some("Only after meals"));

    assert!(matches!(
        system.change_medicine(9, aspirin()),
        Err(Error::MedicineDoesNotExist(9))
    ));
}

#[test]
fn test_del_missing_medicine() {
    let (_dir, mut system) = setup();
    assert!(matches!(
        system.del_medicine(3),
        Err(Error::MedicineDoesNotExist(3))
    ));
}

#[test]
fn test_take_dose() {
    let (dir, mut system) = setup();
    let path = write_medicines(dir.path());
    system.load_medicines_database_from(&path).unwrap();

    // Mom is 12+ and has no allergies
    system.take_dose(1, 1).unwrap();
    assert_eq!(system.medicines()[&1].doses_left(), 4);
    assert!(!system.medicines_file_saved());
}

#[test]
fn test_take_dose_refusals() {
    let (dir, mut system) = setup();
    let path = write_medicines(dir.path());
    system.load_medicines_database_from(&path).unwrap();

    // Dad is allergic to nicotine
    match system.take_dose(0, 0) {
        Err(Error::AllergyWarning(list)) => assert_eq!(list, "nicotine"),
        other => panic!("unexpected result: {:?}", other),
    }
    // Child is too young for paracetamol
    let err = system.take_dose(1, 2).unwrap_err();
    assert!(matches!(err, Error::AgeWarning { recommended: 12, .. }));
    assert!(err.is_warning());

    assert!(matches!(system.take_dose(7, 0), Err(Error::MedicineDoesNotExist(7))));
    assert!(matches!(system.take_dose(0, 7), Err(Error::UserDoesNotExist(7))));
    assert!(system.medicines_file_saved());
}

#[test]
fn test_notes_through_system() {
    let (_dir, mut system) = setup();
    let id = system.add_medicine(aspirin()).unwrap();

    assert!(matches!(
        system.set_note(id, 9, "hello"),
        Err(Error::UserDoesNotExist(9))
    ));
    assert!(matches!(
        system.set_note(5, 9, "hello"),
        Err(Error::UserDoesNotExist(9))
    ));
    assert!(matches!(
        system.set_note(5, 0, "hello"),
        Err(Error::MedicineDoesNotExist(5))
    ));
    assert!(matches!(system.set_note(id, 0, ""), Err(Error::EmptyNote)));

    system.set_note(id, 0, "hello").unwrap();
    assert_eq!(system.medicines()[&id].note(0), Some("hello"));
    system.del_note(id, 0).unwrap();
    system.del_note(id, 0).unwrap();
    assert_eq!(system.medicines()[&id].note(0), None);
}

#[test]
fn test_medicine_views() {
    let (_dir, mut system) = setup();
    let valid = system.add_medicine(aspirin()).unwrap();
    let mut fields = aspirin();
    fields.expiration_date = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
    fields.recipients = vec![2];
    let expired = system.add_medicine(fields).unwrap();

    assert_eq!(ids(system.valid_medicines()), vec![valid]);
    assert_eq!(ids(system.expired_medicines()), vec![expired]);
    assert_eq!(ids(system.medicines_for(2)), vec![expired]);
    assert_eq!(ids(system.medicines_for(0)), vec![valid]);
}

#[test]
fn test_prescriptions_are_persisted() {
    let (_dir, mut system) = setup();

    let id = system.add_prescription(1, "vitamin d", 1, 3).unwrap();
    assert_eq!(id, 1);
    system.change_prescription(1, 0, "Med3", 2, 5).unwrap();
    system.del_prescription(0, 1).unwrap();

    let mut reloaded = System::new(system.users_file_path());
    reloaded.load_users_data().unwrap();
    let mom = &reloaded.users()[&1];
    assert_eq!(mom.prescriptions()[&1].medicine_name(), "Vitamin D");
    assert_eq!(mom.prescriptions()[&0].dosage(), 2);
    assert_eq!(mom.prescriptions()[&0].weekday(), 5);
    assert_eq!(reloaded.users()[&0].prescriptions().len(), 1);
}

#[test]
fn test_prescription_errors_leave_user_unchanged() {
    let (_dir, mut system) = setup();
    assert!(matches!(
        system.add_prescription(9, "med", 1, 1),
        Err(Error::UserDoesNotExist(9))
    ));
    assert!(matches!(
        system.change_prescription(1, 0, "med", 1, 8),
        Err(Error::InvalidWeekday)
    ));
    assert_eq!(system.users()[&1].prescriptions()[&0].medicine_name(), "Med3");
    assert!(matches!(
        system.change_prescription(1, 4, "med", 1, 1),
        Err(Error::NoSuchIdInUserPrescriptions(4))
    ));
    assert!(matches!(
        system.del_prescription(1, 4),
        Err(Error::NoSuchIdInUserPrescriptions(4))
    ));
}

#[test]
fn test_prescriptions_on_weekday() {
    let (_dir, system) = setup();
    let tuesday: Vec<(String, String)> = system
        .prescriptions_on(2)
        .into_iter()
        .map(|(user, p)| (user.name().to_string(), p.medicine_name().to_string()))
        .collect();
    assert_eq!(
        tuesday,
        vec![
            ("Dad".to_string(), "Med1".to_string()),
            ("Mom".to_string(), "Med3".to_string())
        ]
    );
    assert!(system.prescriptions_on(1).is_empty());
}

#[test]
fn test_change_user_keeps_prescriptions() {
    let (_dir, mut system) = setup();
    let profile = UserProfile {
        name: "father".into(),
        birth_date: NaiveDate::from_ymd_opt(1982, 7, 12).unwrap(),
        illnesses: vec![],
        allergies: vec!["Pollen".into()],
    };
    system.change_user(0, &profile).unwrap();

    let mut reloaded = System::new(system.users_file_path());
    reloaded.load_users_data().unwrap();
    let dad = &reloaded.users()[&0];
    assert_eq!(dad.name(), "Father");
    assert!(dad.illnesses().is_empty());
    assert!(dad.allergies().contains("pollen"));
    assert_eq!(dad.prescriptions().len(), 2);

    assert!(matches!(
        system.change_user(9, &profile),
        Err(Error::UserDoesNotExist(9))
    ));
}

#[test]
fn test_add_user() {
    let (_dir, mut system) = setup();
    let profile = UserProfile {
        name: "grandma".into(),
        birth_date: NaiveDate::from_ymd_opt(1950, 3, 1).unwrap(),
        illnesses: vec!["Arthritis".into()],
        allergies: vec![],
    };
    assert_eq!(system.add_user(&profile).unwrap(), 3);
    assert_eq!(system.users()[&3].name(), "Grandma");

    let mut reloaded = System::new(system.users_file_path());
    reloaded.load_users_data().unwrap();
    assert_eq!(reloaded.users().len(), 4);
}
