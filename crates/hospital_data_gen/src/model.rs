//! Hospital entity types and their table mappings.
//!
//! Each entity implements [`Record`], which names its table, its column list
//! and how one instance becomes a row of [`SqlValue`]s.

use crate::value::{Row, SqlValue, TableData};
use chrono::{NaiveDate, NaiveDateTime};

/// A generated entity that maps onto one SQL table
pub trait Record {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Rows per INSERT statement when no override is given
    const BATCH_SIZE: usize;

    fn id(&self) -> i64;
    fn to_row(&self) -> Row;
}

/// Collect a slice of records into a renderable table
pub fn table_data<T: Record>(records: &[T]) -> TableData {
    TableData {
        table_name: T::TABLE,
        columns: T::COLUMNS,
        rows: records.iter().map(Record::to_row).collect(),
        batch_size: T::BATCH_SIZE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterType {
    Outpatient,
    Inpatient,
    Er,
}

impl EncounterType {
    pub const ALL: [EncounterType; 3] = [
        EncounterType::Outpatient,
        EncounterType::Inpatient,
        EncounterType::Er,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EncounterType::Outpatient => "Outpatient",
            EncounterType::Inpatient => "Inpatient",
            EncounterType::Er => "ER",
        }
    }

    /// Inclusive bounds on encounter length in whole hours
    pub fn duration_hours(&self) -> (i64, i64) {
        match self {
            EncounterType::Inpatient => (1, 72),
            EncounterType::Outpatient | EncounterType::Er => (1, 4),
        }
    }
}

impl std::fmt::Display for EncounterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStatus {
    Paid,
    Pending,
    Denied,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 3] = [ClaimStatus::Paid, ClaimStatus::Pending, ClaimStatus::Denied];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Paid => "Paid",
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Denied => "Denied",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Specialty {
    pub id: i64,
    pub name: String,
    pub code: String,
}

impl Record for Specialty {
    const TABLE: &'static str = "specialties";
    const COLUMNS: &'static [&'static str] = &["specialty_id", "specialty_name", "specialty_code"];
    const BATCH_SIZE: usize = 100;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Row {
        vec![
            self.id.into(),
            self.name.as_str().into(),
            self.code.as_str().into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub floor: i64,
    pub capacity: i64,
}

impl Record for Department {
    const TABLE: &'static str = "departments";
    const COLUMNS: &'static [&'static str] =
        &["department_id", "department_name", "floor", "capacity"];
    const BATCH_SIZE: usize = 100;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Row {
        vec![
            self.id.into(),
            self.name.as_str().into(),
            self.floor.into(),
            self.capacity.into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub credential: String,
    pub specialty_id: i64,
    pub department_id: i64,
}

impl Record for Provider {
    const TABLE: &'static str = "providers";
    const COLUMNS: &'static [&'static str] = &[
        "provider_id",
        "first_name",
        "last_name",
        "credential",
        "specialty_id",
        "department_id",
    ];
    const BATCH_SIZE: usize = 100;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Row {
        vec![
            self.id.into(),
            self.first_name.as_str().into(),
            self.last_name.as_str().into(),
            self.credential.as_str().into(),
            self.specialty_id.into(),
            self.department_id.into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub mrn: String,
}

impl Record for Patient {
    const TABLE: &'static str = "patients";
    const COLUMNS: &'static [&'static str] = &[
        "patient_id",
        "first_name",
        "last_name",
        "date_of_birth",
        "gender",
        "mrn",
    ];
    const BATCH_SIZE: usize = 500;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Row {
        vec![
            self.id.into(),
            self.first_name.as_str().into(),
            self.last_name.as_str().into(),
            self.date_of_birth.into(),
            self.gender.as_str().into(),
            self.mrn.as_str().into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub id: i64,
    pub code: String,
    pub description: String,
}

impl Record for Diagnosis {
    const TABLE: &'static str = "diagnoses";
    const COLUMNS: &'static [&'static str] = &["diagnosis_id", "icd10_code", "icd10_description"];
    const BATCH_SIZE: usize = 100;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Row {
        vec![
            self.id.into(),
            self.code.as_str().into(),
            self.description.as_str().into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    pub id: i64,
    pub code: String,
    pub description: String,
}

impl Record for Procedure {
    const TABLE: &'static str = "procedures";
    const COLUMNS: &'static [&'static str] = &["procedure_id", "cpt_code", "cpt_description"];
    const BATCH_SIZE: usize = 100;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Row {
        vec![
            self.id.into(),
            self.code.as_str().into(),
            self.description.as_str().into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Encounter {
    pub id: i64,
    pub patient_id: i64,
    pub provider_id: i64,
    pub encounter_type: EncounterType,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// Always the assigned provider's department
    pub department_id: i64,
}

impl Encounter {
    pub fn duration_hours(&self) -> i64 {
        (self.end_time - self.start_time).num_hours()
    }
}

impl Record for Encounter {
    const TABLE: &'static str = "encounters";
    const COLUMNS: &'static [&'static str] = &[
        "encounter_id",
        "patient_id",
        "provider_id",
        "encounter_type",
        "encounter_date",
        "discharge_date",
        "department_id",
    ];
    const BATCH_SIZE: usize = 500;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Row {
        vec![
            self.id.into(),
            self.patient_id.into(),
            self.provider_id.into(),
            self.encounter_type.as_str().into(),
            self.start_time.into(),
            self.end_time.into(),
            self.department_id.into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncounterDiagnosis {
    pub id: i64,
    pub encounter_id: i64,
    pub diagnosis_id: i64,
    /// 1-based, contiguous per encounter
    pub sequence: i64,
}

impl Record for EncounterDiagnosis {
    const TABLE: &'static str = "encounter_diagnoses";
    const COLUMNS: &'static [&'static str] = &[
        "encounter_diagnosis_id",
        "encounter_id",
        "diagnosis_id",
        "diagnosis_sequence",
    ];
    const BATCH_SIZE: usize = 1000;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Row {
        vec![
            self.id.into(),
            self.encounter_id.into(),
            self.diagnosis_id.into(),
            self.sequence.into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncounterProcedure {
    pub id: i64,
    pub encounter_id: i64,
    pub procedure_id: i64,
    pub date: NaiveDate,
}

impl Record for EncounterProcedure {
    const TABLE: &'static str = "encounter_procedures";
    const COLUMNS: &'static [&'static str] = &[
        "encounter_procedure_id",
        "encounter_id",
        "procedure_id",
        "procedure_date",
    ];
    const BATCH_SIZE: usize = 1000;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Row {
        vec![
            self.id.into(),
            self.encounter_id.into(),
            self.procedure_id.into(),
            self.date.into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Billing {
    pub id: i64,
    pub encounter_id: i64,
    pub claim_cents: i64,
    pub allowed_cents: i64,
    pub claim_date: NaiveDate,
    pub status: ClaimStatus,
}

impl Record for Billing {
    const TABLE: &'static str = "billing";
    const COLUMNS: &'static [&'static str] = &[
        "billing_id",
        "encounter_id",
        "claim_amount",
        "allowed_amount",
        "claim_date",
        "claim_status",
    ];
    const BATCH_SIZE: usize = 500;

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Row {
        vec![
            self.id.into(),
            self.encounter_id.into(),
            SqlValue::Cents(self.claim_cents),
            SqlValue::Cents(self.allowed_cents),
            self.claim_date.into(),
            self.status.as_str().into(),
        ]
    }
}

/// Everything produced by one generation run, already FK-resolved
#[derive(Debug, Clone, Default)]
pub struct DatasetBundle {
    /// Seed the generator actually used (drawn from entropy when none was given)
    pub seed: u64,
    pub specialties: Vec<Specialty>,
    pub departments: Vec<Department>,
    pub providers: Vec<Provider>,
    pub patients: Vec<Patient>,
    pub diagnoses: Vec<Diagnosis>,
    pub procedures: Vec<Procedure>,
    pub encounters: Vec<Encounter>,
    pub encounter_diagnoses: Vec<EncounterDiagnosis>,
    pub encounter_procedures: Vec<EncounterProcedure>,
    pub billing: Vec<Billing>,
}

impl DatasetBundle {
    /// All tables in foreign-key order (parents first)
    pub fn tables(&self) -> Vec<TableData> {
        vec![
            table_data(&self.specialties),
            table_data(&self.departments),
            table_data(&self.providers),
            table_data(&self.patients),
            table_data(&self.diagnoses),
            table_data(&self.procedures),
            table_data(&self.encounters),
            table_data(&self.encounter_diagnoses),
            table_data(&self.encounter_procedures),
            table_data(&self.billing),
        ]
    }

    pub fn total_rows(&self) -> usize {
        self.specialties.len()
            + self.departments.len()
            + self.providers.len()
            + self.patients.len()
            + self.diagnoses.len()
            + self.procedures.len()
            + self.encounters.len()
            + self.encounter_diagnoses.len()
            + self.encounter_procedures.len()
            + self.billing.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_width_matches_columns() {
        let b = Billing {
            id: 1,
            encounter_id: 2,
            claim_cents: 10_050,
            allowed_cents: 7_000,
            claim_date: NaiveDate::from_ymd_opt(2021, 1, 2).unwrap(),
            status: ClaimStatus::Pending,
        };
        let row = b.to_row();
        assert_eq!(row.len(), Billing::COLUMNS.len());
        assert_eq!(row[2].to_sql_literal(), "100.50");
        assert_eq!(row[5].to_sql_literal(), "'Pending'");
    }

    #[test]
    fn test_encounter_type_bounds() {
        assert_eq!(EncounterType::Inpatient.duration_hours(), (1, 72));
        assert_eq!(EncounterType::Er.duration_hours(), (1, 4));
        assert_eq!(EncounterType::Er.as_str(), "ER");
    }

    #[test]
    fn test_empty_bundle_tables_are_in_fk_order() {
        let bundle = DatasetBundle::default();
        let names: Vec<&str> = bundle.tables().iter().map(|t| t.table_name).collect();
        assert_eq!(names.first(), Some(&"specialties"));
        assert_eq!(names.last(), Some(&"billing"));
        assert!(bundle.tables().iter().all(|t| t.is_empty()));
    }
}
