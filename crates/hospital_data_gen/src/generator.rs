//! Data generator that produces the hospital dataset.
//!
//! Generates FK-consistent data: reference tables first, then encounters with
//! their diagnosis/procedure fan-out and exactly one billing row each. With a
//! fixed seed the output is fully deterministic.

use crate::fake::{FakeData, MRN_SPACE};
use crate::model::{
    Billing, ClaimStatus, DatasetBundle, Department, Diagnosis, Encounter, EncounterDiagnosis,
    EncounterProcedure, EncounterType, Gender, Patient, Procedure, Provider, Record, Specialty,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::ops::{Range, RangeInclusive};

/// Diagnoses attached to each encounter (inclusive)
pub const DIAGNOSES_PER_ENCOUNTER: (i64, i64) = (1, 5);
/// Procedures attached to each encounter (inclusive)
pub const PROCEDURES_PER_ENCOUNTER: (i64, i64) = (0, 3);
/// Claim date lag after discharge, in days (inclusive)
pub const CLAIM_LAG_DAYS: (i64, i64) = (1, 30);
/// Allowed amount as a fraction of the claim amount
pub const ALLOWED_FRACTION: Range<f64> = 0.5..0.9;

/// Id blocks start on the first `ID_BLOCK_ALIGN * k + 1` after the previous block
const ID_BLOCK_ALIGN: i64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// A reference table with no rows would make FK sampling impossible
    #[error("reference table '{0}' must have at least one row")]
    EmptyReferenceTable(&'static str),

    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),
}

/// Generation settings
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Fixed seed for reproducible output; `None` draws one from OS entropy
    pub seed: Option<u64>,
    pub specialties: usize,
    pub departments: usize,
    pub providers: usize,
    pub patients: usize,
    pub diagnoses: usize,
    pub procedures: usize,
    pub encounters: usize,
    pub encounter_window_start: NaiveDateTime,
    pub encounter_window_days: i64,
    pub birth_years: RangeInclusive<i32>,
    /// Claim amount bounds in cents
    pub claim_cents: RangeInclusive<i64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            specialties: 10,
            departments: 20,
            providers: 100,
            patients: 2000,
            diagnoses: 50,
            procedures: 50,
            encounters: 10_000,
            encounter_window_start: NaiveDate::from_ymd_opt(2020, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or(NaiveDateTime::MIN),
            encounter_window_days: 1825,
            birth_years: 1920..=2020,
            claim_cents: 10_000..=2_000_000,
        }
    }
}

impl GeneratorConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_encounters(mut self, encounters: usize) -> Self {
        self.encounters = encounters;
        self
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        let reference_counts = [
            (Specialty::TABLE, self.specialties),
            (Department::TABLE, self.departments),
            (Provider::TABLE, self.providers),
            (Patient::TABLE, self.patients),
            (Diagnosis::TABLE, self.diagnoses),
            (Procedure::TABLE, self.procedures),
        ];
        if let Some((table, _)) = reference_counts.iter().find(|(_, count)| *count == 0) {
            return Err(GenerateError::EmptyReferenceTable(table));
        }

        if self.patients as u64 > MRN_SPACE / 2 {
            return Err(GenerateError::InvalidConfig(format!(
                "{} patients exceeds the unique MRN capacity",
                self.patients
            )));
        }
        if self.encounter_window_days <= 0 {
            return Err(GenerateError::InvalidConfig(
                "encounter window must span at least one day".to_string(),
            ));
        }
        if self.latest_generated_instant().is_none() {
            return Err(GenerateError::InvalidConfig(format!(
                "encounter window of {} days from {} is outside the representable date range",
                self.encounter_window_days, self.encounter_window_start
            )));
        }
        if self.birth_years.is_empty() {
            return Err(GenerateError::InvalidConfig(format!(
                "empty birth year range {:?}",
                self.birth_years
            )));
        }
        if self.claim_cents.is_empty() || *self.claim_cents.start() < 0 {
            return Err(GenerateError::InvalidConfig(format!(
                "claim amount range {:?} must be non-empty and non-negative",
                self.claim_cents
            )));
        }
        Ok(())
    }

    /// Upper bound on any timestamp or date derived from the encounter window
    fn latest_generated_instant(&self) -> Option<NaiveDateTime> {
        let max_hours = EncounterType::ALL
            .iter()
            .map(|t| t.duration_hours().1)
            .max()
            .unwrap_or(0);
        let span = self
            .encounter_window_days
            .checked_add(CLAIM_LAG_DAYS.1)
            .and_then(Duration::try_days)?
            .checked_add(&Duration::minutes(24 * 60 - 1))?
            .checked_add(&Duration::hours(max_hours))?;
        self.encounter_window_start.checked_add_signed(span)
    }
}

/// A contiguous block of ids reserved for one table
#[derive(Debug, Clone)]
pub struct IdBlock {
    range: Range<i64>,
    next: i64,
}

impl IdBlock {
    fn next_id(&mut self) -> i64 {
        let id = self.next;
        debug_assert!(self.range.contains(&id), "id block exhausted");
        self.next += 1;
        id
    }

    pub fn range(&self) -> &Range<i64> {
        &self.range
    }
}

/// Lays out disjoint id blocks, one per table, in reservation order
#[derive(Debug)]
pub struct IdSpace {
    cursor: i64,
}

impl Default for IdSpace {
    fn default() -> Self {
        Self { cursor: 1 }
    }
}

impl IdSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, capacity: usize) -> IdBlock {
        let start = self.cursor;
        let end = start.saturating_add(capacity as i64);
        self.cursor = ((end - 1) / ID_BLOCK_ALIGN + 1) * ID_BLOCK_ALIGN + 1;
        IdBlock {
            range: start..end,
            next: start,
        }
    }
}

/// Main data generator
pub struct Generator {
    config: GeneratorConfig,
    seed: u64,
    fake: FakeData<ChaCha8Rng>,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerateError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        Ok(Self {
            config,
            seed,
            fake: FakeData::new(ChaCha8Rng::seed_from_u64(seed)),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate the complete dataset
    pub fn generate(&mut self) -> DatasetBundle {
        let mut ids = IdSpace::new();
        let n = self.config.encounters;

        let mut specialty_ids = ids.reserve(self.config.specialties);
        let mut department_ids = ids.reserve(self.config.departments);
        let mut provider_ids = ids.reserve(self.config.providers);
        let mut patient_ids = ids.reserve(self.config.patients);
        let mut diagnosis_ids = ids.reserve(self.config.diagnoses);
        let mut procedure_ids = ids.reserve(self.config.procedures);
        let mut encounter_ids = ids.reserve(n);
        let mut enc_diag_ids = ids.reserve(n.saturating_mul(DIAGNOSES_PER_ENCOUNTER.1 as usize));
        let mut enc_proc_ids = ids.reserve(n.saturating_mul(PROCEDURES_PER_ENCOUNTER.1 as usize));
        let mut billing_ids = ids.reserve(n);

        let specialties = self.generate_specialties(&mut specialty_ids);
        let departments = self.generate_departments(&mut department_ids);
        let providers = self.generate_providers(&mut provider_ids, &specialties, &departments);
        let patients = self.generate_patients(&mut patient_ids);
        let diagnoses = self.generate_diagnoses(&mut diagnosis_ids);
        let procedures = self.generate_procedures(&mut procedure_ids);

        let mut bundle = DatasetBundle {
            seed: self.seed,
            specialties,
            departments,
            providers,
            patients,
            diagnoses,
            procedures,
            ..Default::default()
        };

        bundle.encounters.reserve(n);
        bundle.billing.reserve(n);
        for _ in 0..n {
            let encounter = self.generate_encounter(&mut encounter_ids, &bundle);

            let diag_count = self
                .fake
                .int_range(DIAGNOSES_PER_ENCOUNTER.0, DIAGNOSES_PER_ENCOUNTER.1);
            for sequence in 1..=diag_count {
                let diagnosis_id = self.fake.pick(&bundle.diagnoses).id;
                bundle.encounter_diagnoses.push(EncounterDiagnosis {
                    id: enc_diag_ids.next_id(),
                    encounter_id: encounter.id,
                    diagnosis_id,
                    sequence,
                });
            }

            let proc_count = self
                .fake
                .int_range(PROCEDURES_PER_ENCOUNTER.0, PROCEDURES_PER_ENCOUNTER.1);
            for _ in 0..proc_count {
                let procedure_id = self.fake.pick(&bundle.procedures).id;
                let date = self
                    .fake
                    .instant_between(encounter.start_time, encounter.end_time)
                    .date();
                bundle.encounter_procedures.push(EncounterProcedure {
                    id: enc_proc_ids.next_id(),
                    encounter_id: encounter.id,
                    procedure_id,
                    date,
                });
            }

            bundle
                .billing
                .push(self.generate_billing(&mut billing_ids, &encounter));
            bundle.encounters.push(encounter);
        }

        bundle
    }

    fn generate_specialties(&mut self, ids: &mut IdBlock) -> Vec<Specialty> {
        (0..self.config.specialties)
            .map(|i| Specialty {
                id: ids.next_id(),
                name: format!("Specialty_{}", i + 1),
                code: self.fake.upper_code(4),
            })
            .collect()
    }

    fn generate_departments(&mut self, ids: &mut IdBlock) -> Vec<Department> {
        (0..self.config.departments)
            .map(|i| Department {
                id: ids.next_id(),
                name: format!("Department_{}", i + 1),
                floor: self.fake.int_range(1, 10),
                capacity: self.fake.int_range(10, 50),
            })
            .collect()
    }

    fn generate_providers(
        &mut self,
        ids: &mut IdBlock,
        specialties: &[Specialty],
        departments: &[Department],
    ) -> Vec<Provider> {
        (0..self.config.providers)
            .map(|_| Provider {
                id: ids.next_id(),
                first_name: self.fake.first_name().to_string(),
                last_name: self.fake.last_name().to_string(),
                credential: self.fake.credential().to_string(),
                specialty_id: self.fake.pick(specialties).id,
                department_id: self.fake.pick(departments).id,
            })
            .collect()
    }

    fn generate_patients(&mut self, ids: &mut IdBlock) -> Vec<Patient> {
        let mut seen_mrns = HashSet::with_capacity(self.config.patients);
        let (year_start, year_end) = (*self.config.birth_years.start(), *self.config.birth_years.end());

        (0..self.config.patients)
            .map(|_| {
                let mut mrn = self.fake.mrn();
                while !seen_mrns.insert(mrn.clone()) {
                    mrn = self.fake.mrn();
                }
                Patient {
                    id: ids.next_id(),
                    first_name: self.fake.first_name().to_string(),
                    last_name: self.fake.last_name().to_string(),
                    date_of_birth: self.fake.date_in_years(year_start, year_end),
                    gender: *self.fake.pick(&Gender::ALL),
                    mrn,
                }
            })
            .collect()
    }

    fn generate_diagnoses(&mut self, ids: &mut IdBlock) -> Vec<Diagnosis> {
        (0..self.config.diagnoses)
            .map(|i| Diagnosis {
                id: ids.next_id(),
                code: self.fake.icd10_code(),
                description: format!("{} ({})", self.fake.condition(), i + 1),
            })
            .collect()
    }

    fn generate_procedures(&mut self, ids: &mut IdBlock) -> Vec<Procedure> {
        (0..self.config.procedures)
            .map(|i| Procedure {
                id: ids.next_id(),
                code: self.fake.cpt_code(),
                description: format!("{} ({})", self.fake.procedure_name(), i + 1),
            })
            .collect()
    }

    fn generate_encounter(&mut self, ids: &mut IdBlock, bundle: &DatasetBundle) -> Encounter {
        let patient_id = self.fake.pick(&bundle.patients).id;
        let provider = self.fake.pick(&bundle.providers);
        let encounter_type = *self.fake.pick(&EncounterType::ALL);

        let day_offset = self.fake.int_range(0, self.config.encounter_window_days);
        let minute_of_day = self.fake.int_range(0, 24 * 60 - 1);
        let start_time = self.config.encounter_window_start
            + Duration::days(day_offset)
            + Duration::minutes(minute_of_day);

        let (min_hours, max_hours) = encounter_type.duration_hours();
        let end_time = start_time + Duration::hours(self.fake.int_range(min_hours, max_hours));

        Encounter {
            id: ids.next_id(),
            patient_id,
            provider_id: provider.id,
            encounter_type,
            start_time,
            end_time,
            department_id: provider.department_id,
        }
    }

    fn generate_billing(&mut self, ids: &mut IdBlock, encounter: &Encounter) -> Billing {
        let claim_cents = self.fake.int_range(
            *self.config.claim_cents.start(),
            *self.config.claim_cents.end(),
        );
        let fraction = self
            .fake
            .fraction(ALLOWED_FRACTION.start, ALLOWED_FRACTION.end);
        let allowed_cents = ((claim_cents as f64) * fraction).round() as i64;
        let lag = self.fake.int_range(CLAIM_LAG_DAYS.0, CLAIM_LAG_DAYS.1);

        Billing {
            id: ids.next_id(),
            encounter_id: encounter.id,
            claim_cents,
            allowed_cents: allowed_cents.min(claim_cents),
            claim_date: encounter.end_time.date() + Duration::days(lag),
            status: *self.fake.pick(&ClaimStatus::ALL),
        }
    }
}

/// Validate `config` and generate a dataset in one call
pub fn generate(config: GeneratorConfig) -> Result<DatasetBundle, GenerateError> {
    Ok(Generator::new(config)?.generate())
}
