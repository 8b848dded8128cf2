//! Fake data generation helpers.
//!
//! Provides deterministic fake names, codes, dates and amounts for the
//! hospital dataset. All randomness flows through the wrapped RNG.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::Rng;

/// First names for fake data
const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Carol", "David", "Emma", "Frank", "Grace", "Henry", "Iris", "Jack", "Kate",
    "Leo", "Maya", "Noah", "Olivia", "Peter", "Quinn", "Rose", "Sam", "Tara", "Uma", "Victor",
    "Wendy", "Xavier", "Yara", "Zack", "Anna", "Brian", "Clara", "Derek", "Aoife", "Sean",
];

/// Last names for fake data
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Martinez",
    "Anderson", "Taylor", "Thomas", "Moore", "Jackson", "Martin", "Lee", "Thompson", "White",
    "Harris", "Clark", "Lewis", "Robinson", "Walker", "Hall", "Young", "King", "O'Brien",
    "O'Neill", "D'Angelo",
];

/// Provider credentials
const CREDENTIALS: &[&str] = &["MD", "DO", "NP", "PA"];

/// Clinical condition terms used for diagnosis descriptions
const CONDITIONS: &[&str] = &[
    "Essential hypertension",
    "Type 2 diabetes mellitus",
    "Acute bronchitis",
    "Chronic kidney disease",
    "Major depressive disorder",
    "Asthma",
    "Atrial fibrillation",
    "Hyperlipidemia",
    "Urinary tract infection",
    "Migraine",
    "Osteoarthritis of knee",
    "Low back pain",
    "Pneumonia",
    "Anemia",
    "Hypothyroidism",
    "Gastroesophageal reflux disease",
    "Chest pain",
    "Cellulitis",
    "Sepsis",
    "Fracture of radius",
];

/// Procedure terms used for procedure descriptions
const PROCEDURES: &[&str] = &[
    "Office visit",
    "Electrocardiogram",
    "Chest X-ray",
    "Complete blood count",
    "Metabolic panel",
    "CT scan of head",
    "MRI of lumbar spine",
    "Ultrasound of abdomen",
    "Influenza vaccination",
    "Wound repair",
    "Colonoscopy",
    "Echocardiogram",
    "Physical therapy evaluation",
    "Venipuncture",
    "Urinalysis",
];

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Number of distinct MRN suffixes (`MRN` + five alphanumerics)
pub const MRN_SPACE: u64 = 62u64.pow(5);

/// Fake data generator with deterministic RNG
pub struct FakeData<R: Rng> {
    rng: R,
}

impl<R: Rng> FakeData<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a random first name
    pub fn first_name(&mut self) -> &'static str {
        *self.pick(FIRST_NAMES)
    }

    /// Generate a random last name
    pub fn last_name(&mut self) -> &'static str {
        *self.pick(LAST_NAMES)
    }

    pub fn credential(&mut self) -> &'static str {
        *self.pick(CREDENTIALS)
    }

    /// Upper-case letters only
    pub fn upper_code(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| self.rng.random_range(b'A'..=b'Z') as char)
            .collect()
    }

    /// Mixed-case letters and digits
    pub fn alphanumeric(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| ALPHANUMERIC[self.rng.random_range(0..ALPHANUMERIC.len())] as char)
            .collect()
    }

    /// Medical record number candidate; uniqueness is enforced by the caller
    pub fn mrn(&mut self) -> String {
        format!("MRN{}", self.alphanumeric(5))
    }

    /// ICD-10 style code, e.g. `J45.9`
    pub fn icd10_code(&mut self) -> String {
        let letter = self.rng.random_range(b'A'..=b'Z') as char;
        let category: u32 = self.rng.random_range(0..100);
        let detail: u32 = self.rng.random_range(0..10);
        format!("{}{:02}.{}", letter, category, detail)
    }

    /// CPT style five digit code
    pub fn cpt_code(&mut self) -> String {
        format!("{:05}", self.rng.random_range(10000..100000u32))
    }

    pub fn condition(&mut self) -> &'static str {
        *self.pick(CONDITIONS)
    }

    pub fn procedure_name(&mut self) -> &'static str {
        *self.pick(PROCEDURES)
    }

    /// Generate a random integer in an inclusive range
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        self.rng.random_range(min..=max)
    }

    /// Generate a float in a half-open range
    pub fn fraction(&mut self, min: f64, max: f64) -> f64 {
        self.rng.random_range(min..max)
    }

    /// Date with a uniform year and day-of-month capped at 28 (safe for all months)
    pub fn date_in_years(&mut self, year_start: i32, year_end: i32) -> NaiveDate {
        let year = self.rng.random_range(year_start..=year_end);
        let month = self.rng.random_range(1..=12);
        let day = self.rng.random_range(1..=28);
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
    }

    /// Uniform instant in `[start, end]` at minute resolution
    pub fn instant_between(&mut self, start: NaiveDateTime, end: NaiveDateTime) -> NaiveDateTime {
        let span = (end - start).num_minutes().max(0);
        start + Duration::minutes(self.rng.random_range(0..=span))
    }

    /// Pick a random element from a non-empty slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.random_range(0..items.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_deterministic_generation() {
        let mut fake1 = FakeData::new(ChaCha8Rng::seed_from_u64(42));
        let mut fake2 = FakeData::new(ChaCha8Rng::seed_from_u64(42));

        assert_eq!(fake1.first_name(), fake2.first_name());
        assert_eq!(fake1.mrn(), fake2.mrn());
        assert_eq!(fake1.icd10_code(), fake2.icd10_code());
    }

    #[test]
    fn test_pool_values_are_static_strs() {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(3));
        for _ in 0..50 {
            let first: &'static str = fake.first_name();
            let last: &'static str = fake.last_name();
            let credential: &'static str = fake.credential();
            let condition: &'static str = fake.condition();
            let procedure: &'static str = fake.procedure_name();

            assert!(FIRST_NAMES.contains(&first));
            assert!(LAST_NAMES.contains(&last));
            assert!(CREDENTIALS.contains(&credential));
            assert!(CONDITIONS.contains(&condition));
            assert!(PROCEDURES.contains(&procedure));
        }
    }

    #[test]
    fn test_code_shapes() {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(7));
        let mrn = fake.mrn();
        assert!(mrn.starts_with("MRN"));
        assert_eq!(mrn.len(), 8);

        let cpt = fake.cpt_code();
        assert_eq!(cpt.len(), 5);
        assert!(cpt.chars().all(|c| c.is_ascii_digit()));

        let code = fake.upper_code(4);
        assert!(code.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_instant_between_stays_in_window() {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(1));
        let start = NaiveDate::from_ymd_opt(2022, 5, 1)
            .unwrap()
            .and_hms_opt(22, 30, 0)
            .unwrap();
        let end = start + Duration::hours(3);
        for _ in 0..200 {
            let t = fake.instant_between(start, end);
            assert!(t >= start && t <= end);
        }
    }
}
