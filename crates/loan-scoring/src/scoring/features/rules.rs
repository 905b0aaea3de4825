use super::super::domain::{ApplicantRecord, Education, Gender, ModelVariant, Purpose};

/// Numeric applicant attributes a rule can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Age,
    Income,
    LoanWithDelay,
    LoanNoDelay,
    TotalLoans,
}

impl NumericField {
    /// Bureau fields read as zero on records without bureau data; the
    /// `BureauOnly` scope keeps them out of those vectors anyway.
    fn read(self, record: &ApplicantRecord) -> f64 {
        match self {
            NumericField::Age => f64::from(record.age),
            NumericField::Income => record.income,
            NumericField::LoanWithDelay => record
                .bureau
                .map_or(0.0, |bureau| f64::from(bureau.loan_with_delay)),
            NumericField::LoanNoDelay => record
                .bureau
                .map_or(0.0, |bureau| f64::from(bureau.loan_no_delay)),
            NumericField::TotalLoans => record
                .bureau
                .map_or(0.0, |bureau| f64::from(bureau.total_loans())),
        }
    }
}

/// Yes/no applicant attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagField {
    GenderMale,
    HasApplied,
    HasIncome,
}

impl FlagField {
    fn read(self, record: &ApplicantRecord) -> bool {
        match self {
            FlagField::GenderMale => record.gender == Gender::Male,
            FlagField::HasApplied => record.has_applied,
            FlagField::HasIncome => record.has_income,
        }
    }
}

/// Categorical value a one-hot column is hot for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Education(Education),
    Purpose(Purpose),
}

impl Category {
    fn matches(self, record: &ApplicantRecord) -> bool {
        match self {
            Category::Education(education) => record.education == education,
            Category::Purpose(purpose) => record.purpose == purpose,
        }
    }
}

/// How a column is derived from the applicant record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Value(NumericField),
    Log1p(NumericField),
    /// Number of edges at or below the value, so `edges.len() + 1` bands.
    Bucket(NumericField, &'static [f64]),
    Flag(FlagField),
    OneHot(Category),
    /// Zero when the denominator is zero.
    Ratio(NumericField, NumericField),
}

impl Transform {
    pub fn apply(self, record: &ApplicantRecord) -> f64 {
        match self {
            Transform::Value(field) => field.read(record),
            Transform::Log1p(field) => field.read(record).ln_1p(),
            Transform::Bucket(field, edges) => {
                let value = field.read(record);
                edges.iter().filter(|edge| value >= **edge).count() as f64
            }
            Transform::Flag(field) => indicator(field.read(record)),
            Transform::OneHot(category) => indicator(category.matches(record)),
            Transform::Ratio(numerator, denominator) => {
                let denominator = denominator.read(record);
                if denominator == 0.0 {
                    0.0
                } else {
                    numerator.read(record) / denominator
                }
            }
        }
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Which model variants a column is emitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    AllVariants,
    BureauOnly,
}

impl RuleScope {
    pub fn includes(self, variant: ModelVariant) -> bool {
        match self {
            RuleScope::AllVariants => true,
            RuleScope::BureauOnly => variant == ModelVariant::Bureau,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRule {
    pub name: &'static str,
    pub scope: RuleScope,
    pub transform: Transform,
}

const fn rule(name: &'static str, scope: RuleScope, transform: Transform) -> FeatureRule {
    FeatureRule {
        name,
        scope,
        transform,
    }
}

const AGE_EDGES: &[f64] = &[25.0, 35.0, 45.0, 55.0];
const INCOME_EDGES: &[f64] = &[2_000_000.0, 5_000_000.0, 10_000_000.0, 20_000_000.0];

use self::Category as C;
use self::FlagField as F;
use self::NumericField as N;
use self::RuleScope::{AllVariants as ALL, BureauOnly as BUREAU};
use self::Transform as T;

/// Column order is the contract with the trained models; the artifacts list
/// the same names in the same order.
pub const FEATURE_RULES: &[FeatureRule] = &[
    rule("age", ALL, T::Value(N::Age)),
    rule("age_band", ALL, T::Bucket(N::Age, AGE_EDGES)),
    rule("log_income", ALL, T::Log1p(N::Income)),
    rule("income_band", ALL, T::Bucket(N::Income, INCOME_EDGES)),
    rule("gender_male", ALL, T::Flag(F::GenderMale)),
    rule("has_applied", ALL, T::Flag(F::HasApplied)),
    rule("has_income", ALL, T::Flag(F::HasIncome)),
    rule("education_high_school", ALL, T::OneHot(C::Education(Education::HighSchool))),
    rule("education_diploma", ALL, T::OneHot(C::Education(Education::Diploma))),
    rule("education_bachelor", ALL, T::OneHot(C::Education(Education::Bachelor))),
    rule("education_master", ALL, T::OneHot(C::Education(Education::Master))),
    rule("education_doctoral", ALL, T::OneHot(C::Education(Education::Doctoral))),
    rule("purpose_working_capital", ALL, T::OneHot(C::Purpose(Purpose::WorkingCapital))),
    rule("purpose_investment", ALL, T::OneHot(C::Purpose(Purpose::Investment))),
    rule("purpose_consumptive", ALL, T::OneHot(C::Purpose(Purpose::Consumptive))),
    rule("purpose_education", ALL, T::OneHot(C::Purpose(Purpose::Education))),
    rule("purpose_others", ALL, T::OneHot(C::Purpose(Purpose::Others))),
    rule("loan_with_delay", BUREAU, T::Value(N::LoanWithDelay)),
    rule("loan_no_delay", BUREAU, T::Value(N::LoanNoDelay)),
    rule("total_loans", BUREAU, T::Value(N::TotalLoans)),
    rule("delay_ratio", BUREAU, T::Ratio(N::LoanWithDelay, N::TotalLoans)),
];
