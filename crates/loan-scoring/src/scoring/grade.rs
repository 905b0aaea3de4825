use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::ModelVariant;

/// Letter band summarizing approval likelihood; `A` is best.
///
/// The derived ordering runs `A < B < ... < F`, so a *better* grade compares
/// *less*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub const ALL: [Grade; 6] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::E, Grade::F];

    pub const fn letter(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }

    /// Grades that land on the approval page.
    pub const fn is_approved(self) -> bool {
        matches!(self, Grade::A | Grade::B)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// Inclusive lower probability bound per band, best band first. Anything
/// below the last bound is `F`.
const BUREAU_BANDS: [(Grade, f64); 5] = [
    (Grade::A, 0.80),
    (Grade::B, 0.65),
    (Grade::C, 0.50),
    (Grade::D, 0.35),
    (Grade::E, 0.20),
];

const NO_BUREAU_BANDS: [(Grade, f64); 5] = [
    (Grade::A, 0.85),
    (Grade::B, 0.70),
    (Grade::C, 0.55),
    (Grade::D, 0.40),
    (Grade::E, 0.25),
];

pub fn bands(variant: ModelVariant) -> &'static [(Grade, f64)] {
    match variant {
        ModelVariant::Bureau => &BUREAU_BANDS,
        ModelVariant::NoBureau => &NO_BUREAU_BANDS,
    }
}

/// Bin a probability into a grade. A probability equal to a bound takes that
/// bound's band; NaN falls through to `F`.
pub fn grade_for(probability: f64, variant: ModelVariant) -> Grade {
    bands(variant)
        .iter()
        .find(|(_, lower)| probability >= *lower)
        .map_or(Grade::F, |(grade, _)| *grade)
}
