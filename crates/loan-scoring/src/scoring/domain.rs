use std::fmt;

use serde::{Deserialize, Serialize};

/// Strictly typed applicant snapshot produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantRecord {
    pub age: u8,
    pub income: f64,
    pub gender: Gender,
    pub has_applied: bool,
    pub has_income: bool,
    pub education: Education,
    pub purpose: Purpose,
    pub bureau: Option<BureauRecord>,
}

impl ApplicantRecord {
    /// The model variant this record must be scored with.
    pub fn variant(&self) -> ModelVariant {
        if self.bureau.is_some() {
            ModelVariant::Bureau
        } else {
            ModelVariant::NoBureau
        }
    }
}

/// Credit-bureau history available for some applicants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BureauRecord {
    pub loan_with_delay: u32,
    pub loan_no_delay: u32,
}

impl BureauRecord {
    pub fn total_loans(&self) -> u32 {
        self.loan_with_delay.saturating_add(self.loan_no_delay)
    }
}

/// Which of the two trained models a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    Bureau,
    NoBureau,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 2] = [ModelVariant::Bureau, ModelVariant::NoBureau];

    pub const fn label(self) -> &'static str {
        match self {
            ModelVariant::Bureau => "model_bureau",
            ModelVariant::NoBureau => "model_no_bureau",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Implements the label table shared by every categorical applicant field.
macro_rules! categorical {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Case-insensitive match against the canonical labels.
            pub fn from_label(raw: &str) -> Option<Self> {
                let trimmed = raw.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|value| value.label().eq_ignore_ascii_case(trimmed))
            }

            pub fn accepted_labels() -> String {
                Self::ALL
                    .iter()
                    .map(|value| format!("'{}'", value.label()))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

categorical!(
    Gender {
        Male => "Male",
        Female => "Female",
    }
);

categorical!(
    /// Highest completed education level.
    Education {
        HighSchool => "High School",
        Diploma => "Diploma",
        Bachelor => "Bachelor Degree",
        Master => "Master Degree",
        Doctoral => "Doctoral Degree",
    }
);

categorical!(
    /// Declared use of the loan.
    Purpose {
        WorkingCapital => "Working Capital",
        Investment => "Investment",
        Consumptive => "Consumptive",
        Education => "Education",
        Others => "Others",
    }
);
