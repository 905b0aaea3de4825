use std::collections::HashMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::domain::{ApplicantRecord, BureauRecord, Education, Gender, Purpose};

pub const AGE_RANGE: RangeInclusive<i64> = 17..=100;
const LOAN_COUNT_RANGE: RangeInclusive<i64> = 0..=(u32::MAX as i64);

const FIELD_REQUIRED: &str = "field required";

/// One rejected input field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Raised when inbound applicant data cannot be turned into an [`ApplicantRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid applicant payload ({})", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue::new(field, message)],
        }
    }

    /// `"<message>, field : <field>"` for the first offending field.
    pub fn summary(&self) -> String {
        match self.issues.first() {
            Some(issue) => format!("{}, field : {}", issue.message, issue.field),
            None => "invalid applicant payload".to_string(),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(|issue| issue.field.as_str())
    }
}

fn render_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a JSON request body.
pub fn normalize_json(payload: &Value) -> Result<ApplicantRecord, ValidationError> {
    let Some(fields) = payload.as_object() else {
        return Err(ValidationError::single(
            "body",
            "value is not a valid dict",
        ));
    };

    let mut collector = Collector::default();
    let bureau = collector.json_bureau(fields.get("bureau"));
    collector.finish(fields, bureau)
}

/// Validate a flat form submission.
///
/// The `bureau` field is a yes/no flag; when set, `loanWithDelay` and
/// `loanNoDelay` become required.
pub fn normalize_form(form: &HashMap<String, String>) -> Result<ApplicantRecord, ValidationError> {
    let fields: Map<String, Value> = form
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();

    let mut collector = Collector::default();
    let bureau = match fields.get("bureau") {
        None => None,
        Some(flag) => match collector.flag("bureau", Some(flag)) {
            Some(true) => collector.bureau_counts(
                "loanWithDelay",
                fields.get("loanWithDelay"),
                "loanNoDelay",
                fields.get("loanNoDelay"),
            ),
            _ => None,
        },
    };
    collector.finish(&fields, bureau)
}

#[derive(Default)]
struct Collector {
    issues: Vec<FieldIssue>,
}

impl Collector {
    fn finish(
        mut self,
        fields: &Map<String, Value>,
        bureau: Option<BureauRecord>,
    ) -> Result<ApplicantRecord, ValidationError> {
        let age = self.integer("age", fields.get("age"), AGE_RANGE);
        let income = self.non_negative_number("income", fields.get("income"));
        let gender = self.category(
            "gender",
            fields.get("gender"),
            Gender::from_label,
            Gender::accepted_labels,
        );
        let has_applied = self.flag("hasApplied", fields.get("hasApplied"));
        let has_income = self.flag("hasIncome", fields.get("hasIncome"));
        let education = self.category(
            "education",
            fields.get("education"),
            Education::from_label,
            Education::accepted_labels,
        );
        let purpose = self.category(
            "purpose",
            fields.get("purpose"),
            Purpose::from_label,
            Purpose::accepted_labels,
        );

        match (
            age,
            income,
            gender,
            has_applied,
            has_income,
            education,
            purpose,
        ) {
            (
                Some(age),
                Some(income),
                Some(gender),
                Some(has_applied),
                Some(has_income),
                Some(education),
                Some(purpose),
            ) if self.issues.is_empty() => Ok(ApplicantRecord {
                age: age as u8,
                income,
                gender,
                has_applied,
                has_income,
                education,
                purpose,
                bureau,
            }),
            _ => Err(ValidationError {
                issues: self.issues,
            }),
        }
    }

    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(FieldIssue::new(field, message));
    }

    fn required<'a>(&mut self, field: &str, value: Option<&'a Value>) -> Option<&'a Value> {
        match value {
            None | Some(Value::Null) => {
                self.reject(field, FIELD_REQUIRED);
                None
            }
            Some(Value::String(raw)) if raw.trim().is_empty() => {
                self.reject(field, FIELD_REQUIRED);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn integer(
        &mut self,
        field: &str,
        value: Option<&Value>,
        range: RangeInclusive<i64>,
    ) -> Option<i64> {
        let value = self.required(field, value)?;
        let parsed = match value {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().and_then(integral)),
            Value::String(raw) => {
                let raw = raw.trim();
                raw.parse::<i64>()
                    .ok()
                    .or_else(|| raw.parse::<f64>().ok().and_then(integral))
            }
            _ => None,
        };

        let Some(parsed) = parsed else {
            self.reject(field, "value is not a valid integer");
            return None;
        };

        if parsed < *range.start() {
            self.reject(
                field,
                format!("ensure this value is greater than or equal to {}", range.start()),
            );
            return None;
        }
        if parsed > *range.end() {
            self.reject(
                field,
                format!("ensure this value is less than or equal to {}", range.end()),
            );
            return None;
        }

        Some(parsed)
    }

    fn non_negative_number(&mut self, field: &str, value: Option<&Value>) -> Option<f64> {
        let value = self.required(field, value)?;
        let parsed = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(raw) => raw.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|number| number.is_finite());

        match parsed {
            Some(number) if number >= 0.0 => Some(number),
            Some(_) => {
                self.reject(field, "ensure this value is greater than or equal to 0");
                None
            }
            None => {
                self.reject(field, "value is not a valid number");
                None
            }
        }
    }

    fn flag(&mut self, field: &str, value: Option<&Value>) -> Option<bool> {
        let value = self.required(field, value)?;
        let parsed = match value {
            Value::Bool(flag) => Some(*flag),
            Value::Number(number) => match number
                .as_i64()
                .or_else(|| number.as_f64().and_then(integral))
            {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "yes" | "y" | "true" | "1" | "on" => Some(true),
                "no" | "n" | "false" | "0" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        };

        if parsed.is_none() {
            self.reject(field, "value could not be parsed to a boolean ('Yes' or 'No')");
        }
        parsed
    }

    fn category<T>(
        &mut self,
        field: &str,
        value: Option<&Value>,
        parse: fn(&str) -> Option<T>,
        accepted: fn() -> String,
    ) -> Option<T> {
        let value = self.required(field, value)?;
        let parsed = value.as_str().and_then(parse);
        if parsed.is_none() {
            self.reject(
                field,
                format!(
                    "value is not a valid enumeration member; permitted: {}",
                    accepted()
                ),
            );
        }
        parsed
    }

    fn json_bureau(&mut self, value: Option<&Value>) -> Option<BureauRecord> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::Object(fields)) if fields.is_empty() => None,
            Some(Value::Object(fields)) => self.bureau_counts(
                "bureau.loanWithDelay",
                fields.get("loanWithDelay"),
                "bureau.loanNoDelay",
                fields.get("loanNoDelay"),
            ),
            Some(_) => {
                self.reject("bureau", "value is not a valid dict");
                None
            }
        }
    }

    fn bureau_counts(
        &mut self,
        with_delay_field: &str,
        with_delay: Option<&Value>,
        no_delay_field: &str,
        no_delay: Option<&Value>,
    ) -> Option<BureauRecord> {
        let loan_with_delay = self.integer(with_delay_field, with_delay, LOAN_COUNT_RANGE);
        let loan_no_delay = self.integer(no_delay_field, no_delay, LOAN_COUNT_RANGE);
        Some(BureauRecord {
            loan_with_delay: loan_with_delay? as u32,
            loan_no_delay: loan_no_delay? as u32,
        })
    }
}

fn integral(number: f64) -> Option<i64> {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Some(number as i64)
    } else {
        None
    }
}
