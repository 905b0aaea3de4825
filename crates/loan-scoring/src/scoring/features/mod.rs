mod rules;

pub use rules::{
    Category, FeatureRule, FlagField, NumericField, RuleScope, Transform, FEATURE_RULES,
};

use serde::Serialize;

use super::domain::{ApplicantRecord, ModelVariant};

/// Model-ready columns in rule-table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub variant: ModelVariant,
    pub names: Vec<&'static str>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|candidate| *candidate == name)
            .map(|index| self.values[index])
    }
}

/// Column names the given variant's model must be trained on.
pub fn feature_names(variant: ModelVariant) -> Vec<&'static str> {
    FEATURE_RULES
        .iter()
        .filter(|rule| rule.scope.includes(variant))
        .map(|rule| rule.name)
        .collect()
}

/// Evaluate the rule table for the record's variant.
pub fn engineer(record: &ApplicantRecord) -> FeatureVector {
    engineer_with(FEATURE_RULES, record)
}

pub fn engineer_with(rules: &[FeatureRule], record: &ApplicantRecord) -> FeatureVector {
    let variant = record.variant();
    let (names, values) = rules
        .iter()
        .filter(|rule| rule.scope.includes(variant))
        .map(|rule| (rule.name, rule.transform.apply(record)))
        .unzip();

    FeatureVector {
        variant,
        names,
        values,
    }
}
