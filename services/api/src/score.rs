use clap::Args;
use loan_scoring::config::{AppConfig, ModelConfig};
use loan_scoring::error::AppError;
use loan_scoring::scoring::{LoanAssessment, LoanScoringService, ModelRegistry};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file holding one applicant record
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Override the bureau-aware model artifact
    #[arg(long)]
    pub(crate) bureau_model: Option<PathBuf>,
    /// Override the bureau-absent model artifact
    #[arg(long)]
    pub(crate) no_bureau_model: Option<PathBuf>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let assessment = score_file(&args, config.models)?;
    render_assessment(&args, &assessment);
    Ok(())
}

pub(crate) fn score_file(
    args: &ScoreArgs,
    mut models: ModelConfig,
) -> Result<LoanAssessment, AppError> {
    if let Some(path) = &args.bureau_model {
        models.bureau_path = path.clone();
    }
    if let Some(path) = &args.no_bureau_model {
        models.no_bureau_path = path.clone();
    }

    let registry = ModelRegistry::load(&models)?;
    let service = LoanScoringService::new(registry);

    let raw = fs::read_to_string(&args.input)?;
    let payload: Value = serde_json::from_str(&raw)?;
    Ok(service.assess_json(&payload)?)
}

fn render_assessment(args: &ScoreArgs, assessment: &LoanAssessment) {
    println!("Loan assessment for {}", args.input.display());
    println!("Model: {}", assessment.variant());
    println!("Raw score: {:.4}", assessment.score.score);
    println!("Probability: {:.4}", assessment.score.probability);
    println!(
        "Decision: {}",
        if assessment.decision() {
            "approve"
        } else {
            "reject"
        }
    );
    println!("Grade: {}", assessment.grade);
}

#[cfg(test)]
mod tests {
    use super::*;
    use loan_scoring::scoring::{Grade, ModelVariant};
    use std::path::Path;

    fn repo_path(relative: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").join(relative)
    }

    fn shipped_models() -> ModelConfig {
        ModelConfig {
            bureau_path: repo_path("assets/model_bureau.json"),
            no_bureau_path: repo_path("assets/model_no_bureau.json"),
        }
    }

    fn write_applicant(name: &str, payload: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("loan-scoring-{}-{name}", std::process::id()));
        fs::write(&path, payload).expect("write applicant");
        path
    }

    #[test]
    fn scores_applicant_file_with_shipped_models() {
        let input = write_applicant(
            "no-bureau.json",
            r#"{"age": 22, "income": 2000000, "gender": "Female", "hasApplied": "No",
                "hasIncome": "Yes", "education": "Bachelor Degree", "purpose": "Investment",
                "bureau": null}"#,
        );
        let args = ScoreArgs {
            input: input.clone(),
            bureau_model: None,
            no_bureau_model: None,
        };

        let assessment = score_file(&args, shipped_models()).expect("scores");
        fs::remove_file(input).ok();

        assert_eq!(assessment.variant(), ModelVariant::NoBureau);
        assert!(assessment.decision());
        assert_eq!(assessment.grade, Grade::B);
    }

    #[test]
    fn invalid_applicant_file_is_reported() {
        let input = write_applicant("invalid.json", r#"{"income": 10}"#);
        let args = ScoreArgs {
            input: input.clone(),
            bureau_model: None,
            no_bureau_model: None,
        };

        let err = score_file(&args, shipped_models()).expect_err("age missing");
        fs::remove_file(input).ok();
        assert!(matches!(err, AppError::Scoring(_)));
    }
}
