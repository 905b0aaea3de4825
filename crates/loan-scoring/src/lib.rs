//! Loan approval scoring over a pair of pre-trained models.
//!
//! Requests flow through the [`scoring`] pipeline: the normalizer turns loose
//! form or JSON input into an [`scoring::ApplicantRecord`], the feature table
//! derives a model-ready vector, the scorer routes it to the bureau-aware or
//! bureau-absent model, and the grade binner maps the probability to a band.

pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
