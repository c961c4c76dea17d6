//! Fetch, translate and clean the Brazilian Federal Senate reimbursement
//! dataset (CEAPS), published as one legacy-encoded CSV per year.

pub mod clean;
pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod translate;

pub use config::{DatasetConfig, YearRange};
pub use error::{PipelineError, RemoteError};
pub use fetch::{HttpStore, RemoteStore};
pub use pipeline::{DatasetPipeline, PipelineReport, YearOutcome};
