//! Likert-scale risk survey analysis.
//!
//! Loads a survey export, maps its columns to risk dimensions and time
//! horizons, computes ordinal statistics per variable and builds the report
//! tables written by the `likert-risk` binary.

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod output;
pub mod reports;
pub mod schema;
pub mod stats;
pub mod types;
pub mod util;

pub use config::AnalysisConfig;
pub use error::{ReportError, Result};
pub use loader::{load_survey, SurveyTable};
pub use schema::{
    build_index, extract_description, extract_variable_code, short_label, SchemaIndex,
    VariableCatalog,
};
pub use stats::{classify_risk_level, compute_frequency_stats, identify_trend};
