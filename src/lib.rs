pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{AuditArgs, CliConfig, CliPolicy};

pub use crate::config::{cli::LocalStorage, toml_config::AuditConfig};
pub use crate::core::audit::AuditPipeline;
pub use crate::core::eligibility::{evaluate, evaluate_with, PolicyTier, TieredPolicy};
pub use crate::core::engine::{AuditEngine, AuditRun};
pub use crate::core::form::{RowEdit, SkillSubmissionForm, SubSkillRow, SubmissionError};
pub use crate::domain::model::{EligibilityResult, ExperienceDuration, ProficiencyRating};
pub use crate::domain::ports::EligibilityPolicy;
pub use crate::utils::error::{EligibilityError, Result};
