pub mod audit;
pub mod eligibility;
pub mod engine;
pub mod form;

pub use crate::domain::model::{
    AuditReport, EligibilityResult, ExperienceDuration, ProficiencyRating, SheetRow,
};
pub use crate::domain::ports::{ConfigProvider, EligibilityPolicy, Pipeline, Storage};
pub use crate::utils::error::Result;
