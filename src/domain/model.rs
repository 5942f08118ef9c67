use crate::utils::error::{EligibilityError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total claimed experience in whole months.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperienceDuration(u32);

impl ExperienceDuration {
    pub const MONTHS_PER_YEAR: u32 = 12;
    /// 下拉選單的最大年數，10 代表「10+」
    pub const MAX_DROPDOWN_YEARS: u32 = 10;
    pub const MAX_DROPDOWN_MONTHS: u32 = 11;

    pub const fn from_months(total_months: u32) -> Self {
        Self(total_months)
    }

    /// 由表單的 (年, 月) 下拉選單組合總月數
    pub fn from_years_months(years: u32, months: u32) -> Result<Self> {
        if years > Self::MAX_DROPDOWN_YEARS {
            return Err(EligibilityError::InvalidExperience {
                field: "years".to_string(),
                value: i64::from(years),
                reason: format!("must be between 0 and {}", Self::MAX_DROPDOWN_YEARS),
            });
        }
        if months > Self::MAX_DROPDOWN_MONTHS {
            return Err(EligibilityError::InvalidExperience {
                field: "months".to_string(),
                value: i64::from(months),
                reason: format!("must be between 0 and {}", Self::MAX_DROPDOWN_MONTHS),
            });
        }
        Ok(Self(years * Self::MONTHS_PER_YEAR + months))
    }

    /// Accepts a raw month count from an untyped source such as a CSV cell.
    pub fn try_from_months(total_months: i64) -> Result<Self> {
        u32::try_from(total_months)
            .map(Self)
            .map_err(|_| EligibilityError::InvalidExperience {
                field: "experience_months".to_string(),
                value: total_months,
                reason: "must be a non-negative number of months".to_string(),
            })
    }

    pub const fn total_months(self) -> u32 {
        self.0
    }

    /// Real-valued years; 30 months is 2.5 years.
    pub fn years(self) -> f64 {
        f64::from(self.0) / f64::from(Self::MONTHS_PER_YEAR)
    }

    /// Splits back into dropdown values. Anything past ten years shows as "10+".
    pub fn to_dropdown(self) -> (u32, u32) {
        let years = (self.0 / Self::MONTHS_PER_YEAR).min(Self::MAX_DROPDOWN_YEARS);
        (years, self.0 % Self::MONTHS_PER_YEAR)
    }
}

impl fmt::Display for ExperienceDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}y {}m",
            self.0 / Self::MONTHS_PER_YEAR,
            self.0 % Self::MONTHS_PER_YEAR
        )
    }
}

/// Star rating in `[1, 5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ProficiencyRating(u8);

impl ProficiencyRating {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(5);

    pub fn new(stars: u8) -> Result<Self> {
        Self::try_from(i64::from(stars))
    }

    /// Forces any star count into range. Used for policy tables whose
    /// values have already been validated.
    pub(crate) const fn saturating(stars: u8) -> Self {
        if stars < Self::MIN.0 {
            Self::MIN
        } else if stars > Self::MAX.0 {
            Self::MAX
        } else {
            Self(stars)
        }
    }

    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for ProficiencyRating {
    type Error = EligibilityError;

    fn try_from(value: i64) -> Result<Self> {
        if (i64::from(Self::MIN.0)..=i64::from(Self::MAX.0)).contains(&value) {
            // range checked above
            Ok(Self(value as u8))
        } else {
            Err(EligibilityError::InvalidProficiency { value })
        }
    }
}

impl TryFrom<u8> for ProficiencyRating {
    type Error = EligibilityError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ProficiencyRating> for u8 {
    fn from(rating: ProficiencyRating) -> Self {
        rating.0
    }
}

impl fmt::Display for ProficiencyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub allowed: bool,
    pub max_allowed: ProficiencyRating,
    pub clamped_proficiency: ProficiencyRating,
    pub message: Option<String>,
}

/// One row of an exported sub-skill sheet, as written by the backend export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSkillRecord {
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub skill_name: Option<String>,
    pub sub_skill_name: String,
    pub experience_months: i64,
    pub proficiency: i64,
}

impl SubSkillRecord {
    pub fn experience(&self) -> Result<ExperienceDuration> {
        ExperienceDuration::try_from_months(self.experience_months)
    }

    pub fn rating(&self) -> Result<ProficiencyRating> {
        ProficiencyRating::try_from(self.proficiency)
    }
}

/// A sheet row after extraction. Rows that failed to parse keep the reason.
#[derive(Debug, Clone)]
pub struct SheetRow {
    pub line: u64,
    pub parsed: std::result::Result<SubSkillRecord, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Compliant {
        max_allowed: ProficiencyRating,
    },
    Violation {
        max_allowed: ProficiencyRating,
        clamped_proficiency: ProficiencyRating,
        message: String,
    },
    Invalid {
        reason: String,
    },
}

impl AuditOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            AuditOutcome::Compliant { .. } => "compliant",
            AuditOutcome::Violation { .. } => "violation",
            AuditOutcome::Invalid { .. } => "invalid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub line: u64,
    pub record: Option<SubSkillRecord>,
    pub outcome: AuditOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total: usize,
    pub compliant: usize,
    pub violations: usize,
    pub invalid: usize,
}

impl AuditSummary {
    pub fn record(&mut self, outcome: &AuditOutcome) {
        self.total += 1;
        match outcome {
            AuditOutcome::Compliant { .. } => self.compliant += 1,
            AuditOutcome::Violation { .. } => self.violations += 1,
            AuditOutcome::Invalid { .. } => self.invalid += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub policy: String,
    pub summary: AuditSummary,
    pub entries: Vec<AuditEntry>,
}
