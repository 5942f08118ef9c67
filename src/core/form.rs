//! Form state for the new-skill card and the update-skill modal.
//!
//! Rows re-run the eligibility rule on every edit and overwrite a rating the
//! policy does not allow, so a row never holds an out-of-policy proficiency.

use crate::core::eligibility::{evaluate_with, TieredPolicy};
use crate::domain::model::{EligibilityResult, ExperienceDuration, ProficiencyRating};
use crate::domain::ports::EligibilityPolicy;
use crate::utils::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowEdit {
    SubSkill { id: u64, name: String },
    Years(u32),
    Months(u32),
    Proficiency(u8),
    HasCertification(bool),
    CertificationDates {
        created: Option<NaiveDate>,
        expires: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubSkillRow {
    pub sub_skill_id: Option<u64>,
    pub name: String,
    years: u32,
    months: u32,
    experience: ExperienceDuration,
    proficiency: ProficiencyRating,
    pub has_certification: bool,
    pub certification_created: Option<NaiveDate>,
    pub certification_expires: Option<NaiveDate>,
    error: Option<String>,
}

impl Default for SubSkillRow {
    fn default() -> Self {
        Self::new()
    }
}

impl SubSkillRow {
    /// Blank row: one star, no experience.
    pub fn new() -> Self {
        Self {
            sub_skill_id: None,
            name: String::new(),
            years: 0,
            months: 0,
            experience: ExperienceDuration::default(),
            proficiency: ProficiencyRating::MIN,
            has_certification: false,
            certification_created: None,
            certification_expires: None,
            error: None,
        }
    }

    /// Loads a stored sub-skill into the update modal.
    ///
    /// The stored month count is kept exactly even past ten years; the
    /// dropdowns show "10+" in that case.
    pub fn from_existing(
        policy: &dyn EligibilityPolicy,
        sub_skill_id: u64,
        name: impl Into<String>,
        experience: ExperienceDuration,
        proficiency: ProficiencyRating,
    ) -> Self {
        let (years, months) = experience.to_dropdown();
        let mut row = Self {
            sub_skill_id: Some(sub_skill_id),
            name: name.into(),
            years,
            months,
            experience,
            proficiency,
            ..Self::new()
        };
        row.revalidate(policy);
        row
    }

    pub fn years(&self) -> u32 {
        self.years
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    pub fn experience(&self) -> ExperienceDuration {
        self.experience
    }

    pub fn proficiency(&self) -> ProficiencyRating {
        self.proficiency
    }

    /// Inline eligibility message from the last edit, if it clamped the rating.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn certification_error(&self) -> Option<&'static str> {
        if !self.has_certification {
            return None;
        }
        match (self.certification_created, self.certification_expires) {
            (Some(created), Some(expires)) if expires < created => {
                Some("Certification expiration date cannot be before its creation date.")
            }
            _ => None,
        }
    }

    /// Applies one field edit, then re-runs the rule.
    pub fn apply(&mut self, policy: &dyn EligibilityPolicy, edit: RowEdit) -> Result<EligibilityResult> {
        match edit {
            RowEdit::SubSkill { id, name } => {
                self.sub_skill_id = Some(id);
                self.name = name;
            }
            RowEdit::Years(years) => {
                self.experience = ExperienceDuration::from_years_months(years, self.months)?;
                self.years = years;
            }
            RowEdit::Months(months) => {
                self.experience = ExperienceDuration::from_years_months(self.years, months)?;
                self.months = months;
            }
            RowEdit::Proficiency(stars) => {
                self.proficiency = ProficiencyRating::new(stars)?;
            }
            RowEdit::HasCertification(has) => {
                self.has_certification = has;
                if !has {
                    self.certification_created = None;
                    self.certification_expires = None;
                }
            }
            RowEdit::CertificationDates { created, expires } => {
                self.certification_created = created;
                self.certification_expires = expires;
            }
        }
        Ok(self.revalidate(policy))
    }

    fn revalidate(&mut self, policy: &dyn EligibilityPolicy) -> EligibilityResult {
        let result = evaluate_with(policy, self.experience, self.proficiency);
        if !result.allowed {
            tracing::debug!(
                experience = %self.experience,
                requested = %self.proficiency,
                max_allowed = %result.max_allowed,
                "clamping proficiency"
            );
        }
        self.proficiency = result.clamped_proficiency;
        self.error = result.message.clone();
        result
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterSkill {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSkillSubmission {
    pub sub_skill_id: u64,
    pub subskill_name: String,
    pub employee_proficiency: ProficiencyRating,
    /// Total months.
    pub experience: ExperienceDuration,
    pub has_certification: bool,
    pub certification_creation_date: Option<NaiveDate>,
    pub certification_expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSubmission {
    pub skill_name: String,
    pub sub_skills: Vec<SubSkillSubmission>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Please resolve duplicate skills before submitting.")]
    UnresolvedDuplicates { sub_skill_ids: Vec<u64> },

    #[error("Select a master skill.")]
    NoMasterSkill,

    #[error("Add at least one sub-skill.")]
    NoRows,

    #[error("Select sub-skill for all entries.")]
    MissingSubSkill { index: usize },

    #[error("Fix errors before submitting: {message}")]
    InvalidRow { index: usize, message: String },
}

/// The new-skill card: one master skill and any number of sub-skill rows.
#[derive(Debug, Clone)]
pub struct SkillSubmissionForm<P: EligibilityPolicy = TieredPolicy> {
    policy: P,
    master_skill: Option<MasterSkill>,
    rows: Vec<SubSkillRow>,
    duplicates: BTreeSet<u64>,
}

impl Default for SkillSubmissionForm<TieredPolicy> {
    fn default() -> Self {
        Self::new(TieredPolicy::default())
    }
}

impl<P: EligibilityPolicy> SkillSubmissionForm<P> {
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            master_skill: None,
            rows: vec![SubSkillRow::new()],
            duplicates: BTreeSet::new(),
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn master_skill(&self) -> Option<&MasterSkill> {
        self.master_skill.as_ref()
    }

    pub fn rows(&self) -> &[SubSkillRow] {
        &self.rows
    }

    /// Switching master skill starts over with a single blank row.
    pub fn select_master_skill(&mut self, skill: MasterSkill) {
        self.master_skill = Some(skill);
        self.rows = vec![SubSkillRow::new()];
        self.duplicates.clear();
    }

    pub fn add_row(&mut self) -> usize {
        self.rows.push(SubSkillRow::new());
        self.rows.len() - 1
    }

    pub fn remove_row(&mut self, index: usize) -> Option<SubSkillRow> {
        if index >= self.rows.len() {
            return None;
        }
        let removed = self.rows.remove(index);
        if let Some(id) = removed.sub_skill_id {
            self.duplicates.remove(&id);
        }
        Some(removed)
    }

    /// Returns `Ok(None)` when `index` is out of range.
    pub fn update_row(&mut self, index: usize, edit: RowEdit) -> Result<Option<EligibilityResult>> {
        let Some(row) = self.rows.get_mut(index) else {
            return Ok(None);
        };
        if let (RowEdit::SubSkill { .. }, Some(previous)) = (&edit, row.sub_skill_id) {
            self.duplicates.remove(&previous);
        }
        row.apply(&self.policy, edit).map(Some)
    }

    pub fn selected_sub_skill_ids(&self) -> Vec<u64> {
        self.rows.iter().filter_map(|row| row.sub_skill_id).collect()
    }

    /// Marks a sub-skill the backend reported as already on the employee's profile.
    pub fn mark_duplicate(&mut self, sub_skill_id: u64) {
        if self.rows.iter().any(|row| row.sub_skill_id == Some(sub_skill_id)) {
            self.duplicates.insert(sub_skill_id);
        }
    }

    pub fn clear_duplicates(&mut self) {
        self.duplicates.clear();
    }

    pub fn is_duplicate(&self, sub_skill_id: u64) -> bool {
        self.duplicates.contains(&sub_skill_id)
    }

    pub fn reset(&mut self) {
        self.master_skill = None;
        self.rows = vec![SubSkillRow::new()];
        self.duplicates.clear();
    }

    /// Builds the payload for the backend, carrying the clamped ratings.
    pub fn submission(&self) -> std::result::Result<SkillSubmission, SubmissionError> {
        if !self.duplicates.is_empty() {
            return Err(SubmissionError::UnresolvedDuplicates {
                sub_skill_ids: self.duplicates.iter().copied().collect(),
            });
        }
        let master = self.master_skill.as_ref().ok_or(SubmissionError::NoMasterSkill)?;
        if self.rows.is_empty() {
            return Err(SubmissionError::NoRows);
        }

        let mut sub_skills = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            let sub_skill_id = row
                .sub_skill_id
                .ok_or(SubmissionError::MissingSubSkill { index })?;
            // a clamp message stays until the row is edited again
            if let Some(message) = row.error().or(row.certification_error()) {
                return Err(SubmissionError::InvalidRow {
                    index,
                    message: message.to_string(),
                });
            }
            sub_skills.push(SubSkillSubmission {
                sub_skill_id,
                subskill_name: row.name.clone(),
                employee_proficiency: row.proficiency,
                experience: row.experience,
                has_certification: row.has_certification,
                certification_creation_date: row.certification_created.filter(|_| row.has_certification),
                certification_expiration_date: row.certification_expires.filter(|_| row.has_certification),
            });
        }

        Ok(SkillSubmission {
            skill_name: master.name.clone(),
            sub_skills,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud() -> MasterSkill {
        MasterSkill {
            id: 7,
            name: "Cloud".to_string(),
        }
    }

    fn lambda() -> RowEdit {
        RowEdit::SubSkill {
            id: 42,
            name: "AWS Lambda".to_string(),
        }
    }

    #[test]
    fn test_new_row_defaults() {
        let row = SubSkillRow::new();
        assert_eq!(row.proficiency(), ProficiencyRating::MIN);
        assert_eq!(row.experience().total_months(), 0);
        assert!(row.error().is_none());
    }

    #[test]
    fn test_star_click_above_cap_is_clamped() {
        let policy = TieredPolicy::default();
        let mut row = SubSkillRow::new();

        let result = row.apply(&policy, RowEdit::Proficiency(5)).unwrap();
        assert!(!result.allowed);
        assert_eq!(row.proficiency().stars(), 2);
        assert_eq!(
            row.error(),
            Some("Proficiency cannot be more than 2 stars for your experience level.")
        );
    }

    #[test]
    fn test_lowering_experience_clamps_existing_rating() {
        let policy = TieredPolicy::default();
        let mut row = SubSkillRow::new();
        row.apply(&policy, RowEdit::Years(6)).unwrap();
        row.apply(&policy, RowEdit::Proficiency(4)).unwrap();
        assert_eq!(row.proficiency().stars(), 4);
        assert!(row.error().is_none());

        row.apply(&policy, RowEdit::Years(3)).unwrap();
        assert_eq!(row.experience().total_months(), 36);
        assert_eq!(row.proficiency().stars(), 3);
        assert!(row.error().is_some());

        // any later edit that passes clears the message
        row.apply(&policy, RowEdit::Months(4)).unwrap();
        assert_eq!(row.experience().total_months(), 40);
        assert!(row.error().is_none());
    }

    #[test]
    fn test_invalid_dropdown_values_leave_row_untouched() {
        let policy = TieredPolicy::default();
        let mut row = SubSkillRow::new();
        row.apply(&policy, RowEdit::Years(4)).unwrap();

        assert!(row.apply(&policy, RowEdit::Months(12)).is_err());
        assert!(row.apply(&policy, RowEdit::Years(11)).is_err());
        assert!(row.apply(&policy, RowEdit::Proficiency(0)).is_err());
        assert_eq!(row.experience().total_months(), 48);
        assert_eq!(row.months(), 0);
    }

    #[test]
    fn test_from_existing_shows_ten_plus_and_keeps_months() {
        let policy = TieredPolicy::default();
        let row = SubSkillRow::from_existing(
            &policy,
            3,
            "Kubernetes",
            ExperienceDuration::from_months(150),
            ProficiencyRating::MAX,
        );
        assert_eq!((row.years(), row.months()), (10, 6));
        assert_eq!(row.experience().total_months(), 150);
        assert_eq!(row.proficiency(), ProficiencyRating::MAX);
        assert!(row.error().is_none());
    }

    #[test]
    fn test_from_existing_clamps_stale_rating() {
        let policy = TieredPolicy::default();
        let row = SubSkillRow::from_existing(
            &policy,
            3,
            "Terraform",
            ExperienceDuration::from_months(12),
            ProficiencyRating::MAX,
        );
        assert_eq!(row.proficiency().stars(), 2);
        assert!(row.error().is_some());
    }

    #[test]
    fn test_certification_dates() {
        let policy = TieredPolicy::default();
        let mut row = SubSkillRow::new();
        row.apply(&policy, RowEdit::HasCertification(true)).unwrap();
        row.apply(
            &policy,
            RowEdit::CertificationDates {
                created: NaiveDate::from_ymd_opt(2024, 5, 1),
                expires: NaiveDate::from_ymd_opt(2023, 5, 1),
            },
        )
        .unwrap();
        assert!(row.certification_error().is_some());

        row.apply(&policy, RowEdit::HasCertification(false)).unwrap();
        assert!(row.certification_error().is_none());
        assert!(row.certification_created.is_none());
    }

    #[test]
    fn test_submission_requires_master_skill_and_sub_skill() {
        let mut form: SkillSubmissionForm = SkillSubmissionForm::default();
        assert_eq!(form.submission(), Err(SubmissionError::NoMasterSkill));

        form.select_master_skill(cloud());
        assert_eq!(
            form.submission(),
            Err(SubmissionError::MissingSubSkill { index: 0 })
        );

        form.remove_row(0);
        assert_eq!(form.submission(), Err(SubmissionError::NoRows));
    }

    #[test]
    fn test_submission_carries_clamped_values() {
        let mut form: SkillSubmissionForm = SkillSubmissionForm::default();
        form.select_master_skill(cloud());
        form.update_row(0, lambda()).unwrap();
        form.update_row(0, RowEdit::Years(1)).unwrap();
        form.update_row(0, RowEdit::Months(6)).unwrap();
        let result = form.update_row(0, RowEdit::Proficiency(5)).unwrap().unwrap();
        assert!(!result.allowed);

        assert_eq!(
            form.submission(),
            Err(SubmissionError::InvalidRow {
                index: 0,
                message: "Proficiency cannot be more than 2 stars for your experience level."
                    .to_string(),
            })
        );

        // picking the clamped star again clears the message
        form.update_row(0, RowEdit::Proficiency(2)).unwrap();
        assert!(form.rows()[0].error().is_none());

        let submission = form.submission().unwrap();
        assert_eq!(submission.skill_name, "Cloud");
        assert_eq!(submission.sub_skills.len(), 1);
        let sub = &submission.sub_skills[0];
        assert_eq!(sub.sub_skill_id, 42);
        assert_eq!(sub.experience.total_months(), 18);
        assert_eq!(sub.employee_proficiency.stars(), 2);
    }

    #[test]
    fn test_clamp_message_blocks_submission() {
        let mut form: SkillSubmissionForm = SkillSubmissionForm::default();
        form.select_master_skill(cloud());
        form.update_row(0, lambda()).unwrap();
        form.update_row(0, RowEdit::Proficiency(5)).unwrap();

        assert!(form.rows()[0].error().is_some());
        assert!(matches!(
            form.submission(),
            Err(SubmissionError::InvalidRow { index: 0, .. })
        ));

        // more experience with the same rating also clears it
        form.update_row(0, RowEdit::Years(3)).unwrap();
        assert!(form.submission().is_ok());
    }

    #[test]
    fn test_duplicates_block_until_cleared() {
        let mut form: SkillSubmissionForm = SkillSubmissionForm::default();
        form.select_master_skill(cloud());
        form.update_row(0, lambda()).unwrap();

        form.mark_duplicate(42);
        form.mark_duplicate(99); // not selected in any row
        assert!(form.is_duplicate(42));
        assert!(!form.is_duplicate(99));
        assert_eq!(
            form.submission(),
            Err(SubmissionError::UnresolvedDuplicates { sub_skill_ids: vec![42] })
        );

        form.update_row(
            0,
            RowEdit::SubSkill {
                id: 43,
                name: "Azure Functions".to_string(),
            },
        )
        .unwrap();
        assert!(!form.is_duplicate(42));
        assert!(form.submission().is_ok());
    }

    #[test]
    fn test_rows_and_reset() {
        let mut form = SkillSubmissionForm::new(TieredPolicy::legacy_binary());
        assert_eq!(form.policy().name(), "legacy");
        form.select_master_skill(cloud());
        assert_eq!(form.add_row(), 1);
        assert_eq!(form.rows().len(), 2);
        assert!(form.update_row(5, RowEdit::Years(1)).unwrap().is_none());
        assert!(form.remove_row(5).is_none());

        form.update_row(1, RowEdit::Years(3)).unwrap();
        form.update_row(1, RowEdit::Proficiency(5)).unwrap();
        assert_eq!(form.rows()[1].proficiency().stars(), 5);

        form.reset();
        assert!(form.master_skill().is_none());
        assert_eq!(form.rows().len(), 1);
        assert!(form.selected_sub_skill_ids().is_empty());
    }
}
