//! Proficiency eligibility rule.
//!
//! Experience caps the star rating a sub-skill may claim. Every form and the
//! batch audit go through [`evaluate_with`] so the thresholds live in one place.

use crate::domain::model::{EligibilityResult, ExperienceDuration, ProficiencyRating};
use crate::domain::ports::EligibilityPolicy;
use crate::utils::error::{EligibilityError, Result};
use crate::utils::validation::validate_range;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Experience up to and including `max_years` caps the rating at `max_stars`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyTier {
    pub max_years: f64,
    pub max_stars: u8,
}

const FOUR_TIER_TIERS: [PolicyTier; 3] = [
    PolicyTier { max_years: 2.0, max_stars: 2 },
    PolicyTier { max_years: 5.0, max_stars: 3 },
    PolicyTier { max_years: 10.0, max_stars: 4 },
];

const LEGACY_TIERS: [PolicyTier; 1] = [PolicyTier { max_years: 2.0, max_stars: 2 }];

#[derive(Debug, Clone, PartialEq)]
pub struct TieredPolicy {
    name: Cow<'static, str>,
    tiers: Cow<'static, [PolicyTier]>,
    ceiling: ProficiencyRating,
}

impl TieredPolicy {
    /// ≤2y → 2, ≤5y → 3, ≤10y → 4, beyond → 5.
    pub const FOUR_TIER: TieredPolicy = TieredPolicy {
        name: Cow::Borrowed("four_tier"),
        tiers: Cow::Borrowed(&FOUR_TIER_TIERS),
        ceiling: ProficiencyRating::MAX,
    };

    /// Older rule: only the first two years are capped (at 2 stars).
    pub const LEGACY_BINARY: TieredPolicy = TieredPolicy {
        name: Cow::Borrowed("legacy"),
        tiers: Cow::Borrowed(&LEGACY_TIERS),
        ceiling: ProficiencyRating::MAX,
    };

    pub fn four_tier() -> Self {
        Self::FOUR_TIER
    }

    pub fn legacy_binary() -> Self {
        Self::LEGACY_BINARY
    }

    /// Builds a custom ladder. Tiers must be ascending in years and
    /// non-decreasing in stars, and the ceiling must not undercut the last tier.
    pub fn new(name: impl Into<String>, tiers: Vec<PolicyTier>, ceiling: u8) -> Result<Self> {
        if tiers.is_empty() {
            return Err(EligibilityError::ConfigValidationError {
                field: "policy.tiers".to_string(),
                message: "at least one tier is required".to_string(),
            });
        }

        let mut previous: Option<&PolicyTier> = None;
        for (index, tier) in tiers.iter().enumerate() {
            let field = format!("policy.tiers[{}]", index);
            if !tier.max_years.is_finite() || tier.max_years < 0.0 {
                return Err(EligibilityError::InvalidConfigValueError {
                    field: format!("{}.max_years", field),
                    value: tier.max_years.to_string(),
                    reason: "must be a finite, non-negative number of years".to_string(),
                });
            }
            validate_range(&format!("{}.max_stars", field), tier.max_stars, 1, 5)?;

            if let Some(prev) = previous {
                if tier.max_years <= prev.max_years {
                    return Err(EligibilityError::ConfigValidationError {
                        field,
                        message: format!(
                            "max_years must increase ({} follows {})",
                            tier.max_years, prev.max_years
                        ),
                    });
                }
                if tier.max_stars < prev.max_stars {
                    return Err(EligibilityError::ConfigValidationError {
                        field,
                        message: "more experience cannot lower the allowed stars".to_string(),
                    });
                }
            }
            previous = Some(tier);
        }

        validate_range("policy.ceiling", ceiling, 1, 5)?;
        if let Some(last) = previous {
            if ceiling < last.max_stars {
                return Err(EligibilityError::ConfigValidationError {
                    field: "policy.ceiling".to_string(),
                    message: format!(
                        "ceiling {} is below the last tier's {} stars",
                        ceiling, last.max_stars
                    ),
                });
            }
        }

        Ok(Self {
            name: Cow::Owned(name.into()),
            tiers: Cow::Owned(tiers),
            ceiling: ProficiencyRating::saturating(ceiling),
        })
    }

    pub fn tiers(&self) -> &[PolicyTier] {
        &self.tiers
    }

    pub fn ceiling(&self) -> ProficiencyRating {
        self.ceiling
    }
}

impl Default for TieredPolicy {
    fn default() -> Self {
        Self::FOUR_TIER
    }
}

impl EligibilityPolicy for TieredPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_allowed(&self, experience: ExperienceDuration) -> ProficiencyRating {
        let years = experience.years();
        self.tiers
            .iter()
            .find(|tier| years <= tier.max_years)
            .map(|tier| ProficiencyRating::saturating(tier.max_stars))
            .unwrap_or(self.ceiling)
    }
}

pub fn violation_message(max_allowed: ProficiencyRating) -> String {
    format!(
        "Proficiency cannot be more than {} stars for your experience level.",
        max_allowed
    )
}

pub fn evaluate_with<P>(
    policy: &P,
    experience: ExperienceDuration,
    proficiency: ProficiencyRating,
) -> EligibilityResult
where
    P: EligibilityPolicy + ?Sized,
{
    let max_allowed = policy.max_allowed(experience);
    let allowed = proficiency <= max_allowed;

    EligibilityResult {
        allowed,
        max_allowed,
        clamped_proficiency: proficiency.min(max_allowed),
        message: (!allowed).then(|| violation_message(max_allowed)),
    }
}

/// Evaluates against the four-tier policy.
pub fn evaluate(experience: ExperienceDuration, proficiency: ProficiencyRating) -> EligibilityResult {
    evaluate_with(&TieredPolicy::FOUR_TIER, experience, proficiency)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stars(n: u8) -> ProficiencyRating {
        ProficiencyRating::new(n).unwrap()
    }

    fn months(n: u32) -> ExperienceDuration {
        ExperienceDuration::from_months(n)
    }

    #[test]
    fn test_tier_boundaries() {
        let cases = [(0, 2), (24, 2), (25, 3), (30, 3), (60, 3), (61, 4), (120, 4), (121, 5), (600, 5)];
        for (total, expected) in cases {
            let result = evaluate(months(total), stars(1));
            assert_eq!(result.max_allowed.stars(), expected, "total_months = {}", total);
        }
    }

    #[test]
    fn test_violation_is_clamped_with_message() {
        let result = evaluate(months(18), stars(5));
        assert_eq!(
            result,
            EligibilityResult {
                allowed: false,
                max_allowed: stars(2),
                clamped_proficiency: stars(2),
                message: Some(
                    "Proficiency cannot be more than 2 stars for your experience level.".to_string()
                ),
            }
        );
    }

    #[test]
    fn test_allowed_results_have_no_message() {
        let result = evaluate(months(72), stars(3));
        assert!(result.allowed);
        assert_eq!(result.max_allowed, stars(4));
        assert_eq!(result.clamped_proficiency, stars(3));
        assert_eq!(result.message, None);

        let result = evaluate(months(0), stars(1));
        assert!(result.allowed);
        assert_eq!(result.max_allowed, stars(2));
        assert_eq!(result.clamped_proficiency, stars(1));
        assert_eq!(result.message, None);
    }

    #[test]
    fn test_clamp_never_exceeds_cap_or_input() {
        for total in 0..=200 {
            for p in 1..=5 {
                let result = evaluate(months(total), stars(p));
                assert!(result.clamped_proficiency <= result.max_allowed);
                assert!(result.clamped_proficiency <= stars(p));
                assert_eq!(result.allowed, result.message.is_none());
            }
        }
    }

    #[test]
    fn test_clamped_value_is_accepted_on_reevaluation() {
        for total in 0..=200 {
            for p in 1..=5 {
                let first = evaluate(months(total), stars(p));
                let second = evaluate(months(total), first.clamped_proficiency);
                assert!(second.allowed, "total_months = {}, p = {}", total, p);
                assert_eq!(second.clamped_proficiency, first.clamped_proficiency);
            }
        }
    }

    #[test]
    fn test_legacy_policy_only_caps_first_two_years() {
        let legacy = TieredPolicy::legacy_binary();
        assert_eq!(legacy.name(), "legacy");
        assert_eq!(legacy.max_allowed(months(24)), stars(2));
        assert_eq!(legacy.max_allowed(months(25)), stars(5));

        let result = evaluate_with(&legacy, months(36), stars(5));
        assert!(result.allowed);
    }

    #[test]
    fn test_custom_policy() {
        let policy = TieredPolicy::new(
            "strict",
            vec![
                PolicyTier { max_years: 1.0, max_stars: 1 },
                PolicyTier { max_years: 3.0, max_stars: 3 },
            ],
            4,
        )
        .unwrap();

        assert_eq!(policy.name(), "strict");
        assert_eq!(policy.max_allowed(months(12)), stars(1));
        assert_eq!(policy.max_allowed(months(13)), stars(3));
        assert_eq!(policy.max_allowed(months(400)), stars(4));

        let dyn_policy: &dyn EligibilityPolicy = &policy;
        let result = evaluate_with(dyn_policy, months(400), stars(5));
        assert_eq!(
            result.message.as_deref(),
            Some("Proficiency cannot be more than 4 stars for your experience level.")
        );
    }

    #[test]
    fn test_custom_policy_rejects_bad_ladders() {
        assert!(TieredPolicy::new("empty", vec![], 5).is_err());
        assert!(TieredPolicy::new(
            "descending",
            vec![
                PolicyTier { max_years: 5.0, max_stars: 2 },
                PolicyTier { max_years: 2.0, max_stars: 3 },
            ],
            5,
        )
        .is_err());
        assert!(TieredPolicy::new(
            "lowering",
            vec![
                PolicyTier { max_years: 2.0, max_stars: 3 },
                PolicyTier { max_years: 5.0, max_stars: 2 },
            ],
            5,
        )
        .is_err());
        assert!(TieredPolicy::new(
            "stars",
            vec![PolicyTier { max_years: 2.0, max_stars: 6 }],
            5,
        )
        .is_err());
        assert!(TieredPolicy::new(
            "nan",
            vec![PolicyTier { max_years: f64::NAN, max_stars: 2 }],
            5,
        )
        .is_err());
        assert!(TieredPolicy::new(
            "low-ceiling",
            vec![PolicyTier { max_years: 2.0, max_stars: 3 }],
            2,
        )
        .is_err());
    }

    #[test]
    fn test_default_is_four_tier() {
        assert_eq!(TieredPolicy::default(), TieredPolicy::four_tier());
        assert_eq!(TieredPolicy::default().tiers().len(), 3);
        assert_eq!(TieredPolicy::default().ceiling(), ProficiencyRating::MAX);
    }
}
