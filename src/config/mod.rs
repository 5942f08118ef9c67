pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use args::{AuditArgs, CliConfig, CliPolicy};

#[cfg(feature = "cli")]
mod args {
    use crate::config::toml_config::PolicyVariant;
    use crate::core::eligibility::TieredPolicy;
    use crate::domain::model::{ExperienceDuration, ProficiencyRating};
    use crate::utils::error::Result;
    use crate::utils::validation::Validate;
    use clap::{Parser, ValueEnum};

    /// Policies selectable by name; custom ladders only come from a config file.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
    pub enum CliPolicy {
        #[default]
        FourTier,
        Legacy,
    }

    impl From<CliPolicy> for PolicyVariant {
        fn from(policy: CliPolicy) -> Self {
            match policy {
                CliPolicy::FourTier => PolicyVariant::FourTier,
                CliPolicy::Legacy => PolicyVariant::Legacy,
            }
        }
    }

    #[derive(Debug, Clone, Parser)]
    #[command(name = "skill-eligibility")]
    #[command(about = "Check a self-rated proficiency against claimed experience")]
    pub struct CliConfig {
        /// Years of experience (0-10, where 10 means 10+)
        #[arg(long, default_value_t = 0)]
        pub years: u32,

        /// Additional months of experience (0-11)
        #[arg(long, default_value_t = 0)]
        pub months: u32,

        /// Total experience in months, instead of --years/--months
        #[arg(long, conflicts_with_all = ["years", "months"])]
        pub total_months: Option<u32>,

        /// Requested proficiency in stars (1-5)
        #[arg(short, long)]
        pub stars: u8,

        #[arg(long, value_enum, default_value_t = CliPolicy::FourTier)]
        pub policy: CliPolicy,

        /// Print the result as JSON
        #[arg(long)]
        pub json: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub json_logs: bool,
    }

    impl CliConfig {
        pub fn experience(&self) -> Result<ExperienceDuration> {
            match self.total_months {
                Some(total) => Ok(ExperienceDuration::from_months(total)),
                None => ExperienceDuration::from_years_months(self.years, self.months),
            }
        }

        pub fn rating(&self) -> Result<ProficiencyRating> {
            ProficiencyRating::new(self.stars)
        }

        pub fn build_policy(&self) -> TieredPolicy {
            match self.policy {
                CliPolicy::FourTier => TieredPolicy::four_tier(),
                CliPolicy::Legacy => TieredPolicy::legacy_binary(),
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            self.experience()?;
            self.rating()?;
            Ok(())
        }
    }

    #[derive(Debug, Clone, Parser)]
    #[command(name = "skill-audit")]
    #[command(about = "Audit an exported sub-skill sheet against the eligibility policy")]
    pub struct AuditArgs {
        /// Path to TOML configuration file
        #[arg(short, long)]
        pub config: Option<String>,

        /// CSV sheet to audit (overrides input.path)
        #[arg(short, long)]
        pub input: Option<String>,

        /// Report directory (overrides output.path)
        #[arg(short, long)]
        pub output_path: Option<String>,

        /// Report formats, comma separated (overrides output.formats)
        #[arg(long, value_delimiter = ',')]
        pub formats: Vec<String>,

        /// Override policy.variant
        #[arg(long, value_enum)]
        pub policy: Option<CliPolicy>,

        /// Abort on the first unreadable row instead of reporting it
        #[arg(long)]
        pub fail_on_invalid: bool,

        /// Validate configuration and show the plan without auditing
        #[arg(long)]
        pub dry_run: bool,

        #[arg(short, long)]
        pub verbose: bool,

        #[arg(long)]
        pub json_logs: bool,
    }

}
