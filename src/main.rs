use clap::Parser;
use skill_eligibility::utils::{logger, validation::Validate};
use skill_eligibility::{evaluate_with, CliConfig, EligibilityError, EligibilityPolicy};

const VIOLATION_EXIT_CODE: i32 = 4;

fn run(config: &CliConfig) -> Result<bool, EligibilityError> {
    config.validate()?;

    let policy = config.build_policy();
    let experience = config.experience()?;
    let rating = config.rating()?;
    tracing::debug!(
        policy = policy.name(),
        experience = %experience,
        stars = %rating,
        "evaluating"
    );

    let result = evaluate_with(&policy, experience, rating);

    if config.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if let Some(message) = &result.message {
        println!("❌ {}", message);
        println!("💡 Proficiency adjusted to {} stars", result.clamped_proficiency);
    } else {
        println!(
            "✅ {} stars allowed for {} (maximum {})",
            rating, experience, result.max_allowed
        );
    }

    Ok(result.allowed)
}

fn main() {
    let config = CliConfig::parse();

    logger::init_logger(config.verbose, config.json_logs);

    match run(&config) {
        // 違反政策不是錯誤，以結束碼 4 與其他錯誤區分
        Ok(allowed) => std::process::exit(if allowed { 0 } else { VIOLATION_EXIT_CODE }),
        Err(e) => {
            tracing::error!(
                "❌ Evaluation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
