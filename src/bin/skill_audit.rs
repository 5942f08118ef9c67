use clap::Parser;
use skill_eligibility::config::toml_config::PolicyVariant;
use skill_eligibility::core::ConfigProvider;
use skill_eligibility::utils::{logger, validation::Validate};
use skill_eligibility::{
    AuditArgs, AuditConfig, AuditEngine, AuditPipeline, EligibilityError, EligibilityPolicy,
    LocalStorage,
};

fn load_config(args: &AuditArgs) -> Result<AuditConfig, EligibilityError> {
    let mut config = match &args.config {
        Some(path) => AuditConfig::from_file(path)?,
        None => {
            let input = args
                .input
                .clone()
                .ok_or_else(|| EligibilityError::MissingConfigError {
                    field: "input.path (use --input or --config)".to_string(),
                })?;
            AuditConfig::new(input, args.output_path.clone().unwrap_or_else(|| "./output".to_string()))
        }
    };

    // 應用命令列覆蓋設定
    if let Some(input) = &args.input {
        config.input.path = input.clone();
    }
    if let Some(output_path) = &args.output_path {
        config.output.path = output_path.clone();
    }
    if !args.formats.is_empty() {
        config.output.formats = args.formats.clone();
    }
    if let Some(variant) = args.policy {
        config.policy.variant = variant.into();
    }
    if args.fail_on_invalid {
        config.input.on_invalid_row = Some("fail".to_string());
    }

    Ok(config)
}

fn print_plan(config: &AuditConfig, policy: &dyn EligibilityPolicy) {
    println!("🔍 Dry run: {}", config.name());
    println!("  📄 Input:   {}", config.input_path());
    println!("  📁 Output:  {}", config.output_path());
    println!("  🧾 Formats: {}", config.output_formats().join(", "));
    println!("  ⭐ Policy:  {}", policy.name());
    if config.policy.variant == PolicyVariant::Custom {
        for tier in config.policy.tiers.iter().flatten() {
            println!("      ≤ {} years → {} stars", tier.max_years, tier.max_stars);
        }
    }
    println!(
        "  🚦 Invalid rows: {}",
        if config.fail_on_invalid_row() { "fail" } else { "skip" }
    );
}

fn fail(e: &EligibilityError) -> ! {
    tracing::error!(
        "❌ Skill audit failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let args = AuditArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            logger::init_logger(args.verbose, args.json_logs);
            fail(&e);
        }
    };

    logger::init_logger(args.verbose || config.verbose(), args.json_logs || config.json_logs());
    tracing::info!("🚀 Starting skill audit '{}'", config.name());

    if let Err(e) = config.validate() {
        fail(&e);
    }

    let policy = match config.build_policy() {
        Ok(policy) => policy,
        Err(e) => fail(&e),
    };

    if args.dry_run {
        print_plan(&config, &policy);
        return;
    }

    let output_path = config.output_path().to_string();
    let pipeline = AuditPipeline::new(LocalStorage::default(), config, policy, output_path);
    let engine = AuditEngine::new(pipeline);

    match engine.run().await {
        Ok(run) => {
            let summary = run.summary;
            println!("✅ Audited {} rows", summary.total);
            println!(
                "   {} compliant, {} above their experience cap, {} invalid",
                summary.compliant, summary.violations, summary.invalid
            );
            for path in &run.outputs {
                println!("📁 Report saved to: {}", path);
            }
        }
        Err(e) => fail(&e),
    }
}
