use anyhow::Context;
use assessor_etl::core::{ConfigProvider, DocumentSource, RunSummary};
use assessor_etl::utils::error::ErrorSeverity;
use assessor_etl::utils::{logger, validation::Validate};
use assessor_etl::{
    ClaimPipeline, CliConfig, CsvSink, EtlEngine, LocalStorage, TomlConfig, VertexClient,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting assessor-etl");

    let config = match args.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    tracing::debug!("Effective config: {:?}", config);

    display_config_summary(&config, &args);

    let storage = LocalStorage::new(config.input_folder());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        return perform_dry_run(&storage).await;
    }

    let instruction = config
        .load_instruction()
        .context("Failed to load extraction instruction")?;
    let model = VertexClient::new(&config.model).context("Failed to build model client")?;
    let pipeline = ClaimPipeline::new(storage, model, &config, instruction)?;

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    let output_path = config.output_path();
    match engine.run_into(|| CsvSink::create(output_path)).await {
        Ok(summary) => {
            tracing::debug!(
                "Run summary: {}",
                serde_json::to_string(&summary).unwrap_or_default()
            );
            print_summary(&summary);
        }
        Err(e) => {
            tracing::error!(
                "❌ Extraction run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &CliConfig) {
    println!("📋 Configuration Summary:");
    println!("  Pipeline: {}", config.pipeline_name());
    println!(
        "  Model: {} ({} / {})",
        config.model.name(),
        config.model.project.as_deref().unwrap_or("-"),
        config.model.location()
    );
    println!("  Input: {}", config.input_folder());
    println!("  Output: {}", config.output_path());
    println!(
        "  Retries: {} (backoff {}s per retry)",
        config.max_retries(),
        config.backoff_seconds()
    );
    println!("  Multi-incident reports: {}", config.multi_incident());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(storage: &LocalStorage) -> anyhow::Result<()> {
    let listing = storage
        .list_documents()
        .await
        .with_context(|| format!("Failed to list {}", storage.base_path().display()))?;

    println!("🔍 Dry Run Analysis:");
    println!("  Documents to process: {}", listing.documents.len());
    for document in &listing.documents {
        println!("    📄 {}", document.name);
    }
    if !listing.skipped.is_empty() {
        println!("  Skipped entries: {}", listing.skipped.len());
        for name in &listing.skipped {
            println!("    ⏭️  {}", name);
        }
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("--- Extraction Summary ---");
    println!("Total PDFs processed (attempted): {}", summary.attempted());
    println!("Successfully processed PDFs: {} files", summary.succeeded);
    println!("       Total extracted rows: {} rows", summary.rows_extracted);
    println!("Errors encountered PDFs: {} files", summary.failed);
    println!("Skipped non-PDF entries: {}", summary.skipped);
    println!("Elapsed: {:.2}s", summary.elapsed.as_secs_f64());
    println!("✅ Extraction complete! Data saved to: {}", summary.output_path);
}
