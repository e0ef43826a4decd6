use clap::Parser;
use cv_batch::adapters::load_spreadsheet;
use cv_batch::core::merge::merge;
use cv_batch::utils::{logger, validation::Validate};
use cv_batch::{
    BatchConfig, BatchEngine, BatchReport, CliConfig, CvError, DocxRenderer, LocalStorage,
    ProfileOutcome, ProfileStore, Result,
};

fn load_profiles(config: &BatchConfig) -> Result<Vec<cv_batch::Profile>> {
    let store = ProfileStore::new(LocalStorage::new());
    let profiles_file = config.profiles_file();
    let extra_file = config.extra_file();

    if config.merge_extra {
        let merged = store
            .merge_into_store(&extra_file, &profiles_file)
            .map_err(|e| match e {
                CvError::MergeError { .. } => e,
                other => CvError::MergeError {
                    message: format!(
                        "{} -> {}: {}",
                        extra_file.display(),
                        profiles_file.display(),
                        other
                    ),
                },
            })?;
        if let Some(total) = merged {
            tracing::info!(
                "🔀 Merged {} into {} ({} profiles)",
                extra_file.display(),
                profiles_file.display(),
                total
            );
        }
    }

    let profiles = store.load(&profiles_file)?;
    tracing::info!("📥 Loaded {} profiles from {}", profiles.len(), profiles_file.display());

    let mut profiles = match store.merge_with_auxiliary(profiles.clone(), &extra_file) {
        Ok((merged, added)) => {
            if added > 0 {
                tracing::info!("➕ {} additional profiles from {}", added, extra_file.display());
            }
            merged
        }
        Err(e) => {
            tracing::warn!("⚠️ Ignoring {}: {}", extra_file.display(), e);
            profiles
        }
    };

    if let Some(sheet) = config.spreadsheet() {
        let from_sheet = load_spreadsheet(&sheet, &config.photo_resolver())?;
        let before = profiles.len();
        profiles = merge([profiles, from_sheet]);
        tracing::info!(
            "📊 {} additional profiles from {}",
            profiles.len() - before,
            sheet.display()
        );
    }

    Ok(profiles)
}

fn run(config: &BatchConfig) -> Result<BatchReport> {
    let profiles = load_profiles(config)?;

    let engine = BatchEngine::new(
        config.batch_options(),
        config.photo_resolver(),
        DocxRenderer::new(),
    );
    #[cfg(feature = "photos")]
    let engine = engine.with_codec(Box::new(cv_batch::adapters::JpegCodec::new(
        config.processed_dir(),
    )));

    engine.run(&profiles)
}

fn fail(e: &CvError) -> ! {
    tracing::error!(
        "❌ cv-batch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 致命錯誤一律非零結束
    std::process::exit(e.exit_code().max(1));
}

fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("Starting cv-batch");

    let config = match cli.to_batch_config() {
        Ok(config) => config,
        Err(e) => fail(&e),
    };
    if cli.verbose {
        tracing::debug!("Batch config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    match run(&config) {
        Ok(report) => {
            for result in &report.results {
                match &result.outcome {
                    ProfileOutcome::RenderedDegraded { note, .. } => {
                        tracing::debug!("'{}' rendered without photo: {}", result.name, note)
                    }
                    ProfileOutcome::SkippedInvalid { missing } => {
                        tracing::debug!("'{}' skipped: missing {}", result.name, missing.join(", "))
                    }
                    _ => {}
                }
            }

            println!(
                "✅ Documents generated: {} -> {}",
                report.rendered(),
                config.output_dir().display()
            );
            if report.skipped() + report.errored() > 0 {
                println!(
                    "⚠️ Skipped: {}, failed: {}, warnings: {}",
                    report.skipped(),
                    report.errored(),
                    report.warnings
                );
            }
        }
        Err(e) => fail(&e),
    }
}
