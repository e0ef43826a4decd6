use anyhow::Context;
use clap::Parser;
use cv_batch::utils::logger;
use cv_batch::{LocalStorage, MergeCliConfig, ProfileStore};

fn main() -> anyhow::Result<()> {
    let cli = MergeCliConfig::parse();
    logger::init_cli_logger(cli.verbose);

    let inputs = cli
        .resolve_inputs()
        .with_context(|| format!("Nothing merged into {}", cli.target.display()))?;
    tracing::info!("🔀 Merging {} files into {}", inputs.len(), cli.target.display());

    let store = ProfileStore::new(LocalStorage::new());
    let total = store
        .merge_files(&inputs, &cli.target)
        .with_context(|| format!("Cannot write {}", cli.target.display()))?;

    println!("✅ {} profiles in {}", total, cli.target.display());
    Ok(())
}
