use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use camroll_core::{
    storage, CancellationToken, CancelledError, Config, LocalStorage, RelocationReport,
};

#[derive(Parser)]
#[command(
    name = "camroll",
    version,
    about = "Relocate camera-roll media between mounted cloud drives under canonical date-derived names"
)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Local working directory for in-flight downloads (defaults to the
    /// system temp directory)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Process only the named origin profile
    #[arg(long)]
    profile: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let t_total = std::time::Instant::now();

    let config = Config::load(&cli.config)?;
    let work_dir = cli.work_dir.unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&work_dir)
        .with_context(|| format!("creating work dir {}", work_dir.display()))?;

    let token = CancellationToken::new();
    {
        let token = token.clone();
        ctrlc::set_handler(move || token.cancel()).context("installing Ctrl-C handler")?;
    }

    let destination = LocalStorage::new(&config.destination.mount);
    let mut totals = RelocationReport::default();
    let mut cancelled = false;

    for origin_config in &config.origins {
        if let Some(ref only) = cli.profile {
            if &origin_config.profile_name != only {
                continue;
            }
        }

        info!("processing origin profile: {}", origin_config.profile_name);
        let origin = LocalStorage::new(&origin_config.mount);
        let destination_root = storage::join_remote(
            &config.destination.path,
            &origin_config.destination_folder,
        );

        match camroll_core::relocate_tree(
            &origin,
            &destination,
            &origin_config.source_path,
            &destination_root,
            &config.constants,
            &work_dir,
            Some(&token),
        ) {
            Ok(report) => totals.merge(report),
            Err(err) if err.is::<CancelledError>() => {
                cancelled = true;
                break;
            }
            Err(err) => return Err(err),
        }
    }

    if cancelled {
        eprintln!("Cancelled; origin files still pending remain in place.");
    }
    eprintln!(
        "Done! {} files relocated, {} duplicates discarded, {} failed, {} skipped, {} folders removed ({:.2}s)",
        totals.files_relocated,
        totals.duplicates_discarded,
        totals.files_failed,
        totals.files_skipped,
        totals.folders_removed,
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
