use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use mediorg_core::{ItemOutcome, OfflineGeocoder, OrganizeOptions, Placement};

#[derive(Parser)]
#[command(
    name = "mediorg",
    version,
    about = "Organize photos and videos by capture date and location"
)]
struct Cli {
    /// Source directory containing photos and videos
    #[arg(short, long)]
    source: PathBuf,

    /// Output directory for organized media
    #[arg(short, long)]
    output: PathBuf,

    /// Move files instead of copying them
    #[arg(long = "move")]
    move_files: bool,

    /// Show what would be done without touching any files
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let t_total = std::time::Instant::now();

    let options = OrganizeOptions {
        source: cli.source,
        dest: cli.output,
        move_files: cli.move_files,
        dry_run: cli.dry_run,
    };

    if options.dry_run {
        eprintln!("Dry run: no files will be copied or moved");
    }

    let bar = Arc::new(Mutex::new(ProgressBar::hidden()));
    let geocoder = OfflineGeocoder::new();

    let progress_bar = Arc::clone(&bar);
    let stats = mediorg_core::organize(
        &options,
        &geocoder,
        &move |stage, current, total, _message| {
            let bar = &progress_bar;
            let bar = bar.lock().unwrap();
            if bar.length() != Some(total) {
                bar.set_length(total);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{prefix:>9} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap()
                    .progress_chars("=> "),
                );
                bar.set_prefix(stage.to_string());
                bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            }
            bar.set_position(current + 1);
        },
        &|outcome: &ItemOutcome| match outcome.placement {
            Placement::Placed | Placement::RenamedPlaced => {
                if let Some(dest) = &outcome.dest {
                    log::info!("{} -> {}", outcome.source.display(), dest.display());
                }
            }
            Placement::SkippedDuplicate => {
                log::info!("skipping duplicate {}", outcome.source.display());
            }
            Placement::Failed => {
                log::error!("{}: {}", outcome.source.display(), outcome.reason);
            }
        },
    )?;

    bar.lock().unwrap().finish_and_clear();

    eprintln!(
        "Done! {} files found: {} placed, {} renamed, {} duplicates skipped, {} failed ({:.2}s)",
        stats.discovered,
        stats.placed,
        stats.renamed,
        stats.skipped_duplicate,
        stats.failed,
        t_total.elapsed().as_secs_f64()
    );

    if !stats.by_source.is_empty() {
        let breakdown: Vec<String> = stats
            .by_source
            .iter()
            .map(|(source, count)| format!("{source}: {count}"))
            .collect();
        eprintln!("Timestamp sources: {}", breakdown.join(", "));
    }

    for (path, reason) in &stats.failures {
        eprintln!("  failed: {} ({reason})", path.display());
    }

    Ok(())
}
