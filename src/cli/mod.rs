use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::pipeline::{self, catalog::SpotdlCli, summary, tagger::FfmpegTagger};
use crate::storage::{fs, references::load_references};

#[derive(Parser)]
#[command(name = "trackferry")]
#[command(version = "0.1")]
#[command(about = "Downloads saved tracks and embeds cover artwork")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download every track of the reference list and tag it with artwork
    Run {
        /// File with one track reference per line
        #[arg(short, long, default_value = "spotify_urls.txt")]
        references: PathBuf,

        /// Also write the run summary as JSON to this path
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },
    /// Check that the external tools are installed
    Check,
    /// Remove temporary tagging files left behind by interrupted runs
    Clean,
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match &cli.command {
        Commands::Run {
            references,
            summary_json,
        } => {
            let refs = load_references(references)?;
            fs::ensure_dir(&cfg.output.dir).with_context(|| {
                format!(
                    "Failed to create output folder {}",
                    cfg.output.dir.to_string_lossy()
                )
            })?;

            warn_if_ffmpeg_missing(&FfmpegTagger::new(&cfg.tagging));

            let mut runner = pipeline::build_runner(&cfg, &cfg.output.dir)?;
            let result = runner.run(&refs);

            println!("\n{}", summary::render(&result));
            if let Some(path) = summary_json {
                summary::write_json(&result, path)?;
                println!("Summary written to {}", path.to_string_lossy());
            }
            println!(
                "Processing complete. Files are in {}",
                cfg.output.dir.to_string_lossy()
            );
        }

        Commands::Check => {
            let tagger = FfmpegTagger::new(&cfg.tagging);
            match tagger.probe() {
                Ok(version) => println!("ffmpeg: {version}"),
                Err(_) => println!(
                    "ffmpeg: not found at {} (album art embedding will be skipped)",
                    tagger.program().to_string_lossy()
                ),
            }

            let catalog = SpotdlCli::new(&cfg.catalog, &cfg.output);
            match catalog.probe() {
                Ok(version) => println!("spotdl: {version}"),
                Err(e) => println!("spotdl: unavailable, {e}"),
            }
        }

        Commands::Clean => {
            let removed = fs::remove_stale_temp_files(&cfg.output.dir).with_context(|| {
                format!(
                    "Failed to clean output folder {}",
                    cfg.output.dir.to_string_lossy()
                )
            })?;
            println!("Removed {} leftover temporary files:", removed.len());
            for path in &removed {
                println!("    - {}", path.to_string_lossy());
            }
        }
    }

    Ok(())
}

fn warn_if_ffmpeg_missing(tagger: &FfmpegTagger) {
    if let Err(e) = tagger.probe() {
        log::warn!(
            "ffmpeg is not installed or not in PATH ({e}). Album art embedding may not work."
        );
    }
}
