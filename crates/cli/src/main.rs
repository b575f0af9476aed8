//! galpack: split, ship and restore game folders.
//!
//! `upload` packs a directory into an archive, splits it into volumes,
//! uploads every volume and writes a JSON manifest. `download` reverses the
//! whole process from such a manifest.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use galpack_pipeline::{AppConfig, Orchestrator, SessionObserver};

#[derive(Parser, Debug)]
#[command(
    name = "galpack",
    version,
    about = "Split, ship and restore game folders via a file-hosting endpoint"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, short = 'c', default_value = "galpack.json")]
    config: PathBuf,

    /// Override the manifest/extraction directory
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Override the scratch directory for intermediate files
    #[arg(long)]
    work_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a directory, split it into volumes and upload them
    Upload {
        /// Directory to pack and upload
        dir: PathBuf,

        /// Maximum volume size in bytes
        #[arg(long)]
        part_size: Option<u64>,
    },

    /// Download the volumes of a manifest, merge and extract them
    Download {
        /// Manifest JSON written by a previous upload
        manifest: PathBuf,
    },

    /// List manifests written by previous uploads
    History,
}

/// Renders session logs above an indicatif bar tracking the in-flight part.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("[{bar:40}] {percent:>3}%")
                .expect("static progress template")
                .progress_chars("=> "),
        );
        Self { bar }
    }

    fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }
}

impl SessionObserver for CliObserver {
    fn on_log(&self, message: &str) {
        self.bar.println(message);
    }

    fn on_progress(&self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,galpack=debug")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config);
    if let Some(dir) = cli.save_dir {
        config.save_dir = dir;
    }
    if let Some(dir) = cli.work_dir {
        config.work_dir = dir;
    }

    match cli.command {
        Commands::Upload { dir, part_size } => {
            if let Some(size) = part_size {
                config.max_part_size = size;
            }
            let observer = Arc::new(CliObserver::new());
            let bar = observer.bar();
            let mut orchestrator =
                Orchestrator::new(config, observer).with_config_path(cli.config);

            let outcome = orchestrator
                .upload(&dir)
                .await
                .with_context(|| format!("upload of {} failed", dir.display()))?;
            bar.finish_and_clear();
            println!(
                "Uploaded {} volume(s); manifest written to {}",
                outcome.volumes,
                outcome.manifest_path.display()
            );
        }

        Commands::Download { manifest } => {
            let observer = Arc::new(CliObserver::new());
            let bar = observer.bar();
            let mut orchestrator = Orchestrator::new(config, observer);

            let outcome = orchestrator
                .download(&manifest)
                .await
                .with_context(|| format!("download from {} failed", manifest.display()))?;
            bar.finish_and_clear();
            println!("Extracted to {}", outcome.target_dir.display());
        }

        Commands::History => {
            if config.upload_history.is_empty() {
                println!("No uploads recorded yet.");
            } else {
                for path in &config.upload_history {
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}
