use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use stormfield::cli::commands::{self, RenderOptions};
use stormfield::config::simulation::SimulationConfig;
use stormfield::persistence;

#[derive(Parser)]
#[command(name = "stormfield")]
#[command(about = "A synthetic tropical-cyclone simulator with reflectivity fields and forecast tracks")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn a storm and run it until it dissipates or max_ticks elapse
    Run {
        /// Genesis parameters file (defaults to the basin's typical genesis point)
        #[arg(short, long)]
        genesis: Option<String>,

        /// Continue from a snapshot file instead of spawning a new storm
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Project forecast tracks from a snapshot and print them as JSON
    Forecast {
        /// Snapshot file (defaults to the newest valid snapshot)
        #[arg(short, long)]
        snapshot: Option<String>,
    },

    /// Rasterize the reflectivity field around the storm as JSON
    Render {
        #[arg(short, long)]
        snapshot: Option<String>,

        #[arg(long, default_value_t = 256)]
        width: usize,

        #[arg(long, default_value_t = 256)]
        height: usize,

        /// Half width of the window in degrees
        #[arg(long, default_value_t = 8.0)]
        half_width: f64,

        /// Noise seed for the field
        #[arg(long, default_value_t = 0)]
        seed: u32,

        /// Also evaluate with the sequential sampler and fail on any difference
        #[arg(long)]
        verify: bool,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show the run and storm in the newest snapshot
    Inspect {
        /// Print the full track
        #[arg(long)]
        track: bool,
    },

    /// Manage run snapshots
    Snapshots {
        #[command(subcommand)]
        action: SnapshotAction,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// List available snapshots
    List {
        /// Snapshot directory
        #[arg(short, long, default_value = "snapshots")]
        dir: String,
    },

    /// Restore and display a run from a snapshot file
    Restore {
        /// Path to the snapshot file
        file: String,
    },
}

fn load_config(path: &str) -> SimulationConfig {
    let config = match SimulationConfig::from_file(Path::new(path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_level, &config.log_format);
    config
}

/// RUST_LOG overrides the configured level.
fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { genesis, resume } => {
            let config = load_config(&cli.config);
            if let Err(e) = commands::run_simulation(&config, genesis.as_deref(), resume.as_deref()) {
                eprintln!("Simulation error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Forecast { snapshot } => {
            let config = load_config(&cli.config);
            if let Err(e) = commands::forecast(&config, snapshot.as_deref()) {
                eprintln!("Forecast error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Render {
            snapshot,
            width,
            height,
            half_width,
            seed,
            verify,
            output,
        } => {
            let config = load_config(&cli.config);
            let options = RenderOptions {
                width,
                height,
                half_width_deg: half_width,
                seed,
                verify,
                output,
            };
            if let Err(e) = commands::render(&config, snapshot.as_deref(), &options) {
                eprintln!("Render error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Inspect { track } => {
            let config = load_config(&cli.config);
            if let Err(e) = commands::inspect(&config, track) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Snapshots { action } => match action {
            SnapshotAction::List { dir } => {
                let snapshot_dir = Path::new(&dir);
                match persistence::list_snapshots(snapshot_dir) {
                    Ok(snapshots) if snapshots.is_empty() => {
                        println!("No snapshots found in {}", snapshot_dir.display());
                    }
                    Ok(snapshots) => {
                        println!("{:<40} {:>8} {:>12}", "File", "Tick", "Size");
                        println!("{}", "-".repeat(62));
                        for s in &snapshots {
                            let name = s.path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
                            println!("{:<40} {:>8} {:>9} KB", name, s.tick_count, s.file_size / 1024);
                        }
                        println!("\n{} snapshot(s) in {}", snapshots.len(), snapshot_dir.display());
                    }
                    Err(e) => {
                        eprintln!("Error listing snapshots: {}", e);
                        std::process::exit(1);
                    }
                }
            }
            SnapshotAction::Restore { file } => {
                let path = Path::new(&file);
                match persistence::load_snapshot(path) {
                    Ok(ctx) => {
                        println!("Restored run from {}", path.display());
                        commands::print_context_summary(&ctx);
                    }
                    Err(e) => {
                        eprintln!("Error restoring snapshot: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        },
    }
}
