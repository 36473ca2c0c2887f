use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use islandsim::cli::commands;
use islandsim::config::generation::GenerationParams;
use islandsim::config::simulation::SimulationConfig;
use islandsim::persistence;
use islandsim::world::generation::{generate_island, print_island_summary};
use islandsim::world::StructureKind;

#[derive(Parser)]
#[command(name = "islandsim")]
#[command(about = "An island ecosystem simulation with terrain, weather, governance and wildlife")]
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
    /// Generate a new island from procedural parameters
    Generate {
        /// Path to island generation config file
        #[arg(short, long, default_value = "worldgen.toml")]
        worldgen: String,

        /// Output snapshot directory
        #[arg(short, long, default_value = "snapshots")]
        output: String,
    },

    /// Run the simulation
    Run {
        /// Path to a specific island snapshot to load
        #[arg(short, long)]
        world: Option<String>,

        /// Run this many ticks headless instead of in real time
        #[arg(short, long)]
        ticks: Option<u64>,
    },

    /// Inspect island or tile state
    Inspect {
        /// Tile coordinate to inspect, as X,Y
        #[arg(short, long, value_parser = commands::parse_tile)]
        tile: Option<(i32, i32)>,

        /// Show island-level summary statistics
        #[arg(long)]
        world: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a structure on the latest island snapshot
    Build {
        /// village, farm, lighthouse or windmill
        kind: StructureKind,

        /// Centre tile, as X,Y
        #[arg(short, long, value_parser = commands::parse_tile)]
        at: (i32, i32),
    },

    /// Manage island snapshots
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

    /// Restore and display an island from a snapshot file
    Restore {
        /// Path to the snapshot file
        file: String,
    },
}

fn init_tracing(config: &SimulationConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// The config file is optional for commands that can run on defaults.
fn load_config(path: &str) -> SimulationConfig {
    let path = Path::new(path);
    let result = if path.exists() {
        SimulationConfig::from_file(path)
    } else {
        SimulationConfig::from_toml_str("", path)
    };
    match result {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_species_or_exit(config: &SimulationConfig) -> islandsim::world::SpeciesTable {
    match commands::load_species(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading species: {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(&cli.config);
    init_tracing(&config);

    match cli.command {
        Commands::Generate { worldgen, output } => {
            let params = match GenerationParams::from_file(Path::new(&worldgen)) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error loading generation config: {}", e);
                    std::process::exit(1);
                }
            };
            let species = load_species_or_exit(&config);
            println!("Generating island from {}...", worldgen);
            let island = generate_island(&params, &species, config.max_animals);
            print_island_summary(&island, &species);

            let snapshot_dir = Path::new(&output);
            match persistence::save_snapshot(&island, snapshot_dir) {
                Ok(path) => println!("\nIsland saved to {}", path.display()),
                Err(e) => {
                    eprintln!("Cannot save snapshot: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Run { world, ticks } => {
            let species = load_species_or_exit(&config);
            if let Err(e) =
                commands::run_simulation(&config, species, world.as_deref(), ticks).await
            {
                eprintln!("Simulation error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Inspect { tile, world, json } => {
            let species = load_species_or_exit(&config);
            if let Err(e) = commands::inspect(&config, &species, tile, world, json) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Build { kind, at } => match commands::build_structure(&config, kind, at) {
            Ok(path) => println!("{} built at ({}, {}). Saved to {}", kind.name(), at.0, at.1, path.display()),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },

        Commands::Snapshots { action } => match action {
            SnapshotAction::List { dir } => {
                let snapshot_dir = Path::new(&dir);
                match persistence::list_snapshots(snapshot_dir) {
                    Ok(snapshots) => {
                        if snapshots.is_empty() {
                            println!("No snapshots found in {}", snapshot_dir.display());
                        } else {
                            println!("{:<40} {:>8} {:>12}", "File", "Tick", "Size");
                            println!("{}", "-".repeat(62));
                            for s in &snapshots {
                                let name = s
                                    .path
                                    .file_name()
                                    .and_then(|n| n.to_str())
                                    .unwrap_or("?");
                                let size_kb = s.bytes / 1024;
                                println!("{:<40} {:>8} {:>9} KB", name, s.tick, size_kb);
                            }
                            println!(
                                "\n{} snapshot(s) in {}",
                                snapshots.len(),
                                snapshot_dir.display()
                            );
                        }
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
                    Ok(island) => {
                        println!("Restored island from {}", path.display());
                        let species = load_species_or_exit(&config);
                        print_island_summary(&island, &species);
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
