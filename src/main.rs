//! Cellule host: headless runner, config generator and an optional window.

use cellule::{Config, Population};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "cellule")]
#[command(version)]
#[command(about = "Cells that fight other species and mate with their own")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation without a window
    Run {
        /// Configuration file (YAML); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "3600")]
        ticks: u64,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "cellule.yaml")]
        output: PathBuf,
    },

    /// Open a window; click to spawn a cell
    #[cfg(feature = "window")]
    Window {
        /// Configuration file (YAML); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn load_config(
    path: Option<&Path>,
    seed: Option<u64>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if seed.is_some() {
        config.seed = seed;
    }
    Ok(config)
}

fn init_logging(config: &Config) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.log_level.as_str()),
    )
    .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, ticks, seed } => {
            let config = load_config(config.as_deref(), seed)?;
            init_logging(&config);
            run_headless(&config, ticks)?;
        }
        Commands::Init { output } => {
            Config::default().save(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
        #[cfg(feature = "window")]
        Commands::Window { config, seed } => {
            let config = load_config(config.as_deref(), seed)?;
            init_logging(&config);
            window::run(&config)?;
        }
    }

    Ok(())
}

fn run_headless(config: &Config, ticks: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut population = Population::from_config(config)?;
    log::info!(
        "seeded {} cells in a {}x{} world (seed {})",
        population.len(),
        config.world.width,
        config.world.height,
        population.seed_value()
    );

    let start = Instant::now();
    for _ in 0..ticks {
        population.step();
        if population.is_empty() {
            log::info!("population extinct at tick {}", population.current_tick());
            break;
        }
    }

    let stats = population.stats();
    let census = population.census();
    log::info!(
        "finished {} ticks in {:.2?}: population {} (R:{} B:{} G:{}), births {}, deaths {}, peak {}",
        population.current_tick(),
        start.elapsed(),
        population.len(),
        census[0],
        census[1],
        census[2],
        stats.total_births,
        stats.total_deaths,
        stats.max_population
    );
    Ok(())
}

#[cfg(feature = "window")]
mod window {
    use cellule::{Config, Population, Vector};
    use piston_window::*;

    pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let mut window: PistonWindow = WindowSettings::new(
            "Cellule",
            [config.world.width as u32, config.world.height as u32],
        )
        .exit_on_esc(true)
        .build()?;

        let mut population = Population::from_config(config)?;
        let mut cursor = [0.0, 0.0];

        while let Some(e) = window.next() {
            if let Some(position) = e.mouse_cursor_args() {
                cursor = position;
            }

            if let Some(Button::Mouse(MouseButton::Left)) = e.press_args() {
                match population.spawn_at(Vector::new(cursor[0], cursor[1]), None) {
                    Ok(id) => log::debug!("spawned {} at {:?}", id, cursor),
                    Err(err) => log::warn!("spawn rejected: {}", err),
                }
            }

            if e.update_args().is_some() {
                population.step();
                let census = population.census();
                window.set_title(format!(
                    "Cellule | tick {} | population {} (R:{} B:{} G:{})",
                    population.current_tick(),
                    population.len(),
                    census[0],
                    census[1],
                    census[2]
                ));
            }

            window.draw_2d(&e, |c, g, _device| {
                clear([0.2, 0.2, 0.2, 1.0], g);
                for cell in population.cells() {
                    let r = cell.size();
                    ellipse(
                        cell.species().color(),
                        [cell.position.x - r, cell.position.y - r, 2.0 * r, 2.0 * r],
                        c.transform,
                        g,
                    );
                }
            });
        }

        Ok(())
    }
}
