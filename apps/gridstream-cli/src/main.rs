use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glam::Vec3;
use gridstream_author::{AuthoringCommand, CommandOutcome, Editor, GridAuthoringStore, GridSettings, GridStats};
use gridstream_common::InMemoryContentLoader;
use gridstream_persist::{GridFileStore, GridLayout};
use gridstream_stream::{CellStreamingManager, DirectoryContentLocator, StreamConfig, load_topology_or_default};
use gridstream_topology::{CellSize, ExpansionLevel, ExpansionMode, GridTopology};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridstream-cli", about = "CLI tool for gridstream operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WorldArgs {
    /// Folder holding the `GridData_<world>` folder
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
    /// World name
    #[arg(short, long)]
    world: String,
}

impl WorldArgs {
    fn files(&self) -> GridFileStore {
        GridFileStore::new(GridLayout::new(&self.root, &self.world))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default grid parameters
    Info,
    /// Edit a world's grid settings and validity, then save
    Author {
        #[command(flatten)]
        world: WorldArgs,
        /// Cell count on X
        #[arg(long)]
        size_x: Option<i32>,
        /// Cell count on Z
        #[arg(long)]
        size_z: Option<i32>,
        /// Cell count on Y
        #[arg(long)]
        size_y: Option<i32>,
        /// Cell edge on X and Z (128, 256, 512, 1024 or 2048)
        #[arg(long)]
        cell_size: Option<i32>,
        /// Cell height (128, 256, 512, 1024 or 2048)
        #[arg(long)]
        cell_size_y: Option<i32>,
        /// Grid origin as x,y,z
        #[arg(long, value_delimiter = ',', num_args = 3, allow_negative_numbers = true)]
        origin: Option<Vec<f32>>,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        #[arg(long, value_enum)]
        level: Option<LevelArg>,
        /// Flat cell index to toggle; repeatable
        #[arg(short, long)]
        toggle: Vec<usize>,
        /// How to write the result
        #[arg(long, value_enum, default_value = "save")]
        write: WriteMode,
    },
    /// Print statistics of a saved world
    Stats {
        #[command(flatten)]
        world: WorldArgs,
    },
    /// Stream a saved world while moving the observer along a line
    Walk {
        #[command(flatten)]
        world: WorldArgs,
        /// Start position as x,y,z
        #[arg(long, value_delimiter = ',', num_args = 3, allow_negative_numbers = true)]
        from: Vec<f32>,
        /// End position as x,y,z
        #[arg(long, value_delimiter = ',', num_args = 3, allow_negative_numbers = true)]
        to: Vec<f32>,
        /// Number of ticks to simulate
        #[arg(long, default_value = "600")]
        ticks: u32,
        /// Horizontal window radius in cells
        #[arg(long, default_value = "1")]
        radius: i32,
        /// Vertical window radius in cells
        #[arg(long, default_value = "1")]
        vertical_radius: i32,
        /// Ticks to wait after a cell change before re-sampling
        #[arg(long, default_value = "10")]
        cooldown: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Center,
    PositiveXz,
    NegativeXz,
    PositiveZx,
    NegativeZx,
}

impl From<ModeArg> for ExpansionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Center => ExpansionMode::Center,
            ModeArg::PositiveXz => ExpansionMode::PositiveXZCorner,
            ModeArg::NegativeXz => ExpansionMode::NegativeXZCorner,
            ModeArg::PositiveZx => ExpansionMode::PositiveZXCorner,
            ModeArg::NegativeZx => ExpansionMode::NegativeZXCorner,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    Top,
    Center,
    Bottom,
}

impl From<LevelArg> for ExpansionLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Top => ExpansionLevel::Top,
            LevelArg::Center => ExpansionLevel::Center,
            LevelArg::Bottom => ExpansionLevel::Bottom,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WriteMode {
    /// Write the master record and every valid cell
    Save,
    /// Refuse if the on-disk topology differs; sync validity otherwise
    SafeSave,
    /// Delete all existing cell data and save from scratch
    Overwrite,
    /// Do not write anything
    None,
}

fn vec3(values: &[f32]) -> anyhow::Result<Vec3> {
    match values {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => bail!("expected x,y,z, got {} values", values.len()),
    }
}

fn print_stats(stats: &GridStats) {
    println!("{stats}");
    if stats.exceeds_cell_warning() {
        println!(
            "warning: {} cells; consider a larger cell size",
            stats.total_cells
        );
    }
    if stats.exceeds_size_warning() {
        println!("warning: large world, saving and loading may be slow");
    }
}

fn describe(topology: &GridTopology) {
    let counts = topology.counts();
    println!(
        "grid: {}x{}x{} cells of {}x{}, origin {}, {:?}/{:?}, min corner {}",
        counts.x,
        counts.z,
        counts.y,
        topology.cell_size_xz(),
        topology.cell_size_y(),
        topology.origin(),
        topology.expansion_mode(),
        topology.expansion_level(),
        topology.min_corner()
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("gridstream-cli v{}", env!("CARGO_PKG_VERSION"));
            describe(&GridTopology::default());
            let config = StreamConfig::default();
            println!(
                "stream defaults: radius {}, vertical radius {}, cooldown {} ticks",
                config.horizontal_radius, config.vertical_radius, config.cell_change_cooldown_ticks
            );
            println!("author defaults: {:?}", GridSettings::default());
        }
        Commands::Author {
            world,
            size_x,
            size_z,
            size_y,
            cell_size,
            cell_size_y,
            origin,
            mode,
            level,
            toggle,
            write,
        } => {
            let mut store = GridAuthoringStore::open(world.files())
                .with_context(|| format!("opening world {}", world.world))?;
            let mut editor = Editor::new();
            let mut loader = InMemoryContentLoader::new();

            let current = *store.settings();
            let settings = GridSettings {
                world_size_x: size_x.unwrap_or(current.world_size_x),
                world_size_z: size_z.unwrap_or(current.world_size_z),
                world_size_y: size_y.unwrap_or(current.world_size_y),
                origin: origin.as_deref().map(vec3).transpose()?.unwrap_or(current.origin),
                cell_size_xz: cell_size.map(CellSize::try_from).transpose()?.unwrap_or(current.cell_size_xz),
                cell_size_y: cell_size_y.map(CellSize::try_from).transpose()?.unwrap_or(current.cell_size_y),
                expansion_mode: mode.map(Into::into).unwrap_or(current.expansion_mode),
                expansion_level: level.map(Into::into).unwrap_or(current.expansion_level),
            };
            if settings != current {
                editor.execute(&mut store, AuthoringCommand::UpdateSettings(settings), &mut loader)?;
            }
            for index in toggle {
                if let CommandOutcome::Toggled { index, valid } =
                    editor.execute(&mut store, AuthoringCommand::ToggleCell(index), &mut loader)?
                {
                    println!("cell {index}: {}", if valid { "enabled" } else { "disabled" });
                }
            }

            describe(store.topology());
            print_stats(store.stats());

            let command = match write {
                WriteMode::Save => AuthoringCommand::Save,
                WriteMode::SafeSave => AuthoringCommand::SafeSave,
                WriteMode::Overwrite => AuthoringCommand::OverwriteAll,
                WriteMode::None => return Ok(()),
            };
            match editor.execute(&mut store, command, &mut loader)? {
                CommandOutcome::Saved(report) => println!("{report}"),
                CommandOutcome::SafeSaved(report) => println!("{report}"),
                _ => {}
            }
        }
        Commands::Stats { world } => {
            let files = world.files();
            if !files.has_master() {
                bail!(
                    "no saved grid at {}",
                    files.layout().master_path().display()
                );
            }
            let store = GridAuthoringStore::open(files)?;
            describe(store.topology());
            print_stats(store.stats());
        }
        Commands::Walk {
            world,
            from,
            to,
            ticks,
            radius,
            vertical_radius,
            cooldown,
        } => {
            let (from, to) = (vec3(&from)?, vec3(&to)?);
            let files = world.files();
            let topology = load_topology_or_default(&files);
            describe(&topology);

            let observer = Rc::new(Cell::new(from));
            let position = Rc::clone(&observer);
            let mut manager = CellStreamingManager::builder()
                .topology(topology)
                .config(StreamConfig {
                    horizontal_radius: radius,
                    vertical_radius,
                    cell_change_cooldown_ticks: cooldown,
                })
                .loader(InMemoryContentLoader::new())
                .locator(DirectoryContentLocator::new(files))
                .position_source(move || position.get())
                .build()?;
            let changes = manager.subscribe();

            let (mut loads, mut unloads) = (0, 0);
            tracing::info!(%from, %to, ticks, "walking");
            let span = ticks.max(1) as f32;
            for tick in 0..ticks {
                observer.set(from.lerp(to, tick as f32 / span));
                let stats = manager.tick();
                loads += stats.loads_requested;
                unloads += stats.unloads_requested;
                for change in changes.try_iter() {
                    println!("tick {tick}: {} -> {}", change.previous, change.current);
                }
            }
            let steps = manager.finish_reconciliation();
            println!(
                "{ticks} ticks (+{steps} to settle): {loads} loads, {unloads} unloads requested, {} cells resident around {}",
                manager.loaded_cells().len(),
                manager.current_cell()
            );
        }
    }

    Ok(())
}
