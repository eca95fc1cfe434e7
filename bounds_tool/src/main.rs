//! Structure bounds tool
//!
//! Fits two-level bounds to an OBJ model, optimizes them and writes the
//! settings records.
//!
//! ```text
//! bounds_tool <model.obj> [config.toml|config.ron] [output.model]
//! ```
//!
//! Without an output path the records are printed to stdout.

mod obj;

use std::path::PathBuf;
use std::process::ExitCode;

use structure_bounds::bounds::{validate, EditSession};
use structure_bounds::config::{BoundsConfig, Config, ConfigError};
use structure_bounds::debug::OutlineBuffer;
use structure_bounds::error::BoundsError;
use structure_bounds::foundation::logging;
use thiserror::Error;

use obj::ObjError;

#[derive(Error, Debug)]
enum ToolError {
    #[error("usage: bounds_tool <model.obj> [config.toml|config.ron] [output.model]")]
    Usage,
    #[error("Could not read model: {0}")]
    Obj(#[from] ObjError),
    #[error("Could not load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Could not create bounds: {0}")]
    Bounds(#[from] BoundsError),
    #[error("Could not write records: {0}")]
    Io(#[from] std::io::Error),
}

struct Args {
    model: PathBuf,
    config: Option<String>,
    output: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ToolError> {
        let model = args.next().ok_or(ToolError::Usage)?;
        let config = args.next();
        let output = args.next().map(PathBuf::from);
        if args.next().is_some() {
            return Err(ToolError::Usage);
        }
        Ok(Self { model: PathBuf::from(model), config, output })
    }
}

fn run(args: Args) -> Result<(), ToolError> {
    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            BoundsConfig::load_from_file(path)?
        }
        None => BoundsConfig::default(),
    };
    config.validate()?;

    log::info!("Reading model {}", args.model.display());
    let mesh = obj::load_obj(&args.model)?;
    if let Some(overall) = mesh.overall_bounds() {
        log::info!(
            "Model has {} parts, overall radius {:.3}",
            mesh.parts.len(),
            overall.radius
        );
    }

    let mut session = EditSession::new(config.asset_kind);
    session.set_world_transform(&config.placement.to_transform().to_matrix());
    session.create_bounds(&mesh, &config.fitting)?;
    session.optimize();

    if let Some(ground) = session.bounds().lowest_point() {
        log::info!(
            "{} fine bounds rest on the ground at height {:.3}",
            session.bounds().fine_at_level(ground).len(),
            ground
        );
    }

    if let Err(violations) = validate(session.bounds()) {
        for violation in &violations {
            log::error!("Bounds invariant broken: {:?}", violation);
        }
    }

    let mut outlines = OutlineBuffer::new();
    session.outline_coarse(&config.outline, &mut outlines);
    log::debug!("{} coarse outlines", outlines.len());
    session.outline_all_fine(&config.outline, &mut outlines);
    log::debug!("{} fine outlines", outlines.len());

    let records = session.settings_records();
    match &args.output {
        Some(path) => {
            std::fs::write(path, records + "\n")?;
            log::info!("Wrote bounds to {}", path.display());
        }
        None => println!("{}", records),
    }
    session.mark_saved();

    log::info!(
        "Done: {} coarse and {} fine bounds",
        session.bounds().coarse_len(),
        session.bounds().fine_len()
    );
    Ok(())
}

fn main() -> ExitCode {
    logging::init();

    let result = Args::parse(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(ToolError::Usage) => {
            eprintln!("{}", ToolError::Usage);
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
