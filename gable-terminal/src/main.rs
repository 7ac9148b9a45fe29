/// Gable Terminal Viewer - interactive gable-roofed building
///
/// Controls:
///   - Mouse drag / A,D / Arrow Left,Right: Rotate the building
///   - Mouse wheel / +,- / Arrow Up,Down: Zoom
///   - M: Toggle pinhole / matrix projection
///   - Q/ESC: Quit
///
/// With `--svg <path>` a single frame is written as an SVG document instead.
use anyhow::{Context, Result};
use clap::Parser;
use gable_core::{ViewerConfig, Viewport};
use gable_terminal::logging::{init_logging, LogTarget, LoggingConfig};
use gable_terminal::{default_matrix_strategy, render_svg_snapshot, TerminalApp};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal viewer for a parametric gable-roofed building")]
struct Args {
    /// JSON viewer configuration (building size, fov, zoom bounds, projection)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for face colors (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Write one frame as SVG to this path and exit
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Snapshot width in pixels
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Snapshot height in pixels
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Use the matrix perspective projection instead of the pinhole formula
    #[arg(long)]
    matrix: bool,

    /// Log to this file (the interactive viewer logs nowhere otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter in env_logger syntax (defaults to RUST_LOG, then info)
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let target = match (&args.log_file, &args.svg) {
        (Some(path), _) => LogTarget::File(path.clone()),
        (None, Some(_)) => LogTarget::Stderr,
        (None, None) => LogTarget::Off,
    };
    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        target,
    })
    .context("failed to open the log file")?;

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if args.matrix {
        config.projection = default_matrix_strategy(&config);
    }
    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random::<u64>);
    info!("using color seed {seed}");

    if let Some(path) = &args.svg {
        let svg = render_svg_snapshot(&config, seed, Viewport::new(args.width, args.height))?;
        std::fs::write(path, svg).with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
        return Ok(());
    }

    let mut app = TerminalApp::new(&config, seed)?;
    app.run()?;

    println!("Thank you for using the Gable terminal viewer!");
    Ok(())
}
