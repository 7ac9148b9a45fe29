/// Logger initialization for the terminal viewer
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Once;

/// Where log records go.
///
/// The interactive viewer owns the alternate screen, so it logs to a file or
/// not at all; one-shot commands can log to stderr.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Off,
    Stderr,
    File(PathBuf),
}

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "gable_core=trace"). When unset, `RUST_LOG` is consulted, then `info`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub target: LogTarget,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            target: LogTarget::Stderr,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
pub fn init_logging(config: LoggingConfig) -> io::Result<()> {
    let target = match config.target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => env_logger::Target::Stderr,
        LogTarget::File(path) => env_logger::Target::Pipe(Box::new(File::create(path)?)),
    };
    let to_file = matches!(target, env_logger::Target::Pipe(_));

    INIT.call_once(move || {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.target(target);
        if to_file {
            builder.write_style(env_logger::WriteStyle::Never);
        }

        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
    Ok(())
}
