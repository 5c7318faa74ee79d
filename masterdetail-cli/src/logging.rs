//! Log setup. The terminal belongs to the UI, so events go to a file when
//! one is given and are dropped otherwise, unless the UI is disabled.

use std::{fs::OpenOptions, io, path::Path, sync::Mutex};

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// `RUST_LOG` wins over the verbosity flag when set.
fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("masterdetail={level},masterdetail_cli={level}")))
}

pub fn init(level: Level, log_file: Option<&Path>, to_stderr: bool) -> io::Result<()> {
    let filter = env_filter(level);
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .init();
        }
        None if to_stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr).without_time())
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::sink))
                .init();
        }
    }
    Ok(())
}
