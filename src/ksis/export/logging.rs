use tracing_subscriber::EnvFilter;

use crate::ksis::export::error::{ExportError, Result};

/// Installs the global `fmt` subscriber. `RUST_LOG` wins over `debug`.
pub fn init(debug: bool) -> Result<()> {
    let default_level = if debug { "ksis_export=debug" } else { "ksis_export=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ExportError::Logging(error.to_string()))
}
