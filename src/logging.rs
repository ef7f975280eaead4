use std::str::FromStr;

use anyhow::{Context as _, Result};
use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

static RELOAD_HANDLE: OnceCell<reload::Handle<EnvFilter, Registry>> = OnceCell::new();

/// Installs the global subscriber on first call; later calls only reload the
/// level filter, so tests can call this once per process without panicking.
pub fn init(level: &str, json: bool) -> Result<()> {
    let handle = RELOAD_HANDLE.get_or_try_init(|| -> Result<_> {
        let filter = EnvFilter::from_str(level).context("invalid log level filter")?;
        let (filter, handle) = reload::Layer::new(filter);

        let registry = tracing_subscriber::registry().with(filter);

        let fmt = tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true);

        if json {
            registry.with(fmt.json()).try_init()?;
        } else {
            registry.with(fmt.pretty()).try_init()?;
        }

        Ok(handle)
    })?;

    handle.reload(EnvFilter::from_str(level).context("invalid log level filter")?)?;

    Ok(())
}
