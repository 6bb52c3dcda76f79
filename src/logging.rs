//! Diagnostic logging to stderr.
//!
//! Filter precedence: `PATCHLINE_LOG`, then `RUST_LOG`, then the level
//! implied by `--verbose`. Stdout stays reserved for review output.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::constants::ENV_LOG;
use crate::env::Env;

/// Default directive for a verbosity count (`-v`, `-vv`).
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "patchline=info,warn",
        2 => "patchline=debug,info",
        _ => "trace",
    }
}

/// Pick the filter string from the environment or the verbosity.
pub fn filter_directive(env: &Env, verbosity: u8) -> String {
    env.non_empty(ENV_LOG)
        .or_else(|| env.non_empty(EnvFilter::DEFAULT_ENV))
        .unwrap_or_else(|| default_directive(verbosity).to_string())
}

/// Install the global subscriber.
pub fn init(env: &Env, verbosity: u8) -> Result<()> {
    let directive = filter_directive(env, verbosity);
    let filter = EnvFilter::try_new(&directive)
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))
        .map_err(|e| anyhow::anyhow!("invalid log filter '{directive}': {e}"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 1)
                .without_time(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set global subscriber: {e}"))?;

    Ok(())
}
