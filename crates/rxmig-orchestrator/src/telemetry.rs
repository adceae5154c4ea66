//! Logging setup

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber for the process
///
/// `RUST_LOG` wins when set; otherwise rxmig crates log at `debug` when
/// `verbose`, `info` when not. Returns `false` if a subscriber was already
/// installed.
pub fn init_logging(verbose: bool) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Same as [`init_logging`], as JSON lines
pub fn init_json_logging(verbose: bool) -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter(verbose))
        .try_init()
        .is_ok()
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!(
            "warn,rxmig_orchestrator={level},rxmig_validator={level},rxmig_codegen={level},rxmig_scanner={level},rxmig_classifier={level}"
        ))
    })
}
