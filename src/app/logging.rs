use tracing_subscriber::{EnvFilter, fmt};

use crate::app::AppError;

const DEFAULT_DIRECTIVES: &str = "info";

/// Installs the global subscriber. `.env` must already be loaded so a
/// `RUST_LOG` set there takes effect.
pub fn init() -> Result<(), AppError> {
    fmt()
        .with_env_filter(filter_from_lookup(|key| std::env::var(key).ok()))
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .map_err(AppError::logging_init)
}

fn filter_from_lookup<F>(lookup: F) -> EnvFilter
where
    F: Fn(&str) -> Option<String>,
{
    lookup(EnvFilter::DEFAULT_ENV)
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}
