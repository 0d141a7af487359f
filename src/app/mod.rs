mod config;
mod error;
mod logging;
mod runtime;
pub mod scheduler;
pub mod services;

pub use config::AppConfig;
pub use error::AppError;
pub use runtime::{AgentScheduler, SystemClock, build_scheduler};

pub fn run() -> Result<(), AppError> {
    let config = bootstrap()?;

    tracing::info!(
        endpoint = %config.endpoint,
        push_interval_ms = config.push_interval_ms,
        power_supply_dir = %config.power_supply_dir,
        http_bind = %config.http_bind,
        autostart = config.autostart,
        "application bootstrap initialized"
    );

    runtime::run(config)
}

/// Push loop only, without the control API. Runs until Ctrl-C.
pub fn run_agent() -> Result<(), AppError> {
    let config = bootstrap()?;

    tracing::info!(
        endpoint = %config.endpoint,
        push_interval_ms = config.push_interval_ms,
        power_supply_dir = %config.power_supply_dir,
        "push agent bootstrap initialized"
    );

    runtime::run_agent(config)
}

fn bootstrap() -> Result<AppConfig, AppError> {
    let dotenv = dotenvy::dotenv();
    logging::init()?;

    if let Err(error) = dotenv
        && !error.not_found()
    {
        tracing::warn!(error = %error, "failed to load .env file");
    }

    AppConfig::from_env()
}
