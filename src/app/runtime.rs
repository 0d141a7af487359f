use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use chrono::Utc;

use crate::adapters::api::{ApiState, configure_routes};
use crate::adapters::battery_sysfs::SysfsBattery;
use crate::adapters::esp_http::HttpPublisher;
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::scheduler::PushScheduler;
use crate::app::services::PushControl;
use crate::domain::push_session::{Clock, PushOutcome, PushSession, TimestampMs};
use crate::domain::reading::Reading;
use crate::domain::telemetry::PlatformTelemetrySource;

#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimestampMs {
        TimestampMs(Utc::now().timestamp_millis())
    }
}

pub type AgentScheduler =
    PushScheduler<PlatformTelemetrySource<SysfsBattery>, HttpPublisher, SystemClock>;

pub fn build_scheduler(config: &AppConfig) -> Result<AgentScheduler, AppError> {
    let source = PlatformTelemetrySource::new(SysfsBattery::new(&config.power_supply_dir));
    let publisher = HttpPublisher::new().map_err(AppError::runtime)?;

    let scheduler = PushScheduler::new(source, publisher, SystemClock);
    scheduler.set_observer(log_tick);
    Ok(scheduler)
}

fn log_tick(reading: &Reading, session: &PushSession) {
    let endpoint = session
        .endpoint
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();

    match &session.last_result {
        Some(PushOutcome::Delivered { at, status }) => tracing::info!(
            endpoint = %endpoint,
            battery_level = reading.level_percent,
            charge_counter = reading.charge_counter_micro_ah,
            current_avg = reading.avg_current_micro_a,
            current_now = reading.now_current_micro_a,
            http_status = status,
            at = %at.to_rfc3339(),
            "telemetry delivered"
        ),
        Some(PushOutcome::Failed { at, message }) => tracing::warn!(
            endpoint = %endpoint,
            battery_level = reading.level_percent,
            failed = session.failed,
            at = %at.to_rfc3339(),
            error = %message,
            "telemetry not delivered"
        ),
        None => {}
    }
}

fn api_state(scheduler: &Arc<AgentScheduler>, config: &AppConfig) -> ApiState {
    let control: Arc<dyn PushControl> = scheduler.clone();
    ApiState {
        control,
        default_interval_ms: config.push_interval_ms,
        endpoint_port: config.endpoint.port(),
    }
}

pub fn run(config: AppConfig) -> Result<(), AppError> {
    let scheduler = Arc::new(build_scheduler(&config)?);

    if config.autostart {
        scheduler
            .start(config.endpoint.clone(), config.push_interval_ms)
            .map_err(AppError::runtime)?;
    }

    let api_state = api_state(&scheduler, &config);

    tracing::info!(bind = %config.http_bind, "http server starting");

    let server_result = actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            App::new()
                .wrap(Cors::permissive())
                .app_data(web::Data::new(api_state.clone()))
                .configure(configure_routes)
        })
        .bind(&config.http_bind)?
        .run()
        .await
    });

    // The blocking HTTP client must be released outside the async runtime.
    scheduler.stop().map_err(AppError::runtime)?;
    drop(scheduler);

    server_result.map_err(AppError::runtime)
}

pub fn run_agent(config: AppConfig) -> Result<(), AppError> {
    let scheduler = build_scheduler(&config)?;
    scheduler
        .start(config.endpoint.clone(), config.push_interval_ms)
        .map_err(AppError::runtime)?;

    actix_web::rt::System::new()
        .block_on(actix_web::rt::signal::ctrl_c())
        .map_err(AppError::runtime)?;

    tracing::info!("shutdown signal received");
    scheduler.stop().map_err(AppError::runtime)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use crate::domain::reading::Reading;
    use crate::test_support::endpoint;

    use super::{AppConfig, api_state, build_scheduler};

    fn config_for(dir: &Path) -> AppConfig {
        AppConfig {
            endpoint: endpoint("127.0.0.1").with_port(8081),
            push_interval_ms: 1000,
            power_supply_dir: dir.to_string_lossy().to_string(),
            http_bind: "127.0.0.1:0".to_string(),
            autostart: false,
        }
    }

    #[test]
    fn built_scheduler_samples_configured_power_supply() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        fs::write(dir.path().join("capacity"), "64\n").expect("write capacity");
        fs::write(dir.path().join("current_now"), "-310000\n").expect("write current_now");

        let config = config_for(dir.path());

        let scheduler = build_scheduler(&config).expect("scheduler should build");

        assert_eq!(scheduler.sample_now(), Reading::new(64, -1, -1, -310_000));
        assert!(!scheduler.is_running());
    }

    #[test]
    fn api_state_controls_the_shared_scheduler() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        fs::write(dir.path().join("capacity"), "41\n").expect("write capacity");

        let config = config_for(dir.path());
        let scheduler = Arc::new(build_scheduler(&config).expect("scheduler should build"));
        let state = api_state(&scheduler, &config);

        assert_eq!(state.default_interval_ms, 1000);
        assert_eq!(state.endpoint_port, 8081);
        assert_eq!(state.control.sample_now(), Reading::new(41, -1, -1, -1));

        let session = state.control.snapshot().expect("snapshot should be readable");
        assert!(!session.running);
        assert_eq!(Arc::strong_count(&scheduler), 2);
    }
}
