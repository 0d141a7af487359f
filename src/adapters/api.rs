use std::sync::Arc;

use actix_web::{HttpResponse, Responder, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::app::scheduler::SchedulerError;
use crate::app::services::PushControl;
use crate::domain::endpoint::Endpoint;
use crate::domain::push_session::{PushOutcome, PushSession};
use crate::domain::reading::Reading;

#[derive(Clone)]
pub struct ApiState {
    pub control: Arc<dyn PushControl>,
    pub default_interval_ms: u64,
    pub endpoint_port: u16,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingResponse {
    pub battery_level: i32,
    pub charge_counter: i32,
    pub current_avg: i32,
    pub current_now: i32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PushResultResponse {
    pub status: &'static str,
    pub at: String,
    pub http_status: Option<u16>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Option<String>,
    pub running: bool,
    pub endpoint: Option<String>,
    pub interval_ms: u64,
    pub last_reading: Option<ReadingResponse>,
    pub last_result: Option<PushResultResponse>,
    pub dispatched: u64,
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub endpoint: String,
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct EndpointRequest {
    pub endpoint: String,
}

impl From<Reading> for ReadingResponse {
    fn from(reading: Reading) -> Self {
        Self {
            battery_level: reading.level_percent,
            charge_counter: reading.charge_counter_micro_ah,
            current_avg: reading.avg_current_micro_a,
            current_now: reading.now_current_micro_a,
        }
    }
}

impl From<PushOutcome> for PushResultResponse {
    fn from(outcome: PushOutcome) -> Self {
        match outcome {
            PushOutcome::Delivered { at, status } => Self {
                status: "delivered",
                at: at.to_rfc3339(),
                http_status: Some(status),
                message: None,
            },
            PushOutcome::Failed { at, message } => Self {
                status: "failed",
                at: at.to_rfc3339(),
                http_status: None,
                message: Some(message),
            },
        }
    }
}

impl From<PushSession> for SessionResponse {
    fn from(session: PushSession) -> Self {
        Self {
            session_id: session.session_id.map(|id| id.to_string()),
            running: session.running,
            endpoint: session.endpoint.map(|endpoint| endpoint.to_string()),
            interval_ms: session.interval_ms,
            last_reading: session.last_reading.map(ReadingResponse::from),
            last_result: session.last_result.map(PushResultResponse::from),
            dispatched: session.dispatched,
            delivered: session.delivered,
            failed: session.failed,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(get_session_endpoint)
        .service(start_session_endpoint)
        .service(stop_session_endpoint)
        .service(update_endpoint_endpoint)
        .service(get_reading_endpoint);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[get("/session")]
async fn get_session_endpoint(state: web::Data<ApiState>) -> impl Responder {
    session_response(state.control.snapshot())
}

#[post("/session/start")]
async fn start_session_endpoint(
    state: web::Data<ApiState>,
    body: web::Json<StartRequest>,
) -> impl Responder {
    let endpoint = match parse_endpoint(&body.endpoint, state.endpoint_port) {
        Ok(endpoint) => endpoint,
        Err(response) => return response,
    };
    let interval_ms = body.interval_ms.unwrap_or(state.default_interval_ms);

    session_response(state.control.start(endpoint, interval_ms))
}

#[post("/session/stop")]
async fn stop_session_endpoint(state: web::Data<ApiState>) -> impl Responder {
    session_response(state.control.stop())
}

#[put("/session/endpoint")]
async fn update_endpoint_endpoint(
    state: web::Data<ApiState>,
    body: web::Json<EndpointRequest>,
) -> impl Responder {
    let endpoint = match parse_endpoint(&body.endpoint, state.endpoint_port) {
        Ok(endpoint) => endpoint,
        Err(response) => return response,
    };

    session_response(state.control.update_endpoint(endpoint))
}

#[get("/reading")]
async fn get_reading_endpoint(state: web::Data<ApiState>) -> impl Responder {
    HttpResponse::Ok().json(ReadingResponse::from(state.control.sample_now()))
}

fn parse_endpoint(raw: &str, port: u16) -> Result<Endpoint, HttpResponse> {
    Endpoint::parse(raw)
        .map(|endpoint| endpoint.with_port(port))
        .map_err(|error| {
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": error.to_string()
            }))
        })
}

fn session_response(result: Result<PushSession, SchedulerError>) -> HttpResponse {
    match result {
        Ok(session) => HttpResponse::Ok().json(SessionResponse::from(session)),
        Err(error) => scheduler_error_response(error),
    }
}

fn scheduler_error_response(error: SchedulerError) -> HttpResponse {
    match error {
        SchedulerError::ZeroInterval => HttpResponse::BadRequest().json(serde_json::json!({
            "error": error.to_string()
        })),
        SchedulerError::StatePoisoned | SchedulerError::TimerSpawn(_) => {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": error.to_string()
            }))
        }
    }
}
