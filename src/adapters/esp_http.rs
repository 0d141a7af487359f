use std::sync::Arc;

use thiserror::Error;

use crate::domain::endpoint::Endpoint;
use crate::domain::reading::Reading;

/// Delivers one reading to an endpoint. Implementations may block; the
/// scheduler calls them from a worker thread, never from its timer.
pub trait Publisher: Send + Sync + 'static {
    fn send(&self, endpoint: &Endpoint, reading: &Reading) -> Result<ResponseSummary, PublishError>;
}

impl<T> Publisher for Arc<T>
where
    T: Publisher + ?Sized,
{
    fn send(&self, endpoint: &Endpoint, reading: &Reading) -> Result<ResponseSummary, PublishError> {
        (**self).send(endpoint, reading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSummary {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),
    #[error("endpoint answered with HTTP {0}")]
    HttpError(u16),
    #[error("malformed update url: {0}")]
    Malformed(String),
}

/// Publishes readings as `GET /update?...` to an ESP32 style HTTP listener.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: reqwest::blocking::Client,
}

impl HttpPublisher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { client })
    }
}

impl Publisher for HttpPublisher {
    fn send(&self, endpoint: &Endpoint, reading: &Reading) -> Result<ResponseSummary, PublishError> {
        let url = reqwest::Url::parse(&endpoint.update_url(reading))
            .map_err(|error| PublishError::Malformed(error.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|error| PublishError::Unreachable(error.to_string()))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();

        tracing::debug!(
            endpoint = %endpoint,
            status = status.as_u16(),
            body = %body,
            "update request answered"
        );

        if status.is_success() {
            Ok(ResponseSummary {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(PublishError::HttpError(status.as_u16()))
        }
    }
}
