use std::fmt;

use thiserror::Error;

use crate::domain::reading::{BatteryField, Reading};

pub const DEFAULT_HTTP_PORT: u16 = 80;
const UPDATE_PATH: &str = "/update";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("endpoint address is empty")]
    Empty,
    #[error("endpoint address must be a dotted quad, got {0:?}")]
    Malformed(String),
}

/// Push target. The host is a dotted quad of four 1-3 digit groups; octet
/// values are not range checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn parse(input: &str) -> Result<Self, EndpointError> {
        let host = input.trim();
        if host.is_empty() {
            return Err(EndpointError::Empty);
        }

        if !is_dotted_quad(host) {
            return Err(EndpointError::Malformed(host.to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port: DEFAULT_HTTP_PORT,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn update_url(&self, reading: &Reading) -> String {
        let query = BatteryField::ALL
            .iter()
            .map(|field| format!("{}={}", field.query_key(), reading.field(*field)))
            .collect::<Vec<_>>()
            .join("&");

        format!("http://{}{}?{}", self, UPDATE_PATH, query)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == DEFAULT_HTTP_PORT {
            write!(f, "{}", self.host)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn is_dotted_quad(value: &str) -> bool {
    let groups: Vec<&str> = value.split('.').collect();
    groups.len() == 4
        && groups.iter().all(|group| {
            (1..=3).contains(&group.len()) && group.bytes().all(|b| b.is_ascii_digit())
        })
}
