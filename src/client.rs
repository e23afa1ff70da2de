//! Combat simulation service client.
//!
//! Two calls, always in order: `POST /combat/simulate?turns=N` then `GET /combat/report`.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::report::Report;

pub const DEFAULT_TURNS: u32 = 10;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Simulation failed")]
    SimulationFailed { status: u16 },
    #[error("Failed to fetch report")]
    ReportFetchFailed { status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid report: {0}")]
    InvalidReport(String),
}

pub trait CombatService {
    fn simulate(&self, turns: u32) -> impl Future<Output = Result<(), ClientError>> + Send;
    fn fetch_report(&self) -> impl Future<Output = Result<Report, ClientError>> + Send;
}

/// Turn count from the raw input field. Empty, unparsable or zero falls back to `default`.
pub fn parse_turns(input: Option<&str>, default: u32) -> u32 {
    input
        .map(str::trim)
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|turns| *turns > 0)
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct HttpCombatClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpCombatClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ClientError::Network(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl CombatService for HttpCombatClient {
    async fn simulate(&self, turns: u32) -> Result<(), ClientError> {
        let url = format!("{}/combat/simulate?turns={turns}", self.base_url);
        tracing::debug!(%url, "requesting simulation");
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "simulate call rejected");
            return Err(ClientError::SimulationFailed {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn fetch_report(&self) -> Result<Report, ClientError> {
        let url = format!("{}/combat/report", self.base_url);
        tracing::debug!(%url, "fetching report");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "report call rejected");
            return Err(ClientError::ReportFetchFailed {
                status: status.as_u16(),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;
        serde_json::from_str(&body).map_err(|err| ClientError::InvalidReport(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_turns_falls_back_on_falsy_input() {
        assert_eq!(parse_turns(None, DEFAULT_TURNS), 10);
        assert_eq!(parse_turns(Some(""), DEFAULT_TURNS), 10);
        assert_eq!(parse_turns(Some("  "), DEFAULT_TURNS), 10);
        assert_eq!(parse_turns(Some("0"), DEFAULT_TURNS), 10);
        assert_eq!(parse_turns(Some("abc"), DEFAULT_TURNS), 10);
        assert_eq!(parse_turns(Some(" 25 "), DEFAULT_TURNS), 25);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = HttpCombatClient::new("http://localhost:8000/", Duration::from_secs(1))
            .expect("client builds");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
