use std::env;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

const TIMEOUT_ENV: &str = "PBDECRYPT_TIMEOUT_SECS";
const RETRIES_ENV: &str = "PBDECRYPT_MAX_RETRIES";
const BACKOFF_ENV: &str = "PBDECRYPT_BACKOFF_MS";
const USER_AGENT_ENV: &str = "PBDECRYPT_USER_AGENT";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_MS: u64 = 500;
const DEFAULT_USER_AGENT: &str = concat!("pbdecrypt/", env!("CARGO_PKG_VERSION"));
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("request to {0} failed: {1}")]
    Transport(String, String),
    #[error("{0} responded with status {1}")]
    Status(String, u16),
    #[error("{0} returned a body that is not json: {1}")]
    Body(String, String),
}

pub trait Fetcher: Send + Sync {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    /// Defaults overridden by `PBDECRYPT_*` environment variables. Values
    /// that do not parse are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout: env_parse::<u64>(TIMEOUT_ENV)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: env_parse::<u32>(RETRIES_ENV).unwrap_or(defaults.max_retries),
            backoff: env_parse::<u64>(BACKOFF_ENV)
                .map(Duration::from_millis)
                .unwrap_or(defaults.backoff),
            user_agent: env::var(USER_AGENT_ENV)
                .ok()
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or(defaults.user_agent),
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

/// Blocking HTTP fetcher that retries rate limiting and server errors.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, FetchError> {
        Self::new(FetchConfig::from_env())
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn attempt(&self, url: &str) -> Result<Value, Attempt> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "JSONHttpRequest")
            .send()
            .map_err(|e| {
                Attempt::Retry(FetchError::Transport(url.to_string(), e.to_string()), None)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error = FetchError::Status(url.to_string(), status.as_u16());
            if is_transient(status) {
                return Err(Attempt::Retry(error, retry_after(&response)));
            }
            return Err(Attempt::Fatal(error));
        }

        response
            .json::<Value>()
            .map_err(|e| Attempt::Fatal(FetchError::Body(url.to_string(), e.to_string())))
    }
}

enum Attempt {
    Retry(FetchError, Option<Duration>),
    Fatal(FetchError),
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_after(response: &reqwest::blocking::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

impl Fetcher for HttpFetcher {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let mut attempt = 0;
        loop {
            match self.attempt(url) {
                Ok(value) => return Ok(value),
                Err(Attempt::Fatal(error)) => return Err(error),
                Err(Attempt::Retry(error, _)) if attempt >= self.config.max_retries => {
                    return Err(error)
                }
                Err(Attempt::Retry(error, hinted)) => {
                    let delay = hinted.unwrap_or_else(|| self.config.delay_for(attempt));
                    log::warn!(
                        "fetch attempt {} of {} failed ({}), retrying in {:?}",
                        attempt + 1,
                        self.config.max_retries + 1,
                        error,
                        delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
