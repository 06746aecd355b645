//! HTTP client for the Cloud Foundry platform API.
//!
//! `CfClient` is the session: one reqwest client plus the API base and the
//! bearer token for the account currently being processed. The orchestrator
//! resets it when moving to the next account; `login` is the only writer of
//! the token. The `Platform` trait is the seam the orchestrator and the
//! lifecycle controller are written against.

mod auth;
mod resolve;

use crate::model::AppState;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Longer bound for the mutating calls (token exchange, start action).
const ACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Resource kinds resolved by name lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Organization,
    Space,
    Application,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ResourceKind::Organization => "organization",
            ResourceKind::Space => "space",
            ResourceKind::Application => "application",
        };
        f.write_str(text)
    }
}

/// Failures surfaced by platform calls. All of these are recoverable at the
/// orchestrator level: the affected unit of work is skipped, never the run.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("auth endpoint discovery failed: {reason}")]
    AuthDiscovery { reason: String },

    #[error("login failed: {reason}")]
    Login { reason: String },

    #[error("{kind} \"{name}\" not found")]
    ResourceNotFound { kind: ResourceKind, name: String },

    #[error("start command rejected with status {status}")]
    StartRejected { status: StatusCode },

    #[error("unexpected status {status} while {doing}")]
    UnexpectedStatus { doing: String, status: StatusCode },

    #[error("no API endpoint configured for this session")]
    NoEndpoint,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Platform operations the orchestrator depends on. Implemented by
/// `CfClient` and by scripted doubles in tests.
pub(crate) trait Platform {
    /// Repoints the session at an account's API endpoint and clears any
    /// previously installed token.
    fn reset(&mut self, api_endpoint: &str);
    async fn login(&mut self, username: &str, password: &str) -> Result<(), PlatformError>;
    async fn get_org_guid(&self, name: &str) -> Result<String, PlatformError>;
    async fn get_space_guid(&self, org_guid: &str, name: &str) -> Result<String, PlatformError>;
    async fn get_app_guid(&self, name: &str, space_guid: &str) -> Result<String, PlatformError>;
    async fn get_app_status(&self, guid: &str) -> Result<AppState, PlatformError>;
    async fn start_application(&self, guid: &str) -> Result<(), PlatformError>;
}

pub struct CfClient {
    http: reqwest::Client,
    api_base: Option<String>,
    token: Option<String>,
}

impl CfClient {
    pub fn new(request_timeout: Duration) -> Result<Self, PlatformError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            api_base: None,
            token: None,
        })
    }

    fn base(&self) -> Result<&str, PlatformError> {
        self.api_base.as_deref().ok_or(PlatformError::NoEndpoint)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn start_application(&self, guid: &str) -> Result<(), PlatformError> {
        let url = format!("{}/v3/apps/{}/actions/start", self.base()?, guid);
        let resp = self
            .authed(self.http.post(url))
            .timeout(ACTION_TIMEOUT)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(PlatformError::StartRejected {
                status: resp.status(),
            })
        }
    }
}

impl Platform for CfClient {
    fn reset(&mut self, api_endpoint: &str) {
        self.api_base = Some(auth::normalize_endpoint(api_endpoint));
        self.token = None;
    }

    async fn login(&mut self, username: &str, password: &str) -> Result<(), PlatformError> {
        CfClient::login(self, username, password).await
    }

    async fn get_org_guid(&self, name: &str) -> Result<String, PlatformError> {
        CfClient::get_org_guid(self, name).await
    }

    async fn get_space_guid(&self, org_guid: &str, name: &str) -> Result<String, PlatformError> {
        CfClient::get_space_guid(self, org_guid, name).await
    }

    async fn get_app_guid(&self, name: &str, space_guid: &str) -> Result<String, PlatformError> {
        CfClient::get_app_guid(self, name, space_guid).await
    }

    async fn get_app_status(&self, guid: &str) -> Result<AppState, PlatformError> {
        CfClient::get_app_status(self, guid).await
    }

    async fn start_application(&self, guid: &str) -> Result<(), PlatformError> {
        CfClient::start_application(self, guid).await
    }
}
