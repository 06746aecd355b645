use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One configured Cloud Foundry account and its target applications.
#[derive(Clone)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub api_endpoint: String,
    pub org: String,
    pub space: String,
    pub apps: Vec<String>,
}

impl Account {
    /// Accounts missing credentials or an organization are skipped without
    /// a login attempt.
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty()
            && !self.password.trim().is_empty()
            && !self.org.trim().is_empty()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_endpoint", &self.api_endpoint)
            .field("org", &self.org)
            .field("space", &self.space)
            .field("apps", &self.apps)
            .finish()
    }
}

/// Timing knobs for the start/poll loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPolicy {
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub wait_budget: Duration,
}

/// Platform-reported application lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    Started,
    Stopped,
    Crashed,
    /// State field absent from the response.
    Unknown,
    /// Any other state string (e.g. STARTING), treated as transient.
    Other(String),
}

impl AppState {
    pub fn from_api(state: Option<&str>) -> Self {
        match state {
            Some("STARTED") => AppState::Started,
            Some("STOPPED") => AppState::Stopped,
            Some("CRASHED") => AppState::Crashed,
            Some(other) => AppState::Other(other.to_string()),
            None => AppState::Unknown,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AppState::Started => "STARTED",
            AppState::Stopped => "STOPPED",
            AppState::Crashed => "CRASHED",
            AppState::Unknown => "UNKNOWN",
            AppState::Other(s) => s,
        }
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one application's start attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartDisposition {
    /// Running before any start command was issued.
    AlreadyRunning,
    Started,
    NotFound,
    StartFailed,
    Stopped,
    Crashed,
    TimedOut,
}

impl StartDisposition {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            StartDisposition::AlreadyRunning | StartDisposition::Started
        )
    }
}

impl fmt::Display for StartDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StartDisposition::AlreadyRunning => "already running",
            StartDisposition::Started => "started",
            StartDisposition::NotFound => "not found",
            StartDisposition::StartFailed => "start command failed",
            StartDisposition::Stopped => "stopped",
            StartDisposition::Crashed => "crashed",
            StartDisposition::TimedOut => "timed out",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationOutcome {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub disposition: StartDisposition,
    /// Wall-clock time spent waiting for the application to come up.
    #[serde(with = "humantime_serde")]
    pub waited: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApplicationOutcome {
    pub fn is_success(&self) -> bool {
        self.disposition.is_success()
    }
}

/// How far an account's processing got before stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Incomplete configuration; no login was attempted.
    Skipped,
    LoginFailed,
    OrgNotFound,
    SpaceNotFound,
    Processed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountOutcome {
    pub username: String,
    pub org: String,
    pub space: String,
    pub status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub apps: Vec<ApplicationOutcome>,
    pub succeeded: usize,
    /// Configured application count, whether or not they were reached.
    pub total: usize,
}

impl AccountOutcome {
    /// Outcome for an account that never reached its applications. `total`
    /// still counts the configured apps so the run-level verdict sees them.
    pub fn failed(account: &Account, status: AccountStatus, detail: Option<String>) -> Self {
        Self {
            username: account.username.clone(),
            org: account.org.clone(),
            space: account.space.clone(),
            status,
            detail,
            apps: Vec::new(),
            succeeded: 0,
            total: account.apps.len(),
        }
    }
}

/// Terminal artifact of one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default)]
    pub timestamp_utc: String,
    pub accounts: Vec<AccountOutcome>,
    pub succeeded: usize,
    pub total: usize,
}

impl RunSummary {
    /// True when every configured application across every account reached a
    /// running state. Accounts that failed before their applications count
    /// those applications as unprocessed, hence unsuccessful.
    pub fn is_success(&self) -> bool {
        self.succeeded == self.total
    }
}

/// Progress events emitted by the orchestrator and consumed by the CLI layer.
#[derive(Debug, Clone)]
pub enum RunEvent {
    AccountStarted { username: String },
    AccountSkipped { username: String, reason: String },
    AccountFailed { username: String, reason: String },
    AppObserved { name: String, state: AppState },
    StartIssued { name: String },
    AppFinished { outcome: ApplicationOutcome },
    AccountFinished { username: String, succeeded: usize, total: usize },
    Info(String),
}
