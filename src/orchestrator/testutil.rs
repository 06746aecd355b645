//! Scripted platform double for orchestrator and lifecycle tests.

use crate::model::AppState;
use crate::platform::{Platform, PlatformError, ResourceKind};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

pub(crate) struct FakePlatform {
    pub login_ok: bool,
    pub start_ok: bool,
    pub orgs: HashMap<String, String>,
    pub spaces: HashMap<String, String>,
    pub apps: HashMap<String, String>,
    states: RefCell<HashMap<String, VecDeque<AppState>>>,
    state_queries: Cell<usize>,
    fail_from: Cell<usize>,
    fail_count: Cell<usize>,
    calls: RefCell<Vec<String>>,
}

impl FakePlatform {
    pub(crate) fn new() -> Self {
        Self {
            login_ok: true,
            start_ok: true,
            orgs: HashMap::new(),
            spaces: HashMap::new(),
            apps: HashMap::new(),
            states: RefCell::default(),
            state_queries: Cell::new(0),
            fail_from: Cell::new(usize::MAX),
            fail_count: Cell::new(0),
            calls: RefCell::default(),
        }
    }

    /// Fake with the canonical org/space target and the given
    /// app name → guid entries.
    pub(crate) fn with_target(apps: &[(&str, &str)]) -> Self {
        let mut fake = Self::new();
        fake.orgs.insert("acme".into(), "org-guid".into());
        fake.spaces.insert("dev".into(), "space-guid".into());
        for (name, guid) in apps {
            fake.apps.insert(name.to_string(), guid.to_string());
        }
        fake
    }

    /// Scripts state observations for a guid; the final entry repeats once
    /// the script is exhausted.
    pub(crate) fn script_states(&self, guid: &str, states: &[AppState]) {
        self.states
            .borrow_mut()
            .insert(guid.to_string(), states.iter().cloned().collect());
    }

    /// Makes `count` state queries fail, starting after `skip` successful
    /// ones. Failing queries do not consume the scripted states.
    pub(crate) fn fail_state_queries_after(&self, skip: usize, count: usize) {
        self.fail_from.set(skip);
        self.fail_count.set(count);
    }

    pub(crate) fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn next_state(&self, guid: &str) -> AppState {
        let mut states = self.states.borrow_mut();
        let queue = states
            .get_mut(guid)
            .expect("state queried for an app without a script");
        if queue.len() > 1 {
            queue.pop_front().expect("non-empty queue")
        } else {
            queue.front().cloned().unwrap_or(AppState::Unknown)
        }
    }
}

impl Platform for FakePlatform {
    fn reset(&mut self, api_endpoint: &str) {
        self.record(format!("reset {api_endpoint}"));
    }

    async fn login(&mut self, username: &str, _password: &str) -> Result<(), PlatformError> {
        self.record(format!("login {username}"));
        if self.login_ok {
            Ok(())
        } else {
            Err(PlatformError::Login {
                reason: "token endpoint returned 401 Unauthorized".into(),
            })
        }
    }

    async fn get_org_guid(&self, name: &str) -> Result<String, PlatformError> {
        self.record(format!("org {name}"));
        self.orgs
            .get(name)
            .cloned()
            .ok_or_else(|| PlatformError::ResourceNotFound {
                kind: ResourceKind::Organization,
                name: name.to_string(),
            })
    }

    async fn get_space_guid(&self, _org_guid: &str, name: &str) -> Result<String, PlatformError> {
        self.record(format!("space {name}"));
        self.spaces
            .get(name)
            .cloned()
            .ok_or_else(|| PlatformError::ResourceNotFound {
                kind: ResourceKind::Space,
                name: name.to_string(),
            })
    }

    async fn get_app_guid(&self, name: &str, _space_guid: &str) -> Result<String, PlatformError> {
        self.record(format!("resolve {name}"));
        self.apps
            .get(name)
            .cloned()
            .ok_or_else(|| PlatformError::ResourceNotFound {
                kind: ResourceKind::Application,
                name: name.to_string(),
            })
    }

    async fn get_app_status(&self, guid: &str) -> Result<AppState, PlatformError> {
        self.record(format!("state {guid}"));
        let seen = self.state_queries.get();
        self.state_queries.set(seen + 1);
        if seen >= self.fail_from.get() && seen < self.fail_from.get() + self.fail_count.get() {
            return Err(PlatformError::UnexpectedStatus {
                doing: format!("reading application {guid}"),
                status: reqwest::StatusCode::BAD_GATEWAY,
            });
        }
        Ok(self.next_state(guid))
    }

    async fn start_application(&self, guid: &str) -> Result<(), PlatformError> {
        self.record(format!("start {guid}"));
        if self.start_ok {
            Ok(())
        } else {
            Err(PlatformError::StartRejected {
                status: reqwest::StatusCode::UNPROCESSABLE_ENTITY,
            })
        }
    }
}
