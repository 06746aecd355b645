//! Application lifecycle controller.
//!
//! The start action is fire-and-forget on the platform side; only state
//! polling confirms the result. The controller bounds the wait with a
//! wall-clock budget so a run always terminates.

use crate::model::{AppState, ApplicationOutcome, RunEvent, StartDisposition, StartPolicy};
use crate::platform::Platform;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

/// Brings one application to a running state: resolve, check, start, poll.
/// Never fails the caller; every path ends in an `ApplicationOutcome`.
pub(crate) async fn ensure_app_started<P: Platform>(
    client: &P,
    name: &str,
    space_guid: &str,
    policy: &StartPolicy,
    events: &UnboundedSender<RunEvent>,
) -> ApplicationOutcome {
    let guid = match client.get_app_guid(name, space_guid).await {
        Ok(guid) => guid,
        Err(err) => {
            return ApplicationOutcome {
                name: name.to_string(),
                guid: None,
                disposition: StartDisposition::NotFound,
                waited: Duration::ZERO,
                detail: Some(err.to_string()),
            };
        }
    };

    // Idempotence: an application already running is left alone.
    // A failed pre-check does not block the start attempt; the poll loop
    // settles the real state.
    match client.get_app_status(&guid).await {
        Ok(AppState::Started) => {
            let _ = events.send(RunEvent::AppObserved {
                name: name.to_string(),
                state: AppState::Started,
            });
            return ApplicationOutcome {
                name: name.to_string(),
                guid: Some(guid),
                disposition: StartDisposition::AlreadyRunning,
                waited: Duration::ZERO,
                detail: None,
            };
        }
        Ok(state) => {
            let _ = events.send(RunEvent::AppObserved {
                name: name.to_string(),
                state,
            });
        }
        Err(err) => {
            let _ = events.send(RunEvent::Info(format!(
                "state check for {name} failed: {err}"
            )));
        }
    }

    if let Err(err) = client.start_application(&guid).await {
        return ApplicationOutcome {
            name: name.to_string(),
            guid: Some(guid),
            disposition: StartDisposition::StartFailed,
            waited: Duration::ZERO,
            detail: Some(err.to_string()),
        };
    }
    let _ = events.send(RunEvent::StartIssued {
        name: name.to_string(),
    });

    wait_for_started(client, name, &guid, policy, events).await
}

/// Polls on a fixed interval until the application reports `STARTED`, dies
/// (`STOPPED`/`CRASHED`), or the budget elapses. Unknown or in-between
/// states are transient and bounded by the same budget.
async fn wait_for_started<P: Platform>(
    client: &P,
    name: &str,
    guid: &str,
    policy: &StartPolicy,
    events: &UnboundedSender<RunEvent>,
) -> ApplicationOutcome {
    let started_at = Instant::now();
    let outcome = |disposition, waited, detail| ApplicationOutcome {
        name: name.to_string(),
        guid: Some(guid.to_string()),
        disposition,
        waited,
        detail,
    };

    loop {
        let waited = started_at.elapsed();
        if waited >= policy.wait_budget {
            return outcome(
                StartDisposition::TimedOut,
                waited,
                Some(format!(
                    "no STARTED observation within {}",
                    humantime::format_duration(policy.wait_budget)
                )),
            );
        }

        match client.get_app_status(guid).await {
            Ok(AppState::Started) => {
                return outcome(StartDisposition::Started, started_at.elapsed(), None);
            }
            Ok(AppState::Stopped) => {
                return outcome(
                    StartDisposition::Stopped,
                    started_at.elapsed(),
                    Some("application reported STOPPED while waiting".into()),
                );
            }
            Ok(AppState::Crashed) => {
                return outcome(
                    StartDisposition::Crashed,
                    started_at.elapsed(),
                    Some("application reported CRASHED while waiting".into()),
                );
            }
            Ok(state) => {
                let _ = events.send(RunEvent::AppObserved {
                    name: name.to_string(),
                    state,
                });
            }
            Err(err) => {
                let _ = events.send(RunEvent::Info(format!(
                    "state poll for {name} failed: {err}"
                )));
            }
        }

        tokio::time::sleep(policy.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::testutil::FakePlatform;
    use tokio::sync::mpsc;

    fn fast_policy() -> StartPolicy {
        StartPolicy {
            poll_interval: Duration::from_millis(5),
            wait_budget: Duration::from_secs(2),
        }
    }

    fn events() -> (
        mpsc::UnboundedSender<RunEvent>,
        mpsc::UnboundedReceiver<RunEvent>,
    ) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn running_app_is_left_alone() {
        let fake = FakePlatform::with_target(&[("web", "guid-web")]);
        fake.script_states("guid-web", &[AppState::Started]);
        let (tx, _rx) = events();

        let outcome = ensure_app_started(&fake, "web", "space-guid", &fast_policy(), &tx).await;

        assert_eq!(outcome.disposition, StartDisposition::AlreadyRunning);
        assert!(outcome.is_success());
        assert_eq!(outcome.waited, Duration::ZERO);
        assert_eq!(fake.count_calls("start"), 0);
        assert_eq!(fake.count_calls("state"), 1);
    }

    #[tokio::test]
    async fn stopped_app_starts_after_transient_polls() {
        let fake = FakePlatform::with_target(&[("web", "guid-web")]);
        fake.script_states(
            "guid-web",
            &[
                AppState::Stopped,
                AppState::Other("STARTING".into()),
                AppState::Other("STARTING".into()),
                AppState::Started,
            ],
        );
        let (tx, _rx) = events();

        let policy = fast_policy();
        let outcome = ensure_app_started(&fake, "web", "space-guid", &policy, &tx).await;

        assert_eq!(outcome.disposition, StartDisposition::Started);
        assert_eq!(outcome.guid.as_deref(), Some("guid-web"));
        assert_eq!(fake.count_calls("start"), 1);
        // One pre-check plus exactly three polls.
        assert_eq!(fake.count_calls("state"), 4);
        assert!(outcome.waited < policy.wait_budget);
    }

    #[tokio::test]
    async fn crash_terminates_polling_immediately() {
        let fake = FakePlatform::with_target(&[("web", "guid-web")]);
        fake.script_states(
            "guid-web",
            &[
                AppState::Unknown,
                AppState::Other("STARTING".into()),
                AppState::Crashed,
            ],
        );
        let (tx, _rx) = events();

        let outcome = ensure_app_started(&fake, "web", "space-guid", &fast_policy(), &tx).await;

        assert_eq!(outcome.disposition, StartDisposition::Crashed);
        assert_eq!(fake.count_calls("state"), 3);
        assert!(outcome.waited < Duration::from_secs(1));
        assert!(outcome.detail.as_deref().unwrap().contains("CRASHED"));
    }

    #[tokio::test]
    async fn stopped_observation_is_terminal_too() {
        let fake = FakePlatform::with_target(&[("web", "guid-web")]);
        fake.script_states("guid-web", &[AppState::Unknown, AppState::Stopped]);
        let (tx, _rx) = events();

        let outcome = ensure_app_started(&fake, "web", "space-guid", &fast_policy(), &tx).await;

        assert_eq!(outcome.disposition, StartDisposition::Stopped);
        assert_eq!(fake.count_calls("state"), 2);
    }

    #[tokio::test]
    async fn polling_times_out_within_budget_plus_one_interval() {
        let fake = FakePlatform::with_target(&[("web", "guid-web")]);
        fake.script_states("guid-web", &[AppState::Other("STARTING".into())]);
        let (tx, _rx) = events();

        let policy = StartPolicy {
            poll_interval: Duration::from_millis(10),
            wait_budget: Duration::from_millis(35),
        };
        let outcome = ensure_app_started(&fake, "web", "space-guid", &policy, &tx).await;

        assert_eq!(outcome.disposition, StartDisposition::TimedOut);
        assert!(outcome.waited >= policy.wait_budget);
        // Budget plus one interval of slack, with headroom for slow CI.
        assert!(outcome.waited < Duration::from_millis(150));
        assert!(fake.count_calls("state") >= 2);
    }

    #[tokio::test]
    async fn unknown_state_while_polling_is_transient() {
        let fake = FakePlatform::with_target(&[("web", "guid-web")]);
        fake.script_states(
            "guid-web",
            &[AppState::Unknown, AppState::Unknown, AppState::Started],
        );
        let (tx, _rx) = events();

        let outcome = ensure_app_started(&fake, "web", "space-guid", &fast_policy(), &tx).await;

        assert_eq!(outcome.disposition, StartDisposition::Started);
        assert_eq!(fake.count_calls("state"), 3);
    }

    #[tokio::test]
    async fn failed_state_query_while_polling_is_transient() {
        let fake = FakePlatform::with_target(&[("web", "guid-web")]);
        fake.script_states("guid-web", &[AppState::Stopped, AppState::Started]);
        let (tx, _rx) = events();

        // Fails the first poll after the pre-check and the start action.
        fake.fail_state_queries_after(1, 1);
        let outcome = ensure_app_started(&fake, "web", "space-guid", &fast_policy(), &tx).await;

        assert_eq!(outcome.disposition, StartDisposition::Started);
    }

    #[tokio::test]
    async fn failed_pre_check_still_issues_the_start_command() {
        let fake = FakePlatform::with_target(&[("web", "guid-web")]);
        fake.script_states("guid-web", &[AppState::Started]);
        let (tx, _rx) = events();

        fake.fail_state_queries_after(0, 1);
        let outcome = ensure_app_started(&fake, "web", "space-guid", &fast_policy(), &tx).await;

        assert_eq!(outcome.disposition, StartDisposition::Started);
        assert_eq!(fake.count_calls("start"), 1);
    }

    #[tokio::test]
    async fn unresolved_app_reports_not_found_without_further_calls() {
        let fake = FakePlatform::with_target(&[]);
        let (tx, _rx) = events();

        let outcome = ensure_app_started(&fake, "ghost", "space-guid", &fast_policy(), &tx).await;

        assert_eq!(outcome.disposition, StartDisposition::NotFound);
        assert!(outcome.guid.is_none());
        assert_eq!(fake.count_calls("state"), 0);
        assert_eq!(fake.count_calls("start"), 0);
        assert!(outcome.detail.as_deref().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn rejected_start_command_skips_polling() {
        let mut fake = FakePlatform::with_target(&[("web", "guid-web")]);
        fake.start_ok = false;
        fake.script_states("guid-web", &[AppState::Stopped]);
        let (tx, _rx) = events();

        let outcome = ensure_app_started(&fake, "web", "space-guid", &fast_policy(), &tx).await;

        assert_eq!(outcome.disposition, StartDisposition::StartFailed);
        // Only the pre-check queried state; no polling happened.
        assert_eq!(fake.count_calls("state"), 1);
        assert!(outcome.detail.as_deref().unwrap().contains("rejected"));
    }
}
