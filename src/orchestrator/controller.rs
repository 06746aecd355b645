//! Sequential account loop.
//!
//! Accounts, and applications within an account, are processed strictly in
//! order. The work is rate-limited by a third-party API and runs on a
//! schedule, so there is nothing to gain from concurrency here.

use super::lifecycle;
use crate::model::{
    Account, AccountOutcome, AccountStatus, RunEvent, RunSummary, StartPolicy,
};
use crate::platform::Platform;
use tokio::sync::mpsc::UnboundedSender;

/// Processes every configured account and returns the run summary. Always
/// completes: every failure is folded into the summary, never raised.
pub(crate) async fn run_accounts<P: Platform>(
    client: &mut P,
    accounts: &[Account],
    policy: &StartPolicy,
    events: &UnboundedSender<RunEvent>,
) -> RunSummary {
    let mut outcomes = Vec::with_capacity(accounts.len());
    for account in accounts {
        outcomes.push(process_account(client, account, policy, events).await);
    }
    let succeeded = outcomes.iter().map(|account| account.succeeded).sum();
    let total = outcomes.iter().map(|account| account.total).sum();
    RunSummary {
        timestamp_utc: now_rfc3339(),
        accounts: outcomes,
        succeeded,
        total,
    }
}

async fn process_account<P: Platform>(
    client: &mut P,
    account: &Account,
    policy: &StartPolicy,
    events: &UnboundedSender<RunEvent>,
) -> AccountOutcome {
    let username = account.username.clone();

    if !account.is_complete() {
        let reason = "incomplete configuration (username, password, or org missing)";
        let _ = events.send(RunEvent::AccountSkipped {
            username,
            reason: reason.to_string(),
        });
        return AccountOutcome::failed(account, AccountStatus::Skipped, Some(reason.to_string()));
    }

    let _ = events.send(RunEvent::AccountStarted {
        username: username.clone(),
    });

    // Fresh session per account; a prior bearer token must never leak across.
    client.reset(&account.api_endpoint);

    if let Err(err) = client.login(&account.username, &account.password).await {
        let _ = events.send(RunEvent::AccountFailed {
            username,
            reason: err.to_string(),
        });
        return AccountOutcome::failed(account, AccountStatus::LoginFailed, Some(err.to_string()));
    }

    let org_guid = match client.get_org_guid(&account.org).await {
        Ok(guid) => guid,
        Err(err) => {
            let _ = events.send(RunEvent::AccountFailed {
                username,
                reason: err.to_string(),
            });
            return AccountOutcome::failed(
                account,
                AccountStatus::OrgNotFound,
                Some(err.to_string()),
            );
        }
    };

    let space_guid = match client.get_space_guid(&org_guid, &account.space).await {
        Ok(guid) => guid,
        Err(err) => {
            let _ = events.send(RunEvent::AccountFailed {
                username,
                reason: err.to_string(),
            });
            return AccountOutcome::failed(
                account,
                AccountStatus::SpaceNotFound,
                Some(err.to_string()),
            );
        }
    };

    // One bad application never aborts the rest of the account.
    let mut apps = Vec::with_capacity(account.apps.len());
    for name in &account.apps {
        let outcome = lifecycle::ensure_app_started(&*client, name, &space_guid, policy, events).await;
        let _ = events.send(RunEvent::AppFinished {
            outcome: outcome.clone(),
        });
        apps.push(outcome);
    }

    let succeeded = apps.iter().filter(|app| app.is_success()).count();
    let total = apps.len();
    let _ = events.send(RunEvent::AccountFinished {
        username: username.clone(),
        succeeded,
        total,
    });

    AccountOutcome {
        username,
        org: account.org.clone(),
        space: account.space.clone(),
        status: AccountStatus::Processed,
        detail: None,
        apps,
        succeeded,
        total,
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}
