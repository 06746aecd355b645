//! Text summary builder for CLI output and notifications.
//!
//! Formats the run summary as human-readable lines; the same lines feed
//! stdout and the notification sink.

use crate::model::{AccountStatus, RunSummary};
use std::time::Duration;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn build_text_summary(summary: &RunSummary) -> TextSummary {
    let mut lines = Vec::new();
    lines.push(format!(
        "Total: {}/{} applications running",
        summary.succeeded, summary.total
    ));

    for account in &summary.accounts {
        lines.push(String::new());
        match account.status {
            AccountStatus::Processed => lines.push(format!(
                "Account {}: {}/{} applications running",
                account.username, account.succeeded, account.total
            )),
            AccountStatus::Skipped => lines.push(format!(
                "Account {}: skipped ({})",
                account.username,
                account.detail.as_deref().unwrap_or("incomplete configuration")
            )),
            AccountStatus::LoginFailed
            | AccountStatus::OrgNotFound
            | AccountStatus::SpaceNotFound => lines.push(format!(
                "Account {}: {}",
                account.username,
                account.detail.as_deref().unwrap_or("failed")
            )),
        }
        for app in &account.apps {
            let mut line = format!("  {}: {}", app.name, app.disposition);
            if !app.waited.is_zero() {
                line.push_str(&format!(" after {}", humanize(app.waited)));
            }
            lines.push(line);
        }
    }

    TextSummary { lines }
}

/// Renders a duration rounded down to whole seconds; sub-second noise from
/// the poll loop has no place in a summary line.
pub(crate) fn humanize(duration: Duration) -> String {
    humantime::format_duration(Duration::from_secs(duration.as_secs())).to_string()
}
