use crate::model::{RunEvent, RunSummary, StartPolicy};
use crate::platform::CfClient;
use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "cf-autostart",
    version,
    about = "Start Cloud Foundry applications across accounts and report the outcome"
)]
pub struct Cli {
    /// Interval between application state polls
    #[arg(long, default_value = "3s")]
    pub poll_interval: humantime::Duration,

    /// Wall-clock budget to wait for each application to start
    #[arg(long, default_value = "60s")]
    pub wait_budget: humantime::Duration,

    /// Timeout applied to individual platform requests
    #[arg(long, default_value = "15s")]
    pub request_timeout: humantime::Duration,

    /// Print the run summary as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Suppress progress output (for cron usage)
    #[arg(long)]
    pub silent: bool,

    /// Telegram bot token for the summary notification
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat to send the summary to
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    /// Skip the Telegram notification even when configured
    #[arg(long)]
    pub no_notify: bool,
}

/// Runs one orchestration pass over all configured accounts. Returns
/// whether every configured application ended up running.
pub async fn run(args: Cli) -> Result<bool> {
    let accounts = crate::config::accounts_from_env();
    if accounts.is_empty() {
        anyhow::bail!(
            "no accounts configured; set CF_USERNAME_1, CF_PASSWORD_1, CF_ORG_1, CF_APPS_1"
        );
    }

    let policy = StartPolicy {
        poll_interval: args.poll_interval.into(),
        wait_budget: args.wait_budget.into(),
    };
    let client = CfClient::new(Duration::from(args.request_timeout))
        .context("failed to build HTTP client")?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RunEvent>();
    let handle = tokio::spawn(async move {
        let mut client = client;
        crate::orchestrator::run_accounts(&mut client, &accounts, &policy, &event_tx).await
    });

    // The sender is dropped when the orchestrator finishes, which ends
    // this loop.
    while let Some(event) = event_rx.recv().await {
        if !args.silent {
            eprintln!("{}", render_event(&event));
        }
    }

    let summary = handle.await.context("orchestrator task failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in crate::text_summary::build_text_summary(&summary).lines {
            println!("{line}");
        }
    }

    if !args.no_notify {
        notify_summary(&args, &summary).await;
    }

    Ok(summary.is_success())
}

fn render_event(event: &RunEvent) -> String {
    match event {
        RunEvent::AccountStarted { username } => format!("-- account {username} --"),
        RunEvent::AccountSkipped { username, reason } => {
            format!("account {username}: skipped ({reason})")
        }
        RunEvent::AccountFailed { username, reason } => format!("account {username}: {reason}"),
        RunEvent::AppObserved { name, state } => format!("{name}: state {state}"),
        RunEvent::StartIssued { name } => format!("{name}: start requested"),
        RunEvent::AppFinished { outcome } => {
            let mut line = format!("{}: {}", outcome.name, outcome.disposition);
            if !outcome.waited.is_zero() {
                line.push_str(&format!(
                    " after {}",
                    crate::text_summary::humanize(outcome.waited)
                ));
            }
            if let Some(detail) = outcome.detail.as_deref() {
                if !outcome.is_success() {
                    line.push_str(&format!(" ({detail})"));
                }
            }
            line
        }
        RunEvent::AccountFinished {
            username,
            succeeded,
            total,
        } => format!("account {username}: {succeeded}/{total} applications running"),
        RunEvent::Info(message) => message.clone(),
    }
}

async fn notify_summary(args: &Cli, summary: &RunSummary) {
    let (Some(token), Some(chat_id)) = (
        args.telegram_bot_token.as_deref(),
        args.telegram_chat_id.as_deref(),
    ) else {
        return;
    };

    match crate::notify::Notifier::new(token, chat_id) {
        Ok(notifier) => {
            let text = crate::text_summary::build_text_summary(summary).lines.join("\n");
            match notifier.send(&text).await {
                Ok(()) => {
                    if !args.silent {
                        eprintln!("notification sent");
                    }
                }
                Err(err) => eprintln!("notification failed: {err:#}"),
            }
        }
        Err(err) => eprintln!("notification skipped: {err:#}"),
    }
}
