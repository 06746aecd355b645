use crate::model::Account;

const DEFAULT_API_ENDPOINT: &str = "api.cf.ap21.hana.ondemand.com";
const DEFAULT_SPACE: &str = "dev";

const ACCOUNT_KEYS: [&str; 6] = [
    "CF_USERNAME",
    "CF_PASSWORD",
    "CF_API_ENDPOINT",
    "CF_ORG",
    "CF_SPACE",
    "CF_APPS",
];

/// Reads accounts from numbered `CF_*_1`, `CF_*_2`, … variable sets. The
/// scan stops at the first index with no variables at all; unsuffixed
/// `CF_*` variables are accepted as a single-account fallback. Accounts
/// with missing fields are still returned so the run can report them as
/// skipped instead of silently dropping them.
pub(crate) fn accounts_from_env() -> Vec<Account> {
    accounts_from(|key| std::env::var(key).ok())
}

fn accounts_from(get: impl Fn(&str) -> Option<String>) -> Vec<Account> {
    let mut accounts = Vec::new();
    for n in 1.. {
        let suffix = format!("_{n}");
        if !any_present(&get, &suffix) {
            break;
        }
        accounts.push(account_at(&get, &suffix));
    }
    if accounts.is_empty() && any_present(&get, "") {
        accounts.push(account_at(&get, ""));
    }
    accounts
}

fn any_present(get: &impl Fn(&str) -> Option<String>, suffix: &str) -> bool {
    ACCOUNT_KEYS
        .iter()
        .any(|key| get(&format!("{key}{suffix}")).is_some())
}

fn account_at(get: &impl Fn(&str) -> Option<String>, suffix: &str) -> Account {
    let var = |key: &str| get(&format!("{key}{suffix}")).unwrap_or_default();
    let or_default = |value: String, default: &str| {
        if value.trim().is_empty() {
            default.to_string()
        } else {
            value
        }
    };
    Account {
        username: var("CF_USERNAME"),
        password: var("CF_PASSWORD"),
        api_endpoint: or_default(var("CF_API_ENDPOINT"), DEFAULT_API_ENDPOINT),
        org: var("CF_ORG"),
        space: or_default(var("CF_SPACE"), DEFAULT_SPACE),
        apps: split_apps(&var("CF_APPS")),
    }
}

fn split_apps(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|app| !app.is_empty())
        .map(String::from)
        .collect()
}
