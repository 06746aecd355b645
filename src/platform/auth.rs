use super::{CfClient, PlatformError, ACTION_TIMEOUT};
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    authorization_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

/// Ensures the endpoint carries a scheme and no trailing slash.
pub(super) fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

impl CfClient {
    /// Reads the platform's well-known info document and returns the
    /// identity provider's base URL.
    async fn discover_auth_endpoint(&self) -> Result<String, PlatformError> {
        let url = format!("{}/v2/info", self.base()?);
        let resp = self.http.get(url).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(PlatformError::AuthDiscovery {
                reason: format!("info endpoint returned {}", resp.status()),
            });
        }
        let info: InfoResponse =
            resp.json()
                .await
                .map_err(|err| PlatformError::AuthDiscovery {
                    reason: format!("malformed info response: {err}"),
                })?;
        if info.authorization_endpoint.is_empty() {
            return Err(PlatformError::AuthDiscovery {
                reason: "no authorization_endpoint in info response".into(),
            });
        }
        Ok(info.authorization_endpoint)
    }

    /// Exchanges credentials for a bearer token via the OAuth password grant
    /// and installs it on the session. The `cf` public client with an empty
    /// secret is the platform's fixed CLI client identifier.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), PlatformError> {
        let auth_endpoint = self.discover_auth_endpoint().await?;
        let token_url = format!("{auth_endpoint}/oauth/token");
        let resp = self
            .http
            .post(token_url)
            .basic_auth("cf", Some(""))
            .form(&[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
            ])
            .timeout(ACTION_TIMEOUT)
            .send()
            .await?;
        if resp.status() != StatusCode::OK {
            return Err(PlatformError::Login {
                reason: format!("token endpoint returned {}", resp.status()),
            });
        }
        let token: TokenResponse = resp.json().await.map_err(|err| PlatformError::Login {
            reason: format!("malformed token response: {err}"),
        })?;
        if token.access_token.is_empty() {
            return Err(PlatformError::Login {
                reason: "no access_token in token response".into(),
            });
        }
        self.token = Some(token.access_token);
        Ok(())
    }
}
