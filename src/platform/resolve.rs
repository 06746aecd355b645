use super::{CfClient, PlatformError, ResourceKind};
use crate::model::AppState;
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    guid: String,
}

#[derive(Debug, Deserialize)]
struct AppResource {
    #[serde(default)]
    state: Option<String>,
}

impl CfClient {
    /// Shared name lookup: queries a filtered collection endpoint and takes
    /// the first resource in API response order.
    async fn first_guid(
        &self,
        path: &str,
        query: &[(&str, &str)],
        kind: ResourceKind,
        name: &str,
    ) -> Result<String, PlatformError> {
        let url = format!("{}{path}", self.base()?);
        let resp = self.authed(self.http.get(url).query(query)).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(PlatformError::UnexpectedStatus {
                doing: format!("looking up {kind} \"{name}\""),
                status: resp.status(),
            });
        }
        let list: ResourceList = resp.json().await?;
        match list.resources.into_iter().next() {
            Some(resource) => Ok(resource.guid),
            None => Err(PlatformError::ResourceNotFound {
                kind,
                name: name.to_string(),
            }),
        }
    }

    pub async fn get_org_guid(&self, name: &str) -> Result<String, PlatformError> {
        self.first_guid(
            "/v3/organizations",
            &[("names", name)],
            ResourceKind::Organization,
            name,
        )
        .await
    }

    pub async fn get_space_guid(
        &self,
        org_guid: &str,
        name: &str,
    ) -> Result<String, PlatformError> {
        self.first_guid(
            "/v3/spaces",
            &[("names", name), ("organization_guids", org_guid)],
            ResourceKind::Space,
            name,
        )
        .await
    }

    pub async fn get_app_guid(&self, name: &str, space_guid: &str) -> Result<String, PlatformError> {
        self.first_guid(
            "/v3/apps",
            &[("names", name), ("space_guids", space_guid)],
            ResourceKind::Application,
            name,
        )
        .await
    }

    /// Reads an application's lifecycle state, with an explicit unknown
    /// sentinel when the field is absent.
    pub async fn get_app_status(&self, guid: &str) -> Result<AppState, PlatformError> {
        let url = format!("{}/v3/apps/{}", self.base()?, guid);
        let resp = self.authed(self.http.get(url)).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(PlatformError::UnexpectedStatus {
                doing: format!("reading application {guid}"),
                status: resp.status(),
            });
        }
        let app: AppResource = resp.json().await?;
        Ok(AppState::from_api(app.state.as_deref()))
    }
}
