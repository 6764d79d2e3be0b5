use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use udise_core::{
    ApiError, ApiResult, District, ExportRequest, ListSchoolsQuery, SchoolsApi, SchoolsPage,
    State, SyncReport, Year,
};

use crate::app_config::AppConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// `SchoolsApi` over the dashboard's REST backend
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct LocationBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<&'a str>,
    state: &'a str,
    district: &'a str,
}

impl HttpClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("udise/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpClient {
            client,
            base_url: config.api_url.clone(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        debug!(url = %response.url(), %status, "api response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let response = self
            .send(self.request(reqwest::Method::GET, path).query(query))
            .await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .send(self.request(reqwest::Method::POST, path).json(body))
            .await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SchoolsApi for HttpClient {
    async fn list_schools(&self, query: &ListSchoolsQuery) -> ApiResult<SchoolsPage> {
        self.get_json("schools", &query.to_params()).await
    }

    async fn run_directory_sync(
        &self,
        year: &str,
        state: &str,
        district: &str,
    ) -> ApiResult<SyncReport> {
        let body = LocationBody {
            year: Some(year),
            state,
            district,
        };
        self.post_json("sync/directory", &body).await
    }

    async fn run_gis_sync(&self, state: &str, district: &str) -> ApiResult<SyncReport> {
        let body = LocationBody {
            year: None,
            state,
            district,
        };
        self.post_json("sync/gis", &body).await
    }

    async fn run_details_sync(
        &self,
        year: &str,
        state: &str,
        district: &str,
    ) -> ApiResult<SyncReport> {
        let body = LocationBody {
            year: Some(year),
            state,
            district,
        };
        self.post_json("sync/details", &body).await
    }

    async fn get_years(&self) -> ApiResult<Vec<Year>> {
        self.get_json("years", &[]).await
    }

    async fn get_master_states(&self, year: &str) -> ApiResult<Vec<State>> {
        self.get_json("master/states", &[("year", year.to_string())])
            .await
    }

    async fn get_master_districts(&self, state: &str, year: &str) -> ApiResult<Vec<District>> {
        self.get_json(
            "master/districts",
            &[("state", state.to_string()), ("year", year.to_string())],
        )
        .await
    }

    async fn get_synced_states(&self) -> ApiResult<Vec<State>> {
        self.get_json("synced/states", &[]).await
    }

    async fn get_synced_districts(&self, state: &str) -> ApiResult<Vec<District>> {
        self.get_json("synced/districts", &[("state", state.to_string())])
            .await
    }

    async fn export_schools(&self, request: &ExportRequest) -> ApiResult<Vec<u8>> {
        let response = self
            .send(
                self.request(reqwest::Method::GET, "schools/export")
                    .query(&request.to_params()),
            )
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Map a failed response to the error taxonomy
pub fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
        StatusCode::CONFLICT => ApiError::Conflict(message),
        _ => ApiError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull a readable message out of an error body, JSON or not
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }

    match body.trim() {
        "" => "no details".to_string(),
        text => text.to_string(),
    }
}
