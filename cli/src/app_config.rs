use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use udise_core::{models::DEFAULT_PAGE_SIZE, QueryConfig, SelectedLocation};

use crate::{args::ConfigArgs, profile::Profile};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Serialize)]
pub struct AppConfig {
    pub profile_name: String,
    pub profile_path: String,
    pub profile_exists: bool,
    pub api_url: String,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub has_token: bool,
    pub page_size: u32,
    pub debounce_ms: u64,
    pub dedupe_pages: bool,
    pub selection: SelectedLocation,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            profile_name: "default".to_string(),
            profile_path: "./".to_string(),
            profile_exists: false,
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            has_token: false,
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            dedupe_pages: false,
            selection: SelectedLocation::default(),
        }
    }
}

impl AppConfig {
    /// Command line and environment win over the profile, the profile over defaults
    pub fn from_args(
        args: &ConfigArgs,
        profile_name: &str,
        profile_path: &Path,
        profile: Option<&Profile>,
    ) -> Self {
        let defaults = AppConfig::default();

        let api_url = args
            .api_url
            .clone()
            .or_else(|| profile.and_then(|p| p.api_url.clone()))
            .unwrap_or(defaults.api_url);
        let token = args
            .token
            .clone()
            .or_else(|| profile.and_then(|p| p.token.clone()))
            .filter(|t| !t.is_empty());

        AppConfig {
            profile_name: profile_name.to_string(),
            profile_exists: profile.is_some(),
            profile_path: profile_path
                .to_str()
                .map(|p| p.to_string())
                .unwrap_or(defaults.profile_path),
            api_url: api_url.trim_end_matches('/').to_string(),
            has_token: token.is_some(),
            token,
            page_size: profile
                .and_then(|p| p.page_size)
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
            debounce_ms: profile
                .and_then(|p| p.debounce_ms)
                .unwrap_or(defaults.debounce_ms),
            dedupe_pages: profile.is_some_and(|p| p.dedupe_pages),
            selection: profile
                .map(|p| p.selection.clone())
                .unwrap_or(defaults.selection),
        }
    }

    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            page_size: self.page_size,
            debounce: Duration::from_millis(self.debounce_ms),
            dedupe_pages: self.dedupe_pages,
        }
    }

    pub fn report_url(&self, school_id: &str) -> String {
        format!("{}/schools/{}/report", self.api_url, school_id)
    }
}
