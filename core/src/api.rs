use async_trait::async_trait;
use serde::Serialize;

use crate::error::ApiResult;
use crate::export::ExportRequest;
use crate::models::{District, FilterTuple, SchoolsPage, State, SyncReport, Year, ALL};

/// Arguments of a single school listing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSchoolsQuery {
    pub state: Option<String>,
    pub district: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub school_type: String,
    pub management: String,
    pub year: Option<String>,
    pub search: String,
    pub category: String,
}

impl ListSchoolsQuery {
    pub fn from_filters(filters: &FilterTuple, limit: u32) -> Self {
        ListSchoolsQuery {
            state: filters.state.clone(),
            district: filters.district.clone(),
            page: filters.page.max(1),
            limit,
            school_type: filters.school_type.clone(),
            management: filters.management.clone(),
            year: filters.year.clone(),
            search: filters.search.clone(),
            category: filters.category.clone(),
        }
    }

    /// Query parameters for the wire; unset and `"all"` values are omitted
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        push_optional(&mut params, "state", self.state.as_deref());
        push_optional(&mut params, "district", self.district.as_deref());
        push_optional(&mut params, "year", self.year.as_deref());
        push_optional(&mut params, "school_type", Some(&self.school_type));
        push_optional(&mut params, "category", Some(&self.category));
        push_optional(&mut params, "management", Some(&self.management));
        push_optional(&mut params, "search", Some(&self.search));
        params
    }
}

pub(crate) fn push_optional(
    params: &mut Vec<(&'static str, String)>,
    key: &'static str,
    value: Option<&str>,
) {
    if let Some(value) = value.filter(|v| !v.is_empty() && *v != ALL) {
        params.push((key, value.to_string()));
    }
}

/// The backend capabilities the dashboard core relies on
#[async_trait]
pub trait SchoolsApi: Send + Sync {
    /// One page of schools, at most `query.limit` records
    async fn list_schools(&self, query: &ListSchoolsQuery) -> ApiResult<SchoolsPage>;

    /// Stage 1: directory listing and coordinates for a location
    async fn run_directory_sync(
        &self,
        year: &str,
        state: &str,
        district: &str,
    ) -> ApiResult<SyncReport>;

    async fn run_gis_sync(&self, state: &str, district: &str) -> ApiResult<SyncReport>;

    /// Stage 2: per-school report data
    async fn run_details_sync(
        &self,
        year: &str,
        state: &str,
        district: &str,
    ) -> ApiResult<SyncReport>;

    async fn get_years(&self) -> ApiResult<Vec<Year>>;

    async fn get_master_states(&self, year: &str) -> ApiResult<Vec<State>>;

    async fn get_master_districts(&self, state: &str, year: &str) -> ApiResult<Vec<District>>;

    async fn get_synced_states(&self) -> ApiResult<Vec<State>>;

    async fn get_synced_districts(&self, state: &str) -> ApiResult<Vec<District>>;

    /// Raw bytes of a CSV or JSON download
    async fn export_schools(&self, request: &ExportRequest) -> ApiResult<Vec<u8>>;
}
