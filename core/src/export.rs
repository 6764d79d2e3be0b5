use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::api::{push_optional, SchoolsApi};
use crate::error::ApiError;
use crate::models::FilterTuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    /// Exactly what the browse view is showing
    CurrentFilters,
    /// Every school of the selected district
    WholeDistrict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("select a district before exporting")]
    MissingDistrict,
    #[error("unknown export format: {0}")]
    UnknownFormat(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("could not save download: {0}")]
    Sink(String),
}

/// What gets sent to the download endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRequest {
    pub filters: FilterTuple,
    pub format: ExportFormat,
}

impl ExportRequest {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let f = &self.filters;
        let mut params = vec![("format", self.format.extension().to_string())];
        push_optional(&mut params, "year", f.year.as_deref());
        push_optional(&mut params, "state", f.state.as_deref());
        push_optional(&mut params, "district", f.district.as_deref());
        push_optional(&mut params, "school_type", Some(&f.school_type));
        push_optional(&mut params, "category", Some(&f.category));
        push_optional(&mut params, "management", Some(&f.management));
        push_optional(&mut params, "search", Some(&f.search));
        params
    }

    /// Suggested file name, e.g. `schools_0901.csv`
    pub fn file_name(&self) -> String {
        let district = self.filters.district.as_deref().unwrap_or("all");
        format!("schools_{}.{}", district, self.format.extension())
    }
}

/// Where downloaded bytes end up
pub trait DownloadSink {
    fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<(), ExportError>;
}

pub struct ExportDispatcher {
    api: Arc<dyn SchoolsApi>,
}

impl ExportDispatcher {
    pub fn new(api: Arc<dyn SchoolsApi>) -> Self {
        ExportDispatcher { api }
    }

    pub fn request_for(
        filters: &FilterTuple,
        scope: ExportScope,
        format: ExportFormat,
    ) -> Result<ExportRequest, ExportError> {
        if filters.district.is_none() {
            return Err(ExportError::MissingDistrict);
        }

        let mut filters = match scope {
            ExportScope::CurrentFilters => filters.clone(),
            ExportScope::WholeDistrict => filters.district_scope(),
        };
        filters.page = 1;

        Ok(ExportRequest { filters, format })
    }

    /// Download the export and hand it to `sink`; returns the file name used
    pub async fn export(
        &self,
        filters: &FilterTuple,
        scope: ExportScope,
        format: ExportFormat,
        sink: &dyn DownloadSink,
    ) -> Result<String, ExportError> {
        let request = Self::request_for(filters, scope, format)?;
        let bytes = self.api.export_schools(&request).await?;
        let file_name = request.file_name();

        sink.deliver(&file_name, &bytes)?;
        info!(file = %file_name, bytes = bytes.len(), "export saved");

        Ok(file_name)
    }
}
