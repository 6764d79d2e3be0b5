//! Reference data that populates the filter domain. Failures are logged and
//! degrade to an empty list.

use tracing::warn;

use crate::api::SchoolsApi;
use crate::error::ApiResult;
use crate::models::{District, State, Year};

/// Which catalogue to read locations from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    /// Everything the upstream portal knows about
    Master,
    /// Only locations that have been synced at least once
    Synced,
}

pub async fn load_years(api: &dyn SchoolsApi) -> Vec<Year> {
    or_empty("years", api.get_years().await)
}

pub async fn load_states(
    api: &dyn SchoolsApi,
    source: LocationSource,
    year: Option<&str>,
) -> Vec<State> {
    let result = match (source, year) {
        (LocationSource::Master, Some(year)) => api.get_master_states(year).await,
        (LocationSource::Master, None) => return vec![],
        (LocationSource::Synced, _) => api.get_synced_states().await,
    };
    or_empty("states", result)
}

pub async fn load_districts(
    api: &dyn SchoolsApi,
    source: LocationSource,
    state: &str,
    year: Option<&str>,
) -> Vec<District> {
    let result = match (source, year) {
        (LocationSource::Master, Some(year)) => api.get_master_districts(state, year).await,
        (LocationSource::Master, None) => return vec![],
        (LocationSource::Synced, _) => api.get_synced_districts(state).await,
    };
    or_empty("districts", result)
}

fn or_empty<T>(what: &str, result: ApiResult<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(error = %err, "failed to load {}", what);
        vec![]
    })
}
