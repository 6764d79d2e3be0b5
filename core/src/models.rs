use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sentinel meaning "no restriction" for the categorical filters
pub const ALL: &str = "all";

/// Page limit used when none is configured
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Canonical snapshot of which schools to list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterTuple {
    /// Academic year identifier
    pub year: Option<String>,
    /// State code
    pub state: Option<String>,
    /// District code
    pub district: Option<String>,
    pub school_type: String,
    pub category: String,
    pub management: String,
    /// Free-text search term
    pub search: String,
    /// 1-based page number
    pub page: u32,
}

impl Default for FilterTuple {
    fn default() -> Self {
        FilterTuple {
            year: None,
            state: None,
            district: None,
            school_type: ALL.to_string(),
            category: ALL.to_string(),
            management: ALL.to_string(),
            search: String::new(),
            page: 1,
        }
    }
}

impl FilterTuple {
    /// True when at least one filter narrows the listing enough to query.
    ///
    /// A year on its own does not count.
    pub fn has_active_filter(&self) -> bool {
        self.state.is_some()
            || self.district.is_some()
            || !self.search.is_empty()
            || self.school_type != ALL
            || self.category != ALL
            || self.management != ALL
    }

    /// Compares every field except `page`
    pub fn same_query(&self, other: &FilterTuple) -> bool {
        self.year == other.year
            && self.state == other.state
            && self.district == other.district
            && self.school_type == other.school_type
            && self.category == other.category
            && self.management == other.management
            && self.search == other.search
    }

    /// Overlay a shared location selection onto this tuple
    pub fn with_location(mut self, location: &SelectedLocation) -> Self {
        if !self.same_location(location) {
            self.page = 1;
        }
        self.year = location.year.clone();
        self.state = location.state.clone();
        self.district = location.district.clone();
        self
    }

    /// The tuple relaxed to the whole district: location only, every other
    /// filter back to its default.
    pub fn district_scope(&self) -> Self {
        FilterTuple {
            year: self.year.clone(),
            state: self.state.clone(),
            district: self.district.clone(),
            ..FilterTuple::default()
        }
    }

    fn same_location(&self, location: &SelectedLocation) -> bool {
        self.year == location.year
            && self.state == location.state
            && self.district == location.district
    }
}

/// Whether a school has been through the details sync yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Listed by the directory sync only, no report available
    DirectoryOnly,
    /// Details synced, a report can be viewed
    Synced,
}

/// A row of school listing data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub udise_code: String,
    /// Present once the details sync has run for the school
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub school_id: Option<String>,
    #[serde(alias = "school_name", default)]
    pub name: String,
    #[serde(alias = "block_name", default)]
    pub block: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub pincode: Option<String>,
    #[serde(default)]
    pub year_desc: Option<String>,
}

impl SchoolRecord {
    pub fn sync_state(&self) -> SyncState {
        match self.school_id {
            Some(_) => SyncState::Synced,
            None => SyncState::DirectoryOnly,
        }
    }

    /// Reports exist only for detail-synced schools
    pub fn can_view_report(&self) -> bool {
        self.sync_state() == SyncState::Synced
    }
}

/// Accumulated results of one browse session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultPage {
    pub records: Vec<SchoolRecord>,
    pub total_count: u64,
    pub has_more: bool,
}

/// Progress of a single sync stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing(String),
    Success(String),
    Error(String),
}

impl SyncStatus {
    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncStatus::Syncing(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncStatus::Success(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SyncStatus::Idle => None,
            SyncStatus::Syncing(m) | SyncStatus::Success(m) | SyncStatus::Error(m) => Some(m),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing(_) => "syncing",
            SyncStatus::Success(_) => "success",
            SyncStatus::Error(_) => "error",
        }
    }
}

/// The (year, state, district) triple shared across pages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedLocation {
    pub year: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
}

impl SelectedLocation {
    /// Empty strings are treated as unset
    pub fn new(year: Option<String>, state: Option<String>, district: Option<String>) -> Self {
        SelectedLocation {
            year: non_empty(year),
            state: non_empty(state),
            district: non_empty(district),
        }
    }

    /// All three parts, if every one is set
    pub fn complete(&self) -> Option<(&str, &str, &str)> {
        match (&self.year, &self.state, &self.district) {
            (Some(y), Some(s), Some(d)) => Some((y, s, d)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Year {
    #[serde(alias = "year_id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "year_desc")]
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    #[serde(alias = "state_code", alias = "stcode11", deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(alias = "state_name", alias = "stname", default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    #[serde(alias = "district_code", alias = "dtcode11", deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(alias = "district_name", alias = "dtname", default)]
    pub name: String,
}

/// One page of the school listing as returned by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolsPage {
    pub data: Vec<SchoolRecord>,
    #[serde(default)]
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Server's belief of the total matching count
    #[serde(default)]
    pub total: u64,
}

/// Outcome of one sync stage as reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub success: bool,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub message: Option<String>,
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Codes and ids arrive as either JSON strings or numbers depending on endpoint
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
