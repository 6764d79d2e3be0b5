#![deny(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

pub mod api;
pub mod error;
pub mod export;
pub mod filters;
pub mod locations;
pub mod models;
pub mod query;
pub mod store;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use api::{ListSchoolsQuery, SchoolsApi};
pub use error::{ApiError, ApiResult};
pub use export::{
    DownloadSink, ExportDispatcher, ExportError, ExportFormat, ExportRequest, ExportScope,
};
pub use filters::{clear_filters, read_filters, set_filter, set_page, write_filters, FilterParams};
pub use locations::{load_districts, load_states, load_years, LocationSource};
pub use models::{
    District, FilterTuple, PageMeta, ResultPage, SchoolRecord, SchoolsPage, SelectedLocation,
    State, SyncReport, SyncState, SyncStatus, Year,
};
pub use query::{QueryConfig, QueryController, QueryPhase, QuerySnapshot};
pub use store::{Notifier, SyncSnapshot, SyncStage, SyncStore, TracingNotifier};
