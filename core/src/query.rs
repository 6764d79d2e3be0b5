//! Paged query controller for the school browse view.
//!
//! Every filter change bumps a generation counter and (re)starts a debounce
//! window. When the window closes one request is issued; a response whose
//! generation is no longer current is dropped on arrival. Page 1 replaces
//! the accumulated results, later pages append to them.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{ListSchoolsQuery, SchoolsApi};
use crate::error::ApiError;
use crate::models::{FilterTuple, ResultPage, SchoolRecord, SchoolsPage, Year, DEFAULT_PAGE_SIZE};

/// Quiescence window before a changed query is issued
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub page_size: u32,
    pub debounce: Duration,
    /// Skip appended records whose `udise_code` is already loaded
    pub dedupe_pages: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
            dedupe_pages: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    /// No narrowing filter, nothing to show
    Idle,
    /// A change is waiting for the debounce window to close
    Scheduled,
    /// Page 1 request in flight
    Loading,
    /// Page > 1 request in flight
    LoadingMore,
    Ready,
    Error,
}

impl QueryPhase {
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            QueryPhase::Scheduled | QueryPhase::Loading | QueryPhase::LoadingMore
        )
    }
}

/// What a view renders from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySnapshot {
    pub phase: QueryPhase,
    pub filters: FilterTuple,
    pub results: ResultPage,
    /// Last page merged into `results`, 0 when nothing is loaded
    pub loaded_page: u32,
    pub last_error: Option<String>,
}

struct Session {
    filters: Option<FilterTuple>,
    generation: u64,
    phase: QueryPhase,
    results: ResultPage,
    loaded_page: u32,
    last_error: Option<ApiError>,
    years: Vec<Year>,
    task: Option<JoinHandle<()>>,
}

impl Session {
    fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            phase: self.phase,
            filters: self.filters.clone().unwrap_or_default(),
            results: self.results.clone(),
            loaded_page: self.loaded_page,
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    fn reset_results(&mut self) {
        self.results = ResultPage::default();
        self.loaded_page = 0;
        self.last_error = None;
    }

    /// Descriptor of the selected year, e.g. `11` -> `2024-25`
    fn year_descriptor(&self, year: &str) -> String {
        self.years
            .iter()
            .find(|y| y.id == year)
            .map(|y| y.desc.clone())
            .unwrap_or_else(|| year.to_string())
    }
}

struct Inner {
    api: Arc<dyn SchoolsApi>,
    config: QueryConfig,
    session: Mutex<Session>,
    updates: watch::Sender<QuerySnapshot>,
}

/// Drives one browse session. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct QueryController {
    inner: Arc<Inner>,
}

impl QueryController {
    pub fn new(api: Arc<dyn SchoolsApi>, config: QueryConfig) -> Self {
        let session = Session {
            filters: None,
            generation: 0,
            phase: QueryPhase::Idle,
            results: ResultPage::default(),
            loaded_page: 0,
            last_error: None,
            years: vec![],
            task: None,
        };
        let (updates, _) = watch::channel(session.snapshot());

        QueryController {
            inner: Arc::new(Inner {
                api,
                config,
                session: Mutex::new(session),
                updates,
            }),
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.inner.config
    }

    /// Known years, used to resolve a year id to the descriptor that
    /// records carry in `year_desc`
    pub fn set_years(&self, years: Vec<Year>) {
        self.inner.lock().years = years;
    }

    /// Apply the current filter tuple. Identical tuples are ignored.
    pub fn update(&self, filters: FilterTuple) {
        let mut session = self.inner.lock();
        self.inner.apply(&mut session, filters, false);
    }

    /// Reload from page 1 with the current filters, replacing what is loaded
    pub fn refresh(&self) {
        let mut session = self.inner.lock();
        if let Some(mut filters) = session.filters.clone() {
            filters.page = 1;
            self.inner.apply(&mut session, filters, true);
        }
    }

    /// Bottom-of-list signal. Advances one page if more results are known
    /// to exist and nothing is scheduled or in flight; returns the tuple
    /// that was scheduled.
    ///
    /// After a failed page the same page is attempted again.
    pub fn request_more(&self) -> Option<FilterTuple> {
        let mut session = self.inner.lock();

        if !matches!(session.phase, QueryPhase::Ready | QueryPhase::Error)
            || !session.results.has_more
        {
            debug!(phase = ?session.phase, "ignoring fetch-more signal");
            return None;
        }

        let mut next = session.filters.clone()?;
        next.page = session.loaded_page + 1;
        let retry = session.filters.as_ref() == Some(&next);
        self.inner.apply(&mut session, next.clone(), retry);

        Some(next)
    }

    pub fn snapshot(&self) -> QuerySnapshot {
        self.inner.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot> {
        self.inner.updates.subscribe()
    }

    /// Wait until nothing is scheduled or in flight
    pub async fn settled(&self) -> QuerySnapshot {
        let mut updates = self.subscribe();
        let settled = updates
            .wait_for(|snapshot| !snapshot.phase.is_busy())
            .await
            .map(|snapshot| snapshot.clone());

        match settled {
            Ok(snapshot) => snapshot,
            Err(_) => self.snapshot(),
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &Session) {
        self.updates.send_replace(session.snapshot());
    }

    fn apply(self: &Arc<Self>, session: &mut Session, filters: FilterTuple, force: bool) {
        if !force && session.filters.as_ref() == Some(&filters) {
            return;
        }

        session.generation += 1;
        if let Some(task) = session.task.take() {
            task.abort();
        }

        let new_query = !session
            .filters
            .as_ref()
            .is_some_and(|current| current.same_query(&filters));
        if new_query {
            session.reset_results();
        }

        if !filters.has_active_filter() {
            debug!("no narrowing filter, clearing results");
            session.filters = Some(filters);
            session.phase = QueryPhase::Idle;
            session.reset_results();
            self.publish(session);
            return;
        }

        debug!(
            generation = session.generation,
            page = filters.page,
            "scheduling school list request"
        );
        session.filters = Some(filters.clone());
        session.phase = QueryPhase::Scheduled;
        session.task = Some(self.schedule(session.generation, filters));
        self.publish(session);
    }

    fn schedule(self: &Arc<Self>, generation: u64, filters: FilterTuple) -> JoinHandle<()> {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(inner.config.debounce).await;
            inner.fetch(generation, filters).await;
        })
    }

    async fn fetch(&self, generation: u64, filters: FilterTuple) {
        {
            let mut session = self.lock();
            if session.generation != generation {
                return;
            }
            session.phase = if filters.page > 1 {
                QueryPhase::LoadingMore
            } else {
                QueryPhase::Loading
            };
            self.publish(&session);
        }

        let query = ListSchoolsQuery::from_filters(&filters, self.config.page_size);
        let result = self.api.list_schools(&query).await;

        let mut session = self.lock();
        if session.generation != generation {
            debug!(
                generation,
                current = session.generation,
                "discarding stale school list response"
            );
            return;
        }
        session.task = None;

        match result {
            Ok(page) => {
                let year = filters
                    .year
                    .as_deref()
                    .map(|year| session.year_descriptor(year));
                merge_page(
                    &mut session.results,
                    filters.page,
                    page,
                    year.as_deref(),
                    &self.config,
                );
                session.loaded_page = filters.page;
                session.last_error = None;
                session.phase = QueryPhase::Ready;
            }
            Err(err) => {
                warn!(page = filters.page, error = %err, "school list request failed");
                session.last_error = Some(err);
                session.phase = QueryPhase::Error;
            }
        }

        self.publish(&session);
    }
}

/// Merge one fetched page into the accumulated results.
///
/// `has_more` reflects the raw page size. Records from another year are
/// dropped when a year is selected, and if that leaves nothing the total
/// is reported as zero.
pub fn merge_page(
    results: &mut ResultPage,
    page_no: u32,
    fetched: SchoolsPage,
    year_desc: Option<&str>,
    config: &QueryConfig,
) {
    results.has_more = fetched.data.len() == config.page_size as usize;

    let records: Vec<SchoolRecord> = match year_desc {
        Some(year) => fetched
            .data
            .into_iter()
            .filter(|record| matches_year(record, year))
            .collect(),
        None => fetched.data,
    };

    results.total_count = if year_desc.is_some() && records.is_empty() {
        0
    } else {
        fetched.meta.total
    };

    if page_no <= 1 {
        results.records = records;
    } else if config.dedupe_pages {
        let mut seen: HashSet<String> = results
            .records
            .iter()
            .map(|r| r.udise_code.clone())
            .collect();
        results.records.extend(
            records
                .into_iter()
                .filter(|r| seen.insert(r.udise_code.clone())),
        );
    } else {
        results.records.extend(records);
    }
}

// Records that do not report a year are kept
fn matches_year(record: &SchoolRecord, selected: &str) -> bool {
    match record.year_desc.as_deref() {
        Some(desc) => {
            let desc = desc.to_lowercase();
            let selected = selected.to_lowercase();
            desc == selected || desc.contains(&selected)
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::models::PageMeta;
    use crate::testing::{page_of, school, FakeApi};

    fn controller(api: &Arc<FakeApi>) -> QueryController {
        let controller = QueryController::new(api.clone(), QueryConfig::default());
        controller.set_years(years());
        controller
    }

    fn district_filters() -> FilterTuple {
        FilterTuple {
            year: Some("11".to_string()),
            state: Some("09".to_string()),
            district: Some("0901".to_string()),
            ..Default::default()
        }
    }

    fn years() -> Vec<Year> {
        vec![Year {
            id: "11".to_string(),
            desc: "2024-25".to_string(),
        }]
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_active_filter_stays_idle_without_request() {
        let api = Arc::new(FakeApi::new());
        let controller = controller(&api);

        controller.update(FilterTuple {
            year: Some("11".to_string()),
            ..Default::default()
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, QueryPhase::Idle);
        assert!(snapshot.results.records.is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_issues_only_latest_change() {
        let api = Arc::new(FakeApi::new().with_page(page_of(0, 3, "2024-25", 3)));
        let controller = controller(&api);

        for term in ["r", "ra", "ram"] {
            controller.update(FilterTuple {
                search: term.to_string(),
                ..district_filters()
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(controller.snapshot().phase, QueryPhase::Scheduled);
        assert!(api.calls().is_empty());

        let snapshot = controller.settled().await;

        let calls = api.list_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].search, "ram");
        assert_eq!(calls[0].limit, 50);
        assert_eq!(snapshot.phase, QueryPhase::Ready);
        assert_eq!(snapshot.results.records.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_update_is_ignored() {
        let api = Arc::new(FakeApi::new().with_page(page_of(0, 2, "2024-25", 2)));
        let controller = controller(&api);

        controller.update(district_filters());
        controller.settled().await;
        controller.update(district_filters());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(api.list_calls().len(), 1);
        assert_eq!(controller.snapshot().phase, QueryPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_infinite_scroll_accumulates_pages() {
        let api = Arc::new(
            FakeApi::new()
                .with_page(page_of(0, 50, "2024-25", 123))
                .with_page(page_of(50, 50, "2024-25", 123))
                .with_page(page_of(100, 23, "2024-25", 123)),
        );
        let controller = controller(&api);
        controller.set_years(years());

        controller.update(district_filters());
        let first = controller.settled().await;
        assert!(first.results.has_more);

        let mut has_more = vec![first.results.has_more];
        while let Some(next) = controller.request_more() {
            let snapshot = controller.settled().await;
            assert_eq!(snapshot.loaded_page, next.page);
            has_more.push(snapshot.results.has_more);
        }

        let snapshot = controller.snapshot();
        assert_eq!(has_more, vec![true, true, false]);
        assert_eq!(snapshot.results.records.len(), 123);
        assert_eq!(snapshot.results.total_count, 123);
        assert_eq!(snapshot.results.records[50].udise_code, "00000000050");
        let pages: Vec<u32> = api.list_calls().iter().map(|q| q.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_signals_advance_one_page() {
        let api = Arc::new(
            FakeApi::new()
                .with_page(page_of(0, 50, "2024-25", 200))
                .with_delayed_page(Duration::from_secs(2), page_of(50, 50, "2024-25", 200)),
        );
        let controller = controller(&api);

        controller.update(district_filters());
        controller.settled().await;

        assert_eq!(controller.request_more().map(|f| f.page), Some(2));
        assert!(controller.request_more().is_none());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(controller.snapshot().phase, QueryPhase::LoadingMore);
        assert!(controller.request_more().is_none());

        let snapshot = controller.settled().await;
        assert_eq!(snapshot.loaded_page, 2);
        assert_eq!(api.list_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_replaces_results() {
        let api = Arc::new(
            FakeApi::new()
                .with_page(page_of(0, 50, "2024-25", 80))
                .with_page(page_of(50, 30, "2024-25", 80))
                .with_page(page_of(500, 4, "2024-25", 4)),
        );
        let controller = controller(&api);

        controller.update(district_filters());
        controller.settled().await;
        controller.request_more();
        assert_eq!(controller.settled().await.results.records.len(), 80);

        controller.update(FilterTuple {
            management: "5".to_string(),
            ..district_filters()
        });
        assert!(controller.snapshot().results.records.is_empty());

        let snapshot = controller.settled().await;
        assert_eq!(snapshot.results.records.len(), 4);
        assert_eq!(snapshot.results.records[0].udise_code, "00000000500");
        assert_eq!(snapshot.loaded_page, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let api = Arc::new(
            FakeApi::new()
                .with_delayed_page(Duration::from_secs(5), page_of(0, 2, "2024-25", 2))
                .with_page(page_of(900, 1, "2024-25", 1)),
        );
        let controller = controller(&api);

        controller.update(FilterTuple {
            search: "old".to_string(),
            ..district_filters()
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(controller.snapshot().phase, QueryPhase::Loading);

        controller.update(FilterTuple {
            search: "new".to_string(),
            ..district_filters()
        });
        let snapshot = controller.settled().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        let snapshot_later = controller.snapshot();
        assert_eq!(snapshot, snapshot_later);
        assert_eq!(snapshot.results.records.len(), 1);
        assert_eq!(snapshot.results.records[0].udise_code, "00000000900");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_page_keeps_results_and_allows_retry() {
        let api = Arc::new(
            FakeApi::new()
                .with_page(page_of(0, 50, "2024-25", 120))
                .with_list_error(ApiError::Network("connection reset".to_string()))
                .with_page(page_of(50, 50, "2024-25", 120)),
        );
        let controller = controller(&api);

        controller.update(district_filters());
        controller.settled().await;
        controller.request_more();

        let failed = controller.settled().await;
        assert_eq!(failed.phase, QueryPhase::Error);
        assert_eq!(failed.results.records.len(), 50);
        assert!(failed.results.has_more);
        assert!(failed.last_error.is_some());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(api.list_calls().len(), 2, "no automatic retry");

        assert_eq!(controller.request_more().map(|f| f.page), Some(2));
        let retried = controller.settled().await;
        assert_eq!(retried.phase, QueryPhase::Ready);
        assert_eq!(retried.results.records.len(), 100);
        let pages: Vec<u32> = api.list_calls().iter().map(|q| q.page).collect();
        assert_eq!(pages, vec![1, 2, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_retries_first_page() {
        let api = Arc::new(
            FakeApi::new()
                .with_list_error(ApiError::Unauthorized)
                .with_page(page_of(0, 5, "2024-25", 5)),
        );
        let controller = controller(&api);

        controller.update(district_filters());
        assert_eq!(controller.settled().await.phase, QueryPhase::Error);
        assert!(controller.request_more().is_none());

        controller.refresh();
        let snapshot = controller.settled().await;
        assert_eq!(snapshot.phase, QueryPhase::Ready);
        assert_eq!(snapshot.results.records.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_after_scrolling_starts_over() {
        let api = Arc::new(
            FakeApi::new()
                .with_page(page_of(0, 50, "2024-25", 120))
                .with_page(page_of(50, 50, "2024-25", 120))
                .with_page(page_of(0, 50, "2024-25", 120)),
        );
        let controller = controller(&api);

        controller.update(district_filters());
        controller.settled().await;
        controller.request_more();
        assert_eq!(controller.settled().await.loaded_page, 2);

        controller.refresh();
        let snapshot = controller.settled().await;

        let pages: Vec<u32> = api.list_calls().iter().map(|q| q.page).collect();
        assert_eq!(pages, vec![1, 2, 1]);
        assert_eq!(snapshot.loaded_page, 1);
        assert_eq!(snapshot.filters.page, 1);
        assert_eq!(snapshot.results.records.len(), 50);
        let codes: HashSet<&str> = snapshot
            .results
            .records
            .iter()
            .map(|r| r.udise_code.as_str())
            .collect();
        assert_eq!(codes.len(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_year_filter_uses_descriptor() {
        let mut page = page_of(0, 2, "2023-24", 40);
        page.data[1].year_desc = Some("2024-25".to_string());
        let api = Arc::new(FakeApi::new().with_page(page));
        let controller = controller(&api);
        controller.set_years(years());

        controller.update(district_filters());
        let snapshot = controller.settled().await;

        assert_eq!(snapshot.results.records.len(), 1);
        assert_eq!(
            snapshot.results.records[0].year_desc.as_deref(),
            Some("2024-25")
        );
        assert_eq!(snapshot.results.total_count, 40);
    }

    #[test]
    fn test_year_filter_forces_zero_total_when_nothing_matches() {
        let mut results = ResultPage::default();
        let fetched = SchoolsPage {
            data: vec![school("1", None, Some("2023-24"))],
            meta: PageMeta { total: 812 },
        };

        merge_page(
            &mut results,
            1,
            fetched,
            Some("2024-25"),
            &QueryConfig::default(),
        );

        assert!(results.records.is_empty());
        assert_eq!(results.total_count, 0);
        assert!(!results.has_more);
    }

    #[test]
    fn test_year_match_is_case_insensitive_substring() {
        let mut results = ResultPage::default();
        let fetched = SchoolsPage {
            data: vec![
                school("1", None, Some("AY 2024-25")),
                school("2", None, Some("2024-25")),
                school("3", None, None),
                school("4", None, Some("2022-23")),
            ],
            meta: PageMeta { total: 4 },
        };

        merge_page(&mut results, 1, fetched, Some("ay 2024-25"), &QueryConfig::default());
        let codes: Vec<&str> = results.records.iter().map(|r| r.udise_code.as_str()).collect();
        assert_eq!(codes, vec!["1", "3"]);
    }

    #[test]
    fn test_append_keeps_duplicates_unless_deduped() {
        let overlap = || SchoolsPage {
            data: vec![school("2", None, None), school("3", None, None)],
            meta: PageMeta { total: 3 },
        };
        let start = || ResultPage {
            records: vec![school("1", None, None), school("2", None, None)],
            total_count: 3,
            has_more: true,
        };

        let mut plain = start();
        merge_page(&mut plain, 2, overlap(), None, &QueryConfig::default());
        assert_eq!(plain.records.len(), 4);

        let mut deduped = start();
        let config = QueryConfig {
            dedupe_pages: true,
            ..Default::default()
        };
        merge_page(&mut deduped, 2, overlap(), None, &config);
        let codes: Vec<&str> = deduped.records.iter().map(|r| r.udise_code.as_str()).collect();
        assert_eq!(codes, vec!["1", "2", "3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_filters_returns_to_idle() {
        let api = Arc::new(FakeApi::new().with_page(page_of(0, 3, "2024-25", 3)));
        let controller = controller(&api);

        controller.update(district_filters());
        controller.settled().await;
        controller.update(FilterTuple::default());

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, QueryPhase::Idle);
        assert!(snapshot.results.records.is_empty());
        assert_eq!(snapshot.results.total_count, 0);
    }
}
