#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ListSchoolsQuery, SchoolsApi};
use crate::error::{ApiError, ApiResult};
use crate::export::ExportRequest;
use crate::models::{District, PageMeta, SchoolRecord, SchoolsPage, State, SyncReport, Year};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(ListSchoolsQuery),
    Directory(String, String, String),
    Gis(String, String),
    Details(String, String, String),
    Years,
    MasterStates(String),
    MasterDistricts(String, String),
    SyncedStates,
    SyncedDistricts(String),
    Export(ExportRequest),
}

struct Scripted<T> {
    delay: Duration,
    result: ApiResult<T>,
}

/// Scripted in-memory backend. Responses are served in the order they were
/// queued; an exhausted queue answers with an empty page or a failed sync.
#[derive(Default)]
pub struct FakeApi {
    pages: Mutex<VecDeque<Scripted<SchoolsPage>>>,
    syncs: Mutex<VecDeque<Scripted<SyncReport>>>,
    calls: Mutex<Vec<Call>>,
    lookups_fail: bool,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, page: SchoolsPage) -> Self {
        self.with_delayed_page(Duration::ZERO, page)
    }

    pub fn with_delayed_page(self, delay: Duration, page: SchoolsPage) -> Self {
        self.pages.lock().unwrap().push_back(Scripted {
            delay,
            result: Ok(page),
        });
        self
    }

    pub fn with_list_error(self, error: ApiError) -> Self {
        self.pages.lock().unwrap().push_back(Scripted {
            delay: Duration::ZERO,
            result: Err(error),
        });
        self
    }

    pub fn with_sync(self, delay: Duration, result: ApiResult<SyncReport>) -> Self {
        self.syncs
            .lock()
            .unwrap()
            .push_back(Scripted { delay, result });
        self
    }

    pub fn with_failing_lookups(mut self) -> Self {
        self.lookups_fail = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> Vec<ListSchoolsQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::List(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn next_sync(&self) -> ApiResult<SyncReport> {
        let scripted = self.syncs.lock().unwrap().pop_front();
        match scripted {
            Some(Scripted { delay, result }) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Err(ApiError::Network("no scripted sync response".to_string())),
        }
    }

    fn lookup<T>(&self, value: Vec<T>) -> ApiResult<Vec<T>> {
        if self.lookups_fail {
            Err(ApiError::Status {
                status: 500,
                message: "lookup failed".to_string(),
            })
        } else {
            Ok(value)
        }
    }
}

#[async_trait]
impl SchoolsApi for FakeApi {
    async fn list_schools(&self, query: &ListSchoolsQuery) -> ApiResult<SchoolsPage> {
        self.record(Call::List(query.clone()));
        let scripted = self.pages.lock().unwrap().pop_front();
        match scripted {
            Some(Scripted { delay, result }) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Ok(SchoolsPage::default()),
        }
    }

    async fn run_directory_sync(
        &self,
        year: &str,
        state: &str,
        district: &str,
    ) -> ApiResult<SyncReport> {
        self.record(Call::Directory(
            year.to_string(),
            state.to_string(),
            district.to_string(),
        ));
        self.next_sync().await
    }

    async fn run_gis_sync(&self, state: &str, district: &str) -> ApiResult<SyncReport> {
        self.record(Call::Gis(state.to_string(), district.to_string()));
        self.next_sync().await
    }

    async fn run_details_sync(
        &self,
        year: &str,
        state: &str,
        district: &str,
    ) -> ApiResult<SyncReport> {
        self.record(Call::Details(
            year.to_string(),
            state.to_string(),
            district.to_string(),
        ));
        self.next_sync().await
    }

    async fn get_years(&self) -> ApiResult<Vec<Year>> {
        self.record(Call::Years);
        self.lookup(vec![
            Year {
                id: "10".to_string(),
                desc: "2023-24".to_string(),
            },
            Year {
                id: "11".to_string(),
                desc: "2024-25".to_string(),
            },
        ])
    }

    async fn get_master_states(&self, year: &str) -> ApiResult<Vec<State>> {
        self.record(Call::MasterStates(year.to_string()));
        self.lookup(vec![State {
            code: "09".to_string(),
            name: "Uttar Pradesh".to_string(),
        }])
    }

    async fn get_master_districts(&self, state: &str, year: &str) -> ApiResult<Vec<District>> {
        self.record(Call::MasterDistricts(state.to_string(), year.to_string()));
        self.lookup(vec![District {
            code: "0901".to_string(),
            name: "Saharanpur".to_string(),
        }])
    }

    async fn get_synced_states(&self) -> ApiResult<Vec<State>> {
        self.record(Call::SyncedStates);
        self.lookup(vec![])
    }

    async fn get_synced_districts(&self, state: &str) -> ApiResult<Vec<District>> {
        self.record(Call::SyncedDistricts(state.to_string()));
        self.lookup(vec![])
    }

    async fn export_schools(&self, request: &ExportRequest) -> ApiResult<Vec<u8>> {
        self.record(Call::Export(request.clone()));
        Ok(b"udise_code,name\n".to_vec())
    }
}

pub fn school(code: &str, school_id: Option<&str>, year_desc: Option<&str>) -> SchoolRecord {
    SchoolRecord {
        udise_code: code.to_string(),
        school_id: school_id.map(str::to_string),
        name: format!("School {}", code),
        block: None,
        pincode: None,
        year_desc: year_desc.map(str::to_string),
    }
}

/// `count` records numbered from `first`, all tagged with `year_desc`
pub fn page_of(first: usize, count: usize, year_desc: &str, total: u64) -> SchoolsPage {
    SchoolsPage {
        data: (first..first + count)
            .map(|n| school(&format!("{:011}", n), None, Some(year_desc)))
            .collect(),
        meta: PageMeta { total },
    }
}

pub fn report(count: u64) -> SyncReport {
    SyncReport {
        success: true,
        count,
        message: None,
    }
}
