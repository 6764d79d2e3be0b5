//! Shared state for the three-stage sync workflow (directory, GIS, details)
//! and the currently selected location.
//!
//! One [`SyncStore`] is created per process and handed to every page that
//! needs it. State is only changed through the store's own actions; readers
//! take snapshots or subscribe to changes.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::SchoolsApi;
use crate::error::{ApiError, ApiResult};
use crate::models::{SelectedLocation, SyncReport, SyncStatus};

/// Sink for transient user-facing messages
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Notifier that only logs
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!("{}", message);
    }

    fn error(&self, message: &str) {
        warn!("{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Directory,
    Gis,
    Details,
}

impl SyncStage {
    pub const ALL: [SyncStage; 3] = [SyncStage::Directory, SyncStage::Gis, SyncStage::Details];

    pub fn label(self) -> &'static str {
        match self {
            SyncStage::Directory => "directory",
            SyncStage::Gis => "gis",
            SyncStage::Details => "details",
        }
    }

    fn progress_message(self) -> &'static str {
        match self {
            SyncStage::Directory => "Fetching school directory...",
            SyncStage::Gis => "Fetching GIS coordinates...",
            SyncStage::Details => "Fetching school details...",
        }
    }

    fn success_message(self, report: &SyncReport) -> String {
        match self {
            SyncStage::Directory => format!("Directory synced: {} schools", report.count),
            SyncStage::Gis => format!("GIS synced: {} schools updated", report.count),
            SyncStage::Details => format!("Details synced: {} schools", report.count),
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            SyncStage::Directory => "Directory sync failed",
            SyncStage::Gis => "GIS sync failed",
            SyncStage::Details => "Details sync failed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSnapshot {
    pub selection: SelectedLocation,
    pub directory: SyncStatus,
    pub gis: SyncStatus,
    pub details: SyncStatus,
}

impl SyncSnapshot {
    pub fn status(&self, stage: SyncStage) -> &SyncStatus {
        match stage {
            SyncStage::Directory => &self.directory,
            SyncStage::Gis => &self.gis,
            SyncStage::Details => &self.details,
        }
    }

    fn status_mut(&mut self, stage: SyncStage) -> &mut SyncStatus {
        match stage {
            SyncStage::Directory => &mut self.directory,
            SyncStage::Gis => &mut self.gis,
            SyncStage::Details => &mut self.details,
        }
    }

    pub fn is_syncing(&self) -> bool {
        SyncStage::ALL
            .iter()
            .any(|stage| self.status(*stage).is_syncing())
    }

    /// Directory sync succeeded, details may run
    pub fn is_step1_complete(&self) -> bool {
        self.directory.is_success()
    }
}

pub struct SyncStore {
    api: Arc<dyn SchoolsApi>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<SyncSnapshot>,
}

impl SyncStore {
    pub fn new(api: Arc<dyn SchoolsApi>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(SyncSnapshot::default());
        SyncStore {
            api,
            notifier,
            state,
        }
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.state.subscribe()
    }

    pub fn selection(&self) -> SelectedLocation {
        self.state.borrow().selection.clone()
    }

    pub fn is_syncing(&self) -> bool {
        self.state.borrow().is_syncing()
    }

    pub fn is_step1_complete(&self) -> bool {
        self.state.borrow().is_step1_complete()
    }

    /// Replace the selected location.
    ///
    /// A different state or district resets every stage to idle. A change
    /// of year alone leaves the statuses as they are.
    pub fn set_selections(&self, selection: SelectedLocation) {
        self.state.send_if_modified(|snapshot| {
            if snapshot.selection == selection {
                return false;
            }

            let moved = snapshot.selection.state != selection.state
                || snapshot.selection.district != selection.district;
            if moved {
                debug!("selection moved, resetting sync statuses");
                for stage in SyncStage::ALL {
                    *snapshot.status_mut(stage) = SyncStatus::Idle;
                }
            }
            snapshot.selection = selection;
            true
        });
    }

    /// Stage 1. Does nothing unless year, state and district are all set.
    pub async fn run_directory_sync(&self) {
        let selection = self.selection();
        let Some((year, state, district)) = selection.complete() else {
            debug!("directory sync skipped, selection incomplete");
            return;
        };

        let call = self.api.run_directory_sync(year, state, district);
        self.run_stage(SyncStage::Directory, call).await;
    }

    /// Needs state and district; the year is not sent
    pub async fn run_gis_sync(&self) {
        let selection = self.selection();
        let (Some(state), Some(district)) = (&selection.state, &selection.district) else {
            debug!("gis sync skipped, selection incomplete");
            return;
        };

        let call = self.api.run_gis_sync(state, district);
        self.run_stage(SyncStage::Gis, call).await;
    }

    /// Stage 2. Callers are expected to offer this only once
    /// [`is_step1_complete`](Self::is_step1_complete) holds; the store does
    /// not enforce it.
    pub async fn run_details_sync(&self) {
        let selection = self.selection();
        let Some((year, state, district)) = selection.complete() else {
            debug!("details sync skipped, selection incomplete");
            return;
        };
        if !self.is_step1_complete() {
            debug!("details sync started before directory sync succeeded");
        }

        let call = self.api.run_details_sync(year, state, district);
        self.run_stage(SyncStage::Details, call).await;
    }

    pub async fn run(&self, stage: SyncStage) {
        match stage {
            SyncStage::Directory => self.run_directory_sync().await,
            SyncStage::Gis => self.run_gis_sync().await,
            SyncStage::Details => self.run_details_sync().await,
        }
    }

    /// Every stage in order, stopping at the first one that does not succeed
    pub async fn run_all(&self) -> bool {
        for stage in SyncStage::ALL {
            self.run(stage).await;
            if !self.snapshot().status(stage).is_success() {
                return false;
            }
        }
        true
    }

    async fn run_stage<F>(&self, stage: SyncStage, call: F)
    where
        F: Future<Output = ApiResult<SyncReport>>,
    {
        info!(stage = stage.label(), "sync started");
        self.set_status(stage, SyncStatus::Syncing(stage.progress_message().to_string()));

        let outcome = call.await.and_then(|report| {
            if report.success {
                Ok(report)
            } else {
                Err(ApiError::SyncRejected(report.message.unwrap_or_default()))
            }
        });

        match outcome {
            Ok(report) => {
                let message = stage.success_message(&report);
                info!(stage = stage.label(), count = report.count, "sync finished");
                self.set_status(stage, SyncStatus::Success(message.clone()));
                self.notifier.success(&message);
            }
            Err(err) => {
                warn!(stage = stage.label(), error = %err, "sync failed");
                let message = match err {
                    ApiError::Conflict(message) => message,
                    _ => stage.failure_message().to_string(),
                };
                self.set_status(stage, SyncStatus::Error(message.clone()));
                self.notifier.error(&message);
            }
        }
    }

    fn set_status(&self, stage: SyncStage, status: SyncStatus) {
        self.state.send_modify(|snapshot| *snapshot.status_mut(stage) = status);
    }
}
