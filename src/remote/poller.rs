//! Periodic door and bay status polling.
//!
//! Each tick fires one door-status and one bay-status request per location, each
//! on its own task. Responses overwrite whatever the cache held for that
//! location, so the last response to land wins. Stopping the poller stops the
//! timer only; requests already on the wire still complete and write back.

use crate::clubos_api::clubos_client::RemoteApiTrait;
use crate::clubos_api::models::bay_status::BayStatus;
use crate::clubos_api::models::door_status::DoorStatus;
use crate::clubos_api::models::response::system_status_response::SystemStatus;
use crate::error::ApiError;
use crate::remote::bay_status::{StatusColor, status_color};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

#[derive(Debug, Clone, Serialize)]
pub struct BaySnapshot {
    #[serde(flatten)]
    pub bay: BayStatus,
    pub color: StatusColor,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationSnapshot {
    pub location: String,
    pub doors: Vec<DoorStatus>,
    pub bays: Vec<BaySnapshot>,
}

/// Latest polled state per location.
#[derive(Clone, Default)]
pub struct StatusCache {
    doors: Arc<DashMap<String, Vec<DoorStatus>>>,
    bays: Arc<DashMap<String, SystemStatus>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doors(&self, location: &str) -> Option<Vec<DoorStatus>> {
        self.doors.get(location).map(|d| d.value().clone())
    }

    pub fn bays(&self, location: &str) -> Option<SystemStatus> {
        self.bays.get(location).map(|b| b.value().clone())
    }

    fn replace_doors(&self, location: &str, doors: Vec<DoorStatus>) {
        self.doors.insert(location.to_string(), doors);
    }

    fn replace_bays(&self, location: &str, status: SystemStatus) {
        self.bays.insert(location.to_string(), status);
    }

    /// Every location either map knows about, ordered by name.
    pub fn snapshot(&self) -> Vec<LocationSnapshot> {
        let mut locations: Vec<String> = self
            .doors
            .iter()
            .map(|e| e.key().clone())
            .chain(self.bays.iter().map(|e| e.key().clone()))
            .collect();
        locations.sort();
        locations.dedup();

        locations
            .into_iter()
            .map(|location| {
                let doors = self.doors(&location).unwrap_or_default();
                let bays = self
                    .bays(&location)
                    .map(|s| s.bays)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|bay| BaySnapshot {
                        color: status_color(&bay),
                        bay,
                    })
                    .collect();
                LocationSnapshot {
                    location,
                    doors,
                    bays,
                }
            })
            .collect()
    }
}

pub struct StatusPoller<T>
where
    T: RemoteApiTrait + Send + Sync + 'static,
{
    api: Arc<T>,
    locations: Vec<String>,
    interval: Duration,
    cache: StatusCache,
}

impl<T> StatusPoller<T>
where
    T: RemoteApiTrait + Send + Sync + 'static,
{
    pub fn new(api: Arc<T>, locations: Vec<String>, interval: Duration, cache: StatusCache) -> Self {
        Self {
            api,
            locations,
            interval,
            cache,
        }
    }

    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    /// Polls every location once and waits for all responses.
    pub async fn refresh(&self) {
        for handle in self.poll_once() {
            if let Err(e) = handle.await {
                error!("Status fetch task failed: {:?}", e);
            }
        }
    }

    /// Starts polling; the first round goes out immediately.
    pub fn start(self) -> PollerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut tick = tokio::time::interval(self.interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(
                "Polling {} locations every {:?}",
                self.locations.len(),
                self.interval
            );
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Status poller stopped");
                        break;
                    }
                    _ = tick.tick() => {
                        // fire and forget, rounds are never awaited
                        let _ = self.poll_once();
                    }
                }
            }
        });

        PollerHandle {
            cancel,
            task: Some(task),
        }
    }

    fn poll_once(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(self.locations.len() * 2);
        for location in &self.locations {
            trace!("Polling status for {}", location);
            handles.push(self.spawn_door_fetch(location.clone()));
            handles.push(self.spawn_bay_fetch(location.clone()));
        }
        handles
    }

    fn spawn_door_fetch(&self, location: String) -> JoinHandle<()> {
        let api = self.api.clone();
        let cache = self.cache.clone();
        tokio::spawn(async move {
            match api.get_door_status(&location).await {
                Ok(doors) => cache.replace_doors(&location, doors),
                Err(e) => log_poll_error("door status", &location, &e),
            }
        })
    }

    fn spawn_bay_fetch(&self, location: String) -> JoinHandle<()> {
        let api = self.api.clone();
        let cache = self.cache.clone();
        tokio::spawn(async move {
            match api.get_bay_status(&location).await {
                Ok(status) => cache.replace_bays(&location, status),
                Err(e) => log_poll_error("bay status", &location, &e),
            }
        })
    }
}

fn log_poll_error(what: &str, location: &str, e: &anyhow::Error) {
    if ApiError::is_unauthorized(e) {
        debug!("Skipping {} for {}: not authenticated", what, location);
    } else {
        error!("Error occurred while fetching {} for {}: {:?}", what, location, e);
    }
}

/// Ticker for printing the cache while a poller runs. The first tick lands a
/// full period after start, once the first poll round has had time to answer.
pub fn report_interval(period: Duration) -> Interval {
    let mut report = tokio::time::interval_at(Instant::now() + period, period);
    report.set_missed_tick_behavior(MissedTickBehavior::Delay);
    report
}

/// Stops the poll timer when [`stop`](PollerHandle::stop)ped or dropped.
pub struct PollerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            error!("Status poller task failed: {:?}", e);
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
