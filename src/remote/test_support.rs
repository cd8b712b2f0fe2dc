//! In-memory [`RemoteApiTrait`] used by the remote module tests.

use crate::clubos_api::clubos_client::RemoteApiTrait;
use crate::clubos_api::models::bay_status::BayStatus;
use crate::clubos_api::models::device_record::DeviceRecord;
use crate::clubos_api::models::door_status::DoorStatus;
use crate::clubos_api::models::request::action_request::ScriptRequest;
use crate::clubos_api::models::request::door_request::DoorRequest;
use crate::clubos_api::models::response::system_status_response::SystemStatus;
use crate::clubos_api::models::script::NinjaOneScript;
use crate::error::ApiError;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::Notify;

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    devices: Mutex<Vec<DeviceRecord>>,
    failing_locations: Mutex<HashSet<String>>,
    fail_devices: AtomicBool,
    fail_actions: AtomicBool,
    unauthorized: AtomicBool,
    poll_round: AtomicU32,
    /// When set, action calls park here until released.
    gate: Option<Notify>,
}

impl FakeApi {
    pub fn with_devices(devices: Vec<DeviceRecord>) -> Self {
        Self {
            devices: Mutex::new(devices),
            ..Default::default()
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Default::default()
        }
    }

    /// Lets one parked action call finish.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn fail_location(&self, location: &str) {
        self.failing_locations
            .lock()
            .unwrap()
            .insert(location.to_string());
    }

    pub fn fail_devices(&self, fail: bool) {
        self.fail_devices.store(fail, Ordering::SeqCst);
    }

    pub fn fail_actions(&self, fail: bool) {
        self.fail_actions.store(fail, Ordering::SeqCst);
    }

    pub fn unauthorized(&self, unauthorized: bool) {
        self.unauthorized.store(unauthorized, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_location(&self, location: &str) -> anyhow::Result<()> {
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized.into());
        }
        if self.failing_locations.lock().unwrap().contains(location) {
            return Err(ApiError::Status {
                status: 503,
                message: format!("{} controller unreachable", location),
            }
            .into());
        }
        Ok(())
    }

    async fn finish_action(&self) -> anyhow::Result<Option<String>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized.into());
        }
        if self.fail_actions.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                message: "Device did not respond".to_string(),
            }
            .into());
        }
        Ok(Some("Command sent".to_string()))
    }
}

impl RemoteApiTrait for FakeApi {
    async fn get_door_status(&self, location: &str) -> anyhow::Result<Vec<DoorStatus>> {
        self.record(format!("get_door_status:{}", location));
        self.check_location(location)?;
        let round = self.poll_round.fetch_add(1, Ordering::SeqCst);
        Ok(vec![DoorStatus {
            door_id: "main".to_string(),
            name: format!("{} Main Entrance #{}", location, round),
            locked: true,
            online: true,
        }])
    }

    async fn get_bay_status(&self, location: &str) -> anyhow::Result<SystemStatus> {
        self.record(format!("get_bay_status:{}", location));
        self.check_location(location)?;
        Ok(SystemStatus {
            location: Some(location.to_string()),
            bays: vec![BayStatus {
                bay_number: 1,
                is_online: true,
                is_occupied: false,
                has_issue: false,
            }],
            updated_at: None,
        })
    }

    async fn get_devices(&self) -> anyhow::Result<Vec<DeviceRecord>> {
        self.record("get_devices".to_string());
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized.into());
        }
        if self.fail_devices.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn list_scripts(&self) -> anyhow::Result<Vec<NinjaOneScript>> {
        self.record("list_scripts".to_string());
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized.into());
        }
        Ok(vec![NinjaOneScript {
            id: "42".to_string(),
            name: "Restart TrackMan".to_string(),
            category: Some("simulator".to_string()),
        }])
    }

    async fn execute_script(&self, payload: ScriptRequest) -> anyhow::Result<Option<String>> {
        self.record(format!(
            "execute_script:{}:{}:{}",
            payload.action,
            payload.location,
            payload.bay_number.as_deref().unwrap_or("-")
        ));
        self.finish_action().await
    }

    async fn unlock_door(&self, payload: DoorRequest) -> anyhow::Result<Option<String>> {
        self.record(format!(
            "unlock_door:{}:{}:{}",
            payload.location,
            payload.door_key,
            payload.duration.unwrap_or_default()
        ));
        self.finish_action().await
    }

    async fn lock_door(&self, payload: DoorRequest) -> anyhow::Result<Option<String>> {
        self.record(format!("lock_door:{}:{}", payload.location, payload.door_key));
        self.finish_action().await
    }

    async fn emergency_unlock(&self, location: &str) -> anyhow::Result<Option<String>> {
        self.record(format!("emergency_unlock:{}", location));
        self.finish_action().await
    }
}
