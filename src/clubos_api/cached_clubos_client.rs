use crate::clubos_api::clubos_client::RemoteApiTrait;
use crate::clubos_api::models::device_record::DeviceRecord;
use crate::clubos_api::models::door_status::DoorStatus;
use crate::clubos_api::models::request::action_request::ScriptRequest;
use crate::clubos_api::models::request::door_request::DoorRequest;
use crate::clubos_api::models::response::system_status_response::SystemStatus;
use crate::clubos_api::models::script::NinjaOneScript;
use crate::error::ApiError;
use anyhow::Result;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Caches the device list and the script catalogue in front of another
/// [`RemoteApiTrait`].
///
/// Door and bay status are passed through untouched; the poller needs them fresh.
#[derive(Clone)]
pub struct CachedClubOsClient<T>
where
    T: RemoteApiTrait,
{
    client: T,
    devices_cache: Cache<&'static str, Vec<DeviceRecord>>,
    scripts_cache: Cache<&'static str, Vec<NinjaOneScript>>,
}

impl<T> CachedClubOsClient<T>
where
    T: RemoteApiTrait,
{
    pub fn new(client: T, ttl: Duration) -> Self {
        Self {
            client,
            devices_cache: Cache::builder().time_to_live(ttl).build(),
            scripts_cache: Cache::builder().time_to_live(ttl).build(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.client
    }

    pub async fn invalidate_devices(&self) {
        self.devices_cache.invalidate("devices").await;
    }

    pub async fn invalidate_scripts(&self) {
        self.scripts_cache.invalidate("scripts").await;
    }
}

impl<T> RemoteApiTrait for CachedClubOsClient<T>
where
    T: RemoteApiTrait + Send + Sync,
{
    async fn get_door_status(&self, location: &str) -> Result<Vec<DoorStatus>> {
        self.client.get_door_status(location).await
    }

    async fn get_bay_status(&self, location: &str) -> Result<SystemStatus> {
        self.client.get_bay_status(location).await
    }

    async fn get_devices(&self) -> Result<Vec<DeviceRecord>> {
        self.devices_cache
            .try_get_with("devices", async { self.client.get_devices().await })
            .await
            .map_err(|e| cached_error("devices", e))
    }

    async fn list_scripts(&self) -> Result<Vec<NinjaOneScript>> {
        self.scripts_cache
            .try_get_with("scripts", async { self.client.list_scripts().await })
            .await
            .map_err(|e| cached_error("scripts", e))
    }

    async fn execute_script(&self, payload: ScriptRequest) -> Result<Option<String>> {
        self.client.execute_script(payload).await
    }

    async fn unlock_door(&self, payload: DoorRequest) -> Result<Option<String>> {
        self.client.unlock_door(payload).await
    }

    async fn lock_door(&self, payload: DoorRequest) -> Result<Option<String>> {
        self.client.lock_door(payload).await
    }

    async fn emergency_unlock(&self, location: &str) -> Result<Option<String>> {
        self.client.emergency_unlock(location).await
    }
}

// moka shares the loader's error behind an Arc; keep ApiError reachable by downcast
fn cached_error(what: &str, e: Arc<anyhow::Error>) -> anyhow::Error {
    match e.downcast_ref::<ApiError>() {
        Some(api_error) => {
            anyhow::Error::new(api_error.clone()).context(format!("Failed to fetch {}", what))
        }
        None => anyhow::anyhow!("Failed to fetch {}: {:?}", what, e),
    }
}
