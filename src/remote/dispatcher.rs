//! Remote action dispatch.
//!
//! Every request is tracked by its [`ActionKey`] for as long as it is
//! outstanding. A request whose key is already outstanding is dropped without
//! touching the network.

use crate::clubos_api::clubos_client::RemoteApiTrait;
use crate::clubos_api::models::request::action_request::{ActionType, ScriptRequest};
use crate::clubos_api::models::request::door_request::DoorRequest;
use crate::error::ApiError;
use crate::remote::action_key::ActionKey;
use crate::remote::notifier::{Notification, Notifier};
use dashmap::DashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Blocking yes/no question put to the operator before destructive actions.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers yes to everything. For unattended use with `--yes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed(String),
    Failed(String),
    /// Same key was already outstanding; nothing was sent.
    AlreadyInFlight,
    /// Operator declined the confirmation.
    Cancelled,
    Invalid(String),
}

#[derive(Clone)]
pub struct ActionDispatcher<T>
where
    T: RemoteApiTrait + Send + Sync,
{
    api: T,
    in_flight: Arc<DashSet<String>>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
    unlock_duration_seconds: u32,
}

impl<T> ActionDispatcher<T>
where
    T: RemoteApiTrait + Send + Sync,
{
    pub fn new(
        api: T,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
        unlock_duration_seconds: u32,
    ) -> Self {
        Self {
            api,
            in_flight: Arc::new(DashSet::new()),
            notifier,
            confirm,
            unlock_duration_seconds,
        }
    }

    pub fn is_in_flight(&self, key: &ActionKey) -> bool {
        self.in_flight.contains(key.as_str())
    }

    /// Outstanding keys, sorted.
    pub fn in_flight(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.in_flight.iter().map(|k| k.key().clone()).collect();
        keys.sort();
        keys
    }

    pub async fn execute(
        &self,
        action: ActionType,
        location: &str,
        target: Option<&str>,
    ) -> DispatchOutcome {
        let location = location.trim();
        // emergency always addresses every door at the location
        let target = match action {
            ActionType::Emergency => None,
            _ => target.map(str::trim).filter(|t| !t.is_empty()),
        };

        if let Err(reason) = validate(action, location, target) {
            self.notifier
                .notify(Notification::error(action.label(), reason.clone()));
            return DispatchOutcome::Invalid(reason);
        }

        let key = ActionKey::new(location, action, target);
        if self.is_in_flight(&key) {
            debug!("{} already in flight, ignoring", key);
            return DispatchOutcome::AlreadyInFlight;
        }

        if action == ActionType::Emergency {
            let prompt = format!(
                "EMERGENCY: unlock ALL doors at {}? This cannot be undone remotely.",
                location
            );
            if !self.confirm.confirm(&prompt) {
                info!("Emergency unlock at {} cancelled by operator", location);
                self.notifier.notify(Notification::info(
                    action.label(),
                    format!("Cancelled, no doors at {} were touched", location),
                ));
                return DispatchOutcome::Cancelled;
            }
        }

        let Some(guard) = InFlightGuard::claim(&self.in_flight, &key) else {
            debug!("{} claimed concurrently, ignoring", key);
            return DispatchOutcome::AlreadyInFlight;
        };

        info!("Dispatching {}", key);
        let result = self.send(action, location, target).await;
        drop(guard);

        match result {
            Ok(server_message) => {
                let message = server_message.unwrap_or_else(|| {
                    success_message(action, location, target, self.unlock_duration_seconds)
                });
                self.notifier
                    .notify(Notification::success(action.label(), message.clone()));
                DispatchOutcome::Completed(message)
            }
            Err(e) => {
                if ApiError::is_unauthorized(&e) {
                    debug!("{} rejected: not authenticated", key);
                } else {
                    error!("{} failed: {:?}", key, e);
                }
                let message = ApiError::user_message(&e, &failure_message(action, location));
                self.notifier
                    .notify(Notification::error(action.label(), message.clone()));
                DispatchOutcome::Failed(message)
            }
        }
    }

    async fn send(
        &self,
        action: ActionType,
        location: &str,
        target: Option<&str>,
    ) -> anyhow::Result<Option<String>> {
        match action {
            ActionType::RestartTrackman | ActionType::RestartMusic | ActionType::RestartTv => {
                self.api
                    .execute_script(ScriptRequest {
                        action,
                        location: location.to_string(),
                        bay_number: target.map(str::to_string),
                    })
                    .await
            }
            ActionType::Unlock => {
                self.api
                    .unlock_door(DoorRequest {
                        location: location.to_string(),
                        door_key: target.unwrap_or_default().to_string(),
                        duration: Some(self.unlock_duration_seconds),
                    })
                    .await
            }
            ActionType::Lock => {
                self.api
                    .lock_door(DoorRequest {
                        location: location.to_string(),
                        door_key: target.unwrap_or_default().to_string(),
                        duration: None,
                    })
                    .await
            }
            ActionType::Emergency => self.api.emergency_unlock(location).await,
        }
    }
}

/// Holds an [`ActionKey`] in the in-flight set until dropped, so a cancelled
/// or panicking request still releases its key.
struct InFlightGuard<'a> {
    set: &'a DashSet<String>,
    key: String,
}

impl<'a> InFlightGuard<'a> {
    fn claim(set: &'a DashSet<String>, key: &ActionKey) -> Option<Self> {
        let key = key.as_str().to_string();
        // only a successful insert may own a guard
        set.insert(key.clone()).then(|| Self { set, key })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

fn validate(action: ActionType, location: &str, target: Option<&str>) -> Result<(), String> {
    if location.is_empty() {
        return Err("A location is required".to_string());
    }
    match (action, target) {
        (ActionType::RestartTrackman, None) => Err("A bay number is required".to_string()),
        (ActionType::RestartTrackman, Some(bay)) if bay.parse::<u32>().is_err() => {
            Err(format!("'{}' is not a bay number", bay))
        }
        (ActionType::Unlock | ActionType::Lock, None) => Err("A door is required".to_string()),
        _ => Ok(()),
    }
}

fn success_message(
    action: ActionType,
    location: &str,
    target: Option<&str>,
    unlock_duration_seconds: u32,
) -> String {
    let target = target.unwrap_or("all");
    match action {
        ActionType::RestartTrackman => {
            format!("TrackMan restart initiated for {} bay {}", location, target)
        }
        ActionType::RestartMusic => format!("Music system restart initiated for {}", location),
        ActionType::RestartTv => format!("TV system restart initiated for {}", location),
        ActionType::Unlock => format!(
            "{} door at {} unlocked for {} seconds",
            target, location, unlock_duration_seconds
        ),
        ActionType::Lock => format!("{} door at {} locked", target, location),
        ActionType::Emergency => format!("All doors at {} unlocked", location),
    }
}

fn failure_message(action: ActionType, location: &str) -> String {
    format!("{} failed at {}", action.label(), location)
}
