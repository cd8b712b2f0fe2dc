use crate::clubos_api::models::door_status::DoorStatus;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DoorStatusResponse {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub doors: Vec<DoorStatus>,
}
