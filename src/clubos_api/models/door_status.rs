use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DoorStatus {
    #[serde(rename = "doorId")]
    pub door_id: String,
    pub name: String,
    pub locked: bool,
    pub online: bool,
}
