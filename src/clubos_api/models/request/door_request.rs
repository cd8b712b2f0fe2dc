use serde::{Deserialize, Serialize};

/// Body of `POST /door-access/unlock` and `POST /door-access/lock`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DoorRequest {
    pub location: String,
    #[serde(rename = "doorKey")]
    pub door_key: String,
    /// Seconds the door stays unlocked. Unused for lock requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EmergencyRequest {
    pub location: String,
    pub action: String,
}

impl EmergencyRequest {
    pub fn unlock_all(location: &str) -> Self {
        Self {
            location: location.to_string(),
            action: "unlock_all".to_string(),
        }
    }
}
