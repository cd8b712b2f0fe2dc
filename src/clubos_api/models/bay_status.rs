use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct BayStatus {
    #[serde(rename = "bayNumber")]
    pub bay_number: u32,
    #[serde(rename = "isOnline")]
    pub is_online: bool,
    #[serde(rename = "isOccupied", default)]
    pub is_occupied: bool,
    #[serde(rename = "hasIssue", default)]
    pub has_issue: bool,
}
