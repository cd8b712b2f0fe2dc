use crate::clubos_api::models::bay_status::BayStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SystemStatus {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bays: Vec<BayStatus>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}
