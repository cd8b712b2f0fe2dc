use serde::{Deserialize, Deserializer, Serialize};

/// A NinjaOne-managed device as reported by `/ninjaone/devices`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceRecord {
    // unassigned devices come back without a location
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub bay_number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
}

impl DeviceRecord {
    pub fn bay(&self) -> Option<u32> {
        self.bay_number.as_deref()?.trim().parse().ok()
    }
}

// The backend is inconsistent about whether bay numbers are strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
