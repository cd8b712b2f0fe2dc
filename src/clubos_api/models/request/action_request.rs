use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ActionType {
    // NinjaOne scripts
    #[serde(rename = "restart-trackman")]
    RestartTrackman,
    #[serde(rename = "restart-music")]
    RestartMusic,
    #[serde(rename = "restart-tv")]
    RestartTv,

    // Doors
    #[serde(rename = "unlock")]
    Unlock,
    #[serde(rename = "lock")]
    Lock,
    #[serde(rename = "emergency")]
    Emergency,
}

impl ActionType {
    pub const ALL: [ActionType; 6] = [
        ActionType::RestartTrackman,
        ActionType::RestartMusic,
        ActionType::RestartTv,
        ActionType::Unlock,
        ActionType::Lock,
        ActionType::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::RestartTrackman => "restart-trackman",
            ActionType::RestartMusic => "restart-music",
            ActionType::RestartTv => "restart-tv",
            ActionType::Unlock => "unlock",
            ActionType::Lock => "lock",
            ActionType::Emergency => "emergency",
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(
            self,
            ActionType::RestartTrackman | ActionType::RestartMusic | ActionType::RestartTv
        )
    }

    /// Human label used in notifications.
    pub fn label(&self) -> &'static str {
        match self {
            ActionType::RestartTrackman => "TrackMan restart",
            ActionType::RestartMusic => "Music system restart",
            ActionType::RestartTv => "TV system restart",
            ActionType::Unlock => "Door unlock",
            ActionType::Lock => "Door lock",
            ActionType::Emergency => "Emergency unlock",
        }
    }
}

impl Display for ActionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown action type: {}", s))
    }
}

/// Body of `POST /ninjaone/execute`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScriptRequest {
    pub action: ActionType,
    pub location: String,
    #[serde(rename = "bayNumber", skip_serializing_if = "Option::is_none")]
    pub bay_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_display_and_from_str() {
        for action in ActionType::ALL {
            let wire = serde_json::to_value(action).unwrap();
            assert_eq!(wire.as_str(), Some(action.as_str()));
            assert_eq!(action.as_str().parse::<ActionType>().unwrap(), action);
        }
        assert!("reboot-everything".parse::<ActionType>().is_err());
    }

    #[test]
    fn script_request_omits_missing_bay() {
        let body = serde_json::to_value(ScriptRequest {
            action: ActionType::RestartMusic,
            location: "Bedford".to_string(),
            bay_number: None,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"action": "restart-music", "location": "Bedford"})
        );
    }
}
