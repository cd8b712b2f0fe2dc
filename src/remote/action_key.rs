use crate::clubos_api::models::request::action_request::ActionType;
use std::fmt::{Display, Formatter};

/// Identifies one remote action request: `{location}-{action}-{target}`.
///
/// Actions without a target use `all`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionKey(String);

impl ActionKey {
    pub fn new(location: &str, action: ActionType, target: Option<&str>) -> Self {
        Self(format!(
            "{}-{}-{}",
            location,
            action.as_str(),
            target.unwrap_or("all")
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ActionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ActionKey> for String {
    fn from(key: ActionKey) -> Self {
        key.0
    }
}
