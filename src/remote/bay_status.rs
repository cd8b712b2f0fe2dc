use crate::clubos_api::models::bay_status::BayStatus;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    /// Working.
    Green,
    /// Needs attention, nobody in the bay.
    Yellow,
    /// Needs attention while a customer is playing.
    Red,
}

impl Display for StatusColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StatusColor::Green => "green",
            StatusColor::Yellow => "yellow",
            StatusColor::Red => "red",
        })
    }
}

/// An offline bay counts as having an issue.
pub fn status_color(bay: &BayStatus) -> StatusColor {
    let needs_attention = bay.has_issue || !bay.is_online;
    match (needs_attention, bay.is_occupied) {
        (false, _) => StatusColor::Green,
        (true, true) => StatusColor::Red,
        (true, false) => StatusColor::Yellow,
    }
}
