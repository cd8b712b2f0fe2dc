use crate::clubos_api::models::ticket::TicketStatus;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TicketFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TicketStatusRequest {
    pub status: TicketStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TicketCommentRequest {
    pub text: String,
}
