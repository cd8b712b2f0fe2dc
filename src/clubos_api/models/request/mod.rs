pub mod action_request;
pub mod door_request;
pub mod task_request;
pub mod ticket_request;
