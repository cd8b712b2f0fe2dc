pub mod request;
pub mod response;

pub mod bay_status;
pub mod conversation;
pub mod device_record;
pub mod door_status;
pub mod script;
pub mod task;
pub mod ticket;
