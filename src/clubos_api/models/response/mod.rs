pub mod door_status_response;
pub mod envelope;
pub mod receipt_upload_response;
pub mod system_status_response;
