use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReceiptUploadResponse {
    pub id: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}
