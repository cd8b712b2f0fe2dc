use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NinjaOneScript {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}
