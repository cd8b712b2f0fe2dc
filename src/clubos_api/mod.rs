pub mod cached_clubos_client;
pub mod clubos_client;
pub mod models;
