//! Client for the ClubOS facility backend: remote hardware actions, door
//! control and per-location status polling.

pub mod clubos_api;
pub mod config;
pub mod error;
pub mod remote;
