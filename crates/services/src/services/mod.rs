pub mod config;
pub mod directory_client;
pub mod profile_panel;
