pub mod config;
pub mod entry;
