//! Shared models, configuration and error types for `netdeck`.

pub mod config;
pub mod error;
pub mod network;
