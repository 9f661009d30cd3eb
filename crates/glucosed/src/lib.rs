//! Glucose daemon library - exposes modules for testing.

pub mod config;
pub mod logging;
pub mod routes;
pub mod server;
pub mod skill;
