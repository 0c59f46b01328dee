//! Chat-driven controller input scheduler.
//!
//! Chat users submit short macros ("press A for 500ms, wait, press B"); the
//! scheduler runs many of them at once against one shared controller and
//! supports a global stop that releases every held input in a single tick.

pub mod config;
pub mod directory;
pub mod engine;
pub mod gateway;
pub mod input;
pub mod reply;
pub mod routes;
pub mod state;
