//! Campus Hub - Campus Portal Backend
//!
//! A campus portal backend: REST API for announcements, classes, timetables,
//! and lost & found, plus an AI assistant service with multi-provider
//! LLM support.

pub mod api;
pub mod assistant;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

pub use config::config;
pub use error::{Error, Result};
pub use state::AppState;
