//! milktrack: dashboard statistics and client for a milk collection backend

pub mod cli;
pub mod config;
pub mod format;
pub mod logging;
pub mod services;
pub mod tui;
pub mod types;
