//! Vote Board - live vote tally dashboard backed by a Google Sheets worksheet
//!
//! This library exposes the core modules for testing and reuse.

pub mod chart;
pub mod common;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod refresh;
pub mod routes;
pub mod services;
pub mod sheets;
