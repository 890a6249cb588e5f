//! Command handlers.

pub mod config;
pub mod models;
pub mod predict;
pub mod serve;
