//! Public API: configuration, data types and the serving loop.

pub mod config;
pub mod models;
pub mod service;
