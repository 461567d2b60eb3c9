// src/lib.rs

pub mod auth;
pub mod config;
pub mod db;
pub mod repositories;
pub mod services;
pub mod test_utils;

pub use atelier_common::error::Error;
pub use config::{AppConfig, BackendKind};
pub use db::Database;
