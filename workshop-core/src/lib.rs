// src/lib.rs

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod eventbus;
pub mod http;
pub mod repositories;
pub mod services;
pub mod utils;

pub use config::WorkshopConfig;
pub use db::Database;
pub use services::WorkshopServices;
pub use workshop_common::error::Error;
