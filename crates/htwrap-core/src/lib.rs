pub mod config;
pub mod logging;

pub mod analyzer;
pub mod auth;
pub mod command;
pub mod server;
pub mod service;
