pub mod attempts;
pub mod auth;
pub mod cli;
pub mod config;
pub mod context;
pub mod http;
pub mod logging;
pub mod server;
pub mod shell;
pub mod ssh;
pub mod tcp;
pub mod utils;
