pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod packet;
pub mod pending;
pub mod records;
pub mod server;
pub mod sweeper;
