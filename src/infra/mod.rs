pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod process;
pub mod rate_limit;
pub mod setup;

pub use error::InfraError;
