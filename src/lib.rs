pub mod config;
pub mod db;
pub mod error;
pub mod framework;
pub mod probe;
pub mod service;
pub mod types;

pub use config::Config;
pub use error::BootstrapError;
pub use service::Orchestrator;
