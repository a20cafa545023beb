//! Configuration loading and management for the Leave Engine.
//!
//! This module loads engine settings (token lifetime, request validation,
//! server address) and optional seed data (employees and periods) from YAML
//! files.
//!
//! # Example
//!
//! ```no_run
//! use leave_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Listening on {}", config.engine().server.addr);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    EngineConfig, RequestSettings, SeedConfig, SeedEmployee, SeedPeriod, ServerSettings,
    TokenSettings, MAX_ENTROPY_BYTES, MAX_TTL_HOURS,
};
