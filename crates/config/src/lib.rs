//! Configuration for the gateway server and the agent
//!
//! Settings are sourced with a fixed precedence: CLI flags win, then
//! environment variables, then an optional JSON config file that fills only
//! still-unset fields, then built-in defaults.

pub mod loader;
pub mod settings;

pub use loader::{load_agent_settings, load_server_settings, ConfigError};
pub use settings::{AgentArgs, AgentSettings, ServerArgs, ServerSettings};
