//! Configuration value objects.
//!
//! These are the validated runtime forms. Reading and parsing the config
//! file happens in the server crate; everything here is handed to the
//! callback pipeline explicitly.

mod config_store;
mod events;
mod gateway;

pub use config_store::{ConfigStore, ConfigWatcher};
pub use events::EventsConfig;
pub use gateway::GatewayConfig;
