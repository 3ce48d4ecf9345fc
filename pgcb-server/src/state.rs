//! Application state shared across all request handlers.

use pgcb_core::callback::CallbackHandler;
use pgcb_core::config::{ConfigStore, EventsConfig, GatewayConfig};

/// Cloneable handle given to every axum handler.
#[derive(Clone)]
pub struct AppState {
    /// The callback pipeline.
    pub callbacks: CallbackHandler,
    /// Gateway section of the config, swapped on SIGHUP.
    pub gateway_config: ConfigStore<GatewayConfig>,
    /// Events section of the config, swapped on SIGHUP.
    pub events_config: ConfigStore<EventsConfig>,
}

impl AppState {
    pub fn new(
        callbacks: CallbackHandler,
        gateway_config: ConfigStore<GatewayConfig>,
        events_config: ConfigStore<EventsConfig>,
    ) -> Self {
        Self {
            callbacks,
            gateway_config,
            events_config,
        }
    }
}
