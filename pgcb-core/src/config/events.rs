//! Downstream event delivery configuration.

use url::Url;

/// Where published callback events are forwarded, if anywhere.
#[derive(Debug, Clone, Default)]
pub struct EventsConfig {
    /// Endpoint receiving forwarded events. `None` means log only.
    pub forward_url: Option<Url>,
    /// Key used to sign forwarded events.
    pub secret: Box<[u8]>,
}

impl EventsConfig {
    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }
}
