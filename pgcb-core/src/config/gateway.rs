//! Gateway configuration.

/// Identity and shared secret agreed with the payment gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// The merchant id every callback must carry.
    pub merchant_id: String,
    /// HMAC key used by the gateway to sign callbacks.
    pub secret: Box<[u8]>,
}

impl GatewayConfig {
    pub fn new(merchant_id: impl Into<String>, secret: impl Into<Box<[u8]>>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            secret: secret.into(),
        }
    }

    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }
}
