//! Signature and business validation of a gateway notification.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. signature
//! 2. merchant id
//! 3. currency
//! 4. result
//! 5. transaction type

use pgcb_sdk::objects::{Notification, SUPPORTED_CURRENCIES, TransactionResult, TransactionType};
use pgcb_sdk::signature;

use crate::config::GatewayConfig;

/// Why a notification was rejected. The display text is what the gateway
/// sees after `Validation failed with error: `.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid merchant")]
    InvalidMerchant,
    #[error("Unsupported currency")]
    UnsupportedCurrency,
    #[error("Unsupported result")]
    UnsupportedResult,
    #[error("Unsupported transaction type")]
    UnsupportedTransactionType,
}

/// A notification that passed every check, with its enums parsed.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedCallback<'a> {
    pub notification: &'a Notification,
    pub result: TransactionResult,
    pub transaction_type: TransactionType,
}

pub struct CallbackValidator<'c> {
    config: &'c GatewayConfig,
}

impl<'c> CallbackValidator<'c> {
    pub fn new(config: &'c GatewayConfig) -> Self {
        Self { config }
    }

    pub fn validate<'a>(
        &self,
        notification: &'a Notification,
        signature: &str,
    ) -> Result<ValidatedCallback<'a>, ValidationError> {
        if let Err(e) =
            signature::verify_notification(notification, signature, self.config.secret_bytes())
        {
            tracing::debug!(error = %e, "Signature check failed");
            return Err(ValidationError::InvalidSignature);
        }

        if notification.merchant_id != self.config.merchant_id {
            return Err(ValidationError::InvalidMerchant);
        }

        if !SUPPORTED_CURRENCIES.contains(&notification.currency.as_str()) {
            return Err(ValidationError::UnsupportedCurrency);
        }

        let result = TransactionResult::from_wire(&notification.result)
            .ok_or(ValidationError::UnsupportedResult)?;

        let transaction_type = TransactionType::from_wire(&notification.transaction_type)
            .ok_or(ValidationError::UnsupportedTransactionType)?;

        Ok(ValidatedCallback {
            notification,
            result,
            transaction_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::test_support::{SECRET, config, notification, signed};

    #[test]
    fn test_valid_notification_passes() {
        let n = notification("COMPLETED");
        let validated = CallbackValidator::new(&config())
            .validate(&n, &signed(&n))
            .unwrap();
        assert_eq!(validated.result, TransactionResult::Completed);
        assert_eq!(validated.transaction_type, TransactionType::Sale);
    }

    #[test]
    fn test_empty_or_wrong_signature() {
        let n = notification("COMPLETED");
        let validator_config = config();
        let validator = CallbackValidator::new(&validator_config);

        assert_eq!(
            validator.validate(&n, "").unwrap_err(),
            ValidationError::InvalidSignature
        );
        let foreign = signature::sign_notification(&n, b"someone-else");
        assert_eq!(
            validator.validate(&n, &foreign).unwrap_err(),
            ValidationError::InvalidSignature
        );
    }

    #[test]
    fn test_uppercase_signature_is_rejected() {
        let n = notification("COMPLETED");
        assert_eq!(
            CallbackValidator::new(&config())
                .validate(&n, &signed(&n).to_uppercase())
                .unwrap_err(),
            ValidationError::InvalidSignature
        );
    }

    #[test]
    fn test_signature_is_checked_before_merchant() {
        let mut n = notification("COMPLETED");
        n.merchant_id = "OTHER".to_string();
        let validator_config = config();
        let validator = CallbackValidator::new(&validator_config);

        assert_eq!(
            validator.validate(&n, "deadbeef").unwrap_err(),
            ValidationError::InvalidSignature
        );
        let sig = signature::sign_notification(&n, SECRET);
        assert_eq!(
            validator.validate(&n, &sig).unwrap_err(),
            ValidationError::InvalidMerchant
        );
    }

    #[test]
    fn test_business_checks_in_priority_order() {
        let validator_config = config();
        let validator = CallbackValidator::new(&validator_config);

        let mut n = notification("PENDING");
        n.currency = "USD".to_string();
        n.transaction_type = "REFUND".to_string();
        assert_eq!(
            validator.validate(&n, &signed(&n)).unwrap_err(),
            ValidationError::UnsupportedCurrency
        );

        n.currency = "NZD".to_string();
        assert_eq!(
            validator.validate(&n, &signed(&n)).unwrap_err(),
            ValidationError::UnsupportedResult
        );

        n.result = "FAILED".to_string();
        assert_eq!(
            validator.validate(&n, &signed(&n)).unwrap_err(),
            ValidationError::UnsupportedTransactionType
        );

        n.transaction_type = "SALE".to_string();
        assert!(validator.validate(&n, &signed(&n)).is_ok());
    }

    #[test]
    fn test_lowercase_result_is_unsupported() {
        let n = notification("completed");
        assert_eq!(
            CallbackValidator::new(&config())
                .validate(&n, &signed(&n))
                .unwrap_err(),
            ValidationError::UnsupportedResult
        );
    }
}
