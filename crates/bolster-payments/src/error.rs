//! Payment errors.

use thiserror::Error;

/// Errors from the payment-gateway integration.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// The gateway rejected the request.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Transport-level failure reaching the gateway.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The supplied callback signature did not match.
    #[error("invalid payment signature")]
    InvalidSignature,
}
