//! Payment-gateway integration for Bolster.
//!
//! Two concerns live here:
//!
//! - creating a gateway-hosted order for client-side payment capture
//! - verifying the signature the gateway hands back through the client
//!   after capture, the one untrusted-input check in the system

mod error;
mod gateway;
mod signature;

pub use error::PaymentError;
pub use gateway::{GatewayClient, GatewayOrder};
pub use signature::{payment_signature, verify_signature};
