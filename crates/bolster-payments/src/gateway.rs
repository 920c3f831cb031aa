//! Payment-gateway order creation.

use crate::PaymentError;
use bolster_commerce::ids::OrderId;
use bolster_commerce::money::Money;
use serde::{Deserialize, Serialize};

/// A gateway-hosted order handle for client-side payment capture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayOrder {
    /// Gateway order id, handed to the client-side checkout widget.
    pub id: String,
    /// Amount in minor currency units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
    /// Our order id, echoed back as the receipt.
    pub receipt: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    payment_capture: u8,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    error: Option<GatewayErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetail {
    description: String,
}

/// Client for the payment gateway's order API.
///
/// Authenticates with HTTP basic auth (key id / key secret). The key id
/// is also exposed to templates so the client-side widget can open the
/// hosted checkout.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl GatewayClient {
    /// Create a client against the given API base URL.
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }

    /// The public key id, for client-side checkout initialization.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The key secret, used to verify callback signatures.
    pub fn key_secret(&self) -> &str {
        &self.key_secret
    }

    /// Create a gateway order for the given amount, with our order id as
    /// the receipt. Amount is sent in minor currency units.
    pub async fn create_order(
        &self,
        amount: Money,
        receipt: &OrderId,
    ) -> Result<GatewayOrder, PaymentError> {
        let request = CreateOrderRequest {
            amount: amount.amount_minor,
            currency: amount.currency.code(),
            receipt: receipt.as_str(),
            payment_capture: 1,
        };

        let response = self
            .http
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<GatewayErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .map(|e| e.description)
                .unwrap_or_else(|| format!("status {}", status));
            return Err(PaymentError::Gateway(detail));
        }

        Ok(response.json::<GatewayOrder>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolster_commerce::money::Currency;

    #[test]
    fn test_request_serialization() {
        let request = CreateOrderRequest {
            amount: Money::new(95000, Currency::INR).amount_minor,
            currency: Currency::INR.code(),
            receipt: "ord_abc",
            payment_capture: 1,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amount"], 95000);
        assert_eq!(json["currency"], "INR");
        assert_eq!(json["receipt"], "ord_abc");
        assert_eq!(json["payment_capture"], 1);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GatewayClient::new("https://gw.example.com/v1/", "key", "secret");
        assert_eq!(client.base_url, "https://gw.example.com/v1");
        assert_eq!(client.key_id(), "key");
    }

    #[test]
    fn test_gateway_order_deserialization() {
        let body = r#"{"id":"gw_ord_1","amount":95000,"currency":"INR","receipt":"ord_abc"}"#;
        let order: GatewayOrder = serde_json::from_str(body).unwrap();
        assert_eq!(order.id, "gw_ord_1");
        assert_eq!(order.amount, 95000);
    }
}
