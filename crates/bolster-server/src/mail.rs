//! Transactional email.
//!
//! Messages are rendered from askama templates and POSTed as JSON to an
//! HTTP mail API. Failures are logged and swallowed: an order can be
//! confirmed even when its confirmation email never goes out, and the
//! triggering request is never failed by the mail path.

use askama::Template;
use bolster_commerce::checkout::Order;
use serde::Serialize;
use tracing::{debug, error, info};

/// Rendered order-confirmation message.
#[derive(Template)]
#[template(path = "mail/order_confirmation.html")]
struct OrderConfirmationMail<'a> {
    order: &'a Order,
    base_url: &'a str,
}

/// Rendered password-reset message.
#[derive(Template)]
#[template(path = "mail/password_reset.html")]
struct PasswordResetMail<'a> {
    reset_url: &'a str,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// HTTP mail transport.
#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    api_url: Option<String>,
    api_key: String,
    from: String,
    base_url: String,
}

impl Mailer {
    /// Create a mailer. With no API URL configured, sends become logged
    /// no-ops (local development).
    pub fn new(
        api_url: Option<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key: api_key.into(),
            from: from.into(),
            base_url: base_url.into(),
        }
    }

    /// Send the order confirmation. Errors are logged, never returned.
    pub async fn send_order_confirmation(&self, to: &str, order: &Order) {
        let mail = OrderConfirmationMail {
            order,
            base_url: &self.base_url,
        };
        let subject = format!("Order {} confirmed", order.id);
        self.send(to, &subject, mail.render()).await;
    }

    /// Send a password-reset link. Errors are logged, never returned.
    pub async fn send_password_reset(&self, to: &str, token: &str) {
        let reset_url = format!("{}/auth/reset/{}", self.base_url, token);
        let mail = PasswordResetMail {
            reset_url: &reset_url,
        };
        self.send(to, "Reset your Bolster password", mail.render())
            .await;
    }

    async fn send(&self, to: &str, subject: &str, body: Result<String, askama::Error>) {
        let html = match body {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, subject = subject, "mail template render failed");
                return;
            }
        };

        let Some(api_url) = &self.api_url else {
            debug!(to = to, subject = subject, "mail transport unconfigured, skipping send");
            return;
        };

        let request = SendRequest {
            from: &self.from,
            to,
            subject,
            html: &html,
        };

        match self
            .http
            .post(api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!(to = to, subject = subject, "mail sent");
            }
            Ok(response) => {
                error!(to = to, status = %response.status(), "mail API rejected message");
            }
            Err(e) => {
                error!(to = to, error = %e, "mail send failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolster_commerce::cart::{Cart, CartTotals, LineKey, PricedProduct, ShippingPolicy};
    use bolster_commerce::checkout::{Address, PaymentMethod};
    use bolster_commerce::ids::{ProductId, UserId};
    use bolster_commerce::money::{Currency, Money};
    use std::collections::HashMap;

    fn sample_order() -> Order {
        let mut cart = Cart::new();
        let pid = ProductId::new("p1");
        cart.add(LineKey::new(pid.clone(), Some("Queen"), None::<&str>), 1)
            .unwrap();
        let mut products = HashMap::new();
        products.insert(
            pid,
            PricedProduct {
                name: "Percale Sheet".to_string(),
                slug: "percale-sheet".to_string(),
                unit_price: Money::new(150000, Currency::INR),
                image: None,
            },
        );
        let totals = CartTotals::compute(&cart, &products, &ShippingPolicy::default()).unwrap();
        Order::from_cart_totals(
            UserId::new("u1"),
            &totals,
            Address::new("A", "1 St", "Kochi", "KL", "682001", "94"),
            PaymentMethod::Cod,
            None,
        )
    }

    #[test]
    fn test_order_confirmation_renders() {
        let order = sample_order();
        let mail = OrderConfirmationMail {
            order: &order,
            base_url: "http://localhost:3000",
        };
        let html = mail.render().unwrap();
        assert!(html.contains("Percale Sheet"));
        assert!(html.contains(order.id.as_str()));
    }

    #[test]
    fn test_password_reset_renders_link() {
        let mail = PasswordResetMail {
            reset_url: "http://localhost:3000/auth/reset/tok123",
        };
        let html = mail.render().unwrap();
        assert!(html.contains("/auth/reset/tok123"));
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_swallows_send() {
        let mailer = Mailer::new(None, "", "orders@bolster.test", "http://localhost:3000");
        // Must not panic or error.
        mailer.send_order_confirmation("a@example.com", &sample_order()).await;
        mailer.send_password_reset("a@example.com", "tok").await;
    }
}
