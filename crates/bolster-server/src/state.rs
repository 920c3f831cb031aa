//! Shared application state.

use crate::config::Config;
use crate::db::Database;
use crate::mail::Mailer;
use crate::rate_limit::RateLimiter;
use bolster_payments::GatewayClient;
use std::sync::Arc;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub gateway: GatewayClient,
    pub mailer: Mailer,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Assemble state from validated configuration.
    pub fn new(config: Config, db: Database) -> Self {
        let gateway = GatewayClient::new(
            &config.gateway_base_url,
            &config.gateway_key_id,
            &config.gateway_key_secret,
        );
        let mailer = Mailer::new(
            config.mail_api_url.clone(),
            &config.mail_api_key,
            &config.mail_from,
            &config.base_url,
        );
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max,
            std::time::Duration::from_secs(config.rate_limit_window_secs),
        ));

        Self {
            db,
            config: Arc::new(config),
            gateway,
            mailer,
            limiter,
        }
    }
}
