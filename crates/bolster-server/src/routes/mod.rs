//! HTTP route handlers, one module per mount point.

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod wishlist;

use axum::Router;

use crate::state::AppState;

/// Assemble the full application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(home::routes())
        .nest("/auth", auth::routes())
        .nest("/products", products::routes())
        .nest("/cart", cart::routes())
        .nest("/wishlist", wishlist::routes())
        .nest("/checkout", checkout::routes())
        .nest("/account", account::routes())
        .nest("/admin", admin::routes())
}
