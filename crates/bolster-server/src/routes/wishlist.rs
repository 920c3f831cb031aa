//! Wishlist page and toggle endpoint.

use askama::Template;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use bolster_auth::FlashMessage;
use bolster_commerce::catalog::Product;
use bolster_commerce::ids::ProductId;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::session::{CurrentUser, Session};
use crate::state::AppState;
use crate::templates::HtmlTemplate;

#[derive(Template)]
#[template(path = "wishlist.html")]
struct WishlistTemplate {
    products: Vec<Product>,
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

async fn wishlist_page(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<HtmlTemplate<WishlistTemplate>, AppError> {
    let products = state.db.wishlist_products(&user.id).await?;
    let (csrf_token, flash) = session.with(|data| (data.csrf_token.clone(), data.take_flash()));

    Ok(HtmlTemplate(WishlistTemplate {
        products,
        csrf_token,
        flash,
    }))
}

#[derive(Debug, Deserialize)]
struct ToggleRequest {
    product_id: String,
    csrf_token: String,
}

async fn toggle(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<Value>, AppError> {
    session.verify_csrf(&request.csrf_token)?;

    let product_id = ProductId::new(request.product_id);
    if state.db.find_product(&product_id).await?.is_none() {
        return Err(AppError::not_found(format!("product {product_id}")));
    }

    let added = state.db.toggle_wishlist(&user.id, &product_id).await?;
    Ok(Json(json!({ "success": true, "inWishlist": added })))
}

/// Build wishlist routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist_page))
        .route("/toggle", post(toggle))
}
