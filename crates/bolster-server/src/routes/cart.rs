//! Cart page and JSON mutation endpoints.
//!
//! The cart lives in the session; every mutation validates the product
//! exists and that stock covers the resulting quantity.

use askama::Template;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use bolster_auth::FlashMessage;
use bolster_commerce::cart::{CartTotals, LineKey};
use bolster_commerce::ids::ProductId;
use bolster_commerce::CommerceError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::session::Session;
use crate::state::AppState;
use crate::templates::HtmlTemplate;

#[derive(Template)]
#[template(path = "cart.html")]
struct CartTemplate {
    totals: CartTotals,
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

/// Price the session cart against current products.
async fn price_session_cart(state: &AppState, session: &Session) -> Result<CartTotals, AppError> {
    let cart = session.with(|data| data.cart.clone());
    let products = state.db.priced_products(&cart.product_ids()).await?;
    Ok(CartTotals::compute(&cart, &products, &state.config.shipping)?)
}

async fn cart_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<HtmlTemplate<CartTemplate>, AppError> {
    let totals = price_session_cart(&state, &session).await?;
    let (csrf_token, flash) = session.with(|data| (data.csrf_token.clone(), data.take_flash()));

    Ok(HtmlTemplate(CartTemplate {
        totals,
        csrf_token,
        flash,
    }))
}

#[derive(Debug, Deserialize)]
struct AddRequest {
    product_id: String,
    #[serde(default = "default_quantity")]
    quantity: i64,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    color: Option<String>,
    csrf_token: String,
}

fn default_quantity() -> i64 {
    1
}

async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddRequest>,
) -> Result<Json<Value>, AppError> {
    session.verify_csrf(&request.csrf_token)?;

    let product_id = ProductId::new(request.product_id);
    let product = state
        .db
        .find_product(&product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("product {product_id}")))?;

    let key = LineKey::new(product_id.clone(), request.size, request.color);
    let already = session.with(|data| data.cart.quantity_of(&key).unwrap_or(0));
    let wanted = already.saturating_add(request.quantity.max(0));
    if !product.stock.can_cover(wanted) {
        return Err(CommerceError::InsufficientStock {
            product_id: product_id.to_string(),
            requested: wanted,
            available: product.stock.quantity,
        }
        .into());
    }

    session.with(|data| data.cart.add(key, request.quantity))?;
    let count = session.with(|data| data.cart.total_quantity());

    Ok(Json(json!({ "success": true, "cartCount": count })))
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    product_id: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    color: Option<String>,
    quantity: i64,
    csrf_token: String,
}

async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<Value>, AppError> {
    session.verify_csrf(&request.csrf_token)?;

    let product_id = ProductId::new(request.product_id);
    let key = LineKey::new(product_id.clone(), request.size, request.color);

    if request.quantity > 0 {
        let product = state
            .db
            .find_product(&product_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("product {product_id}")))?;
        if !product.stock.can_cover(request.quantity) {
            return Err(CommerceError::InsufficientStock {
                product_id: product_id.to_string(),
                requested: request.quantity,
                available: product.stock.quantity,
            }
            .into());
        }
    }

    let existed = session.with(|data| data.cart.set_quantity(&key, request.quantity))?;
    if !existed {
        return Err(AppError::not_found("cart line"));
    }
    let count = session.with(|data| data.cart.total_quantity());

    Ok(Json(json!({ "success": true, "cartCount": count })))
}

#[derive(Debug, Deserialize)]
struct RemoveRequest {
    product_id: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    color: Option<String>,
    csrf_token: String,
}

async fn remove(
    session: Session,
    Json(request): Json<RemoveRequest>,
) -> Result<Json<Value>, AppError> {
    session.verify_csrf(&request.csrf_token)?;

    let key = LineKey::new(
        ProductId::new(request.product_id),
        request.size,
        request.color,
    );
    let removed = session.with(|data| data.cart.remove(&key));
    let count = session.with(|data| data.cart.total_quantity());

    Ok(Json(json!({ "success": removed, "cartCount": count })))
}

/// Build cart routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_page))
        .route("/add", post(add))
        .route("/update", post(update))
        .route("/remove", post(remove))
}
