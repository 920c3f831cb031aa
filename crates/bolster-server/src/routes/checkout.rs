//! Checkout: review page, order placement, payment verification.
//!
//! The order row is written before any gateway call, so a gateway
//! failure leaves a recoverable pending order instead of losing the
//! purchase intent. The verification callback is the system's trust
//! boundary: the signature is recomputed server-side and compared before
//! any state changes.

use askama::Template;
use axum::extract::State;
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use bolster_auth::{FlashKind, FlashMessage};
use bolster_commerce::cart::CartTotals;
use bolster_commerce::checkout::{Address, Order, PaymentMethod};
use bolster_commerce::ids::{AddressId, OrderId};
use bolster_commerce::CommerceError;
use bolster_payments::verify_signature;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::session::{CurrentUser, Session};
use crate::state::AppState;
use crate::templates::HtmlTemplate;

#[derive(Template)]
#[template(path = "checkout.html")]
struct CheckoutTemplate {
    totals: CartTotals,
    addresses: Vec<Address>,
    gateway_key_id: String,
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

/// Price the session cart against current products.
async fn price_session_cart(state: &AppState, session: &Session) -> Result<CartTotals, AppError> {
    let cart = session.with(|data| data.cart.clone());
    let products = state.db.priced_products(&cart.product_ids()).await?;
    Ok(CartTotals::compute(&cart, &products, &state.config.shipping)?)
}

async fn checkout_page(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<axum::response::Response, AppError> {
    use axum::response::IntoResponse;

    if session.with(|data| data.cart.is_empty()) {
        session.flash(FlashKind::Error, "Your cart is empty");
        return Ok(Redirect::to("/cart").into_response());
    }

    let totals = price_session_cart(&state, &session).await?;
    let addresses = state.db.list_addresses(&user.id).await?;
    let (csrf_token, flash) = session.with(|data| (data.csrf_token.clone(), data.take_flash()));

    Ok(HtmlTemplate(CheckoutTemplate {
        totals,
        addresses,
        gateway_key_id: state.gateway.key_id().to_string(),
        csrf_token,
        flash,
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
struct PlaceOrderRequest {
    address_id: String,
    payment_method: String,
    #[serde(default)]
    note: Option<String>,
    csrf_token: String,
}

async fn place_order(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<Value>, AppError> {
    session.verify_csrf(&request.csrf_token)?;

    let payment_method = PaymentMethod::from_str(&request.payment_method)
        .ok_or_else(|| AppError::validation("unknown payment method"))?;

    let address = state
        .db
        .find_address(&user.id, &AddressId::new(request.address_id))
        .await?
        .ok_or_else(|| AppError::validation("invalid address"))?;

    if session.with(|data| data.cart.is_empty()) {
        return Err(AppError::validation("cart is empty"));
    }

    let totals = price_session_cart(&state, &session).await?;

    // Stock check against the snapshot quantities about to be ordered.
    for line in &totals.lines {
        let product = state
            .db
            .find_product(&line.product_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("product {}", line.product_id)))?;
        if !product.stock.can_cover(line.quantity) {
            return Err(CommerceError::InsufficientStock {
                product_id: line.product_id.to_string(),
                requested: line.quantity,
                available: product.stock.quantity,
            }
            .into());
        }
    }

    let order = Order::from_cart_totals(
        user.id.clone(),
        &totals,
        address,
        payment_method,
        request.note.filter(|n| !n.is_empty()),
    );

    // Persist before any gateway call.
    state.db.insert_order(&order).await?;
    tracing::info!(order_id = %order.id, user_id = %user.id, total = order.total.amount_minor, method = payment_method.as_str(), "order placed");

    match payment_method {
        PaymentMethod::Online => {
            let gateway_order = state.gateway.create_order(order.total, &order.id).await?;
            Ok(Json(json!({
                "success": true,
                "orderId": order.id.as_str(),
                "paymentMethod": "online",
                "gatewayOrderId": gateway_order.id,
                "amount": order.total.amount_minor,
                "currency": order.total.currency.code(),
                "keyId": state.gateway.key_id(),
            })))
        }
        PaymentMethod::Cod => {
            state.mailer.send_order_confirmation(&user.email, &order).await;
            session.with(|data| data.cart.clear());
            Ok(Json(json!({
                "success": true,
                "orderId": order.id.as_str(),
                "paymentMethod": "cod",
            })))
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerifyPaymentRequest {
    order_id: String,
    payment_id: String,
    signature: String,
    csrf_token: String,
}

async fn verify_payment(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<Value>, AppError> {
    session.verify_csrf(&request.csrf_token)?;

    // Trust boundary: the callback arrives via the customer's browser.
    // A mismatched signature means a forged or corrupted callback; the
    // order is left untouched.
    if !verify_signature(
        state.gateway.key_secret(),
        &request.order_id,
        &request.payment_id,
        &request.signature,
    ) {
        tracing::warn!(order_id = %request.order_id, "payment signature mismatch");
        return Err(AppError::PaymentSignature);
    }

    let order_id = OrderId::new(request.order_id);
    let order = state
        .db
        .find_order(&order_id)
        .await?
        .filter(|o| o.user_id == user.id)
        .ok_or_else(|| AppError::not_found(format!("order {order_id}")))?;

    state.db.record_payment(&order.id, &request.payment_id).await?;
    tracing::info!(order_id = %order.id, payment_id = %request.payment_id, "payment verified");

    let mut confirmed = order;
    confirmed.confirm_payment(&request.payment_id);
    state.mailer.send_order_confirmation(&user.email, &confirmed).await;

    session.with(|data| data.cart.clear());

    Ok(Json(json!({ "success": true })))
}

/// Build checkout routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout_page))
        .route("/place-order", post(place_order))
        .route("/verify-payment", post(verify_payment))
}
