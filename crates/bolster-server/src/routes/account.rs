//! Account pages: order history and address book.

use askama::Template;
use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Form, Router};
use bolster_auth::{FlashKind, FlashMessage};
use bolster_commerce::checkout::{Address, Order};
use bolster_commerce::ids::{AddressId, OrderId};
use serde::Deserialize;

use crate::error::AppError;
use crate::session::{CurrentUser, Session};
use crate::state::AppState;
use crate::templates::HtmlTemplate;

#[derive(Template)]
#[template(path = "account/orders.html")]
struct OrdersTemplate {
    orders: Vec<Order>,
    flash: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "account/order_detail.html")]
struct OrderDetailTemplate {
    order: Order,
    flash: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "account/addresses.html")]
struct AddressesTemplate {
    addresses: Vec<Address>,
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

async fn orders(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<HtmlTemplate<OrdersTemplate>, AppError> {
    let orders = state.db.list_orders_for_user(&user.id).await?;
    let flash = session.with(|data| data.take_flash());
    Ok(HtmlTemplate(OrdersTemplate { orders, flash }))
}

async fn order_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<HtmlTemplate<OrderDetailTemplate>, AppError> {
    let order_id = OrderId::new(id);
    let order = state
        .db
        .find_order(&order_id)
        .await?
        .filter(|o| o.user_id == user.id)
        .ok_or_else(|| AppError::not_found(format!("order {order_id}")))?;

    let flash = session.with(|data| data.take_flash());
    Ok(HtmlTemplate(OrderDetailTemplate { order, flash }))
}

async fn addresses(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> Result<HtmlTemplate<AddressesTemplate>, AppError> {
    let addresses = state.db.list_addresses(&user.id).await?;
    let (csrf_token, flash) = session.with(|data| (data.csrf_token.clone(), data.take_flash()));

    Ok(HtmlTemplate(AddressesTemplate {
        addresses,
        csrf_token,
        flash,
    }))
}

#[derive(Debug, Deserialize)]
struct AddressForm {
    name: String,
    street: String,
    city: String,
    state: String,
    zip: String,
    phone: String,
    csrf_token: String,
}

impl AddressForm {
    fn into_address(self) -> Address {
        Address::new(self.name, self.street, self.city, self.state, self.zip, self.phone)
    }
}

async fn add_address(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Form(form): Form<AddressForm>,
) -> Result<Redirect, AppError> {
    session.verify_csrf(&form.csrf_token)?;

    let address = form.into_address();
    if !address.is_complete() {
        session.flash(FlashKind::Error, "Please fill in all address fields");
        return Ok(Redirect::to("/account/addresses"));
    }

    state.db.add_address(&user.id, &address).await?;
    session.flash(FlashKind::Success, "Address added");
    Ok(Redirect::to("/account/addresses"))
}

async fn edit_address(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Form(form): Form<AddressForm>,
) -> Result<Redirect, AppError> {
    session.verify_csrf(&form.csrf_token)?;

    let address = form.into_address();
    if !address.is_complete() {
        session.flash(FlashKind::Error, "Please fill in all address fields");
        return Ok(Redirect::to("/account/addresses"));
    }

    let updated = state
        .db
        .update_address(&user.id, &AddressId::new(id), &address)
        .await?;
    if !updated {
        return Err(AppError::not_found("address"));
    }

    session.flash(FlashKind::Success, "Address updated");
    Ok(Redirect::to("/account/addresses"))
}

/// Build account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders))
        .route("/orders/{id}", get(order_detail))
        .route("/addresses", get(addresses).post(add_address))
        .route("/addresses/{id}", post(edit_address))
}
