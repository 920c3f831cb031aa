//! Home page.

use askama::Template;
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use bolster_auth::FlashMessage;
use bolster_commerce::catalog::{Category, Product};

use crate::error::AppError;
use crate::session::Session;
use crate::state::AppState;
use crate::templates::HtmlTemplate;

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    featured: Vec<Product>,
    categories: Vec<Category>,
    flash: Vec<FlashMessage>,
}

async fn index(
    State(state): State<AppState>,
    session: Session,
) -> Result<HtmlTemplate<HomeTemplate>, AppError> {
    let featured = state.db.featured_products(8).await?;
    let categories = state.db.list_categories().await?;
    let flash = session.with(|data| data.take_flash());

    Ok(HtmlTemplate(HomeTemplate {
        featured,
        categories,
        flash,
    }))
}

/// Build home routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}
