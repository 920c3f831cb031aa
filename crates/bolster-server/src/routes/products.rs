//! Catalog routes: listing with filters, product detail, JSON APIs.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use bolster_auth::{FlashKind, FlashMessage};
use bolster_commerce::catalog::{Category, Product, Review};
use bolster_commerce::money::Money;
use bolster_commerce::search::{CatalogQuery, Filter, Pagination, SortOption};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::session::{CurrentUser, Session};
use crate::state::AppState;
use crate::templates::HtmlTemplate;

/// Query-string filters, echoed back into the filter form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub category: String,
    #[serde(default, rename = "minPrice")]
    pub min_price: String,
    #[serde(default, rename = "maxPrice")]
    pub max_price: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub page: Option<i64>,
}

#[derive(Template)]
#[template(path = "products/list.html")]
struct ProductListTemplate {
    products: Vec<Product>,
    categories: Vec<Category>,
    params: ListParams,
    pagination: Pagination,
    flash: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "products/detail.html")]
struct ProductDetailTemplate {
    product: Product,
    related: Vec<Product>,
    reviews: Vec<Review>,
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

/// Build the catalog query from request parameters. Filters are ANDed;
/// an unknown category slug simply leaves that filter off.
async fn build_query(state: &AppState, params: &ListParams) -> Result<CatalogQuery, AppError> {
    let mut query = CatalogQuery::new()
        .with_sort(SortOption::from_param(&params.sort))
        .with_pagination(params.page.unwrap_or(1), 24);

    if !params.category.is_empty() {
        if let Some(category) = state.db.find_category_by_slug(&params.category).await? {
            query = query.with_filter(Filter::Category(category.id));
        }
    }

    let currency = state.config.currency();
    let min = parse_major(&params.min_price, currency);
    let max = parse_major(&params.max_price, currency);
    if min.is_some() || max.is_some() {
        query = query.with_filter(Filter::price_range(min, max));
    }

    if !params.color.is_empty() {
        query = query.with_filter(Filter::Colors(split_csv(&params.color)));
    }
    if !params.size.is_empty() {
        query = query.with_filter(Filter::Sizes(split_csv(&params.size)));
    }
    if !params.search.is_empty() {
        query = query.with_filter(Filter::text(&params.search));
    }

    Ok(query)
}

fn parse_major(raw: &str, currency: bolster_commerce::money::Currency) -> Option<Money> {
    raw.parse::<f64>().ok().map(|v| Money::from_decimal(v, currency))
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    session: Session,
) -> Result<HtmlTemplate<ProductListTemplate>, AppError> {
    let query = build_query(&state, &params).await?;
    let (products, total) = state.db.search_products(&query).await?;
    let pagination = Pagination::new(query.page, query.per_page, total);
    let categories = state.db.list_categories().await?;
    let flash = session.with(|data| data.take_flash());

    Ok(HtmlTemplate(ProductListTemplate {
        products,
        categories,
        params,
        pagination,
        flash,
    }))
}

async fn detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
) -> Result<HtmlTemplate<ProductDetailTemplate>, AppError> {
    let product = state
        .db
        .find_product_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("product {slug}")))?;

    let related = state.db.related_products(&product, 4).await?;
    let reviews = state.db.reviews_for(&product.id).await?;
    let (csrf_token, flash) =
        session.with(|data| (data.csrf_token.clone(), data.take_flash()));

    Ok(HtmlTemplate(ProductDetailTemplate {
        product,
        related,
        reviews,
        csrf_token,
        flash,
    }))
}

#[derive(Debug, Deserialize)]
struct ReviewForm {
    rating: u8,
    comment: String,
    csrf_token: String,
}

async fn add_review(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ReviewForm>,
) -> Result<axum::response::Redirect, AppError> {
    session.verify_csrf(&form.csrf_token)?;

    if !(1..=5).contains(&form.rating) {
        return Err(AppError::validation("rating must be between 1 and 5"));
    }

    let product = state
        .db
        .find_product_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("product {slug}")))?;

    state
        .db
        .add_review(&product.id, &user.id, form.rating, &form.comment)
        .await?;
    session.flash(FlashKind::Success, "Review added");

    Ok(axum::response::Redirect::to(&format!("/products/{slug}")))
}

/// Suggestion payload for the search box.
#[derive(Debug, Serialize)]
struct Suggestion {
    name: String,
    slug: String,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuggestionParams {
    #[serde(default)]
    q: String,
}

async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> Result<Json<Vec<Suggestion>>, AppError> {
    if params.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }

    let products = state.db.product_suggestions(params.q.trim(), 5).await?;
    Ok(Json(
        products
            .into_iter()
            .map(|p| Suggestion {
                name: p.name,
                slug: p.slug,
                image: p.images.into_iter().next(),
            })
            .collect(),
    ))
}

async fn featured(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let products = state.db.featured_products(8).await?;
    let payload: Vec<_> = products
        .into_iter()
        .map(|p| {
            json!({
                "name": p.name,
                "slug": p.slug,
                "price": p.price.amount_minor,
                "discountedPrice": p.discounted_price.amount_minor,
                "images": p.images,
                "shortDescription": p.short_description,
                "rating": p.rating,
            })
        })
        .collect();
    Ok(Json(json!(payload)))
}

/// Build catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/api/suggestions", get(suggestions))
        .route("/api/featured", get(featured))
        .route("/{slug}", get(detail))
        .route("/{slug}/reviews", post(add_review))
}
