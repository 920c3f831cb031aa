//! Admin back-office: dashboard, product management, CSV bulk import,
//! order management.

use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Form, Router};
use bolster_auth::{FlashKind, FlashMessage};
use bolster_commerce::catalog::{Category, Product, ProductAttributes, Stock};
use bolster_commerce::checkout::{Order, OrderStatus};
use bolster_commerce::ids::{CategoryId, ProductId};
use bolster_commerce::import::import_products;
use bolster_commerce::money::Money;
use bolster_commerce::slug::slugify;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::AppError;
use crate::session::{AdminUser, Session};
use crate::state::AppState;
use crate::templates::HtmlTemplate;
use crate::uploads::{remove_file, save_csv, save_upload, MAX_PRODUCT_IMAGES};

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct DashboardTemplate {
    product_count: i64,
    order_count: i64,
    user_count: i64,
    month_order_count: i64,
    recent_orders: Vec<Order>,
    flash: Vec<FlashMessage>,
}

/// Product row with its category name, for the admin listing.
struct AdminProduct {
    product: Product,
    category_name: String,
}

#[derive(Template)]
#[template(path = "admin/products.html")]
struct AdminProductsTemplate {
    products: Vec<AdminProduct>,
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "admin/product_form.html")]
struct ProductFormTemplate {
    categories: Vec<Category>,
    product: Option<Product>,
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "admin/orders.html")]
struct AdminOrdersTemplate {
    orders: Vec<Order>,
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    AdminUser(_): AdminUser,
) -> Result<HtmlTemplate<DashboardTemplate>, AppError> {
    let product_count = state.db.count_products().await?;
    let order_count = state.db.count_orders().await?;
    let user_count = state.db.count_users().await?;
    let month_order_count = state.db.count_orders_since(30).await?;
    let recent_orders = state.db.recent_orders(5).await?;
    let flash = session.with(|data| data.take_flash());

    Ok(HtmlTemplate(DashboardTemplate {
        product_count,
        order_count,
        user_count,
        month_order_count,
        recent_orders,
        flash,
    }))
}

async fn product_list(
    State(state): State<AppState>,
    session: Session,
    AdminUser(_): AdminUser,
) -> Result<HtmlTemplate<AdminProductsTemplate>, AppError> {
    let products = state
        .db
        .list_products()
        .await?
        .into_iter()
        .map(|(product, category_name)| AdminProduct {
            product,
            category_name,
        })
        .collect();
    let (csrf_token, flash) = session.with(|data| (data.csrf_token.clone(), data.take_flash()));

    Ok(HtmlTemplate(AdminProductsTemplate {
        products,
        csrf_token,
        flash,
    }))
}

async fn new_product_form(
    State(state): State<AppState>,
    session: Session,
    AdminUser(_): AdminUser,
) -> Result<HtmlTemplate<ProductFormTemplate>, AppError> {
    let categories = state.db.list_categories().await?;
    let (csrf_token, flash) = session.with(|data| (data.csrf_token.clone(), data.take_flash()));

    Ok(HtmlTemplate(ProductFormTemplate {
        categories,
        product: None,
        csrf_token,
        flash,
    }))
}

async fn edit_product_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
    AdminUser(_): AdminUser,
) -> Result<HtmlTemplate<ProductFormTemplate>, AppError> {
    let product = state
        .db
        .find_product(&ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::not_found("product"))?;
    let categories = state.db.list_categories().await?;
    let (csrf_token, flash) = session.with(|data| (data.csrf_token.clone(), data.take_flash()));

    Ok(HtmlTemplate(ProductFormTemplate {
        categories,
        product: Some(product),
        csrf_token,
        flash,
    }))
}

/// Fields collected from the multipart product form.
#[derive(Default)]
struct ProductForm {
    fields: HashMap<String, String>,
    images: Vec<(String, Vec<u8>)>,
}

impl ProductForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ProductForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "images" {
                let filename = field.file_name().unwrap_or("image.jpg").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(e.to_string()))?;
                if !bytes.is_empty() && form.images.len() < MAX_PRODUCT_IMAGES {
                    form.images.push((filename, bytes.to_vec()));
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(e.to_string()))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    fn required(&self, name: &str) -> Result<String, AppError> {
        let value = self.text(name);
        if value.trim().is_empty() {
            return Err(AppError::validation(format!("missing field {name}")));
        }
        Ok(value)
    }

    fn money(&self, name: &str, currency: bolster_commerce::money::Currency) -> Result<Money, AppError> {
        let raw = self.required(name)?;
        let value: f64 = raw
            .parse()
            .map_err(|_| AppError::validation(format!("bad number for {name}")))?;
        Ok(Money::from_decimal(value, currency))
    }

    fn list(&self, name: &str) -> Vec<String> {
        self.text(name)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn attributes(&self) -> ProductAttributes {
        ProductAttributes {
            sizes: self.list("sizes"),
            colors: self.list("colors"),
            material: Some(self.text("material")).filter(|m| !m.is_empty()),
            thread_count: self.text("thread_count").parse().ok(),
            dimensions: Some(self.text("dimensions")).filter(|d| !d.is_empty()),
        }
    }
}

async fn create_product(
    State(state): State<AppState>,
    session: Session,
    AdminUser(_): AdminUser,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let form = ProductForm::read(multipart).await?;
    session.verify_csrf(&form.text("csrf_token"))?;

    let currency = state.config.currency();
    let result: Result<Product, AppError> = async {
        let price = form.money("price", currency)?;
        let discounted = if form.text("discounted_price").trim().is_empty() {
            price
        } else {
            form.money("discounted_price", currency)?
        };

        let mut product = Product::new(
            form.required("name")?,
            form.required("description")?,
            price,
            discounted,
            CategoryId::new(form.required("category")?),
        )?;

        let short = form.text("short_description");
        if !short.is_empty() {
            product.short_description = short;
        }
        product.attributes = form.attributes();
        product.tags = form.list("tags");
        product.featured = form.text("is_featured") == "on";
        product.stock = Stock::new(form.text("stock_quantity").parse().unwrap_or(0));

        for (filename, bytes) in &form.images {
            let path = save_upload(&state.config.upload_dir, filename, bytes).await?;
            product.images.push(path);
        }

        state.db.insert_product(&product).await?;
        Ok(product)
    }
    .await;

    match result {
        Ok(product) => {
            tracing::info!(product_id = %product.id, slug = %product.slug, "product created");
            session.flash(FlashKind::Success, "Product added successfully");
            Ok(Redirect::to("/admin/products"))
        }
        Err(e) => {
            tracing::warn!(error = %e, "product create failed");
            session.flash(FlashKind::Error, format!("Error adding product: {e}"));
            Ok(Redirect::to("/admin/products/new"))
        }
    }
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
    AdminUser(_): AdminUser,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let form = ProductForm::read(multipart).await?;
    session.verify_csrf(&form.text("csrf_token"))?;

    let mut product = state
        .db
        .find_product(&ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::not_found("product"))?;

    let currency = state.config.currency();
    let result: Result<(), AppError> = async {
        let price = form.money("price", currency)?;
        let discounted = if form.text("discounted_price").trim().is_empty() {
            price
        } else {
            form.money("discounted_price", currency)?
        };
        product.set_pricing(price, discounted)?;

        product.name = form.required("name")?;
        product.slug = slugify(&product.name);
        product.description = form.required("description")?;
        let short = form.text("short_description");
        if !short.is_empty() {
            product.short_description = short;
        }
        product.category_id = CategoryId::new(form.required("category")?);
        product.attributes = form.attributes();
        product.tags = form.list("tags");
        product.featured = form.text("is_featured") == "on";
        product.stock = Stock::new(form.text("stock_quantity").parse().unwrap_or(0));

        for (filename, bytes) in &form.images {
            let path = save_upload(&state.config.upload_dir, filename, bytes).await?;
            product.images.push(path);
        }

        state.db.update_product(&product).await?;
        Ok(())
    }
    .await;

    match result {
        Ok(()) => {
            session.flash(FlashKind::Success, "Product updated");
            Ok(Redirect::to("/admin/products"))
        }
        Err(e) => {
            tracing::warn!(error = %e, "product update failed");
            session.flash(FlashKind::Error, format!("Error updating product: {e}"));
            Ok(Redirect::to(&format!("/admin/products/{}/edit", product.id)))
        }
    }
}

async fn bulk_upload(
    State(state): State<AppState>,
    session: Session,
    AdminUser(_): AdminUser,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let mut csv_bytes: Option<Vec<u8>> = None;
    let mut csrf_token = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.to_string()))?
    {
        match field.name().unwrap_or_default() {
            "csvFile" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(e.to_string()))?;
                csv_bytes = Some(bytes.to_vec());
            }
            "csrf_token" => {
                csrf_token = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(e.to_string()))?;
            }
            _ => {}
        }
    }

    session.verify_csrf(&csrf_token)?;

    let Some(bytes) = csv_bytes.filter(|b| !b.is_empty()) else {
        session.flash(FlashKind::Error, "Please upload a CSV file");
        return Ok(Redirect::to("/admin/products"));
    };

    // The upload is persisted for processing and deleted afterwards,
    // whatever the outcome.
    let path = save_csv(&state.config.upload_dir, &bytes).await?;
    let outcome = process_csv(&state, &path).await;
    remove_file(&path).await;

    match outcome {
        Ok((created, skipped)) => {
            tracing::info!(created, skipped, "bulk import finished");
            session.flash(
                FlashKind::Success,
                format!("{created} products imported, {skipped} rows skipped"),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "bulk import failed");
            session.flash(FlashKind::Error, "Error processing CSV file");
        }
    }
    Ok(Redirect::to("/admin/products"))
}

async fn process_csv(
    state: &AppState,
    path: &std::path::Path,
) -> Result<(usize, usize), AppError> {
    let file = std::fs::File::open(path)
        .map_err(|e| AppError::Internal(format!("open csv: {e}")))?;
    let categories = state.db.category_name_map().await?;
    let outcome = import_products(file, &categories, state.config.currency())?;

    let mut created = 0usize;
    let mut skipped = outcome.skipped;
    for product in outcome.created {
        // A duplicate slug fails the unique index; count it as skipped.
        match state.db.insert_product(&product).await {
            Ok(()) => created += 1,
            Err(e) => {
                tracing::warn!(slug = %product.slug, error = %e, "import row not inserted");
                skipped += 1;
            }
        }
    }
    Ok((created, skipped))
}

#[derive(Debug, Deserialize)]
struct CategoryForm {
    name: String,
    csrf_token: String,
}

async fn create_category(
    State(state): State<AppState>,
    session: Session,
    AdminUser(_): AdminUser,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect, AppError> {
    session.verify_csrf(&form.csrf_token)?;

    if form.name.trim().is_empty() {
        session.flash(FlashKind::Error, "Category name is required");
        return Ok(Redirect::to("/admin/products"));
    }

    match state.db.insert_category(&Category::new(form.name.trim())).await {
        Ok(()) => session.flash(FlashKind::Success, "Category created"),
        Err(_) => session.flash(FlashKind::Error, "That category already exists"),
    }
    Ok(Redirect::to("/admin/products"))
}

async fn order_list(
    State(state): State<AppState>,
    session: Session,
    AdminUser(_): AdminUser,
) -> Result<HtmlTemplate<AdminOrdersTemplate>, AppError> {
    let orders = state.db.list_orders().await?;
    let (csrf_token, flash) = session.with(|data| (data.csrf_token.clone(), data.take_flash()));

    Ok(HtmlTemplate(AdminOrdersTemplate {
        orders,
        csrf_token,
        flash,
    }))
}

#[derive(Debug, Deserialize)]
struct StatusForm {
    status: String,
    csrf_token: String,
}

async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
    AdminUser(_): AdminUser,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    session.verify_csrf(&form.csrf_token)?;

    let status = OrderStatus::from_str(&form.status)
        .ok_or_else(|| AppError::validation("unknown order status"))?;

    let updated = state
        .db
        .update_order_status(&bolster_commerce::ids::OrderId::new(id), status)
        .await?;
    if !updated {
        return Err(AppError::not_found("order"));
    }

    session.flash(FlashKind::Success, "Order status updated");
    Ok(Redirect::to("/admin/orders"))
}

/// Build admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/products", get(product_list).post(create_product))
        .route("/products/new", get(new_product_form))
        .route("/products/bulk-upload", post(bulk_upload))
        .route("/products/{id}/edit", get(edit_product_form))
        .route("/products/{id}", post(update_product))
        .route("/categories", post(create_category))
        .route("/orders", get(order_list))
        .route("/orders/{id}/status", post(update_order_status))
}
