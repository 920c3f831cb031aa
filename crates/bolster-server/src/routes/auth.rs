//! Registration, login, logout, and password reset.

use askama::Template;
use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Form, Router};
use bolster_auth::{
    hash_password, validate_strength, verify_password, FlashKind, FlashMessage, User,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::session::Session;
use crate::state::AppState;
use crate::templates::HtmlTemplate;

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "auth/forgot.html")]
struct ForgotTemplate {
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "auth/reset.html")]
struct ResetTemplate {
    token: String,
    csrf_token: String,
    flash: Vec<FlashMessage>,
}

fn page_context(session: &Session) -> (String, Vec<FlashMessage>) {
    session.with(|data| (data.csrf_token.clone(), data.take_flash()))
}

async fn login_page(session: Session) -> HtmlTemplate<LoginTemplate> {
    let (csrf_token, flash) = page_context(&session);
    HtmlTemplate(LoginTemplate { csrf_token, flash })
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    email: String,
    password: String,
    csrf_token: String,
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AppError> {
    session.verify_csrf(&form.csrf_token)?;

    let Some((user, hash)) = state.db.find_user_by_email(&form.email).await? else {
        session.flash(FlashKind::Error, "Invalid email or password");
        return Ok(Redirect::to("/auth/login"));
    };

    if !verify_password(&form.password, &hash)? {
        session.flash(FlashKind::Error, "Invalid email or password");
        return Ok(Redirect::to("/auth/login"));
    }

    tracing::info!(user_id = %user.id, "user logged in");
    session.with(|data| data.login(user.id.clone()));
    session.flash(FlashKind::Success, format!("Welcome back, {}", user.name));
    Ok(Redirect::to("/"))
}

async fn register_page(session: Session) -> HtmlTemplate<RegisterTemplate> {
    let (csrf_token, flash) = page_context(&session);
    HtmlTemplate(RegisterTemplate { csrf_token, flash })
}

#[derive(Debug, Deserialize)]
struct RegisterForm {
    name: String,
    email: String,
    password: String,
    csrf_token: String,
}

async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, AppError> {
    session.verify_csrf(&form.csrf_token)?;

    if form.name.trim().is_empty() || !form.email.contains('@') {
        session.flash(FlashKind::Error, "Please fill in a valid name and email");
        return Ok(Redirect::to("/auth/register"));
    }
    if let Err(e) = validate_strength(&form.password) {
        session.flash(FlashKind::Error, e.to_string());
        return Ok(Redirect::to("/auth/register"));
    }
    if state.db.find_user_by_email(&form.email).await?.is_some() {
        session.flash(FlashKind::Error, "An account with that email already exists");
        return Ok(Redirect::to("/auth/register"));
    }

    let user = User::new(form.email.trim(), form.name.trim());
    let hash = hash_password(&form.password)?;
    state.db.insert_user(&user, &hash).await?;

    tracing::info!(user_id = %user.id, "user registered");
    session.with(|data| data.login(user.id.clone()));
    session.flash(FlashKind::Success, "Account created");
    Ok(Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
struct LogoutForm {
    csrf_token: String,
}

async fn logout(session: Session, Form(form): Form<LogoutForm>) -> Result<Redirect, AppError> {
    session.verify_csrf(&form.csrf_token)?;
    session.with(|data| data.logout());
    session.flash(FlashKind::Success, "You have been logged out");
    Ok(Redirect::to("/"))
}

async fn forgot_page(session: Session) -> HtmlTemplate<ForgotTemplate> {
    let (csrf_token, flash) = page_context(&session);
    HtmlTemplate(ForgotTemplate { csrf_token, flash })
}

#[derive(Debug, Deserialize)]
struct ForgotForm {
    email: String,
    csrf_token: String,
}

async fn forgot(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotForm>,
) -> Result<Redirect, AppError> {
    session.verify_csrf(&form.csrf_token)?;

    // Same response whether or not the account exists.
    if let Some((user, _)) = state.db.find_user_by_email(&form.email).await? {
        let token = new_reset_token();
        state.db.create_password_reset(&user.id, &token).await?;
        state.mailer.send_password_reset(&user.email, &token).await;
    }

    session.flash(
        FlashKind::Success,
        "If that email is registered, a reset link is on its way",
    );
    Ok(Redirect::to("/auth/login"))
}

async fn reset_page(Path(token): Path<String>, session: Session) -> HtmlTemplate<ResetTemplate> {
    let (csrf_token, flash) = page_context(&session);
    HtmlTemplate(ResetTemplate {
        token,
        csrf_token,
        flash,
    })
}

#[derive(Debug, Deserialize)]
struct ResetForm {
    password: String,
    csrf_token: String,
}

async fn reset(
    State(state): State<AppState>,
    Path(token): Path<String>,
    session: Session,
    Form(form): Form<ResetForm>,
) -> Result<Redirect, AppError> {
    session.verify_csrf(&form.csrf_token)?;

    if let Err(e) = validate_strength(&form.password) {
        session.flash(FlashKind::Error, e.to_string());
        return Ok(Redirect::to(&format!("/auth/reset/{token}")));
    }

    let Some(user_id) = state.db.consume_password_reset(&token).await? else {
        session.flash(FlashKind::Error, "That reset link is invalid or expired");
        return Ok(Redirect::to("/auth/forgot"));
    };

    let hash = hash_password(&form.password)?;
    state.db.set_password_hash(&user_id, &hash).await?;
    tracing::info!(user_id = %user_id, "password reset");

    session.flash(FlashKind::Success, "Password updated, please log in");
    Ok(Redirect::to("/auth/login"))
}

/// Random URL-safe reset token.
fn new_reset_token() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;

    let bytes: [u8; 24] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", post(logout))
        .route("/forgot", get(forgot_page).post(forgot))
        .route("/reset/{token}", get(reset_page).post(reset))
}
