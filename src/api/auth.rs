use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    web, HttpRequest, HttpResponse,
};
use chrono::Utc;
use serde_json::json;

use super::{base_url, flash_back};
use crate::middleware::{CurrentUser, SESSION_COOKIE};
use crate::models::{AccountForm, ForgotForm, LoginForm, RegisterForm, ResetForm, User, UserView};
use crate::services::password_reset_service::{self, NO_ACCOUNT};
use crate::services::{auth_service, user_service};
use crate::state::AppState;
use crate::utils::flash::{self, Flash};
use crate::utils::{AppError, AppResult};

fn session_cookie(token: String, ttl_hours: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(ttl_hours))
        .finish()
}

/// Redirect that also logs `user` in
fn redirect_with_session(
    state: &AppState,
    user: &User,
    location: &str,
    flashes: Vec<Flash>,
) -> AppResult<HttpResponse> {
    let token = state.sessions.issue_session(user)?;
    let mut res = flash::redirect(location, flashes);
    res.add_cookie(&session_cookie(token, state.config.session_ttl_hours))
        .map_err(|e| AppError::Internal(format!("Failed to set session cookie: {}", e)))?;
    Ok(res)
}

pub async fn login_form(req: HttpRequest) -> HttpResponse {
    flash::page(&req, json!({ "title": "Login" }))
}

pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    log::info!("🔐 POST /login - email: {}", form.email);

    match auth_service::login(state.users.as_ref(), &form).await {
        Ok(user) => redirect_with_session(
            &state,
            &user,
            "/",
            vec![Flash::success("You are now logged in!")],
        ),
        Err(AppError::Unauthorized(msg)) => {
            Ok(flash::redirect("/login", vec![Flash::error(msg)]))
        }
        Err(e) => Err(e),
    }
}

pub async fn register_form(req: HttpRequest) -> HttpResponse {
    flash::page(&req, json!({ "title": "Register" }))
}

pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegisterForm>,
) -> AppResult<HttpResponse> {
    log::info!("📝 POST /register - email: {}", form.email);

    match auth_service::register(state.users.as_ref(), &form, state.config.bcrypt_cost).await {
        Ok(user) => redirect_with_session(
            &state,
            &user,
            "/",
            vec![Flash::success("You are now logged in!")],
        ),
        Err(e) => flash_back(e, "/register"),
    }
}

pub async fn logout() -> HttpResponse {
    let mut res = flash::redirect("/", vec![Flash::success("You are now logged out!")]);
    let cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    if let Err(e) = res.add_removal_cookie(&cookie) {
        log::error!("❌ Failed to clear session cookie: {}", e);
    }
    res
}

pub async fn account(req: HttpRequest, user: CurrentUser) -> HttpResponse {
    flash::page(
        &req,
        json!({ "title": "Edit Your Account", "user": UserView::from(&user.0) }),
    )
}

pub async fn update_account(
    state: web::Data<AppState>,
    user: CurrentUser,
    form: web::Form<AccountForm>,
) -> AppResult<HttpResponse> {
    match user_service::update_account(state.users.as_ref(), &user.0, &form).await {
        Ok(_) => Ok(flash::redirect(
            "/account",
            vec![Flash::success("Updated the profile!")],
        )),
        Err(e) => flash_back(e, "/account"),
    }
}

pub async fn forgot(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<ForgotForm>,
) -> AppResult<HttpResponse> {
    log::info!("🔑 POST /account/forgot - email: {}", form.email);

    let result = password_reset_service::request_reset(
        state.users.as_ref(),
        state.mailer.as_ref(),
        &form.email,
        &base_url(&req, &state.config),
        Utc::now(),
    )
    .await;

    match result {
        Ok(()) => Ok(flash::redirect(
            "/login",
            vec![Flash::success("You have been emailed a password reset link.")],
        )),
        Err(AppError::NotFound(_)) => {
            Ok(flash::redirect("/login", vec![Flash::error(NO_ACCOUNT)]))
        }
        Err(e) => Err(e),
    }
}

fn invalid_reset() -> HttpResponse {
    flash::redirect(
        "/login",
        vec![Flash::error(AppError::InvalidOrExpiredToken.to_string())],
    )
}

pub async fn reset_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    match password_reset_service::find_pending(state.users.as_ref(), &path, Utc::now()).await {
        Ok(_) => Ok(flash::page(&req, json!({ "title": "Reset your password" }))),
        Err(AppError::InvalidOrExpiredToken) => Ok(invalid_reset()),
        Err(e) => Err(e),
    }
}

pub async fn reset(
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<ResetForm>,
) -> AppResult<HttpResponse> {
    let token = path.into_inner();

    let result = password_reset_service::complete_reset(
        state.users.as_ref(),
        &token,
        &form.password,
        &form.password_confirm,
        state.config.bcrypt_cost,
        Utc::now(),
    )
    .await;

    match result {
        Ok(user) => redirect_with_session(
            &state,
            &user,
            "/",
            vec![Flash::success("💃 Nice! Your password has been reset! You are now logged in!")],
        ),
        Err(AppError::InvalidOrExpiredToken) => Ok(invalid_reset()),
        Err(e) => flash_back(e, &format!("/account/reset/{}", token)),
    }
}
