use actix_web::{http::header, web, HttpRequest, HttpResponse};
use chrono::Utc;

use super::{flash_back, parse_object_id};
use crate::middleware::CurrentUser;
use crate::models::ReviewForm;
use crate::services::review_service;
use crate::state::AppState;
use crate::utils::flash::{self, Flash};
use crate::utils::AppResult;

/// Where the form was posted from, same-site paths only
fn referer_path(req: &HttpRequest) -> String {
    req.headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<actix_web::http::Uri>().ok())
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| "/".to_string())
}

pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    form: web::Form<ReviewForm>,
) -> AppResult<HttpResponse> {
    let store_id = parse_object_id(&path)?;
    log::info!("⭐ POST /reviews/{} - {}", store_id, user.0.email);

    match review_service::add_review(
        state.stores.as_ref(),
        state.reviews.as_ref(),
        &user.0,
        &store_id,
        &form,
        Utc::now(),
    )
    .await
    {
        Ok((_, store)) => Ok(flash::redirect(
            &format!("/store/{}", store.slug),
            vec![Flash::success("Review Saved!")],
        )),
        Err(e) => flash_back(e, &referer_path(&req)),
    }
}
