use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::parse_object_id;
use crate::middleware::CurrentUser;
use crate::models::{StoreSummaryView, StoreView, UserView};
use crate::services::{store_service, user_service};
use crate::state::AppState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free text matched against name and description
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

fn required_coordinate(raw: Option<&str>, name: &str) -> AppResult<f64> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidRequest(format!("Missing '{}' query parameter", name)))?
        .parse::<f64>()
        .map_err(|_| AppError::InvalidRequest(format!("'{}' must be a number", name)))
}

#[utoipa::path(
    get,
    path = "/api/search",
    tag = "Stores",
    params(SearchQuery),
    responses(
        (status = 200, description = "Up to 5 stores, best match first", body = [StoreView])
    )
)]
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let q = query.q.as_deref().unwrap_or_default();
    log::info!("🔍 GET /api/search - q: '{}'", q);

    let stores = store_service::search(state.stores.as_ref(), q).await?;
    let views: Vec<StoreView> = stores.iter().map(StoreView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

#[utoipa::path(
    get,
    path = "/api/stores/near",
    tag = "Stores",
    params(NearQuery),
    responses(
        (status = 200, description = "Up to 10 stores within 10 km, nearest first", body = [StoreSummaryView]),
        (status = 400, description = "Missing or invalid coordinates")
    )
)]
pub async fn near(
    state: web::Data<AppState>,
    query: web::Query<NearQuery>,
) -> AppResult<HttpResponse> {
    let lng = required_coordinate(query.lng.as_deref(), "lng")?;
    let lat = required_coordinate(query.lat.as_deref(), "lat")?;
    log::info!("📍 GET /api/stores/near - lng: {}, lat: {}", lng, lat);

    let stores = store_service::near(state.stores.as_ref(), lng, lat).await?;
    let views: Vec<StoreSummaryView> = stores.into_iter().map(StoreSummaryView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

#[utoipa::path(
    post,
    path = "/api/stores/{id}/heart",
    tag = "Stores",
    params(("id" = String, Path, description = "Store id")),
    responses(
        (status = 200, description = "The user with the updated hearts", body = UserView),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Unknown store")
    ),
    security(("session" = []))
)]
pub async fn heart(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let store_id = parse_object_id(&path)?;
    let updated = user_service::toggle_heart(
        state.users.as_ref(),
        state.stores.as_ref(),
        &user.0,
        &store_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(UserView::from(&updated)))
}

#[cfg(test)]
mod tests {
    use crate::database::StoreRepository;
    use crate::testing::{session_cookie, store_at, store_fixture, TestContext};
    use actix_web::{http::StatusCode, test};

    #[actix_web::test]
    async fn test_search_endpoint() {
        let ctx = TestContext::new();
        let (user, _) = ctx.login_as("wes@example.com").await;
        ctx.db
            .insert_store(store_fixture("Coffee Corner", user.id.unwrap(), &[]))
            .await
            .unwrap();
        let app = test::init_service(ctx.app()).await;

        for uri in ["/api/search", "/api/search?q=", "/api/search?q=%20"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body, serde_json::json!([]), "{}", uri);
        }

        let req = test::TestRequest::get().uri("/api/search?q=coffee").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["name"], "Coffee Corner");
    }

    #[actix_web::test]
    async fn test_near_endpoint() {
        let ctx = TestContext::new();
        let (user, _) = ctx.login_as("wes@example.com").await;
        let id = user.id.unwrap();
        ctx.db.insert_store(store_at("Near", id, 0.01, 0.0)).await.unwrap();
        ctx.db.insert_store(store_at("Far", id, 1.0, 0.0)).await.unwrap();
        let app = test::init_service(ctx.app()).await;

        let req = test::TestRequest::get()
            .uri("/api/stores/near?lat=0&lng=0")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Near"]);
        assert!(body[0].get("tags").is_none());

        for uri in [
            "/api/stores/near",
            "/api/stores/near?lat=0",
            "/api/stores/near?lat=abc&lng=0",
            "/api/stores/near?lat=95&lng=0",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_heart_toggle_endpoint() {
        let ctx = TestContext::new();
        let (user, token) = ctx.login_as("wes@example.com").await;
        let store = ctx
            .db
            .insert_store(store_fixture("Deli", user.id.unwrap(), &[]))
            .await
            .unwrap();
        let uri = format!("/api/stores/{}/heart", store.id.unwrap().to_hex());
        let app = test::init_service(ctx.app()).await;

        let req = test::TestRequest::post().uri(&uri).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri(&uri)
            .cookie(session_cookie(&token))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["hearts"], serde_json::json!([store.id.unwrap().to_hex()]));

        // The middleware reloads the user, so the second call sees the heart
        let req = test::TestRequest::post()
            .uri(&uri)
            .cookie(session_cookie(&token))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["hearts"], serde_json::json!([]));
        assert!(body.get("password_hash").is_none());
    }
}
