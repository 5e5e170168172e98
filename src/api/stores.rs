use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures::TryStreamExt;
use serde_json::json;

use super::{flash_back, parse_object_id};
use crate::middleware::CurrentUser;
use crate::models::{
    RankedStoreView, ReviewView, Store, StoreDetailView, StoreForm, StoreView, UserView,
};
use crate::services::store_service::{self, PageResult, Populate};
use crate::services::upload_service::{discard_photo, photo_extension, resize_and_store};
use crate::state::AppState;
use crate::utils::flash::{self, Flash};
use crate::utils::{AppError, AppResult};

fn views(stores: &[Store]) -> Vec<StoreView> {
    stores.iter().map(StoreView::from).collect()
}

fn text(bytes: Vec<u8>) -> AppResult<String> {
    String::from_utf8(bytes)
        .map_err(|_| AppError::InvalidRequest("Form fields must be UTF-8".to_string()))
}

fn coordinate(raw: &str) -> AppResult<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| AppError::Validation("Coordinates must be numbers".to_string()))
}

/// Store form fields plus the raw photo part, if one was sent
struct StoreUpload {
    form: StoreForm,
    photo: Option<(Vec<u8>, String)>,
}

/// Reads the store form out of a multipart body. A non-empty `photo` part
/// is type-checked here but only written to disk by `save_store`.
async fn read_store_form(mut payload: Multipart) -> AppResult<StoreUpload> {
    let mut form = StoreForm::default();
    let mut photo: Option<(Vec<u8>, String)> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|m| m.essence_str().to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::InvalidRequest(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            // Browsers send an empty part when no file was picked
            "photo" if bytes.is_empty() => {}
            "photo" => {
                let extension = photo_extension(content_type.as_deref().unwrap_or_default())?;
                photo = Some((bytes, extension));
            }
            "name" => form.name = text(bytes)?,
            "description" => form.description = text(bytes)?,
            "tags" | "tags[]" => form.tags.push(text(bytes)?),
            "address" | "location[address]" => form.address = text(bytes)?,
            "lng" | "location[coordinates][0]" => form.lng = coordinate(&text(bytes)?)?,
            "lat" | "location[coordinates][1]" => form.lat = coordinate(&text(bytes)?)?,
            other => log::debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(StoreUpload { form, photo })
}

/// Validates the fields, then resizes and writes the photo and hands the
/// completed form to `save`. The photo is removed again if `save` fails.
async fn save_store<F, Fut>(upload: StoreUpload, upload_dir: &str, save: F) -> AppResult<Store>
where
    F: FnOnce(StoreForm) -> Fut,
    Fut: std::future::Future<Output = AppResult<Store>>,
{
    let StoreUpload { mut form, photo } = upload;
    store_service::check_form(&form)?;

    let stored = match photo {
        Some((bytes, extension)) => Some(resize_and_store(bytes, extension, upload_dir).await?),
        None => None,
    };
    if stored.is_some() {
        form.photo = stored.clone();
    }

    let result = save(form).await;
    if let (Err(_), Some(file_name)) = (&result, &stored) {
        discard_photo(upload_dir, file_name);
    }
    result
}

async fn render_page(req: &HttpRequest, state: &AppState, page: u64) -> AppResult<HttpResponse> {
    match store_service::list_page(state.stores.as_ref(), page).await? {
        PageResult::Page(p) => Ok(flash::page(
            req,
            json!({
                "title": "Stores",
                "stores": views(&p.stores),
                "page": p.page,
                "pages": p.pages,
                "count": p.count,
            }),
        )),
        PageResult::Redirect { requested, last } => Ok(flash::redirect(
            &format!("/stores/page/{}", last),
            vec![Flash::info(store_service::missing_page_notice(requested, last))],
        )),
    }
}

pub async fn index(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    render_page(&req, &state, 1).await
}

pub async fn list_page(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let page = store_service::parse_page(Some(path.as_str()));
    render_page(&req, &state, page).await
}

pub async fn add_form(req: HttpRequest, _user: CurrentUser) -> HttpResponse {
    flash::page(&req, json!({ "title": "Add Store" }))
}

pub async fn create(
    state: web::Data<AppState>,
    user: CurrentUser,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    log::info!("🏪 POST /add - {}", user.0.email);

    let upload = match read_store_form(payload).await {
        Ok(upload) => upload,
        Err(e) => return flash_back(e, "/add"),
    };

    let upload_dir = state.config.upload_dir.clone();
    let saved = save_store(upload, &upload_dir, move |form| async move {
        store_service::create_store(state.stores.as_ref(), &user.0, &form, Utc::now()).await
    })
    .await;

    match saved {
        Ok(store) => Ok(flash::redirect(
            &format!("/store/{}", store.slug),
            vec![Flash::success(format!(
                "Successfully created {}. Care to leave a review?",
                store.name
            ))],
        )),
        Err(e) => flash_back(e, "/add"),
    }
}

pub async fn edit_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_object_id(&path)?;
    let store = store_service::find_editable(state.stores.as_ref(), &id, &user.0).await?;

    Ok(flash::page(
        &req,
        json!({
            "title": format!("Edit {}", store.name),
            "store": StoreView::from(&store),
        }),
    ))
}

pub async fn update(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let id = parse_object_id(&path)?;
    let edit_url = format!("/stores/{}/edit", id);
    log::info!("✏️  POST /add/{} - {}", id, user.0.email);

    // Ownership first, so strangers can't push files into the upload dir
    store_service::find_editable(state.stores.as_ref(), &id, &user.0).await?;

    let upload = match read_store_form(payload).await {
        Ok(upload) => upload,
        Err(e) => return flash_back(e, &edit_url),
    };

    let upload_dir = state.config.upload_dir.clone();
    let saved = save_store(upload, &upload_dir, move |form| async move {
        store_service::update_store(state.stores.as_ref(), &id, &user.0, &form).await
    })
    .await;

    match saved {
        Ok(store) => Ok(flash::redirect(
            &edit_url,
            vec![Flash::success(format!("Successfully updated {}.", store.name))],
        )),
        Err(e) => flash_back(e, &edit_url),
    }
}

pub async fn show(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let details = store_service::get_by_slug(
        state.stores.as_ref(),
        state.users.as_ref(),
        state.reviews.as_ref(),
        &path,
        Populate::all(),
    )
    .await?;

    let title = details.store.name.clone();
    let view = StoreDetailView {
        store: StoreView::from(&details.store),
        author_profile: details.author.as_ref().map(UserView::from),
        reviews: details
            .reviews
            .map(|reviews| reviews.iter().map(ReviewView::from).collect()),
    };

    Ok(flash::page(&req, json!({ "title": title, "store": view })))
}

pub async fn tags(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let tag = req.match_info().get("tag").map(str::to_string);
    let page = store_service::by_tag(state.stores.as_ref(), tag.as_deref()).await?;

    Ok(flash::page(
        &req,
        json!({
            "title": "Tags",
            "tag": page.tag,
            "tags": page.tags,
            "stores": views(&page.stores),
        }),
    ))
}

pub async fn top(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let ranked: Vec<RankedStoreView> = store_service::top(state.stores.as_ref())
        .await?
        .into_iter()
        .map(RankedStoreView::from)
        .collect();

    Ok(flash::page(&req, json!({ "title": "⭐ Top Stores!", "stores": ranked })))
}

pub async fn hearts(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
) -> AppResult<HttpResponse> {
    let stores = store_service::hearted(state.stores.as_ref(), &user.0).await?;
    Ok(flash::page(&req, json!({ "title": "Hearted Stores", "stores": views(&stores) })))
}
