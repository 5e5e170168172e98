use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    http::header,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::models::User;
use crate::state::AppState;
use crate::utils::flash::{self, Flash};
use crate::utils::AppError;

pub const SESSION_COOKIE: &str = "session";

/// The logged-in user, attached to the request by `SessionMiddleware`.
///
/// As an extractor it rejects anonymous requests: JSON routes get a 401,
/// pages redirect to the login form with a flash message.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<CurrentUser>() {
            return ready(Ok(user.clone()));
        }

        let err = AppError::LoginRequired;
        if req.path().starts_with("/api") {
            return ready(Err(err.into()));
        }

        let response = flash::redirect("/login", vec![Flash::error(err.to_string())]);
        ready(Err(InternalError::from_response(err, response).into()))
    }
}

/// Cookie first, then `Authorization: Bearer <token>`
fn session_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Resolves the session token into a `CurrentUser`. Never rejects.
pub struct SessionMiddleware;

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let token = session_token(&req);
            let state = req.app_data::<web::Data<AppState>>().cloned();

            if let (Some(token), Some(state)) = (token, state) {
                match state.sessions.resolve_session(&token).await {
                    Ok(Some(user)) => {
                        req.extensions_mut().insert(CurrentUser(user));
                    }
                    Ok(None) => log::debug!("🔒 Session token did not resolve to a user"),
                    Err(e) => log::error!("❌ Session lookup failed: {}", e),
                }
            }

            service.call(req).await
        })
    }
}
