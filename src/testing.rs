//! Fixtures shared by the unit and handler tests

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    cookie::Cookie,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error,
};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

use crate::config::AppConfig;
use crate::database::memory::MemoryDatabase;
use crate::database::UserRepository;
use crate::middleware::{SecurityHeaders, SessionMiddleware, SESSION_COOKIE};
use crate::models::{Location, Store, StoreForm, User};
use crate::services::mail_service::RecordingMailer;
use crate::services::slug_service::slugify;
use crate::state::AppState;
use crate::utils::flash::{self, Flash};

pub const TEST_PASSWORD: &str = "password";

pub fn user_fixture(email: &str) -> User {
    User {
        id: None,
        email: email.to_string(),
        name: "Wes".to_string(),
        password_hash: String::new(),
        reset_password_token: None,
        reset_password_expires: None,
        hearts: Vec::new(),
    }
}

pub fn store_at(name: &str, author: ObjectId, lng: f64, lat: f64) -> Store {
    Store {
        id: None,
        name: name.to_string(),
        slug: slugify(name),
        description: String::new(),
        tags: Vec::new(),
        created: BsonDateTime::now(),
        location: Location::point(lng, lat, "123 Main St"),
        photo: None,
        author,
    }
}

pub fn store_fixture(name: &str, author: ObjectId, tags: &[&str]) -> Store {
    let mut store = store_at(name, author, -79.3832, 43.6532);
    store.tags = tags.iter().map(|t| t.to_string()).collect();
    store
}

pub fn store_form(name: &str) -> StoreForm {
    StoreForm {
        name: name.to_string(),
        description: String::new(),
        tags: Vec::new(),
        address: "123 Main St".to_string(),
        lng: Some(-79.3832),
        lat: Some(43.6532),
        photo: None,
    }
}

pub fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::new(SESSION_COOKIE, token.to_string())
}

/// Flash messages a response left for the next page
pub fn flashes_of<B>(res: &ServiceResponse<B>) -> Vec<Flash> {
    res.response()
        .cookies()
        .find(|c| c.name() == flash::FLASH_COOKIE)
        .map(|c| flash::decode(c.value()))
        .unwrap_or_default()
}

pub struct TestContext {
    pub db: Arc<MemoryDatabase>,
    pub mailer: Arc<RecordingMailer>,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        let db = Arc::new(MemoryDatabase::new());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::in_memory(db.clone(), mailer.clone(), AppConfig::for_tests());
        TestContext { db, mailer, state }
    }

    pub fn data(&self) -> web::Data<AppState> {
        web::Data::new(self.state.clone())
    }

    /// Registers a user whose password is `TEST_PASSWORD` and opens a session
    pub async fn login_as(&self, email: &str) -> (User, String) {
        let mut user = user_fixture(email);
        user.password_hash = bcrypt::hash(TEST_PASSWORD, 4).unwrap();
        let user = self.db.insert_user(user).await.unwrap();
        let token = self.state.sessions.issue_session(&user).unwrap();
        (user, token)
    }

    /// The full router against the in-memory backend
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.data())
            .wrap(SessionMiddleware)
            .wrap(SecurityHeaders)
            .configure(crate::api::configure)
    }
}
