use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request};
use clubroom_api::{AuthToken, UserId, Uuid};

use crate::{parent::ParentRegistry, store::Store, Error};

/// The `auth-token` header carrying the bearer session token.
pub const AUTH_HEADER: &str = "auth-token";

#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
    pub store: Arc<Store>,
    pub registry: Arc<ParentRegistry>,
}

impl AppState {
    pub fn new() -> AppState {
        AppState {
            store: Arc::new(Store::new()),
            registry: Arc::new(ParentRegistry::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new()
    }
}

/// Syntactically valid token taken from the `auth-token` header. Absence is
/// 401; a present but malformed value is 403.
pub struct PreAuth(pub AuthToken);

#[async_trait]
impl<S: Sync> FromRequestParts<S> for PreAuth {
    type Rejection = Error;

    async fn from_request_parts(req: &mut request::Parts, _state: &S) -> Result<PreAuth, Error> {
        match req.headers.get(AUTH_HEADER) {
            None => Err(Error::unauthenticated()),
            Some(token) => {
                let token = token.to_str().map_err(|_| Error::forbidden())?;
                let token = Uuid::try_from(token).map_err(|_| Error::forbidden())?;
                Ok(PreAuth(AuthToken(token)))
            }
        }
    }
}

/// Verified identity: the token must still be present in the revocable
/// session registry (logout removes it).
pub struct Auth(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = Error;

    async fn from_request_parts(req: &mut request::Parts, state: &AppState) -> Result<Auth, Error> {
        let token = PreAuth::from_request_parts(req, state).await?.0;
        match state.store.session_user(token).await {
            Some(user) => Ok(Auth(user)),
            None => Err(Error::forbidden()),
        }
    }
}
