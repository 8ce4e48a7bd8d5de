use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use clubroom_api::{
    Error as ApiError, NewSession, NewUser, PasswordConfirm, PasswordReset, SessionInfo, User,
    UserClubs, UserId, UserPatch,
};

use crate::{
    extractors::{AppState, Auth, PreAuth},
    parent::parse_id,
    store::Store,
    Error,
};

const BCRYPT_COST: u32 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/:userId", get(get_one).patch(edit).delete(remove))
        .route("/:userId/reset_password", patch(reset_password))
}

async fn list(State(store): State<Arc<Store>>) -> Json<Vec<User>> {
    Json(store.users().await)
}

async fn get_one(
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
) -> Result<Json<User>, Error> {
    let id = UserId(parse_id(&raw)?);
    Ok(Json(store.user(id).await.ok_or_else(Error::not_found)?))
}

async fn signup(
    State(store): State<Arc<Store>>,
    Json(data): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), Error> {
    data.validate()?;
    if store.email_taken(&data.email).await {
        return Err(Error::Api(ApiError::EmailAlreadyUsed(data.email)));
    }
    if store.username_taken(&data.username).await {
        return Err(Error::Api(ApiError::UsernameAlreadyUsed(data.username)));
    }
    let pass_hash = bcrypt::hash(&data.password, BCRYPT_COST).context("hashing password")?;
    let user = User {
        id: UserId(clubroom_api::Uuid::new_v4()),
        username: data.username,
        email: data.email,
        user_clubs: UserClubs::default(),
        comments: vec![],
        notifications: vec![],
    };
    store.insert_user(user.clone(), pass_hash).await;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(store): State<Arc<Store>>,
    Json(data): Json<NewSession>,
) -> Result<Json<SessionInfo>, Error> {
    data.validate()?;
    // unknown email and wrong password are indistinguishable on purpose
    let (user, pass_hash) = store
        .user_by_email(&data.email)
        .await
        .ok_or_else(Error::forbidden)?;
    if !bcrypt::verify(&data.password, &pass_hash).context("verifying password")? {
        return Err(Error::forbidden());
    }
    let token = store.create_session(user.id).await;
    Ok(Json(SessionInfo { token, user }))
}

async fn logout(PreAuth(token): PreAuth, State(store): State<Arc<Store>>) -> Result<(), Error> {
    match store.revoke_session(token).await {
        true => Ok(()),
        false => Err(Error::forbidden()),
    }
}

async fn edit(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, Error> {
    let id = UserId(parse_id(&raw)?);
    store.user(id).await.ok_or_else(Error::not_found)?;
    if actor != id {
        return Err(Error::forbidden());
    }
    patch.validate()?;
    Ok(Json(
        store.patch_user(id, patch).await.ok_or_else(Error::not_found)?,
    ))
}

async fn reset_password(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
    Json(data): Json<PasswordReset>,
) -> Result<(), Error> {
    let id = UserId(parse_id(&raw)?);
    let pass_hash = store.pass_hash(id).await.ok_or_else(Error::not_found)?;
    if actor != id {
        return Err(Error::forbidden());
    }
    if !bcrypt::verify(&data.password, &pass_hash).context("verifying password")? {
        return Err(Error::forbidden());
    }
    if data.new_password.trim().is_empty() {
        return Err(Error::Api(ApiError::Validation(String::from(
            "new_password must not be empty",
        ))));
    }
    let new_hash = bcrypt::hash(&data.new_password, BCRYPT_COST).context("hashing password")?;
    if !store.set_pass_hash(id, new_hash).await {
        return Err(Error::not_found());
    }
    Ok(())
}

async fn remove(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
    Json(data): Json<PasswordConfirm>,
) -> Result<(), Error> {
    let id = UserId(parse_id(&raw)?);
    let pass_hash = store.pass_hash(id).await.ok_or_else(Error::not_found)?;
    if actor != id {
        return Err(Error::forbidden());
    }
    if !bcrypt::verify(&data.password, &pass_hash).context("verifying password")? {
        return Err(Error::forbidden());
    }
    store.remove_user(id).await;
    Ok(())
}
