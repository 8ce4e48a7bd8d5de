use std::{collections::HashMap, sync::Arc};

use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use clubroom_api::{ClubId, NewPost, Post, PostId, PostPatch, Uuid};

use crate::{
    extractors::{AppState, Auth},
    handlers::comments,
    parent::parse_id,
    store::Store,
    Error,
};

/// Mounted both at `/api/posts` (personal posts) and under
/// `/api/clubs/:clubId/posts` (club posts, members only).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/:postId", get(get_one).patch(edit).delete(remove))
        .nest("/:postId/comments", comments::router())
}

fn target(params: &HashMap<String, String>) -> Result<PostId, Error> {
    let raw = params
        .get("postId")
        .ok_or_else(|| Error::Anyhow(anyhow!("post route without a post id parameter")))?;
    Ok(PostId(parse_id(raw)?))
}

async fn get_one(
    State(store): State<Arc<Store>>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Json<Post>, Error> {
    let id = target(&params)?;
    Ok(Json(store.post(id).await.ok_or_else(Error::not_found)?))
}

async fn create(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(params): Path<HashMap<String, String>>,
    Json(data): Json<NewPost>,
) -> Result<Json<Post>, Error> {
    data.validate()?;
    let user = store.user(actor).await.ok_or_else(Error::not_found)?;
    let club = match params.get("clubId") {
        Some(raw) => {
            let id = ClubId(parse_id(raw)?);
            store.club(id).await.ok_or_else(Error::not_found)?;
            if !user.user_clubs.is_member_of(id) {
                return Err(Error::forbidden());
            }
            Some(id)
        }
        None => None,
    };
    let post = Post {
        id: PostId(Uuid::new_v4()),
        content: data.content,
        created_by: actor,
        created_in: club,
        comments: vec![],
        created_at: Utc::now(),
    };
    store.insert_post(post.clone()).await;
    Ok(Json(post))
}

async fn edit(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(params): Path<HashMap<String, String>>,
    Json(patch): Json<PostPatch>,
) -> Result<Json<Post>, Error> {
    patch.validate()?;
    let id = target(&params)?;
    let post = store.post(id).await.ok_or_else(Error::not_found)?;
    if post.created_by != actor {
        return Err(Error::forbidden());
    }
    let updated = store
        .update_post(id, |post| {
            if let Some(content) = patch.content {
                post.content = content;
            }
        })
        .await
        .ok_or_else(Error::not_found)?;
    Ok(Json(updated))
}

async fn remove(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Json<PostId>, Error> {
    let id = target(&params)?;
    let post = store.post(id).await.ok_or_else(Error::not_found)?;
    if post.created_by != actor {
        return Err(Error::forbidden());
    }
    // comments of the post stay addressable by id, same as comment deletion
    store.remove_post(id).await;
    Ok(Json(id))
}
