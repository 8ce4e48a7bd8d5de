use std::{collections::HashMap, sync::Arc};

use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use clubroom_api::{Comment, CommentId, CommentPatch, NewComment};

use crate::{
    extractors::{AppState, Auth},
    lifecycle, parent,
    parent::ParentRegistry,
    store::Store,
    Error,
};

/// The comment surface of one parent. Built once and nested under every
/// parent mount (`/api/posts/:postId/comments`, `/api/gigs/:gigId/comments`,
/// club-scoped posts, and the reply mounts) so that resolution and policy
/// live in exactly one place.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).patch(edit).delete(remove))
}

/// Root mount at `/api/comments`: direct fetch of any comment (orphaned
/// replies included) plus the canonical reply surface for arbitrary depth.
pub fn root_router() -> Router<AppState> {
    Router::new()
        .route("/:commentId", get(get_one))
        .nest("/:commentId/reply", router())
}

/// The comment the request targets: the innermost `:id`, or the bare
/// `:commentId` on the direct-fetch route. Absence of both means the handler
/// is mounted on a path shape it was never meant for.
fn target(params: &HashMap<String, String>) -> Result<CommentId, Error> {
    let raw = params
        .get("id")
        .or_else(|| params.get("commentId"))
        .ok_or_else(|| Error::Anyhow(anyhow!("comment route without a comment id parameter")))?;
    Ok(CommentId(parent::parse_id(raw)?))
}

async fn list(
    State(store): State<Arc<Store>>,
    State(registry): State<Arc<ParentRegistry>>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Json<Vec<CommentId>>, Error> {
    let parent = parent::resolve(&registry, &store, &params).await?;
    Ok(Json(parent.comments))
}

async fn get_one(
    State(store): State<Arc<Store>>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Json<Comment>, Error> {
    let id = target(&params)?;
    Ok(Json(store.comment(id).await.ok_or_else(Error::not_found)?))
}

async fn create(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    State(registry): State<Arc<ParentRegistry>>,
    Path(params): Path<HashMap<String, String>>,
    Json(data): Json<NewComment>,
) -> Result<Json<Vec<CommentId>>, Error> {
    Ok(Json(
        lifecycle::create(&store, &registry, &params, actor, data).await?,
    ))
}

async fn edit(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    State(registry): State<Arc<ParentRegistry>>,
    Path(params): Path<HashMap<String, String>>,
    Json(patch): Json<CommentPatch>,
) -> Result<Json<Comment>, Error> {
    let id = target(&params)?;
    Ok(Json(
        lifecycle::edit(&store, &registry, &params, actor, id, patch).await?,
    ))
}

async fn remove(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    State(registry): State<Arc<ParentRegistry>>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Json<CommentId>, Error> {
    let id = target(&params)?;
    Ok(Json(
        lifecycle::delete(&store, &registry, &params, actor, id).await?,
    ))
}
