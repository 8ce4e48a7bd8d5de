//! Comment lifecycle orchestration: create, edit and delete are sequences of
//! independent per-collection writes (comment, author, parent, recipient).
//! Every lookup and policy check happens before the first write; once writes
//! begin there is no rollback. A write that finds its target gone mid-flight
//! leaves the applied prefix in place, logs it, and surfaces
//! `LifecycleIncomplete`, and `Store::reconcile` repairs the invariant later.

use std::collections::HashMap;

use chrono::Utc;
use clubroom_api::{
    Comment, CommentId, CommentPatch, NewComment, NotifAction, NotifLink, Notification, User,
    UserId, Uuid,
};

use crate::{
    parent::{self, Parent, ParentRegistry, PathContext},
    policy,
    store::Store,
    Error,
};

fn comment_notification(
    action: NotifAction,
    actor: &User,
    comment_id: CommentId,
    comment_content: &str,
    parent: &Parent,
) -> Notification {
    Notification {
        action,
        links: vec![
            NotifLink {
                content: actor.username.clone(),
                id: actor.id.0,
            },
            NotifLink {
                content: String::from(comment_content),
                id: comment_id.0,
            },
            NotifLink {
                content: parent.excerpt.clone(),
                id: parent.id.uuid(),
            },
        ],
        from: actor.id,
        to: parent.owner,
        sent_at: Utc::now(),
    }
}

/// Create a comment on the parent the path resolves to. Returns the parent's
/// updated comment-id list.
pub async fn create(
    store: &Store,
    registry: &ParentRegistry,
    params: &HashMap<String, String>,
    actor: UserId,
    data: NewComment,
) -> Result<Vec<CommentId>, Error> {
    data.validate().map_err(Error::Api)?;
    let parent = parent::resolve(registry, store, params).await?;
    let ctx = PathContext::from_params(params)?;
    let user = store.user(actor).await.ok_or_else(Error::not_found)?;
    policy::authorize_create(&parent, &ctx, &user)?;

    let comment = Comment {
        id: CommentId(Uuid::new_v4()),
        content: data.content,
        created_by: actor,
        created_in: parent.id,
        comments: vec![],
        created_at: Utc::now(),
        edited_at: None,
    };
    let id = comment.id;
    let content = comment.content.clone();
    store.insert_comment(comment).await;

    if !store.push_user_comment(actor, id).await {
        tracing::error!(comment = ?id, author = ?actor, "author vanished mid-create");
        return Err(Error::lifecycle_incomplete());
    }
    if !store.parent_push_comment(parent.id, id).await {
        tracing::error!(comment = ?id, parent = ?parent.id, "parent vanished mid-create");
        return Err(Error::lifecycle_incomplete());
    }

    let action = if ctx.is_reply {
        NotifAction::CommentReply
    } else {
        NotifAction::PostComment
    };
    let notif = comment_notification(action, &user, id, &content, &parent);
    if !store.push_notification(notif).await {
        // the recipient is gone; nothing to repair, the comment stands
        tracing::warn!(recipient = ?parent.owner, "dropping notification, recipient gone");
    }

    store
        .parent_comments(parent.id)
        .await
        .ok_or_else(Error::lifecycle_incomplete)
}

/// Owner-only, content-only edit. Returns the post-update record.
pub async fn edit(
    store: &Store,
    registry: &ParentRegistry,
    params: &HashMap<String, String>,
    actor: UserId,
    id: CommentId,
    patch: CommentPatch,
) -> Result<Comment, Error> {
    patch.validate().map_err(Error::Api)?;
    let comment = store.comment(id).await.ok_or_else(Error::not_found)?;
    policy::authorize_edit(&comment, actor)?;
    // resolved again to locate the notification recipient
    let parent = parent::resolve(registry, store, params).await?;
    let ctx = PathContext::from_params(params)?;
    let user = store.user(actor).await.ok_or_else(Error::not_found)?;

    // an empty patch is a no-op and must not notify anyone
    let updated = match patch.content {
        Some(content) => store
            .set_comment_content(id, content, Utc::now())
            .await
            .ok_or_else(Error::lifecycle_incomplete)?,
        None => return Ok(comment),
    };

    let action = if ctx.is_reply {
        NotifAction::CommentReplyEdit
    } else {
        NotifAction::PostCommentEdit
    };
    let notif = comment_notification(action, &user, id, &updated.content, &parent);
    if !store.push_notification(notif).await {
        tracing::warn!(recipient = ?parent.owner, "dropping notification, recipient gone");
    }

    Ok(updated)
}

/// Deletes the comment and pulls its id from the author's and the parent's
/// lists. Children are neither removed nor re-parented; they stay
/// addressable by id. Returns the deleted id.
pub async fn delete(
    store: &Store,
    registry: &ParentRegistry,
    params: &HashMap<String, String>,
    actor: UserId,
    id: CommentId,
) -> Result<CommentId, Error> {
    let parent = parent::resolve(registry, store, params).await?;
    let comment = store.comment(id).await.ok_or_else(Error::not_found)?;
    let user = store.user(actor).await.ok_or_else(Error::not_found)?;
    let ctx = PathContext::from_params(params)?;
    policy::authorize_delete(&parent, &comment, &ctx, &user)?;

    if !store.pull_user_comment(comment.created_by, id).await {
        tracing::error!(comment = ?id, author = ?comment.created_by, "author vanished mid-delete");
        return Err(Error::lifecycle_incomplete());
    }
    if !store.parent_pull_comment(comment.created_in, id).await {
        tracing::error!(comment = ?id, parent = ?comment.created_in, "parent vanished mid-delete");
        return Err(Error::lifecycle_incomplete());
    }
    if store.remove_comment(id).await.is_none() {
        tracing::error!(comment = ?id, "comment vanished mid-delete");
        return Err(Error::lifecycle_incomplete());
    }
    Ok(id)
}
