use uuid::Uuid;

use crate::{Time, UserId};

/// What happened, from the recipient's point of view. Comment actions
/// distinguish top-level comments from replies.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum NotifAction {
    PostComment,
    CommentReply,
    PostCommentEdit,
    CommentReplyEdit,
    ClubRequestSent,
    ClubFollowed,
    ClubMemberAccepted,
    GigApplicantAccepted,
}

/// A rendered fragment of the notification text, with the id of the record
/// it refers to so a client can link it.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NotifLink {
    pub content: String,
    pub id: Uuid,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Notification {
    pub action: NotifAction,
    pub links: Vec<NotifLink>,
    pub from: UserId,
    pub to: UserId,
    pub sent_at: Time,
}
