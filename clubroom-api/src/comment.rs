use uuid::Uuid;

use crate::{validate_nonempty, Error, GigId, PostId, Time, UserId, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn stub() -> CommentId {
        CommentId(STUB_UUID)
    }
}

/// The one parent a comment is attached to. Tagged so that parent-kind
/// dispatch is an enum match rather than a loop over object keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ParentId {
    Post(PostId),
    Gig(GigId),
    Comment(CommentId),
}

impl ParentId {
    /// The raw id, for contexts that only link back to the record.
    pub fn uuid(self) -> Uuid {
        match self {
            ParentId::Post(id) => id.0,
            ParentId::Gig(id) => id.0,
            ParentId::Comment(id) => id.0,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,

    /// Owner; never changes after creation.
    pub created_by: UserId,
    /// Parent; never changes after creation.
    pub created_in: ParentId,

    /// Replies, in creation order.
    pub comments: Vec<CommentId>,

    pub created_at: Time,
    pub edited_at: Option<Time>,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub content: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), Error> {
        validate_nonempty("content", &self.content)
    }
}

/// Only content-bearing fields are patchable; identity fields are not
/// expressible here at all.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct CommentPatch {
    pub content: Option<String>,
}

impl CommentPatch {
    pub fn validate(&self) -> Result<(), Error> {
        match &self.content {
            Some(content) => validate_nonempty("content", content),
            None => Ok(()),
        }
    }
}
