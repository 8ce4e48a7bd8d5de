use uuid::Uuid;

use crate::{validate_nonempty, ClubId, CommentId, Error, Time, UserId, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn stub() -> PostId {
        PostId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Post {
    pub id: PostId,
    pub content: String,

    pub created_by: UserId,
    /// Club the post was published in, if any.
    pub created_in: Option<ClubId>,

    /// Top-level comments, in creation order.
    pub comments: Vec<CommentId>,

    pub created_at: Time,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewPost {
    pub content: String,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), Error> {
        validate_nonempty("content", &self.content)
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct PostPatch {
    pub content: Option<String>,
}

impl PostPatch {
    pub fn validate(&self) -> Result<(), Error> {
        match &self.content {
            Some(content) => validate_nonempty("content", content),
            None => Ok(()),
        }
    }
}
