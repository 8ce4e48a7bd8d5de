use uuid::Uuid;

use crate::{validate_nonempty, CommentId, Error, Time, UserId, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct GigId(pub Uuid);

impl GigId {
    pub fn stub() -> GigId {
        GigId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Gig {
    pub id: GigId,
    pub title: String,
    pub description: String,

    pub created_by: UserId,

    /// Users who asked to review the gig.
    pub applicants: Vec<UserId>,
    /// Users cleared to review the gig; comments on a gig are reviews and
    /// are restricted to the creator and this set.
    pub accepted_applicants: Vec<UserId>,

    /// Reviews, in creation order.
    pub comments: Vec<CommentId>,

    pub created_at: Time,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewGig {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl NewGig {
    pub fn validate(&self) -> Result<(), Error> {
        validate_nonempty("title", &self.title)?;
        crate::validate_string(&self.description)
    }
}
