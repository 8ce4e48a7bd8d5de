use uuid::Uuid;

use crate::{validate_nonempty, Error, Time, UserId, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct ClubId(pub Uuid);

impl ClubId {
    pub fn stub() -> ClubId {
        ClubId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Club {
    pub id: ClubId,
    pub title: String,
    pub description: String,

    pub created_by: UserId,
    pub members: Vec<UserId>,
    pub pending_requests: Vec<UserId>,

    pub created_at: Time,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewClub {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl NewClub {
    pub fn validate(&self) -> Result<(), Error> {
        validate_nonempty("title", &self.title)?;
        crate::validate_string(&self.description)
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct ClubPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl ClubPatch {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(title) = &self.title {
            validate_nonempty("title", title)?;
        }
        if let Some(description) = &self.description {
            crate::validate_string(description)?;
        }
        Ok(())
    }
}
