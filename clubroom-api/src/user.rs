use uuid::Uuid;

use crate::{validate_nonempty, ClubId, CommentId, Error, Notification, STUB_UUID};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn stub() -> UserId {
        UserId(STUB_UUID)
    }
}

/// Club-membership markers, split by how the user relates to the club.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct UserClubs {
    pub created_clubs: Vec<ClubId>,
    pub joined_clubs: Vec<ClubId>,
    pub pending_requests: Vec<ClubId>,
}

impl UserClubs {
    /// Created or joined; the membership test used by the comment policy.
    pub fn is_member_of(&self, club: ClubId) -> bool {
        self.created_clubs.contains(&club) || self.joined_clubs.contains(&club)
    }
}

/// Wire shape of a user. The password hash never leaves the store.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,

    pub user_clubs: UserClubs,

    /// Authored comments, in creation order.
    pub comments: Vec<CommentId>,

    pub notifications: Vec<Notification>,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), Error> {
        validate_nonempty("username", &self.username)?;
        validate_nonempty("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(Error::Validation(String::from("malformed email")));
        }
        validate_nonempty("password", &self.password)
    }
}

/// Id and password are deliberately not representable here.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(username) = &self.username {
            validate_nonempty("username", username)?;
        }
        if let Some(email) = &self.email {
            validate_nonempty("email", email)?;
            if !email.contains('@') {
                return Err(Error::Validation(String::from("malformed email")));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct PasswordReset {
    pub password: String,
    pub new_password: String,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct PasswordConfirm {
    pub password: String,
}
