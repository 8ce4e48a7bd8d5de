use uuid::Uuid;

use crate::{validate_nonempty, Error, User, STUB_UUID};

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewSession {
    pub email: String,
    pub password: String,
}

impl NewSession {
    pub fn validate(&self) -> Result<(), Error> {
        validate_nonempty("email", &self.email)?;
        validate_nonempty("password", &self.password)
    }
}

/// Opaque session token; validity is decided by the server-side session
/// registry, which supports explicit revocation at logout time.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthToken(pub Uuid);

impl AuthToken {
    pub fn stub() -> AuthToken {
        AuthToken(STUB_UUID)
    }
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct SessionInfo {
    pub token: AuthToken,
    pub user: User,
}
