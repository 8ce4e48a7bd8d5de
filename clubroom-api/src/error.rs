use anyhow::{anyhow, Context};
use serde_json::json;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Malformed identifier {0:?}")]
    MalformedId(String),

    #[error("Cannot be found")]
    NotFound,

    #[error("Permission denied")]
    Forbidden,

    #[error("Please login")]
    Unauthenticated,

    #[error("No parent discriminator in path parameters")]
    NoParentDiscriminator,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Email already used {0}")]
    EmailAlreadyUsed(String),

    #[error("Username already used {0}")]
    UsernameAlreadyUsed(String),

    #[error("Lifecycle sequence left partially applied")]
    LifecycleIncomplete,
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::MalformedId(_) => StatusCode::NOT_FOUND,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::NoParentDiscriminator => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::EmailAlreadyUsed(_) => StatusCode::CONFLICT,
            Error::UsernameAlreadyUsed(_) => StatusCode::CONFLICT,
            Error::LifecycleIncomplete => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::MalformedId(id) => json!({
                "message": "cannot be found",
                "type": "malformed-id",
                "id": id,
            }),
            Error::NotFound => json!({
                "message": "cannot be found",
                "type": "not-found",
            }),
            Error::Forbidden => json!({
                "message": "permission denied",
                "type": "forbidden",
            }),
            Error::Unauthenticated => json!({
                "message": "please login",
                "type": "unauthenticated",
            }),
            Error::NoParentDiscriminator => json!({
                "message": "no parent discriminator in path",
                "type": "no-parent-discriminator",
            }),
            Error::Validation(msg) => json!({
                "message": msg,
                "type": "validation",
            }),
            Error::EmailAlreadyUsed(email) => json!({
                "message": "email already used",
                "type": "conflict-email",
                "email": email,
            }),
            Error::UsernameAlreadyUsed(name) => json!({
                "message": "username already used",
                "type": "conflict-username",
                "username": name,
            }),
            Error::LifecycleIncomplete => json!({
                "message": "update sequence left partially applied, see server logs",
                "type": "lifecycle-incomplete",
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let get_str = |field: &str| -> anyhow::Result<String> {
            Ok(String::from(
                data.get(field)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| anyhow!("error body has no string field {field:?}"))?,
            ))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(get_str("message")?),
                "malformed-id" => Error::MalformedId(get_str("id")?),
                "not-found" => Error::NotFound,
                "forbidden" => Error::Forbidden,
                "unauthenticated" => Error::Unauthenticated,
                "no-parent-discriminator" => Error::NoParentDiscriminator,
                "validation" => Error::Validation(get_str("message")?),
                "conflict-email" => Error::EmailAlreadyUsed(get_str("email")?),
                "conflict-username" => Error::UsernameAlreadyUsed(get_str("username")?),
                "lifecycle-incomplete" => Error::LifecycleIncomplete,
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
