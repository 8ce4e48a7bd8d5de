use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

mod auth;
mod club;
mod comment;
mod error;
mod gig;
mod notification;
mod post;
mod user;

pub use auth::{AuthToken, NewSession, SessionInfo};
pub use club::{Club, ClubId, ClubPatch, NewClub};
pub use comment::{Comment, CommentId, CommentPatch, NewComment, ParentId};
pub use error::Error;
pub use gig::{Gig, GigId, NewGig};
pub use notification::{NotifAction, NotifLink, Notification};
pub use post::{NewPost, Post, PostId, PostPatch};
pub use user::{NewUser, PasswordConfirm, PasswordReset, User, UserClubs, UserId, UserPatch};

pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::Validation(String::from(
            "null byte in string is not allowed",
        )));
    }
    Ok(())
}

fn validate_nonempty(field: &str, s: &str) -> Result<(), Error> {
    validate_string(s)?;
    if s.trim().is_empty() {
        return Err(Error::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
