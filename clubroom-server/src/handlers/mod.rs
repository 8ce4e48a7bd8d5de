pub mod clubs;
pub mod comments;
pub mod gigs;
pub mod posts;
pub mod users;
