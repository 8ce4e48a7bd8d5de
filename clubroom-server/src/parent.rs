use std::collections::HashMap;

use clubroom_api::{ClubId, CommentId, GigId, ParentId, PostId, UserId, Uuid};

use crate::{store::Store, Error};

/// The three parent kinds a comment can attach to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParentKind {
    Comment,
    Post,
    Gig,
}

/// Maps path-parameter discriminators to parent kinds.
///
/// Priority is the array order and is part of the contract: reply routes put
/// the target comment id innermost, so when a nested path carries several
/// ancestor ids the `commentId` discriminator is the most specific parent
/// and always wins over `postId` and `gigId`.
pub struct ParentRegistry {
    keys: [(&'static str, ParentKind); 3],
}

impl ParentRegistry {
    pub fn new() -> ParentRegistry {
        ParentRegistry {
            keys: [
                ("commentId", ParentKind::Comment),
                ("postId", ParentKind::Post),
                ("gigId", ParentKind::Gig),
            ],
        }
    }

    /// The single discriminator present in `params`, by priority. Absence is
    /// a routing defect, not a client error.
    pub fn discriminator<'a>(
        &self,
        params: &'a HashMap<String, String>,
    ) -> Result<(ParentKind, &'a str), Error> {
        for (key, kind) in &self.keys {
            if let Some(raw) = params.get(*key) {
                return Ok((*kind, raw));
            }
        }
        Err(Error::Api(clubroom_api::Error::NoParentDiscriminator))
    }
}

impl Default for ParentRegistry {
    fn default() -> Self {
        ParentRegistry::new()
    }
}

/// Uniform capability view over the three parent kinds. `excerpt` is the
/// text a notification links back to; `accepted_applicants` only exists for
/// gigs.
#[derive(Clone, Debug)]
pub struct Parent {
    pub id: ParentId,
    pub owner: UserId,
    pub comments: Vec<CommentId>,
    pub accepted_applicants: Option<Vec<UserId>>,
    pub excerpt: String,
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw).map_err(|_| Error::malformed_id(raw))
}

/// Shared resolution routine: pick the discriminator, parse the id, load
/// the record. Used identically by list, create, edit and delete.
pub async fn resolve(
    registry: &ParentRegistry,
    store: &Store,
    params: &HashMap<String, String>,
) -> Result<Parent, Error> {
    let (kind, raw) = registry.discriminator(params)?;
    let id = parse_id(raw)?;
    match kind {
        ParentKind::Post => {
            let post = store.post(PostId(id)).await.ok_or_else(Error::not_found)?;
            Ok(Parent {
                id: ParentId::Post(post.id),
                owner: post.created_by,
                comments: post.comments,
                accepted_applicants: None,
                excerpt: post.content,
            })
        }
        ParentKind::Gig => {
            let gig = store.gig(GigId(id)).await.ok_or_else(Error::not_found)?;
            Ok(Parent {
                id: ParentId::Gig(gig.id),
                owner: gig.created_by,
                comments: gig.comments,
                accepted_applicants: Some(gig.accepted_applicants),
                excerpt: gig.title,
            })
        }
        ParentKind::Comment => {
            let comment = store
                .comment(CommentId(id))
                .await
                .ok_or_else(Error::not_found)?;
            Ok(Parent {
                id: ParentId::Comment(comment.id),
                owner: comment.created_by,
                comments: comment.comments,
                accepted_applicants: None,
                excerpt: comment.content,
            })
        }
    }
}

/// Path context relevant to authorization: the enclosing club, if the path
/// carries one, and whether the request targets a reply (i.e. has a comment
/// ancestor).
#[derive(Clone, Copy, Debug, Default)]
pub struct PathContext {
    pub club: Option<ClubId>,
    pub is_reply: bool,
}

impl PathContext {
    pub fn from_params(params: &HashMap<String, String>) -> Result<PathContext, Error> {
        let club = match params.get("clubId") {
            Some(raw) => Some(ClubId(parse_id(raw)?)),
            None => None,
        };
        Ok(PathContext {
            club,
            is_reply: params.contains_key("commentId"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (String::from(*k), String::from(*v)))
            .collect()
    }

    #[test]
    fn comment_discriminator_wins_over_post_and_gig() {
        let registry = ParentRegistry::new();
        let uuid = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let (kind, _) =
            registry.discriminator(&params(&[("commentId", uuid), ("postId", uuid)])).unwrap();
        assert_eq!(kind, ParentKind::Comment);
        let (kind, _) = registry
            .discriminator(&params(&[("gigId", uuid), ("commentId", uuid)]))
            .unwrap();
        assert_eq!(kind, ParentKind::Comment);
        let (kind, _) = registry
            .discriminator(&params(&[("postId", uuid), ("clubId", uuid)]))
            .unwrap();
        assert_eq!(kind, ParentKind::Post);
    }

    #[test]
    fn missing_discriminator_is_a_routing_error() {
        let registry = ParentRegistry::new();
        match registry.discriminator(&params(&[("clubId", "whatever")])) {
            Err(Error::Api(clubroom_api::Error::NoParentDiscriminator)) => (),
            other => panic!("expected NoParentDiscriminator, got {other:?}"),
        }
    }

    #[test]
    fn path_context_reads_club_and_reply_markers() {
        let uuid = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let ctx = PathContext::from_params(&params(&[("clubId", uuid), ("commentId", uuid)]))
            .unwrap();
        assert!(ctx.club.is_some());
        assert!(ctx.is_reply);

        let ctx = PathContext::from_params(&params(&[("postId", uuid)])).unwrap();
        assert!(ctx.club.is_none());
        assert!(!ctx.is_reply);

        assert!(PathContext::from_params(&params(&[("clubId", "nope")])).is_err());
    }
}
