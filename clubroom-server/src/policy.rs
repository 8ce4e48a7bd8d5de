use clubroom_api::{Comment, ParentId, User, UserId};

use crate::{
    parent::{Parent, PathContext},
    Error,
};

/// Create rules, first match governs:
/// 1. top-level comment on a gig is a review: gig creator or accepted
///    applicant only;
/// 2. anything under a club context: club members (created or joined) only;
/// 3. otherwise any authenticated actor.
pub fn authorize_create(parent: &Parent, ctx: &PathContext, actor: &User) -> Result<(), Error> {
    if let (ParentId::Gig(_), false) = (parent.id, ctx.is_reply) {
        let accepted = parent
            .accepted_applicants
            .as_deref()
            .unwrap_or(&[])
            .contains(&actor.id);
        if parent.owner != actor.id && !accepted {
            return Err(Error::forbidden());
        }
        return Ok(());
    }
    if let Some(club) = ctx.club {
        if !actor.user_clubs.is_member_of(club) {
            return Err(Error::forbidden());
        }
    }
    Ok(())
}

/// Owner-only.
pub fn authorize_edit(comment: &Comment, actor: UserId) -> Result<(), Error> {
    if comment.created_by != actor {
        return Err(Error::forbidden());
    }
    Ok(())
}

/// The comment's author may always delete it. For non-gig parents the
/// creator of the enclosing club may too; gig reviews stay author-only no
/// matter who owns the gig. Callers must have loaded parent, comment and
/// actor already so that lookup failures surface as NotFound before any
/// Forbidden from here.
pub fn authorize_delete(
    parent: &Parent,
    comment: &Comment,
    ctx: &PathContext,
    actor: &User,
) -> Result<(), Error> {
    if comment.created_by == actor.id {
        return Ok(());
    }
    if matches!(parent.id, ParentId::Gig(_)) {
        return Err(Error::forbidden());
    }
    match ctx.club {
        Some(club) if actor.user_clubs.created_clubs.contains(&club) => Ok(()),
        _ => Err(Error::forbidden()),
    }
}
