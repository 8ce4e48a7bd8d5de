use std::collections::{HashMap, HashSet};

use clubroom_api::{
    AuthToken, Club, ClubId, Comment, CommentId, Gig, GigId, Notification, ParentId, Post, PostId,
    Time, User, UserId, UserPatch, Uuid,
};
use tokio::sync::RwLock;

/// User record as persisted; the password hash stays out of the wire type.
#[derive(Debug)]
pub struct StoredUser {
    pub user: User,
    pub pass_hash: String,
}

/// Process-wide repository. One `RwLock` per collection: every exported
/// operation touches a single collection under a single lock acquisition, so
/// per-document mutations are atomic while unrelated requests never
/// serialize against each other. Nothing spans collections; the lifecycle
/// manager sequences its three writes without a transaction (see
/// `reconcile`).
#[derive(Default)]
pub struct Store {
    users: RwLock<HashMap<UserId, StoredUser>>,
    clubs: RwLock<HashMap<ClubId, Club>>,
    posts: RwLock<HashMap<PostId, Post>>,
    gigs: RwLock<HashMap<GigId, Gig>>,
    comments: RwLock<HashMap<CommentId, Comment>>,
    sessions: RwLock<HashMap<AuthToken, UserId>>,
}

fn push_unique<T: Copy + PartialEq>(list: &mut Vec<T>, item: T) {
    if !list.contains(&item) {
        list.push(item);
    }
}

fn pull<T: PartialEq>(list: &mut Vec<T>, item: &T) {
    list.retain(|x| x != item);
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReconcileReport {
    /// References re-inserted into an author or parent list.
    pub relinked: usize,
    /// Duplicate references dropped.
    pub deduped: usize,
    /// Comments whose parent no longer exists; left alone on purpose.
    pub orphaned: usize,
}

impl Store {
    pub fn new() -> Store {
        Store::default()
    }

    // --- users ---

    pub async fn insert_user(&self, user: User, pass_hash: String) {
        self.users
            .write()
            .await
            .insert(user.id, StoredUser { user, pass_hash });
    }

    pub async fn user(&self, id: UserId) -> Option<User> {
        self.users.read().await.get(&id).map(|u| u.user.clone())
    }

    pub async fn users(&self) -> Vec<User> {
        self.users
            .read()
            .await
            .values()
            .map(|u| u.user.clone())
            .collect()
    }

    pub async fn user_by_email(&self, email: &str) -> Option<(User, String)> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.user.email == email)
            .map(|u| (u.user.clone(), u.pass_hash.clone()))
    }

    pub async fn email_taken(&self, email: &str) -> bool {
        self.users
            .read()
            .await
            .values()
            .any(|u| u.user.email == email)
    }

    pub async fn username_taken(&self, username: &str) -> bool {
        self.users
            .read()
            .await
            .values()
            .any(|u| u.user.username == username)
    }

    pub async fn pass_hash(&self, id: UserId) -> Option<String> {
        self.users.read().await.get(&id).map(|u| u.pass_hash.clone())
    }

    pub async fn set_pass_hash(&self, id: UserId, pass_hash: String) -> bool {
        match self.users.write().await.get_mut(&id) {
            Some(u) => {
                u.pass_hash = pass_hash;
                true
            }
            None => false,
        }
    }

    pub async fn patch_user(&self, id: UserId, patch: UserPatch) -> Option<User> {
        let mut users = self.users.write().await;
        let u = users.get_mut(&id)?;
        if let Some(username) = patch.username {
            u.user.username = username;
        }
        if let Some(email) = patch.email {
            u.user.email = email;
        }
        Some(u.user.clone())
    }

    pub async fn remove_user(&self, id: UserId) -> bool {
        self.users.write().await.remove(&id).is_some()
    }

    /// Targeted update of the club-membership markers.
    pub async fn update_user_clubs(
        &self,
        id: UserId,
        f: impl FnOnce(&mut clubroom_api::UserClubs),
    ) -> bool {
        match self.users.write().await.get_mut(&id) {
            Some(u) => {
                f(&mut u.user.user_clubs);
                true
            }
            None => false,
        }
    }

    pub async fn push_user_comment(&self, id: UserId, comment: CommentId) -> bool {
        match self.users.write().await.get_mut(&id) {
            Some(u) => {
                push_unique(&mut u.user.comments, comment);
                true
            }
            None => false,
        }
    }

    pub async fn pull_user_comment(&self, id: UserId, comment: CommentId) -> bool {
        match self.users.write().await.get_mut(&id) {
            Some(u) => {
                pull(&mut u.user.comments, &comment);
                true
            }
            None => false,
        }
    }

    pub async fn push_notification(&self, notif: Notification) -> bool {
        match self.users.write().await.get_mut(&notif.to) {
            Some(u) => {
                u.user.notifications.push(notif);
                true
            }
            None => false,
        }
    }

    // --- clubs ---

    pub async fn insert_club(&self, club: Club) {
        self.clubs.write().await.insert(club.id, club);
    }

    pub async fn club(&self, id: ClubId) -> Option<Club> {
        self.clubs.read().await.get(&id).cloned()
    }

    pub async fn clubs(&self) -> Vec<Club> {
        self.clubs.read().await.values().cloned().collect()
    }

    pub async fn update_club(&self, id: ClubId, f: impl FnOnce(&mut Club)) -> Option<Club> {
        let mut clubs = self.clubs.write().await;
        let club = clubs.get_mut(&id)?;
        f(club);
        Some(club.clone())
    }

    pub async fn remove_club(&self, id: ClubId) -> Option<Club> {
        self.clubs.write().await.remove(&id)
    }

    // --- posts ---

    pub async fn insert_post(&self, post: Post) {
        self.posts.write().await.insert(post.id, post);
    }

    pub async fn post(&self, id: PostId) -> Option<Post> {
        self.posts.read().await.get(&id).cloned()
    }

    pub async fn update_post(&self, id: PostId, f: impl FnOnce(&mut Post)) -> Option<Post> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(&id)?;
        f(post);
        Some(post.clone())
    }

    pub async fn remove_post(&self, id: PostId) -> Option<Post> {
        self.posts.write().await.remove(&id)
    }

    // --- gigs ---

    pub async fn insert_gig(&self, gig: Gig) {
        self.gigs.write().await.insert(gig.id, gig);
    }

    pub async fn gig(&self, id: GigId) -> Option<Gig> {
        self.gigs.read().await.get(&id).cloned()
    }

    pub async fn gigs(&self) -> Vec<Gig> {
        self.gigs.read().await.values().cloned().collect()
    }

    pub async fn update_gig(&self, id: GigId, f: impl FnOnce(&mut Gig)) -> Option<Gig> {
        let mut gigs = self.gigs.write().await;
        let gig = gigs.get_mut(&id)?;
        f(gig);
        Some(gig.clone())
    }

    // --- comments ---

    pub async fn insert_comment(&self, comment: Comment) {
        self.comments.write().await.insert(comment.id, comment);
    }

    pub async fn comment(&self, id: CommentId) -> Option<Comment> {
        self.comments.read().await.get(&id).cloned()
    }

    pub async fn set_comment_content(
        &self,
        id: CommentId,
        content: String,
        edited_at: Time,
    ) -> Option<Comment> {
        let mut comments = self.comments.write().await;
        let comment = comments.get_mut(&id)?;
        comment.content = content;
        comment.edited_at = Some(edited_at);
        Some(comment.clone())
    }

    pub async fn remove_comment(&self, id: CommentId) -> Option<Comment> {
        self.comments.write().await.remove(&id)
    }

    /// Append a comment id to the parent's children list, whichever kind the
    /// parent is. Returns false when the parent is gone.
    pub async fn parent_push_comment(&self, parent: ParentId, comment: CommentId) -> bool {
        match parent {
            ParentId::Post(id) => match self.posts.write().await.get_mut(&id) {
                Some(p) => {
                    push_unique(&mut p.comments, comment);
                    true
                }
                None => false,
            },
            ParentId::Gig(id) => match self.gigs.write().await.get_mut(&id) {
                Some(g) => {
                    push_unique(&mut g.comments, comment);
                    true
                }
                None => false,
            },
            ParentId::Comment(id) => match self.comments.write().await.get_mut(&id) {
                Some(c) => {
                    push_unique(&mut c.comments, comment);
                    true
                }
                None => false,
            },
        }
    }

    /// Authoritative child list of a parent, after any pushes.
    pub async fn parent_comments(&self, parent: ParentId) -> Option<Vec<CommentId>> {
        match parent {
            ParentId::Post(id) => self.posts.read().await.get(&id).map(|p| p.comments.clone()),
            ParentId::Gig(id) => self.gigs.read().await.get(&id).map(|g| g.comments.clone()),
            ParentId::Comment(id) => self
                .comments
                .read()
                .await
                .get(&id)
                .map(|c| c.comments.clone()),
        }
    }

    pub async fn parent_pull_comment(&self, parent: ParentId, comment: CommentId) -> bool {
        match parent {
            ParentId::Post(id) => match self.posts.write().await.get_mut(&id) {
                Some(p) => {
                    pull(&mut p.comments, &comment);
                    true
                }
                None => false,
            },
            ParentId::Gig(id) => match self.gigs.write().await.get_mut(&id) {
                Some(g) => {
                    pull(&mut g.comments, &comment);
                    true
                }
                None => false,
            },
            ParentId::Comment(id) => match self.comments.write().await.get_mut(&id) {
                Some(c) => {
                    pull(&mut c.comments, &comment);
                    true
                }
                None => false,
            },
        }
    }

    // --- sessions ---

    pub async fn create_session(&self, user: UserId) -> AuthToken {
        let token = AuthToken(Uuid::new_v4());
        self.sessions.write().await.insert(token, user);
        token
    }

    pub async fn session_user(&self, token: AuthToken) -> Option<UserId> {
        self.sessions.read().await.get(&token).copied()
    }

    pub async fn revoke_session(&self, token: AuthToken) -> bool {
        self.sessions.write().await.remove(&token).is_some()
    }

    // --- reconciliation ---

    /// Repair the relationship invariant: every existing comment appears
    /// exactly once in its author's list and its parent's list. The three
    /// lifecycle writes are not transactional, so a fault between them can
    /// leave a comment half-linked; this pass is idempotent and re-links
    /// whatever still has both endpoints. A comment whose parent record no
    /// longer exists is an orphaned reply and is deliberately left as-is.
    ///
    /// Locks are taken one collection at a time, never nested.
    pub async fn reconcile(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let links: Vec<(CommentId, UserId, ParentId)> = self
            .comments
            .read()
            .await
            .values()
            .map(|c| (c.id, c.created_by, c.created_in))
            .collect();

        fn dedup(list: &mut Vec<CommentId>, report: &mut ReconcileReport) {
            let mut seen = HashSet::new();
            let before = list.len();
            list.retain(|id| seen.insert(*id));
            report.deduped += before - list.len();
        }

        {
            let mut users = self.users.write().await;
            for u in users.values_mut() {
                dedup(&mut u.user.comments, &mut report);
            }
            for (comment, author, _) in &links {
                match users.get_mut(author) {
                    Some(u) if !u.user.comments.contains(comment) => {
                        u.user.comments.push(*comment);
                        report.relinked += 1;
                    }
                    Some(_) => (),
                    None => tracing::warn!(?comment, ?author, "comment author no longer exists"),
                }
            }
        }

        {
            let mut posts = self.posts.write().await;
            for p in posts.values_mut() {
                dedup(&mut p.comments, &mut report);
            }
        }
        {
            let mut gigs = self.gigs.write().await;
            for g in gigs.values_mut() {
                dedup(&mut g.comments, &mut report);
            }
        }
        {
            let mut comments = self.comments.write().await;
            for c in comments.values_mut() {
                dedup(&mut c.comments, &mut report);
            }
        }

        for (comment, _, parent) in &links {
            let relinked = match parent {
                ParentId::Post(id) => match self.posts.write().await.get_mut(id) {
                    Some(p) if !p.comments.contains(comment) => {
                        p.comments.push(*comment);
                        Some(true)
                    }
                    Some(_) => Some(false),
                    None => None,
                },
                ParentId::Gig(id) => match self.gigs.write().await.get_mut(id) {
                    Some(g) if !g.comments.contains(comment) => {
                        g.comments.push(*comment);
                        Some(true)
                    }
                    Some(_) => Some(false),
                    None => None,
                },
                ParentId::Comment(id) => match self.comments.write().await.get_mut(id) {
                    Some(c) if !c.comments.contains(comment) => {
                        c.comments.push(*comment);
                        Some(true)
                    }
                    Some(_) => Some(false),
                    None => None,
                },
            };
            match relinked {
                Some(true) => report.relinked += 1,
                Some(false) => (),
                None => {
                    tracing::debug!(?comment, ?parent, "orphaned comment, parent gone");
                    report.orphaned += 1;
                }
            }
        }

        if report.relinked > 0 || report.deduped > 0 {
            tracing::warn!(?report, "reconciliation repaired broken references");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clubroom_api::UserClubs;

    fn user(name: &str) -> User {
        User {
            id: UserId(Uuid::new_v4()),
            username: String::from(name),
            email: format!("{name}@example.com"),
            user_clubs: UserClubs::default(),
            comments: vec![],
            notifications: vec![],
        }
    }

    fn post(by: UserId) -> Post {
        Post {
            id: PostId(Uuid::new_v4()),
            content: String::from("hello"),
            created_by: by,
            created_in: None,
            comments: vec![],
            created_at: Utc::now(),
        }
    }

    fn comment(by: UserId, parent: ParentId) -> Comment {
        Comment {
            id: CommentId(Uuid::new_v4()),
            content: String::from("nice"),
            created_by: by,
            created_in: parent,
            comments: vec![],
            created_at: Utc::now(),
            edited_at: None,
        }
    }

    #[tokio::test]
    async fn push_is_idempotent_and_pull_removes() {
        let store = Store::new();
        let u = user("ana");
        let uid = u.id;
        store.insert_user(u, String::new()).await;

        let cid = CommentId(Uuid::new_v4());
        assert!(store.push_user_comment(uid, cid).await);
        assert!(store.push_user_comment(uid, cid).await);
        assert_eq!(store.user(uid).await.unwrap().comments, vec![cid]);

        assert!(store.pull_user_comment(uid, cid).await);
        assert!(store.user(uid).await.unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn reconcile_relinks_torn_create() {
        let store = Store::new();
        let u = user("bea");
        let uid = u.id;
        store.insert_user(u, String::new()).await;
        let p = post(uid);
        let pid = p.id;
        store.insert_post(p).await;

        // comment persisted, but the crash happened before either push
        let c = comment(uid, ParentId::Post(pid));
        let cid = c.id;
        store.insert_comment(c).await;

        let report = store.reconcile().await;
        assert_eq!(report.relinked, 2);
        assert_eq!(store.user(uid).await.unwrap().comments, vec![cid]);
        assert_eq!(store.post(pid).await.unwrap().comments, vec![cid]);

        // and running it again changes nothing
        let report = store.reconcile().await;
        assert_eq!(report, ReconcileReport::default());
    }

    #[tokio::test]
    async fn reconcile_leaves_orphans_alone() {
        let store = Store::new();
        let u = user("cal");
        let uid = u.id;
        store.insert_user(u, String::new()).await;

        // reply whose parent comment was deleted
        let c = comment(uid, ParentId::Comment(CommentId(Uuid::new_v4())));
        let cid = c.id;
        store.insert_comment(c).await;

        let report = store.reconcile().await;
        assert_eq!(report.orphaned, 1);
        assert!(store.comment(cid).await.is_some());
    }

    #[tokio::test]
    async fn sessions_are_revocable() {
        let store = Store::new();
        let uid = UserId(Uuid::new_v4());
        let token = store.create_session(uid).await;
        assert_eq!(store.session_user(token).await, Some(uid));
        assert!(store.revoke_session(token).await);
        assert_eq!(store.session_user(token).await, None);
        assert!(!store.revoke_session(token).await);
    }
}
