use std::{fmt::Debug, time::Duration};

use axum::{
    http::{self, request, StatusCode},
    Router,
};
use clubroom_api::{
    AuthToken, Club, Comment, CommentId, Error as ApiError, Gig, NewClub, NewComment, NewGig,
    NewPost, NewSession, NewUser, NotifAction, ParentId, Post, SessionInfo, User,
};
use tower::{Service, ServiceExt};

use crate::{app, AppState, AUTH_HEADER};

fn test_app() -> (Router, AppState) {
    let state = AppState::new();
    (app(state.clone(), Duration::from_secs(5)), state)
}

async fn call<Req, Resp>(
    app: &mut Router,
    req: request::Request<axum::body::Body>,
    req_body: &Req,
) -> Result<Resp, ApiError>
where
    Req: Debug,
    Resp: 'static + for<'de> serde::Deserialize<'de>,
{
    app.ready().await.expect("waiting for app to be ready");
    let resp = app.call(req).await.expect("running request");
    let status = resp.status();
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("recovering resp bytes");
    if status.is_success() {
        if std::any::TypeId::of::<Resp>() == std::any::TypeId::of::<()>() {
            // empty-bodied 200, which does not parse as json
            return Ok(serde_json::from_slice(b"null").unwrap());
        } else {
            return Ok(serde_json::from_slice(&body).unwrap_or_else(|err| {
                panic!("failed parsing resp body: {err}\nbody: {body:?}\nrequest: {req_body:?}")
            }));
        }
    }
    Err(ApiError::parse(&body)
        .unwrap_or_else(|err| panic!("parsing error response body {err}, body is {body:?}")))
}

async fn run_on_app<Req, Resp>(
    app: &mut Router,
    method: &str,
    uri: &str,
    token: Option<AuthToken>,
    body: &Req,
) -> Result<Resp, ApiError>
where
    Req: Debug + serde::Serialize,
    Resp: 'static + for<'de> serde::Deserialize<'de>,
{
    let req = request::Builder::new()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    let req = match token {
        Some(token) => req.header(AUTH_HEADER, token.0.to_string()),
        None => req,
    };
    let req = req
        .body(axum::body::Body::from(
            serde_json::to_vec(body).expect("serializing request body to json"),
        ))
        .expect("building request");
    call(app, req, body).await
}

async fn register(app: &mut Router, name: &str) -> SessionInfo {
    let new_user = NewUser {
        username: String::from(name),
        email: format!("{name}@example.com"),
        password: String::from("hunter2"),
    };
    let _: User = run_on_app(app, "POST", "/api/users/signup", None, &new_user)
        .await
        .expect("signing up");
    run_on_app(
        app,
        "POST",
        "/api/users/login",
        None,
        &NewSession {
            email: new_user.email,
            password: new_user.password,
        },
    )
    .await
    .expect("logging in")
}

async fn make_post(app: &mut Router, token: AuthToken, content: &str) -> Post {
    run_on_app(
        app,
        "POST",
        "/api/posts",
        Some(token),
        &NewPost {
            content: String::from(content),
        },
    )
    .await
    .expect("creating post")
}

async fn make_gig(app: &mut Router, token: AuthToken, title: &str) -> Gig {
    run_on_app(
        app,
        "POST",
        "/api/gigs",
        Some(token),
        &NewGig {
            title: String::from(title),
            description: String::new(),
        },
    )
    .await
    .expect("creating gig")
}

async fn make_club(app: &mut Router, token: AuthToken, title: &str) -> Club {
    run_on_app(
        app,
        "POST",
        "/api/clubs",
        Some(token),
        &NewClub {
            title: String::from(title),
            description: String::new(),
        },
    )
    .await
    .expect("creating club")
}

fn comment_body(content: &str) -> NewComment {
    NewComment {
        content: String::from(content),
    }
}

async fn fetch_user(app: &mut Router, id: clubroom_api::UserId) -> User {
    run_on_app::<_, User>(app, "GET", &format!("/api/users/{}", id.0), None, &())
        .await
        .expect("fetching user")
}

#[tokio::test]
async fn session_gate_and_revocation() {
    let (mut app, _) = test_app();

    // no token at all
    let res: Result<Club, _> = run_on_app(
        &mut app,
        "POST",
        "/api/clubs",
        None,
        &NewClub {
            title: String::from("c"),
            description: String::new(),
        },
    )
    .await;
    assert_eq!(res.unwrap_err(), ApiError::Unauthenticated);

    // syntactically valid but unknown token
    let res: Result<Club, _> = run_on_app(
        &mut app,
        "POST",
        "/api/clubs",
        Some(AuthToken::stub()),
        &NewClub {
            title: String::from("c"),
            description: String::new(),
        },
    )
    .await;
    assert_eq!(res.unwrap_err(), ApiError::Forbidden);

    let session = register(&mut app, "ana").await;
    let _club = make_club(&mut app, session.token, "vinyl").await;

    // logout revokes the token
    let () = run_on_app(&mut app, "POST", "/api/users/logout", Some(session.token), &())
        .await
        .expect("logging out");
    let res: Result<(), _> =
        run_on_app(&mut app, "POST", "/api/users/logout", Some(session.token), &()).await;
    assert_eq!(res.unwrap_err(), ApiError::Forbidden);
    let res: Result<Club, _> = run_on_app(
        &mut app,
        "POST",
        "/api/clubs",
        Some(session.token),
        &NewClub {
            title: String::from("again"),
            description: String::new(),
        },
    )
    .await;
    assert_eq!(res.unwrap_err(), ApiError::Forbidden);
}

#[tokio::test]
async fn auth_status_codes_are_401_and_403() {
    let (mut app, _) = test_app();
    let req = request::Builder::new()
        .method("POST")
        .uri("/api/gigs")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"title\":\"x\"}"))
        .unwrap();
    app.ready().await.unwrap();
    let resp = app.call(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = request::Builder::new()
        .method("POST")
        .uri("/api/gigs")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(AUTH_HEADER, "not-even-a-uuid")
        .body(axum::body::Body::from("{\"title\":\"x\"}"))
        .unwrap();
    app.ready().await.unwrap();
    let resp = app.call(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn comment_on_post_create_list_delete() {
    let (mut app, _) = test_app();
    let u1 = register(&mut app, "bea").await;
    let post = make_post(&mut app, u1.token, "first post").await;
    let base = format!("/api/posts/{}/comments", post.id.0);

    let ids: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &base,
        Some(u1.token),
        &comment_body("nice one"),
    )
    .await
    .expect("creating comment");
    assert_eq!(ids.len(), 1);
    let cid = ids[0];

    // parent's list and author's list both grew by exactly one
    let listed: Vec<CommentId> = run_on_app(&mut app, "GET", &base, None, &())
        .await
        .expect("listing comments");
    assert_eq!(listed, vec![cid]);
    let author = fetch_user(&mut app, u1.user.id).await;
    assert_eq!(author.comments, vec![cid]);

    let comment: Comment = run_on_app(&mut app, "GET", &format!("{base}/{}", cid.0), None, &())
        .await
        .expect("fetching comment");
    assert_eq!(comment.created_by, u1.user.id);
    assert_eq!(comment.created_in, ParentId::Post(post.id));

    let deleted: CommentId = run_on_app(
        &mut app,
        "DELETE",
        &format!("{base}/{}", cid.0),
        Some(u1.token),
        &(),
    )
    .await
    .expect("deleting comment");
    assert_eq!(deleted, cid);

    let listed: Vec<CommentId> = run_on_app(&mut app, "GET", &base, None, &())
        .await
        .expect("listing comments");
    assert!(listed.is_empty());
    let author = fetch_user(&mut app, u1.user.id).await;
    assert!(author.comments.is_empty());
    let res: Result<Comment, _> =
        run_on_app(&mut app, "GET", &format!("{base}/{}", cid.0), None, &()).await;
    assert_eq!(res.unwrap_err(), ApiError::NotFound);
}

#[tokio::test]
async fn reply_threads_and_no_cascade_on_delete() {
    let (mut app, _) = test_app();
    let u1 = register(&mut app, "cal").await;
    let u2 = register(&mut app, "dot").await;
    let post = make_post(&mut app, u1.token, "thread root").await;

    let ids: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &format!("/api/posts/{}/comments", post.id.0),
        Some(u1.token),
        &comment_body("top level"),
    )
    .await
    .expect("creating comment");
    let top = ids[0];

    // reply through the canonical reply surface
    let reply_base = format!("/api/comments/{}/reply", top.0);
    let ids: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &reply_base,
        Some(u2.token),
        &comment_body("a reply"),
    )
    .await
    .expect("creating reply");
    assert_eq!(ids.len(), 1);
    let reply = ids[0];

    let fetched: Comment = run_on_app(
        &mut app,
        "GET",
        &format!("/api/comments/{}", reply.0),
        None,
        &(),
    )
    .await
    .expect("fetching reply");
    assert_eq!(fetched.created_in, ParentId::Comment(top));

    // a reply to the reply, two levels deep
    let ids: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &format!("/api/comments/{}/reply", reply.0),
        Some(u1.token),
        &comment_body("deeper"),
    )
    .await
    .expect("creating nested reply");
    let deep = ids[0];

    // deleting the top comment orphans but does not remove its children
    let _: CommentId = run_on_app(
        &mut app,
        "DELETE",
        &format!("/api/posts/{}/comments/{}", post.id.0, top.0),
        Some(u1.token),
        &(),
    )
    .await
    .expect("deleting top comment");

    let orphan: Comment = run_on_app(
        &mut app,
        "GET",
        &format!("/api/comments/{}", reply.0),
        None,
        &(),
    )
    .await
    .expect("fetching orphaned reply");
    assert_eq!(orphan.comments, vec![deep]);
    // but walking from the deleted parent 404s
    let res: Result<Vec<CommentId>, _> =
        run_on_app(&mut app, "GET", &reply_base, None, &()).await;
    assert_eq!(res.unwrap_err(), ApiError::NotFound);
}

#[tokio::test]
async fn gig_reviews_need_creator_or_accepted_applicant() {
    let (mut app, _) = test_app();
    let owner = register(&mut app, "eve").await;
    let reviewer = register(&mut app, "finn").await;
    let gig = make_gig(&mut app, owner.token, "friday night set").await;
    let base = format!("/api/gigs/{}/comments", gig.id.0);

    let res: Result<Vec<CommentId>, _> = run_on_app(
        &mut app,
        "POST",
        &base,
        Some(reviewer.token),
        &comment_body("amazing"),
    )
    .await;
    assert_eq!(res.unwrap_err(), ApiError::Forbidden);

    // the creator may always review
    let ids: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &base,
        Some(owner.token),
        &comment_body("self note"),
    )
    .await
    .expect("creator commenting");
    let owners_comment = ids[0];

    // once accepted, the same actor succeeds
    let () = run_on_app(
        &mut app,
        "POST",
        &format!("/api/gigs/{}/apply", gig.id.0),
        Some(reviewer.token),
        &(),
    )
    .await
    .expect("applying");
    let () = run_on_app(
        &mut app,
        "POST",
        &format!(
            "/api/gigs/{}/applicants/accept/{}",
            gig.id.0, reviewer.user.id.0
        ),
        Some(owner.token),
        &(),
    )
    .await
    .expect("accepting applicant");
    let ids: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &base,
        Some(reviewer.token),
        &comment_body("amazing"),
    )
    .await
    .expect("accepted applicant commenting");
    let review = *ids.last().unwrap();

    // replies to a gig comment are not bound by the review rule
    let outsider = register(&mut app, "gus").await;
    let _: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &format!("/api/comments/{}/reply", review.0),
        Some(outsider.token),
        &comment_body("agreed"),
    )
    .await
    .expect("outsider replying");

    // the gig owner cannot delete someone else's review
    let res: Result<CommentId, _> = run_on_app(
        &mut app,
        "DELETE",
        &format!("{base}/{}", review.0),
        Some(owner.token),
        &(),
    )
    .await;
    assert_eq!(res.unwrap_err(), ApiError::Forbidden);
    // and its author can
    let _: CommentId = run_on_app(
        &mut app,
        "DELETE",
        &format!("{base}/{}", review.0),
        Some(reviewer.token),
        &(),
    )
    .await
    .expect("author deleting review");

    let listed: Vec<CommentId> = run_on_app(&mut app, "GET", &base, None, &())
        .await
        .expect("listing reviews");
    assert_eq!(listed, vec![owners_comment]);
}

#[tokio::test]
async fn club_context_gates_create_and_delete() {
    let (mut app, _) = test_app();
    let owner = register(&mut app, "hana").await;
    let member = register(&mut app, "iris").await;
    let outsider = register(&mut app, "jack").await;

    let club = make_club(&mut app, owner.token, "jazz cellar").await;
    let () = run_on_app(
        &mut app,
        "POST",
        &format!("/api/clubs/{}/follow", club.id.0),
        Some(member.token),
        &(),
    )
    .await
    .expect("following club");

    let post: Post = run_on_app(
        &mut app,
        "POST",
        &format!("/api/clubs/{}/posts", club.id.0),
        Some(member.token),
        &NewPost {
            content: String::from("session tonight"),
        },
    )
    .await
    .expect("posting in club");
    let base = format!("/api/clubs/{}/posts/{}/comments", club.id.0, post.id.0);

    let res: Result<Vec<CommentId>, _> = run_on_app(
        &mut app,
        "POST",
        &base,
        Some(outsider.token),
        &comment_body("let me in"),
    )
    .await;
    assert_eq!(res.unwrap_err(), ApiError::Forbidden);

    let ids: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &base,
        Some(member.token),
        &comment_body("see you there"),
    )
    .await
    .expect("member commenting");
    let cid = ids[0];

    // same post addressed without the club in the path carries no club rule
    let _: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &format!("/api/posts/{}/comments", post.id.0),
        Some(outsider.token),
        &comment_body("drive-by"),
    )
    .await
    .expect("commenting outside club context");

    // deletion: stranger no, club creator yes
    let res: Result<CommentId, _> = run_on_app(
        &mut app,
        "DELETE",
        &format!("{base}/{}", cid.0),
        Some(outsider.token),
        &(),
    )
    .await;
    assert_eq!(res.unwrap_err(), ApiError::Forbidden);
    let deleted: CommentId = run_on_app(
        &mut app,
        "DELETE",
        &format!("{base}/{}", cid.0),
        Some(owner.token),
        &(),
    )
    .await
    .expect("club creator deleting");
    assert_eq!(deleted, cid);
}

#[tokio::test]
async fn edit_is_owner_only_and_identity_fields_stay_put() {
    let (mut app, _) = test_app();
    let u1 = register(&mut app, "kim").await;
    let u2 = register(&mut app, "lou").await;
    let post = make_post(&mut app, u1.token, "content").await;
    let base = format!("/api/posts/{}/comments", post.id.0);

    let ids: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &base,
        Some(u1.token),
        &comment_body("original"),
    )
    .await
    .expect("creating comment");
    let cid = ids[0];
    let uri = format!("{base}/{}", cid.0);

    let res: Result<Comment, _> = run_on_app(
        &mut app,
        "PATCH",
        &uri,
        Some(u2.token),
        &serde_json::json!({ "content": "hijacked" }),
    )
    .await;
    assert_eq!(res.unwrap_err(), ApiError::Forbidden);
    let fetched: Comment = run_on_app(&mut app, "GET", &uri, None, &())
        .await
        .expect("fetching comment");
    assert_eq!(fetched.content, "original");

    // identity fields in the body are ignored, content is applied
    let updated: Comment = run_on_app(
        &mut app,
        "PATCH",
        &uri,
        Some(u1.token),
        &serde_json::json!({
            "content": "edited",
            "created_by": clubroom_api::UserId::stub(),
            "created_in": { "kind": "comment", "id": CommentId::stub() },
        }),
    )
    .await
    .expect("editing comment");
    assert_eq!(updated.content, "edited");
    assert_eq!(updated.created_by, u1.user.id);
    assert_eq!(updated.created_in, ParentId::Post(post.id));
    assert!(updated.edited_at.is_some());
}

#[tokio::test]
async fn notifications_reach_the_parent_owner() {
    let (mut app, _) = test_app();
    let u1 = register(&mut app, "mia").await;
    let u2 = register(&mut app, "noa").await;
    let post = make_post(&mut app, u1.token, "look at this").await;
    let base = format!("/api/posts/{}/comments", post.id.0);

    let ids: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &base,
        Some(u2.token),
        &comment_body("first"),
    )
    .await
    .expect("creating comment");
    let cid = ids[0];

    let owner = fetch_user(&mut app, u1.user.id).await;
    assert_eq!(owner.notifications.len(), 1);
    assert_eq!(owner.notifications[0].action, NotifAction::PostComment);
    assert_eq!(owner.notifications[0].from, u2.user.id);

    let _: Comment = run_on_app(
        &mut app,
        "PATCH",
        &format!("{base}/{}", cid.0),
        Some(u2.token),
        &serde_json::json!({ "content": "first, edited" }),
    )
    .await
    .expect("editing comment");
    let owner = fetch_user(&mut app, u1.user.id).await;
    assert_eq!(owner.notifications.len(), 2);
    assert_eq!(owner.notifications[1].action, NotifAction::PostCommentEdit);

    // an empty patch changes nothing and must not notify
    let unchanged: Comment = run_on_app(
        &mut app,
        "PATCH",
        &format!("{base}/{}", cid.0),
        Some(u2.token),
        &serde_json::json!({}),
    )
    .await
    .expect("empty patch");
    assert_eq!(unchanged.content, "first, edited");
    let owner = fetch_user(&mut app, u1.user.id).await;
    assert_eq!(owner.notifications.len(), 2);

    // replies notify the comment's owner, with the reply-specific tag
    let _: Vec<CommentId> = run_on_app(
        &mut app,
        "POST",
        &format!("/api/comments/{}/reply", cid.0),
        Some(u1.token),
        &comment_body("thanks"),
    )
    .await
    .expect("replying");
    let commenter = fetch_user(&mut app, u2.user.id).await;
    assert_eq!(commenter.notifications.len(), 1);
    assert_eq!(commenter.notifications[0].action, NotifAction::CommentReply);
    assert_eq!(commenter.notifications[0].from, u1.user.id);
}

#[tokio::test]
async fn malformed_and_missing_ids_are_not_found() {
    let (mut app, _) = test_app();
    let res: Result<Vec<CommentId>, _> =
        run_on_app(&mut app, "GET", "/api/posts/not-a-uuid/comments", None, &()).await;
    assert_eq!(
        res.unwrap_err(),
        ApiError::MalformedId(String::from("not-a-uuid"))
    );

    let res: Result<Comment, _> = run_on_app(
        &mut app,
        "GET",
        &format!("/api/comments/{}", clubroom_api::STUB_UUID),
        None,
        &(),
    )
    .await;
    assert_eq!(res.unwrap_err(), ApiError::NotFound);

    let res: Result<User, _> = run_on_app(&mut app, "GET", "/api/users/zzz", None, &()).await;
    assert_eq!(res.unwrap_err(), ApiError::MalformedId(String::from("zzz")));
}

#[tokio::test]
async fn signup_conflicts_and_body_validation() {
    let (mut app, _) = test_app();
    let _ = register(&mut app, "ola").await;

    let res: Result<User, _> = run_on_app(
        &mut app,
        "POST",
        "/api/users/signup",
        None,
        &NewUser {
            username: String::from("someone-else"),
            email: String::from("ola@example.com"),
            password: String::from("pw"),
        },
    )
    .await;
    assert_eq!(
        res.unwrap_err(),
        ApiError::EmailAlreadyUsed(String::from("ola@example.com"))
    );

    let res: Result<User, _> = run_on_app(
        &mut app,
        "POST",
        "/api/users/signup",
        None,
        &NewUser {
            username: String::from("ola"),
            email: String::from("other@example.com"),
            password: String::from("pw"),
        },
    )
    .await;
    assert_eq!(
        res.unwrap_err(),
        ApiError::UsernameAlreadyUsed(String::from("ola"))
    );

    let res: Result<SessionInfo, _> = run_on_app(
        &mut app,
        "POST",
        "/api/users/login",
        None,
        &NewSession {
            email: String::from("ola@example.com"),
            password: String::from("wrong"),
        },
    )
    .await;
    assert_eq!(res.unwrap_err(), ApiError::Forbidden);

    // empty comment content is rejected before any resolution side effects
    let u = register(&mut app, "pam").await;
    let post = make_post(&mut app, u.token, "p").await;
    let res: Result<Vec<CommentId>, _> = run_on_app(
        &mut app,
        "POST",
        &format!("/api/posts/{}/comments", post.id.0),
        Some(u.token),
        &comment_body("   "),
    )
    .await;
    assert!(matches!(res.unwrap_err(), ApiError::Validation(_)));
}

#[tokio::test]
async fn club_membership_flow() {
    let (mut app, _) = test_app();
    let owner = register(&mut app, "quin").await;
    let joiner = register(&mut app, "rae").await;
    let club = make_club(&mut app, owner.token, "garage").await;

    let () = run_on_app(
        &mut app,
        "POST",
        &format!("/api/clubs/{}/join", club.id.0),
        Some(joiner.token),
        &(),
    )
    .await
    .expect("requesting to join");
    let fetched: Club = run_on_app(
        &mut app,
        "GET",
        &format!("/api/clubs/{}", club.id.0),
        None,
        &(),
    )
    .await
    .expect("fetching club");
    assert_eq!(fetched.pending_requests, vec![joiner.user.id]);

    let () = run_on_app(
        &mut app,
        "POST",
        &format!(
            "/api/clubs/{}/requests/accept/{}",
            club.id.0, joiner.user.id.0
        ),
        Some(owner.token),
        &(),
    )
    .await
    .expect("accepting request");

    let members: Vec<clubroom_api::UserId> = run_on_app(
        &mut app,
        "GET",
        &format!("/api/clubs/{}/members", club.id.0),
        None,
        &(),
    )
    .await
    .expect("listing members");
    assert_eq!(members, vec![joiner.user.id]);

    let joined = fetch_user(&mut app, joiner.user.id).await;
    assert_eq!(joined.user_clubs.joined_clubs, vec![club.id]);
    assert!(joined.user_clubs.pending_requests.is_empty());
    assert_eq!(
        joined.notifications.last().unwrap().action,
        NotifAction::ClubMemberAccepted
    );

    let () = run_on_app(
        &mut app,
        "POST",
        &format!("/api/clubs/{}/leave", club.id.0),
        Some(joiner.token),
        &(),
    )
    .await
    .expect("leaving club");
    let left = fetch_user(&mut app, joiner.user.id).await;
    assert!(left.user_clubs.joined_clubs.is_empty());
}
