use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use clubroom_api::{
    Club, ClubId, ClubPatch, NewClub, NotifAction, NotifLink, Notification, User, UserId, Uuid,
};

use crate::{
    extractors::{AppState, Auth},
    handlers::{comments, posts},
    parent::parse_id,
    store::Store,
    Error,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:clubId", get(get_one).patch(edit).delete(remove))
        .route("/:clubId/members", get(members))
        .route("/:clubId/join", post(join))
        .route("/:clubId/follow", post(follow))
        .route("/:clubId/cancel", post(cancel))
        .route("/:clubId/leave", post(leave))
        .route("/:clubId/requests/accept/:userId", post(accept_request))
        .route("/:clubId/requests/refuse/:userId", post(refuse_request))
        .route("/:clubId/members/delete/:userId", post(remove_member))
        .nest("/:clubId/posts", posts::router())
        // club-scoped replies carry the club context for the comment policy
        .nest("/:clubId/comments/:commentId/reply", comments::router())
}

fn club_notification(action: NotifAction, actor: &User, club: &Club, to: UserId) -> Notification {
    Notification {
        action,
        links: vec![
            NotifLink {
                content: actor.username.clone(),
                id: actor.id.0,
            },
            NotifLink {
                content: club.title.clone(),
                id: club.id.0,
            },
        ],
        from: actor.id,
        to,
        sent_at: Utc::now(),
    }
}

async fn load_club(store: &Store, raw: &str) -> Result<Club, Error> {
    let id = ClubId(parse_id(raw)?);
    store.club(id).await.ok_or_else(Error::not_found)
}

async fn list(State(store): State<Arc<Store>>) -> Json<Vec<Club>> {
    Json(store.clubs().await)
}

async fn get_one(
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
) -> Result<Json<Club>, Error> {
    Ok(Json(load_club(&store, &raw).await?))
}

async fn members(
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<UserId>>, Error> {
    Ok(Json(load_club(&store, &raw).await?.members))
}

async fn create(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Json(data): Json<NewClub>,
) -> Result<Json<Club>, Error> {
    data.validate()?;
    store.user(actor).await.ok_or_else(Error::not_found)?;
    let club = Club {
        id: ClubId(Uuid::new_v4()),
        title: data.title,
        description: data.description,
        created_by: actor,
        members: vec![],
        pending_requests: vec![],
        created_at: Utc::now(),
    };
    store.insert_club(club.clone()).await;
    store
        .update_user_clubs(actor, |clubs| clubs.created_clubs.push(club.id))
        .await;
    Ok(Json(club))
}

async fn edit(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
    Json(patch): Json<ClubPatch>,
) -> Result<Json<Club>, Error> {
    patch.validate()?;
    let club = load_club(&store, &raw).await?;
    if club.created_by != actor {
        return Err(Error::forbidden());
    }
    let updated = store
        .update_club(club.id, |club| {
            if let Some(title) = patch.title {
                club.title = title;
            }
            if let Some(description) = patch.description {
                club.description = description;
            }
        })
        .await
        .ok_or_else(Error::not_found)?;
    Ok(Json(updated))
}

async fn remove(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
) -> Result<Json<ClubId>, Error> {
    let club = load_club(&store, &raw).await?;
    if club.created_by != actor {
        return Err(Error::forbidden());
    }
    // drop the club marker from the creator, members and pending requesters
    store
        .update_user_clubs(club.created_by, |clubs| {
            clubs.created_clubs.retain(|c| *c != club.id)
        })
        .await;
    for member in &club.members {
        store
            .update_user_clubs(*member, |clubs| {
                clubs.joined_clubs.retain(|c| *c != club.id)
            })
            .await;
    }
    for requester in &club.pending_requests {
        store
            .update_user_clubs(*requester, |clubs| {
                clubs.pending_requests.retain(|c| *c != club.id)
            })
            .await;
    }
    store.remove_club(club.id).await;
    Ok(Json(club.id))
}

async fn join(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
) -> Result<(), Error> {
    let club = load_club(&store, &raw).await?;
    if club.created_by == actor {
        return Err(Error::forbidden());
    }
    let user = store.user(actor).await.ok_or_else(Error::not_found)?;
    store
        .update_club(club.id, |club| {
            if !club.pending_requests.contains(&actor) {
                club.pending_requests.push(actor);
            }
        })
        .await;
    store
        .update_user_clubs(actor, |clubs| {
            if !clubs.pending_requests.contains(&club.id) {
                clubs.pending_requests.push(club.id);
            }
        })
        .await;
    let notif = club_notification(NotifAction::ClubRequestSent, &user, &club, club.created_by);
    store.push_notification(notif).await;
    Ok(())
}

async fn follow(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
) -> Result<(), Error> {
    let club = load_club(&store, &raw).await?;
    if club.created_by == actor {
        return Err(Error::forbidden());
    }
    let user = store.user(actor).await.ok_or_else(Error::not_found)?;
    store
        .update_club(club.id, |club| {
            if !club.members.contains(&actor) {
                club.members.push(actor);
            }
        })
        .await;
    store
        .update_user_clubs(actor, |clubs| {
            if !clubs.joined_clubs.contains(&club.id) {
                clubs.joined_clubs.push(club.id);
            }
        })
        .await;
    let notif = club_notification(NotifAction::ClubFollowed, &user, &club, club.created_by);
    store.push_notification(notif).await;
    Ok(())
}

async fn cancel(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
) -> Result<(), Error> {
    let club = load_club(&store, &raw).await?;
    if !club.pending_requests.contains(&actor) {
        return Err(Error::not_found());
    }
    store
        .update_club(club.id, |club| club.pending_requests.retain(|u| *u != actor))
        .await;
    store
        .update_user_clubs(actor, |clubs| {
            clubs.pending_requests.retain(|c| *c != club.id)
        })
        .await;
    Ok(())
}

async fn leave(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
) -> Result<(), Error> {
    let club = load_club(&store, &raw).await?;
    if !club.members.contains(&actor) {
        return Err(Error::not_found());
    }
    store
        .update_club(club.id, |club| club.members.retain(|u| *u != actor))
        .await;
    store
        .update_user_clubs(actor, |clubs| clubs.joined_clubs.retain(|c| *c != club.id))
        .await;
    Ok(())
}

async fn accept_request(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path((raw_club, raw_user)): Path<(String, String)>,
) -> Result<(), Error> {
    let club = load_club(&store, &raw_club).await?;
    let user_id = UserId(parse_id(&raw_user)?);
    if club.created_by != actor {
        return Err(Error::forbidden());
    }
    if !club.pending_requests.contains(&user_id) {
        return Err(Error::not_found());
    }
    let owner = store.user(actor).await.ok_or_else(Error::not_found)?;
    store
        .update_club(club.id, |club| {
            club.pending_requests.retain(|u| *u != user_id);
            if !club.members.contains(&user_id) {
                club.members.push(user_id);
            }
        })
        .await;
    store
        .update_user_clubs(user_id, |clubs| {
            clubs.pending_requests.retain(|c| *c != club.id);
            if !clubs.joined_clubs.contains(&club.id) {
                clubs.joined_clubs.push(club.id);
            }
        })
        .await;
    let notif = club_notification(NotifAction::ClubMemberAccepted, &owner, &club, user_id);
    store.push_notification(notif).await;
    Ok(())
}

async fn refuse_request(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path((raw_club, raw_user)): Path<(String, String)>,
) -> Result<(), Error> {
    let club = load_club(&store, &raw_club).await?;
    let user_id = UserId(parse_id(&raw_user)?);
    if club.created_by != actor {
        return Err(Error::forbidden());
    }
    if !club.pending_requests.contains(&user_id) {
        return Err(Error::not_found());
    }
    store
        .update_club(club.id, |club| club.pending_requests.retain(|u| *u != user_id))
        .await;
    store
        .update_user_clubs(user_id, |clubs| {
            clubs.pending_requests.retain(|c| *c != club.id)
        })
        .await;
    Ok(())
}

async fn remove_member(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path((raw_club, raw_user)): Path<(String, String)>,
) -> Result<(), Error> {
    let club = load_club(&store, &raw_club).await?;
    let user_id = UserId(parse_id(&raw_user)?);
    if club.created_by != actor {
        return Err(Error::forbidden());
    }
    if !club.members.contains(&user_id) {
        return Err(Error::not_found());
    }
    store
        .update_club(club.id, |club| club.members.retain(|u| *u != user_id))
        .await;
    store
        .update_user_clubs(user_id, |clubs| {
            clubs.joined_clubs.retain(|c| *c != club.id)
        })
        .await;
    Ok(())
}
