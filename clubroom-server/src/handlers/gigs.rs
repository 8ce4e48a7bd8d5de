use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use clubroom_api::{
    Gig, GigId, NewGig, NotifAction, NotifLink, Notification, UserId, Uuid,
};

use crate::{
    extractors::{AppState, Auth},
    handlers::comments,
    parent::parse_id,
    store::Store,
    Error,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:gigId", get(get_one))
        .route("/:gigId/apply", post(apply))
        .route("/:gigId/applicants/accept/:userId", post(accept_applicant))
        .nest("/:gigId/comments", comments::router())
}

async fn load_gig(store: &Store, raw: &str) -> Result<Gig, Error> {
    let id = GigId(parse_id(raw)?);
    store.gig(id).await.ok_or_else(Error::not_found)
}

async fn list(State(store): State<Arc<Store>>) -> Json<Vec<Gig>> {
    Json(store.gigs().await)
}

async fn get_one(
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
) -> Result<Json<Gig>, Error> {
    Ok(Json(load_gig(&store, &raw).await?))
}

async fn create(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Json(data): Json<NewGig>,
) -> Result<Json<Gig>, Error> {
    data.validate()?;
    store.user(actor).await.ok_or_else(Error::not_found)?;
    let gig = Gig {
        id: GigId(Uuid::new_v4()),
        title: data.title,
        description: data.description,
        created_by: actor,
        applicants: vec![],
        accepted_applicants: vec![],
        comments: vec![],
        created_at: Utc::now(),
    };
    store.insert_gig(gig.clone()).await;
    Ok(Json(gig))
}

async fn apply(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path(raw): Path<String>,
) -> Result<(), Error> {
    let gig = load_gig(&store, &raw).await?;
    if gig.created_by == actor {
        return Err(Error::forbidden());
    }
    store
        .update_gig(gig.id, |gig| {
            if !gig.applicants.contains(&actor) {
                gig.applicants.push(actor);
            }
        })
        .await;
    Ok(())
}

async fn accept_applicant(
    Auth(actor): Auth,
    State(store): State<Arc<Store>>,
    Path((raw_gig, raw_user)): Path<(String, String)>,
) -> Result<(), Error> {
    let gig = load_gig(&store, &raw_gig).await?;
    let user_id = UserId(parse_id(&raw_user)?);
    if gig.created_by != actor {
        return Err(Error::forbidden());
    }
    if !gig.applicants.contains(&user_id) {
        return Err(Error::not_found());
    }
    let owner = store.user(actor).await.ok_or_else(Error::not_found)?;
    store
        .update_gig(gig.id, |gig| {
            gig.applicants.retain(|u| *u != user_id);
            if !gig.accepted_applicants.contains(&user_id) {
                gig.accepted_applicants.push(user_id);
            }
        })
        .await;
    let notif = Notification {
        action: NotifAction::GigApplicantAccepted,
        links: vec![
            NotifLink {
                content: owner.username.clone(),
                id: owner.id.0,
            },
            NotifLink {
                content: gig.title.clone(),
                id: gig.id.0,
            },
        ],
        from: actor,
        to: user_id,
        sent_at: Utc::now(),
    };
    store.push_notification(notif).await;
    Ok(())
}
