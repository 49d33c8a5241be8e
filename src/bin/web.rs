//! Single binary web server: JSON API over the bracket engine, plus a
//! server-sent-events stream of live updates.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. See `config` for the environment
//! variables it reads.

use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::{
    cookie::Key,
    delete, get, post, put,
    web::{self, Bytes, Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tournament_bracket_web::{
    cancel_event, cancel_registration, create_event, create_team, export::export_matches_csv,
    generate_bracket, get_bracket, get_event, list_events,
    notify::{InMemoryNotifications, NotificationSink},
    register_team, reschedule_match, review_registration,
    store::MemoryStore,
    update_match_status, update_score, validate_match, Broadcaster, Config, Engine, EventId,
    MatchId, MatchStatus, NewEvent, RegistrationId, RegistrationStatus, Role, TeamId,
    TournamentError, User, UserId,
};

type AppState = Data<Engine>;

const SESSION_USER: &str = "user_id";

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct SignInBody {
    user_id: UserId,
}

#[derive(Deserialize)]
struct CreateUserBody {
    name: String,
}

#[derive(Deserialize)]
struct CreateTeamBody {
    name: String,
    #[serde(default)]
    members: Vec<UserId>,
}

#[derive(Deserialize)]
struct RegisterBody {
    team_id: TeamId,
}

#[derive(Deserialize)]
struct ReviewBody {
    status: RegistrationStatus,
}

#[derive(Deserialize)]
struct MatchStatusBody {
    status: MatchStatus,
}

#[derive(Deserialize)]
struct ScoreBody {
    team1: i64,
    team2: i64,
}

#[derive(Deserialize)]
struct ScheduleBody {
    scheduled_time: DateTime<Utc>,
}

/// Path segment: event id (e.g. /api/events/{id})
#[derive(Deserialize)]
struct EventPath {
    id: EventId,
}

/// Path segments: event id and registration id
#[derive(Deserialize)]
struct RegistrationPath {
    id: EventId,
    registration_id: RegistrationId,
}

/// Path segment: match id (e.g. /api/matches/{id})
#[derive(Deserialize)]
struct MatchPath {
    id: MatchId,
}

fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::NotFound(_) => HttpResponse::NotFound().json(body),
        TournamentError::BadRequest(_) => HttpResponse::BadRequest().json(body),
        TournamentError::Forbidden(_) => HttpResponse::Forbidden().json(body),
        TournamentError::Storage(inner) => {
            log::error!("Storage failure: {}", inner);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn respond<T: Serialize>(result: Result<T, TournamentError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(&e),
    }
}

/// Acting user from the session cookie.
fn actor(session: &Session) -> Result<UserId, TournamentError> {
    match session.get::<UserId>(SESSION_USER) {
        Ok(Some(id)) => Ok(id),
        Ok(None) => Err(TournamentError::forbidden("Sign in required")),
        Err(e) => {
            log::warn!("Unreadable session: {}", e);
            Err(TournamentError::forbidden("Sign in required"))
        }
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tournament-bracket-web",
    })
}

/// Sign in as an existing user (the session carries the user id).
#[post("/api/session")]
async fn api_sign_in(state: AppState, session: Session, body: Json<SignInBody>) -> HttpResponse {
    let user = match state.user(body.user_id).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };
    if let Err(e) = session.insert(SESSION_USER, user.id) {
        log::error!("Could not write session: {}", e);
        return HttpResponse::InternalServerError().json(serde_json::json!({ "error": "session error" }));
    }
    HttpResponse::Ok().json(user)
}

#[delete("/api/session")]
async fn api_sign_out(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Create a player account.
#[post("/api/users")]
async fn api_create_user(state: AppState, body: Json<CreateUserBody>) -> HttpResponse {
    let name = body.name.trim();
    if name.is_empty() {
        return error_response(&TournamentError::bad_request("Name is required"));
    }
    let user = User::new(name, Role::Player);
    respond(
        state
            .users
            .save_user(&user)
            .await
            .map(|()| user)
            .map_err(TournamentError::from),
    )
}

/// Create a team captained by the signed-in user.
#[post("/api/teams")]
async fn api_create_team(state: AppState, session: Session, body: Json<CreateTeamBody>) -> HttpResponse {
    let actor = match actor(&session) {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    respond(create_team(&state, actor, &body.name, &body.members).await)
}

#[get("/api/events")]
async fn api_list_events(state: AppState) -> HttpResponse {
    respond(list_events(&state).await)
}

/// Create an event (admin only).
#[post("/api/events")]
async fn api_create_event(state: AppState, session: Session, body: Json<NewEvent>) -> HttpResponse {
    let actor = match actor(&session) {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    respond(create_event(&state, actor, body.into_inner()).await)
}

/// Get an event by id; its status is reconciled with the clock first.
#[get("/api/events/{id}")]
async fn api_get_event(state: AppState, path: Path<EventPath>) -> HttpResponse {
    respond(get_event(&state, path.id).await)
}

#[post("/api/events/{id}/cancel")]
async fn api_cancel_event(state: AppState, session: Session, path: Path<EventPath>) -> HttpResponse {
    let actor = match actor(&session) {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    respond(cancel_event(&state, actor, path.id).await)
}

/// Register a team (captain only).
#[post("/api/events/{id}/registrations")]
async fn api_register_team(
    state: AppState,
    session: Session,
    path: Path<EventPath>,
    body: Json<RegisterBody>,
) -> HttpResponse {
    let actor = match actor(&session) {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    respond(register_team(&state, actor, path.id, body.team_id).await)
}

#[get("/api/events/{id}/registrations")]
async fn api_list_registrations(state: AppState, path: Path<EventPath>) -> HttpResponse {
    respond(
        state
            .registrations
            .registrations_for_event(path.id)
            .await
            .map_err(TournamentError::from),
    )
}

/// Accept or reject a registration (admin only).
#[put("/api/events/{id}/registrations/{registration_id}")]
async fn api_review_registration(
    state: AppState,
    session: Session,
    path: Path<RegistrationPath>,
    body: Json<ReviewBody>,
) -> HttpResponse {
    let actor = match actor(&session) {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    log::debug!("Reviewing registration {} of event {}", path.registration_id, path.id);
    respond(review_registration(&state, actor, path.registration_id, body.status).await)
}

/// Withdraw a registration (only the captain who made it).
#[delete("/api/events/{id}/registrations/{registration_id}")]
async fn api_cancel_registration(
    state: AppState,
    session: Session,
    path: Path<RegistrationPath>,
) -> HttpResponse {
    let actor = match actor(&session) {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    log::debug!("Cancelling registration {} of event {}", path.registration_id, path.id);
    respond(cancel_registration(&state, actor, path.registration_id).await)
}

/// Bracket of an event, or null before generation.
#[get("/api/events/{id}/bracket")]
async fn api_get_bracket(state: AppState, path: Path<EventPath>) -> HttpResponse {
    respond(get_bracket(&state, path.id).await)
}

/// Generate the bracket (admin only; refused once play has started).
#[post("/api/events/{id}/bracket/generate")]
async fn api_generate_bracket(state: AppState, session: Session, path: Path<EventPath>) -> HttpResponse {
    let actor = match actor(&session) {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    respond(generate_bracket(&state, actor, path.id).await)
}

#[get("/api/events/{id}/matches")]
async fn api_list_matches(state: AppState, path: Path<EventPath>) -> HttpResponse {
    if let Err(e) = state.event(path.id).await {
        return error_response(&e);
    }
    respond(
        state
            .matches
            .matches_for_event(path.id)
            .await
            .map_err(TournamentError::from),
    )
}

/// Download the event's matches as CSV.
#[get("/api/events/{id}/matches.csv")]
async fn api_export_matches(state: AppState, path: Path<EventPath>) -> HttpResponse {
    use tournament_bracket_web::export::ExportError;
    match export_matches_csv(&state, path.id).await {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"matches-{}.csv\"", path.id),
            ))
            .body(csv),
        Err(ExportError::Tournament(e)) => error_response(&e),
        Err(e) => {
            log::error!("CSV export failed for event {}: {}", path.id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

#[get("/api/matches/{id}")]
async fn api_get_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    respond(state.game(path.id).await)
}

/// Start or cancel a match (admin only).
#[put("/api/matches/{id}/status")]
async fn api_match_status(
    state: AppState,
    session: Session,
    path: Path<MatchPath>,
    body: Json<MatchStatusBody>,
) -> HttpResponse {
    let actor = match actor(&session) {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    respond(update_match_status(&state, actor, path.id, body.status).await)
}

/// Set the score of an in-progress match (admin only).
#[put("/api/matches/{id}/score")]
async fn api_match_score(
    state: AppState,
    session: Session,
    path: Path<MatchPath>,
    body: Json<ScoreBody>,
) -> HttpResponse {
    let actor = match actor(&session) {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    respond(update_score(&state, actor, path.id, body.team1, body.team2).await)
}

/// Validate the result and advance the bracket (admin only).
#[post("/api/matches/{id}/validate")]
async fn api_validate_match(state: AppState, session: Session, path: Path<MatchPath>) -> HttpResponse {
    let actor = match actor(&session) {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    respond(validate_match(&state, actor, path.id).await.map(|outcome| outcome.game))
}

/// Move a match to a new time (admin only).
#[put("/api/matches/{id}/schedule")]
async fn api_reschedule_match(
    state: AppState,
    session: Session,
    path: Path<MatchPath>,
    body: Json<ScheduleBody>,
) -> HttpResponse {
    let actor = match actor(&session) {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    respond(reschedule_match(&state, actor, path.id, body.scheduled_time).await)
}

/// Notifications of the signed-in user, newest first.
#[get("/api/notifications")]
async fn api_notifications(state: AppState, session: Session) -> HttpResponse {
    match actor(&session) {
        Ok(user) => HttpResponse::Ok().json(state.notifications.notifications_for(user).await),
        Err(e) => error_response(&e),
    }
}

/// Live updates as server-sent events.
#[get("/api/live")]
async fn api_live(state: AppState) -> HttpResponse {
    let rx = state.broadcaster.subscribe();
    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(message) => {
                    let frame = format!("event: {}\ndata: {}\n\n", message.event, message.payload);
                    return Some((Ok::<_, std::convert::Infallible>(Bytes::from(frame)), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("Live listener lagged, {} messages skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let notifications = Arc::new(InMemoryNotifications::new());
    let engine = Engine::with_store(
        Arc::new(MemoryStore::new()),
        notifications.clone(),
        Broadcaster::new(config.broadcast_capacity),
    );

    let admin = User::new(config.admin_name.clone(), Role::Admin);
    if let Err(e) = engine.users.save_user(&admin).await {
        log::error!("Could not create admin account: {}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
    log::info!(
        "Admin account '{}' has id {} (sign in with POST /api/session)",
        admin.name,
        admin.id
    );

    // Background task: purge old notifications. Bracket state never runs on a timer.
    let retention = config.notification_retention;
    let cleanup_interval = config.cleanup_interval;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let cutoff = chrono::Duration::from_std(retention)
                .ok()
                .and_then(|age| Utc::now().checked_sub_signed(age));
            let Some(cutoff) = cutoff else {
                log::debug!("Retention window reaches past the calendar, nothing to purge");
                continue;
            };
            let removed = notifications.purge_before(cutoff).await;
            if removed > 0 {
                log::info!("Cleaned up {} old notification(s)", removed);
            }
        }
    });

    let state = Data::new(engine);
    let session_key = Key::generate();

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .service(api_health)
            .service(api_sign_in)
            .service(api_sign_out)
            .service(api_create_user)
            .service(api_create_team)
            .service(api_list_events)
            .service(api_create_event)
            .service(api_get_event)
            .service(api_cancel_event)
            .service(api_register_team)
            .service(api_list_registrations)
            .service(api_review_registration)
            .service(api_cancel_registration)
            .service(api_get_bracket)
            .service(api_generate_bracket)
            .service(api_export_matches)
            .service(api_list_matches)
            .service(api_get_match)
            .service(api_match_status)
            .service(api_match_score)
            .service(api_validate_match)
            .service(api_reschedule_match)
            .service(api_notifications)
            .service(api_live)
            .route("/", web::get().to(index))
    })
    .bind(bind)?
    .run()
    .await
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Tournament bracket API. See /api/health, /api/events and /api/live.\n")
}
