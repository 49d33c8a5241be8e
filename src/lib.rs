//! Tournament bracket engine: single-elimination brackets, match lifecycle
//! and event status, behind repository traits.

pub mod broadcast;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod logic;
pub mod models;
pub mod notify;
pub mod store;

pub use broadcast::{Broadcaster, LiveMessage, EVENT_UPDATED};
pub use config::Config;
pub use engine::Engine;
pub use error::{Entity, StoreError, TournamentError};
pub use logic::{
    advance_bracket, cancel_event, cancel_registration, create_event, create_team,
    generate_bracket, get_bracket, get_event, list_events, register_team, reschedule_match,
    review_registration, sync_event_status, update_match_status, update_score, validate_match,
    Advancement, BracketView, NewEvent,
};
pub use models::{
    Bracket, BracketPosition, BracketSlot, Event, EventId, EventRegistration, EventStatus,
    GameMatch, MatchId, MatchStatus, RegistrationId, RegistrationStatus, Role, Round, Schedule,
    Score, Team, TeamId, User, UserId,
};
