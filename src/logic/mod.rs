//! Tournament business logic: bracket generation and advancement, match
//! lifecycle, event status, registrations.

mod advancer;
mod event_status;
mod events;
mod generator;
mod match_lifecycle;
mod registration;
mod view;

pub use advancer::{advance_bracket, Advancement};
pub use event_status::{bracket_finished, next_status, sync_event_status, sync_event_status_at};
pub use events::{cancel_event, create_event, get_event, list_events, NewEvent};
pub use generator::{generate_bracket, pair_teams, schedule_round, seed_first_round, MIN_TEAMS};
pub use match_lifecycle::{
    reschedule_match, update_match_status, update_score, validate_match, ValidationOutcome,
};
pub use registration::{cancel_registration, create_team, register_team, review_registration};
pub use view::{get_bracket, BracketView, RoundView, SlotView, TeamRef};
