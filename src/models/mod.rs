//! Data structures for the bracket engine: events, matches, teams, users.

mod event;
mod game;
mod team;
mod user;

pub use event::{Bracket, BracketSlot, Event, EventId, EventStatus, GameId, Round, Schedule};
pub use game::{
    BracketPosition, BracketSide, GameMatch, MatchId, MatchStatus, Score, Validation,
};
pub use team::{EventRegistration, RegistrationId, RegistrationStatus, Team, TeamId};
pub use user::{Role, User, UserId};
