//! Notification records and the sink they are delivered to.
//!
//! Delivery is best effort: callers go through [`crate::Engine::notify_user`]
//! and [`crate::Engine::notify_team`], which log failures instead of
//! returning them.

use crate::models::{EventId, MatchId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    MatchCreated,
    MatchStarted,
    ScoreUpdated,
    MatchWon,
    MatchLost,
    MatchRescheduled,
    NextRound,
    Champion,
    TournamentEnded,
    RegistrationReviewed,
}

/// Record a notification points at.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum RelatedEntity {
    Event(EventId),
    Match(MatchId),
}

/// Notification content, before it is addressed to a user.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related: Option<RelatedEntity>,
}

impl NotificationPayload {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            related: None,
        }
    }

    pub fn about(mut self, related: RelatedEntity) -> Self {
        self.related = Some(related);
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user: UserId,
    #[serde(flatten)]
    pub payload: NotificationPayload,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user: UserId, payload: NotificationPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            payload,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Where notifications are stored for users to read.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn create_notification(&self, notification: Notification) -> Result<(), NotifyError>;

    /// Newest first.
    async fn notifications_for(&self, user: UserId) -> Vec<Notification>;

    /// Drop notifications created before `cutoff`; returns how many went.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> usize;
}

#[derive(Default)]
pub struct InMemoryNotifications {
    items: RwLock<Vec<Notification>>,
}

impl InMemoryNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Every stored notification, oldest first.
    pub async fn all(&self) -> Vec<Notification> {
        self.items.read().await.clone()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotifications {
    async fn create_notification(&self, notification: Notification) -> Result<(), NotifyError> {
        self.items.write().await.push(notification);
        Ok(())
    }

    async fn notifications_for(&self, user: UserId) -> Vec<Notification> {
        let items = self.items.read().await;
        let mut mine: Vec<_> = items.iter().filter(|n| n.user == user).cloned().collect();
        mine.reverse();
        mine
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|n| n.created_at >= cutoff);
        before - items.len()
    }
}
