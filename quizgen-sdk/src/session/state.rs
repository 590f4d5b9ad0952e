//! Client session state and its pure transitions.
//!
//! Nothing in here performs I/O; [`Session`](super::Session) drives these
//! transitions from API responses and realtime signals.

use std::time::{Duration, Instant};

use crate::objects::{QuizList, QuizSummary, RawCreationRequest, UserProfile};

/// How long an alert stays visible.
pub const ALERT_DURATION: Duration = Duration::from_secs(3);

/// Lifecycle of the realtime connection.
///
/// Handling a message is a transient step inside `Connected`, not a state of
/// its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Which screen the client is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Login,
    Dashboard,
    CreateQuiz,
    Quiz { quiz_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Failure,
}

/// A transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    pub expires_at: Instant,
}

impl Alert {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub view: View,
    pub user: Option<UserProfile>,
    pub connection: ConnectionState,
    pub own_quizzes: Vec<QuizSummary>,
    pub shared_quizzes: Vec<QuizSummary>,
    pub alerts: Vec<Alert>,
    /// The creation form as the user is filling it in.
    pub draft: RawCreationRequest,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Replace both lists wholesale.
    ///
    /// Applying the same list twice leaves the state unchanged, which is what
    /// makes duplicate completion events harmless.
    pub fn apply_quiz_list(&mut self, list: QuizList) {
        self.own_quizzes = list.own_quizzes;
        self.shared_quizzes = list.shared_quizzes;
    }

    pub fn contains_quiz(&self, quiz_id: &str) -> bool {
        self.own_quizzes
            .iter()
            .chain(self.shared_quizzes.iter())
            .any(|q| q.id == quiz_id)
    }

    pub fn push_alert(&mut self, kind: AlertKind, message: impl Into<String>, now: Instant) {
        self.alerts.push(Alert {
            kind,
            message: message.into(),
            expires_at: now + ALERT_DURATION,
        });
    }

    /// Drop every alert whose display time is over.
    pub fn expire_alerts(&mut self, now: Instant) {
        self.alerts.retain(|a| !a.is_expired(now));
    }

    pub fn signed_in(&mut self, user: UserProfile) {
        self.user = Some(user);
        self.view = View::Dashboard;
    }

    /// Back to a fresh, anonymous state. Alerts survive so that a logout
    /// message can still be shown.
    pub fn signed_out(&mut self) {
        let alerts = std::mem::take(&mut self.alerts);
        *self = SessionState {
            alerts,
            ..Default::default()
        };
    }
}
