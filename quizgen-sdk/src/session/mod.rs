//! Client reconciliation state machine.
//!
//! The client never learns when a creation job finishes except through the
//! realtime channel. [`Session`] owns the client state, holds at most one
//! realtime connection, and reconciles by refetching the whole quiz list on
//! every completion event, so duplicated, reordered or missed events never
//! leave it inconsistent.
//!
//! I/O is reached through two seams: [`QuizBackend`] for the HTTP API and
//! [`RealtimeConnector`] for the socket. The `client` feature provides
//! reqwest and tungstenite implementations of both.

mod machine;
mod state;

pub use machine::Session;
pub use state::{ALERT_DURATION, Alert, AlertKind, ConnectionState, SessionState, View};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::objects::{
    CreationRequest, Credentials, JobAck, NegotiateResponse, QuizList, UserProfile,
};

/// Failure of a backend call, as the user should see it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The server could not be reached at all.
    #[error("Unable to connect to server")]
    Unreachable(String),
    /// The server answered with an error body.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// The server answered with something that could not be understood.
    #[error("An unknown error occurred")]
    Unexpected(String),
}

impl BackendError {
    /// Message for the one alert raised by this failure.
    pub fn alert_message(&self) -> String {
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Rejected { status: 401, .. })
    }
}

/// The HTTP API as seen by the client.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<UserProfile, BackendError>;
    async fn register(&self, credentials: &Credentials) -> Result<UserProfile, BackendError>;
    /// Profile of the user the current session cookie belongs to.
    async fn me(&self) -> Result<UserProfile, BackendError>;
    async fn logout(&self) -> Result<(), BackendError>;
    async fn list_quizzes(&self) -> Result<QuizList, BackendError>;
    async fn create_quiz(&self, request: &CreationRequest) -> Result<JobAck, BackendError>;
    async fn negotiate(&self) -> Result<NegotiateResponse, BackendError>;
}

/// What happened on a realtime connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalKind {
    Opened,
    Message(String),
    Closed,
}

/// A signal tagged with the generation of the connection that produced it.
///
/// Every connection the session opens gets a new generation, so signals
/// still in flight from a replaced or closed connection can be recognised
/// and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSignal {
    pub generation: u64,
    pub kind: SignalKind,
}

impl ChannelSignal {
    pub fn new(generation: u64, kind: SignalKind) -> Self {
        Self { generation, kind }
    }
}

pub type SignalSender = mpsc::UnboundedSender<ChannelSignal>;

/// Handle to one open realtime connection.
pub trait RealtimeConnection: Send {
    /// Close the connection. No signal is required after this.
    fn close(&mut self);
}

/// Opens realtime connections.
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    type Connection: RealtimeConnection;

    /// Start connecting to `url`.
    ///
    /// The connection reports `Opened`, every text frame and `Closed` on
    /// `signals`, each tagged with `generation`.
    async fn connect(
        &self,
        url: &str,
        generation: u64,
        signals: SignalSender,
    ) -> Result<Self::Connection, BackendError>;
}
