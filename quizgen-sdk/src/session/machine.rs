use std::time::Instant;

use tokio::sync::mpsc;

use super::{
    AlertKind, BackendError, ChannelSignal, ConnectionState, QuizBackend, RealtimeConnection,
    RealtimeConnector, SessionState, SignalKind, SignalSender, View,
};
use crate::objects::realtime::parse_frame;
use crate::objects::{Credentials, JobAck, RawCreationRequest, RealtimeEvent};
use crate::validation::validate_creation;

pub const QUIZ_SUBMITTED: &str = "Your quiz is being processed!";
pub const QUIZ_CREATED: &str = "Your quiz has been created!";
pub const QUIZ_FAILED: &str = "Your quiz could not be created";
pub const MISSING_CREDENTIALS: &str = "Missing username or password";

/// Owner of the client state and of the single realtime connection.
///
/// All mutation goes through `&mut self`; realtime connections only ever
/// talk to the session through the signal channel.
pub struct Session<B, C: RealtimeConnector> {
    backend: B,
    connector: C,
    state: SessionState,
    generation: u64,
    connection: Option<C::Connection>,
    signal_tx: SignalSender,
    signal_rx: mpsc::UnboundedReceiver<ChannelSignal>,
}

impl<B: QuizBackend, C: RealtimeConnector> Session<B, C> {
    pub fn new(backend: B, connector: C) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            connector,
            state: SessionState::default(),
            generation: 0,
            connection: None,
            signal_tx,
            signal_rx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Generation of the current (or most recently closed) connection.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn draft_mut(&mut self) -> &mut RawCreationRequest {
        &mut self.state.draft
    }

    /// Switch screens. Anything but the login view needs a signed-in user.
    pub fn navigate(&mut self, view: View) {
        if view == View::Login || self.state.is_authenticated() {
            self.state.view = view;
        }
    }

    pub fn expire_alerts(&mut self) {
        self.state.expire_alerts(Instant::now());
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    pub async fn login(&mut self, credentials: Credentials) -> bool {
        if !credentials.is_complete() {
            self.alert(AlertKind::Failure, MISSING_CREDENTIALS);
            return false;
        }
        match self.backend.login(&credentials).await {
            Ok(user) => {
                self.enter(user).await;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    pub async fn register(&mut self, credentials: Credentials) -> bool {
        if !credentials.is_complete() {
            self.alert(AlertKind::Failure, MISSING_CREDENTIALS);
            return false;
        }
        match self.backend.register(&credentials).await {
            Ok(user) => {
                self.enter(user).await;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    /// Resume a session from an existing cookie. An expired or missing
    /// session is not an error worth an alert.
    pub async fn restore(&mut self) -> bool {
        match self.backend.me().await {
            Ok(user) => {
                self.enter(user).await;
                true
            }
            Err(e) if e.is_unauthorized() => false,
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    pub async fn logout(&mut self) {
        self.close_channel();
        if let Err(e) = self.backend.logout().await {
            tracing::warn!(error = %e, "logout request failed");
        }
        self.state.signed_out();
    }

    async fn enter(&mut self, user: crate::objects::UserProfile) {
        tracing::debug!(user_id = %user.id, "signed in");
        self.state.signed_in(user);
        self.refresh().await;
        self.open_channel().await;
    }

    // -----------------------------------------------------------------------
    // Quizzes
    // -----------------------------------------------------------------------

    /// Refetch both quiz lists and replace the local ones.
    pub async fn refresh(&mut self) -> bool {
        match self.backend.list_quizzes().await {
            Ok(list) => {
                self.state.apply_quiz_list(list);
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    /// Validate the draft locally and submit it.
    ///
    /// A rejected draft raises one alert and never reaches the network.
    pub async fn submit_quiz(&mut self) -> Option<JobAck> {
        let request = match validate_creation(self.state.draft.clone()) {
            Ok(request) => request,
            Err(e) => {
                self.alert(AlertKind::Failure, e.to_string());
                return None;
            }
        };
        match self.backend.create_quiz(&request).await {
            Ok(ack) => {
                self.alert(AlertKind::Success, QUIZ_SUBMITTED);
                self.state.draft = RawCreationRequest::default();
                self.state.view = View::Dashboard;
                self.refresh().await;
                Some(ack)
            }
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Realtime channel
    // -----------------------------------------------------------------------

    /// Negotiate a fresh credential and open a new connection, replacing the
    /// current one.
    pub async fn open_channel(&mut self) {
        self.close_channel();
        self.generation += 1;
        let generation = self.generation;
        self.state.connection = ConnectionState::Connecting;

        let url = match self.backend.negotiate().await {
            Ok(negotiated) => negotiated.url,
            Err(e) => {
                tracing::warn!(error = %e, "negotiate failed");
                self.state.connection = ConnectionState::Disconnected;
                return;
            }
        };
        match self
            .connector
            .connect(&url, generation, self.signal_tx.clone())
            .await
        {
            Ok(connection) => self.connection = Some(connection),
            Err(e) => {
                tracing::warn!(error = %e, "failed to open realtime connection");
                self.state.connection = ConnectionState::Disconnected;
            }
        }
    }

    fn close_channel(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        // anything still in flight from the old connection is now stale
        self.generation += 1;
        self.state.connection = ConnectionState::Disconnected;
    }

    /// Wait for the next signal and apply it.
    pub async fn process_next_signal(&mut self) {
        if let Some(signal) = self.signal_rx.recv().await {
            self.handle_signal(signal).await;
        }
    }

    /// Apply every signal already queued. Returns how many were taken off
    /// the queue, stale ones included.
    pub async fn process_pending_signals(&mut self) -> usize {
        let mut taken = 0;
        while let Ok(signal) = self.signal_rx.try_recv() {
            taken += 1;
            self.handle_signal(signal).await;
        }
        taken
    }

    pub async fn handle_signal(&mut self, signal: ChannelSignal) {
        if signal.generation != self.generation {
            tracing::debug!(
                generation = signal.generation,
                current = self.generation,
                "dropping signal from a stale connection"
            );
            return;
        }
        match signal.kind {
            SignalKind::Opened => {
                if self.state.connection == ConnectionState::Connecting {
                    self.state.connection = ConnectionState::Connected;
                }
            }
            SignalKind::Closed => {
                // no automatic reconnect
                self.connection = None;
                self.state.connection = ConnectionState::Disconnected;
            }
            SignalKind::Message(text) => self.handle_frame(&text).await,
        }
    }

    async fn handle_frame(&mut self, text: &str) {
        let event = match parse_frame(text) {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed realtime frame");
                return;
            }
        };
        match event {
            RealtimeEvent::QuizProcessed { quiz_id } => {
                tracing::info!(quiz_id = ?quiz_id, "quiz processed");
                self.refresh().await;
                self.alert(AlertKind::Success, QUIZ_CREATED);
            }
            RealtimeEvent::QuizErrored { quiz_id, error } => {
                tracing::info!(quiz_id = ?quiz_id, error = ?error, "quiz generation failed");
                self.refresh().await;
                self.alert(AlertKind::Failure, QUIZ_FAILED);
            }
            RealtimeEvent::Unrecognized => {
                tracing::debug!("ignoring unrecognized realtime event");
            }
        }
    }

    fn alert(&mut self, kind: AlertKind, message: impl Into<String>) {
        self.state.push_alert(kind, message, Instant::now());
    }

    fn fail(&mut self, error: &BackendError) {
        self.alert(AlertKind::Failure, error.alert_message());
    }
}

impl<B, C: RealtimeConnector> Drop for Session<B, C> {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::objects::creation::{MIME_PDF, UploadedFile};
    use crate::objects::{
        CreationRequest, NegotiateResponse, QuizList, QuizSummary, UserProfile,
    };

    #[derive(Default)]
    struct Store {
        quizzes: QuizList,
        pending: Vec<QuizSummary>,
        calls: Vec<&'static str>,
        unreachable: bool,
        fail_negotiate: bool,
    }

    #[derive(Clone, Default)]
    struct FakeBackend(Arc<Mutex<Store>>);

    impl FakeBackend {
        fn call(&self, name: &'static str) -> Result<(), BackendError> {
            let mut store = self.0.lock().unwrap();
            store.calls.push(name);
            if store.unreachable {
                return Err(BackendError::Unreachable("connection refused".into()));
            }
            Ok(())
        }

        fn count(&self, name: &str) -> usize {
            self.0.lock().unwrap().calls.iter().filter(|c| **c == name).count()
        }

        /// The external processor finishing every pending job.
        fn finish_jobs(&self) {
            let mut store = self.0.lock().unwrap();
            let done: Vec<_> = store.pending.drain(..).collect();
            store.quizzes.own_quizzes.extend(done);
        }
    }

    #[async_trait]
    impl QuizBackend for FakeBackend {
        async fn login(&self, credentials: &Credentials) -> Result<UserProfile, BackendError> {
            self.call("login")?;
            if credentials.password != "secret" {
                return Err(BackendError::Rejected {
                    status: 401,
                    message: "Incorrect password".into(),
                });
            }
            Ok(UserProfile {
                id: "u1".into(),
                username: credentials.username.clone(),
            })
        }

        async fn register(&self, credentials: &Credentials) -> Result<UserProfile, BackendError> {
            self.call("register")?;
            Ok(UserProfile {
                id: "u2".into(),
                username: credentials.username.clone(),
            })
        }

        async fn me(&self) -> Result<UserProfile, BackendError> {
            self.call("me")?;
            Err(BackendError::Rejected {
                status: 401,
                message: "Unauthorized".into(),
            })
        }

        async fn logout(&self) -> Result<(), BackendError> {
            self.call("logout")
        }

        async fn list_quizzes(&self) -> Result<QuizList, BackendError> {
            self.call("list")?;
            Ok(self.0.lock().unwrap().quizzes.clone())
        }

        async fn create_quiz(&self, request: &CreationRequest) -> Result<JobAck, BackendError> {
            self.call("create")?;
            let mut store = self.0.lock().unwrap();
            let id = format!("q{}", store.pending.len() + store.quizzes.own_quizzes.len() + 1);
            store.pending.push(QuizSummary {
                id: id.clone(),
                name: request.quiz_name.clone(),
                question_count: Some(request.num_questions),
                processed: true,
                errored: false,
                created_at: None,
                last_modified: None,
            });
            Ok(JobAck {
                id,
                name: request.quiz_name.clone(),
            })
        }

        async fn negotiate(&self) -> Result<NegotiateResponse, BackendError> {
            self.call("negotiate")?;
            if self.0.lock().unwrap().fail_negotiate {
                return Err(BackendError::Unexpected("fabric down".into()));
            }
            let n = self.count("negotiate");
            Ok(NegotiateResponse {
                url: format!("wss://fabric.test/client/hubs/quiz?access_token=t{n}"),
            })
        }
    }

    struct OpenedConnection {
        url: String,
        generation: u64,
        signals: SignalSender,
        closed: Arc<AtomicBool>,
    }

    #[derive(Clone, Default)]
    struct FakeConnector(Arc<Mutex<Vec<OpenedConnection>>>);

    impl FakeConnector {
        fn send(&self, index: usize, kind: SignalKind) {
            let opened = self.0.lock().unwrap();
            let conn = &opened[index];
            // a closed socket still may have frames buffered
            let _ = conn.signals.send(ChannelSignal::new(conn.generation, kind));
        }

        fn is_closed(&self, index: usize) -> bool {
            self.0.lock().unwrap()[index].closed.load(Ordering::SeqCst)
        }
    }

    struct FakeConnection(Arc<AtomicBool>);

    impl RealtimeConnection for FakeConnection {
        fn close(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RealtimeConnector for FakeConnector {
        type Connection = FakeConnection;

        async fn connect(
            &self,
            url: &str,
            generation: u64,
            signals: SignalSender,
        ) -> Result<FakeConnection, BackendError> {
            let closed = Arc::new(AtomicBool::new(false));
            let _ = signals.send(ChannelSignal::new(generation, SignalKind::Opened));
            self.0.lock().unwrap().push(OpenedConnection {
                url: url.to_owned(),
                generation,
                signals,
                closed: closed.clone(),
            });
            Ok(FakeConnection(closed))
        }
    }

    const PROCESSED: &str =
        r#"{"type":"message","from":"server","dataType":"json","data":{"type":"quiz_processed"}}"#;

    fn session() -> (Session<FakeBackend, FakeConnector>, FakeBackend, FakeConnector) {
        let backend = FakeBackend::default();
        let connector = FakeConnector::default();
        (
            Session::new(backend.clone(), connector.clone()),
            backend,
            connector,
        )
    }

    async fn logged_in() -> (Session<FakeBackend, FakeConnector>, FakeBackend, FakeConnector) {
        let (mut session, backend, connector) = session();
        assert!(session.login(Credentials::new("alice", "secret")).await);
        session.process_pending_signals().await;
        (session, backend, connector)
    }

    fn fill_valid_draft(session: &mut Session<FakeBackend, FakeConnector>) {
        let draft = session.draft_mut();
        draft.quiz_name = Some("History Quiz".into());
        draft.content = Some("a".repeat(500));
        draft.question_types = vec!["multi-choice".into()];
        draft.num_questions = Some("10".into());
    }

    fn messages(session: &Session<FakeBackend, FakeConnector>) -> Vec<&str> {
        session
            .state()
            .alerts
            .iter()
            .map(|a| a.message.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_login_connects_realtime_channel() {
        let (session, backend, connector) = logged_in().await;
        assert_eq!(session.state().view, View::Dashboard);
        assert_eq!(session.state().connection, ConnectionState::Connected);
        assert_eq!(backend.count("negotiate"), 1);
        assert_eq!(backend.count("list"), 1);
        assert!(connector.0.lock().unwrap()[0].url.contains("access_token=t1"));
    }

    #[tokio::test]
    async fn test_submit_then_processed_event_lists_quiz() {
        let (mut session, backend, connector) = logged_in().await;
        fill_valid_draft(&mut session);

        let ack = session.submit_quiz().await.unwrap();
        assert_eq!(ack.name, "History Quiz");
        assert!(!session.state().contains_quiz(&ack.id));
        assert!(session.state().draft.quiz_name.is_none());
        assert_eq!(messages(&session), vec![QUIZ_SUBMITTED]);

        backend.finish_jobs();
        connector.send(0, SignalKind::Message(PROCESSED.into()));
        session.process_pending_signals().await;

        assert!(session.state().contains_quiz(&ack.id));
        assert_eq!(messages(&session), vec![QUIZ_SUBMITTED, QUIZ_CREATED]);
    }

    #[tokio::test]
    async fn test_empty_draft_is_rejected_locally() {
        let (mut session, backend, _) = logged_in().await;
        session.draft_mut().quiz_name = Some(String::new());
        session.draft_mut().content = Some(String::new());

        assert!(session.submit_quiz().await.is_none());
        assert_eq!(messages(&session), vec!["A quiz name is required!"]);
        assert_eq!(backend.count("create"), 0);
    }

    #[tokio::test]
    async fn test_four_files_are_rejected_locally() {
        let (mut session, backend, _) = logged_in().await;
        fill_valid_draft(&mut session);
        session.draft_mut().files = (0..4)
            .map(|i| UploadedFile::new(format!("{i}.pdf"), MIME_PDF, vec![1]))
            .collect();

        assert!(session.submit_quiz().await.is_none());
        assert_eq!(messages(&session), vec!["Maximum 3 files allowed"]);
        assert_eq!(backend.count("create"), 0);
    }

    #[tokio::test]
    async fn test_duplicate_processed_events_are_idempotent() {
        let (mut session, backend, connector) = logged_in().await;
        fill_valid_draft(&mut session);
        session.submit_quiz().await.unwrap();
        backend.finish_jobs();

        connector.send(0, SignalKind::Message(PROCESSED.into()));
        session.process_pending_signals().await;
        let once = session.state().own_quizzes.clone();

        connector.send(0, SignalKind::Message(PROCESSED.into()));
        session.process_pending_signals().await;
        assert_eq!(session.state().own_quizzes, once);
        assert_eq!(once.len(), 1);
    }

    #[tokio::test]
    async fn test_errored_event_refetches_and_alerts() {
        let (mut session, backend, connector) = logged_in().await;
        let lists_before = backend.count("list");
        connector.send(
            0,
            SignalKind::Message(r#"{"data":{"type":"quiz_errored","error":"boom"}}"#.into()),
        );
        session.process_pending_signals().await;
        assert_eq!(backend.count("list"), lists_before + 1);
        assert_eq!(messages(&session), vec![QUIZ_FAILED]);
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_frames_are_ignored() {
        let (mut session, backend, connector) = logged_in().await;
        let lists_before = backend.count("list");
        connector.send(0, SignalKind::Message("{not json".into()));
        connector.send(0, SignalKind::Message(r#"{"data":{"type":"quiz_shared"}}"#.into()));
        connector.send(
            0,
            SignalKind::Message(r#"{"type":"system","event":"connected"}"#.into()),
        );
        session.process_pending_signals().await;
        assert_eq!(backend.count("list"), lists_before);
        assert!(session.state().alerts.is_empty());
        assert_eq!(session.state().connection, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_dropped_connection_then_manual_refresh() {
        let (mut session, backend, connector) = logged_in().await;
        fill_valid_draft(&mut session);
        let ack = session.submit_quiz().await.unwrap();

        connector.send(0, SignalKind::Closed);
        session.process_pending_signals().await;
        assert_eq!(session.state().connection, ConnectionState::Disconnected);

        backend.finish_jobs();
        assert!(!session.state().contains_quiz(&ack.id));
        assert!(session.refresh().await);
        assert!(session.state().contains_quiz(&ack.id));
        // no silent reconnect
        assert_eq!(backend.count("negotiate"), 1);
    }

    #[tokio::test]
    async fn test_logout_closes_channel_and_drops_stale_signals() {
        let (mut session, backend, connector) = logged_in().await;
        fill_valid_draft(&mut session);
        session.submit_quiz().await.unwrap();
        let old_generation = session.generation();

        session.logout().await;
        assert!(connector.is_closed(0));
        assert_eq!(session.state().view, View::Login);
        assert_eq!(session.state().connection, ConnectionState::Disconnected);
        assert!(session.state().own_quizzes.is_empty());

        backend.finish_jobs();
        connector.send(0, SignalKind::Message(PROCESSED.into()));
        let lists_before = backend.count("list");
        session.process_pending_signals().await;
        assert_eq!(backend.count("list"), lists_before);

        assert!(session.login(Credentials::new("alice", "secret")).await);
        assert_eq!(backend.count("negotiate"), 2);
        assert_ne!(session.generation(), old_generation);
        assert!(connector.0.lock().unwrap()[1].url.contains("access_token=t2"));

        // the old socket fires again after the new one is up
        let lists_before = backend.count("list");
        connector.send(0, SignalKind::Message(PROCESSED.into()));
        session.process_pending_signals().await;
        assert_eq!(backend.count("list"), lists_before);
        assert!(!messages(&session).contains(&QUIZ_CREATED));
        assert_eq!(session.state().connection, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_unreachable_server_raises_single_alert() {
        let (mut session, backend, _) = session();
        backend.0.lock().unwrap().unreachable = true;
        assert!(!session.login(Credentials::new("alice", "secret")).await);
        assert_eq!(messages(&session), vec!["Unable to connect to server"]);
        assert_eq!(session.state().view, View::Login);
        assert_eq!(session.state().connection, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_rejected_login_shows_server_message() {
        let (mut session, backend, _) = session();
        assert!(!session.login(Credentials::new("alice", "wrong")).await);
        assert_eq!(messages(&session), vec!["Incorrect password"]);
        assert_eq!(backend.count("negotiate"), 0);

        assert!(!session.login(Credentials::new("alice", "")).await);
        assert_eq!(backend.count("login"), 1);
        assert_eq!(messages(&session).last(), Some(&MISSING_CREDENTIALS));
    }

    #[tokio::test]
    async fn test_negotiate_failure_leaves_session_disconnected() {
        let (mut session, backend, connector) = session();
        backend.0.lock().unwrap().fail_negotiate = true;
        assert!(session.login(Credentials::new("alice", "secret")).await);
        assert_eq!(session.state().view, View::Dashboard);
        assert_eq!(session.state().connection, ConnectionState::Disconnected);
        assert!(connector.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_without_session_is_silent() {
        let (mut session, _, _) = session();
        assert!(!session.restore().await);
        assert!(session.state().alerts.is_empty());
        session.navigate(View::Dashboard);
        assert_eq!(session.state().view, View::Login);
    }
}
