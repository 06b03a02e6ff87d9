//! Login screen controller.
//!
//! `LoginFlow` owns everything the login screen does that is not drawing:
//! the session bootstrap check, local validation, the in-flight request and
//! what happens when it comes back. Slow work (the storage read and the HTTP
//! call) runs on spawned tasks that report back over an MPSC channel. The
//! owner drains the channel from its event loop with [`LoginFlow::tick`].
//!
//! Every activation of the screen gets a fresh generation number. Messages
//! from an older generation, or arriving while the screen is inactive, are
//! dropped without touching storage or navigation.

use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::auth::{Credentials, Session, ValidationError};

/// Buffer size for the task message channel.
/// At most one storage check and one login request are in flight at a time.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Where the login screen hands off to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The authenticated area
    Main,
    /// Account registration
    Register,
}

/// User-facing alert raised by the login screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginAlert {
    /// Local form check failed; nothing was sent
    Validation(ValidationError),
    /// Anything that went wrong talking to the backend
    LoginFailed,
}

impl LoginAlert {
    pub fn title(&self) -> &'static str {
        match self {
            LoginAlert::Validation(_) => "Validation Error",
            LoginAlert::LoginFailed => "Login error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            LoginAlert::Validation(e) => e.to_string(),
            LoginAlert::LoginFailed => "An error occurred while logging in.".to_string(),
        }
    }
}

/// What `LoginFlow::submit` did with the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Request is on its way
    Submitted,
    /// Form failed a local check
    Rejected(ValidationError),
    /// A request is already in flight
    Busy,
    /// Screen is not active
    Inactive,
}

enum FlowMessage {
    /// Result of the bootstrap storage read: whether a token exists
    SessionChecked(Result<bool>),
    /// Result of the login request
    LoginFinished(Result<String>),
}

struct Tagged {
    generation: u64,
    message: FlowMessage,
}

pub struct LoginFlow {
    api: ApiClient,
    session: Session,
    redirect_delay: Duration,

    active: bool,
    generation: u64,
    loading: bool,
    alert: Option<LoginAlert>,
    redirect_at: Option<Instant>,

    tasks: Vec<JoinHandle<()>>,
    /// Token writes; never aborted, they outlive the screen
    writes: Vec<JoinHandle<()>>,
    tx: mpsc::Sender<Tagged>,
    rx: mpsc::Receiver<Tagged>,
}

impl LoginFlow {
    pub fn new(api: ApiClient, session: Session, redirect_delay: Duration) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            api,
            session,
            redirect_delay,
            active: false,
            generation: 0,
            loading: false,
            alert: None,
            redirect_at: None,
            tasks: Vec::new(),
            writes: Vec::new(),
            tx,
            rx,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Show the screen and start the session bootstrap check.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        self.generation += 1;
        self.loading = false;
        self.alert = None;
        self.redirect_at = None;

        let session = self.session.clone();
        let tx = self.tx.clone();
        let generation = self.generation;
        debug!(generation, "Login screen activated, checking stored session");

        let handle = tokio::task::spawn_blocking(move || {
            let checked = session.load().map(|token| token.is_some());
            let message = FlowMessage::SessionChecked(checked);
            if tx.blocking_send(Tagged { generation, message }).is_err() {
                debug!("Login flow dropped before session check finished");
            }
        });
        self.tasks.push(handle);
    }

    /// Hide the screen. In-flight work is aborted and any result it still
    /// produces is discarded.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.generation += 1;
        self.loading = false;
        self.redirect_at = None;

        for handle in self.tasks.drain(..) {
            handle.abort();
        }
        while self.rx.try_recv().is_ok() {}
        debug!("Login screen deactivated");
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Validate the form and, if it passes, send it to the backend.
    pub fn submit(&mut self, credentials: Credentials) -> SubmitOutcome {
        if !self.active {
            warn!("Login submitted while screen inactive");
            return SubmitOutcome::Inactive;
        }
        if self.loading {
            debug!("Login already in flight, ignoring submit");
            return SubmitOutcome::Busy;
        }

        if let Err(e) = credentials.validate() {
            debug!(reason = %e, "Login form rejected");
            self.alert = Some(LoginAlert::Validation(e));
            return SubmitOutcome::Rejected(e);
        }

        self.loading = true;
        self.alert = None;
        info!(email = %credentials.normalized_email(), "Logging in");

        let api = self.api.clone();
        let tx = self.tx.clone();
        let generation = self.generation;
        let handle = tokio::spawn(async move {
            let result = api.login(&credentials).await;
            drop(credentials);
            let message = FlowMessage::LoginFinished(result);
            if tx.send(Tagged { generation, message }).await.is_err() {
                debug!("Login flow dropped before request finished");
            }
        });
        self.tasks.push(handle);

        SubmitOutcome::Submitted
    }

    // =========================================================================
    // Event loop integration
    // =========================================================================

    /// Apply finished background work and fire a due redirect.
    ///
    /// Returns the route to navigate to, if any.
    pub fn tick(&mut self, now: Instant) -> Option<Route> {
        self.tasks.retain(|handle| !handle.is_finished());
        self.writes.retain(|handle| !handle.is_finished());

        let mut route = None;
        while let Ok(tagged) = self.rx.try_recv() {
            if let Some(r) = self.apply(tagged, now) {
                route = Some(r);
            }
        }
        if route.is_some() {
            return route;
        }

        match self.redirect_at {
            Some(at) if now >= at => {
                self.redirect_at = None;
                info!("Existing session found, entering main area");
                Some(Route::Main)
            }
            _ => None,
        }
    }

    /// Wait for the next background result and apply it.
    ///
    /// Only call this with work in flight; otherwise it waits forever.
    pub async fn wait_for_update(&mut self) -> Option<Route> {
        let tagged = self.rx.recv().await?;
        self.apply(tagged, Instant::now())
    }

    /// Wait until every token write started by a successful login is done.
    pub async fn finish_pending_writes(&mut self) {
        for handle in self.writes.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "Session write task failed");
            }
        }
    }

    fn save_token(&mut self, token: String) {
        let session = self.session.clone();
        let handle = tokio::task::spawn_blocking(move || {
            if let Err(e) = session.save(&token) {
                warn!(error = %format!("{:#}", e), "Failed to save session");
            }
        });
        self.writes.push(handle);
    }

    fn apply(&mut self, tagged: Tagged, now: Instant) -> Option<Route> {
        if !self.active || tagged.generation != self.generation {
            debug!(
                generation = tagged.generation,
                current = self.generation,
                "Discarding result for inactive login screen"
            );
            return None;
        }

        match tagged.message {
            FlowMessage::SessionChecked(Ok(true)) => {
                if self.redirect_at.is_none() {
                    self.redirect_at = Some(now + self.redirect_delay);
                }
                None
            }
            FlowMessage::SessionChecked(Ok(false)) => None,
            FlowMessage::SessionChecked(Err(e)) => {
                warn!(error = %format!("{:#}", e), "Failed to read stored session");
                None
            }
            FlowMessage::LoginFinished(Ok(token)) => {
                self.loading = false;
                self.save_token(token);
                info!("Login successful");
                Some(Route::Main)
            }
            FlowMessage::LoginFinished(Err(e)) => {
                self.loading = false;
                error!(error = %format!("{:#}", e), "Login failed");
                self.alert = Some(LoginAlert::LoginFailed);
                None
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn alert(&self) -> Option<LoginAlert> {
        self.alert
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Whether a stored session was found and the redirect is pending
    pub fn redirect_pending(&self) -> bool {
        self.redirect_at.is_some()
    }
}

impl Drop for LoginFlow {
    fn drop(&mut self) {
        for handle in self.tasks.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::{KeyValueStore, MemoryStore, AUTH_TOKEN_KEY};

    const WAIT: Duration = Duration::from_secs(5);

    fn flow_for(server_uri: &str, store: Arc<MemoryStore>) -> LoginFlow {
        let api = ApiClient::with_base_url(server_uri).unwrap();
        LoginFlow::new(api, Session::new(store), Duration::from_millis(400))
    }

    async fn mount_login(server: &MockServer, template: ResponseTemplate, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(template)
            .expect(expected)
            .mount(server)
            .await;
    }

    /// Activate and consume the bootstrap check result
    async fn activated(flow: &mut LoginFlow) {
        flow.activate();
        let route = tokio::time::timeout(WAIT, flow.wait_for_update()).await.unwrap();
        assert_eq!(route, None);
    }

    #[tokio::test]
    async fn test_empty_fields_rejected_without_request() {
        let server = MockServer::start().await;
        mount_login(&server, ResponseTemplate::new(200), 0).await;
        let mut flow = flow_for(&server.uri(), Arc::new(MemoryStore::new()));
        activated(&mut flow).await;

        let outcome = flow.submit(Credentials::new("", "pw"));
        assert_eq!(outcome, SubmitOutcome::Rejected(ValidationError::MissingFields));
        assert_eq!(
            flow.alert(),
            Some(LoginAlert::Validation(ValidationError::MissingFields))
        );
        assert!(!flow.is_loading());

        let outcome = flow.submit(Credentials::new("jane@example.com", ""));
        assert_eq!(outcome, SubmitOutcome::Rejected(ValidationError::MissingFields));
    }

    #[tokio::test]
    async fn test_malformed_email_rejected_without_request() {
        let server = MockServer::start().await;
        mount_login(&server, ResponseTemplate::new(200), 0).await;
        let mut flow = flow_for(&server.uri(), Arc::new(MemoryStore::new()));
        activated(&mut flow).await;

        for email in ["jane.example.com", "jane@example"] {
            let outcome = flow.submit(Credentials::new(email, "pw"));
            assert_eq!(outcome, SubmitOutcome::Rejected(ValidationError::InvalidEmail));
        }
        let alert = flow.alert().unwrap();
        assert_eq!(alert.title(), "Validation Error");
        assert_eq!(alert.message(), "Please enter a valid email address.");
    }

    #[tokio::test]
    async fn test_successful_login_stores_token_and_navigates() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({ "token": "session-123" })),
            1,
        )
        .await;
        let store = Arc::new(MemoryStore::new());
        let mut flow = flow_for(&server.uri(), store.clone());
        activated(&mut flow).await;

        let outcome = flow.submit(Credentials::new("Jane@Example.com", "pw"));
        assert_eq!(outcome, SubmitOutcome::Submitted);
        assert!(flow.is_loading());

        let route = tokio::time::timeout(WAIT, flow.wait_for_update()).await.unwrap();
        assert_eq!(route, Some(Route::Main));
        assert!(!flow.is_loading());
        assert_eq!(flow.alert(), None);
        flow.finish_pending_writes().await;
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("session-123"));
    }

    #[tokio::test]
    async fn test_server_error_shows_generic_alert_and_stores_nothing() {
        let server = MockServer::start().await;
        mount_login(&server, ResponseTemplate::new(500), 1).await;
        let store = Arc::new(MemoryStore::new());
        let mut flow = flow_for(&server.uri(), store.clone());
        activated(&mut flow).await;

        assert_eq!(
            flow.submit(Credentials::new("jane@example.com", "pw")),
            SubmitOutcome::Submitted
        );
        let route = tokio::time::timeout(WAIT, flow.wait_for_update()).await.unwrap();

        assert_eq!(route, None);
        assert!(!flow.is_loading());
        let alert = flow.alert().unwrap();
        assert_eq!(alert, LoginAlert::LoginFailed);
        assert_eq!(alert.title(), "Login error");
        assert_eq!(alert.message(), "An error occurred while logging in.");
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);

        // Form stays usable: dismiss and the next submit goes out again
        flow.dismiss_alert();
        assert_eq!(flow.alert(), None);
    }

    #[tokio::test]
    async fn test_request_timeout_shows_generic_alert_and_stores_nothing() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "too-late" }))
                .set_delay(Duration::from_secs(2)),
            1,
        )
        .await;
        let store = Arc::new(MemoryStore::new());
        let api =
            ApiClient::with_base_url_and_timeout(&server.uri(), Duration::from_millis(200)).unwrap();
        let mut flow = LoginFlow::new(api, Session::new(store.clone()), Duration::ZERO);
        activated(&mut flow).await;

        assert_eq!(
            flow.submit(Credentials::new("jane@example.com", "pw")),
            SubmitOutcome::Submitted
        );
        let route = tokio::time::timeout(WAIT, flow.wait_for_update()).await.unwrap();

        assert_eq!(route, None);
        assert!(!flow.is_loading());
        assert_eq!(flow.alert(), Some(LoginAlert::LoginFailed));
        flow.finish_pending_writes().await;
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_then_retry_by_user_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t2" })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let mut flow = flow_for(&server.uri(), store.clone());
        activated(&mut flow).await;

        flow.submit(Credentials::new("jane@example.com", "pw"));
        let first = tokio::time::timeout(WAIT, flow.wait_for_update()).await.unwrap();
        assert_eq!(first, None);
        assert_eq!(flow.alert(), Some(LoginAlert::LoginFailed));

        assert_eq!(
            flow.submit(Credentials::new("jane@example.com", "pw")),
            SubmitOutcome::Submitted
        );
        assert_eq!(flow.alert(), None);
        let second = tokio::time::timeout(WAIT, flow.wait_for_update()).await.unwrap();
        assert_eq!(second, Some(Route::Main));
        flow.finish_pending_writes().await;
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn test_resubmit_while_in_flight_is_ignored() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "once" }))
                .set_delay(Duration::from_millis(300)),
            1,
        )
        .await;
        let mut flow = flow_for(&server.uri(), Arc::new(MemoryStore::new()));
        activated(&mut flow).await;

        let creds = Credentials::new("jane@example.com", "pw");
        assert_eq!(flow.submit(creds.clone()), SubmitOutcome::Submitted);
        assert_eq!(flow.submit(creds.clone()), SubmitOutcome::Busy);
        assert_eq!(flow.submit(creds), SubmitOutcome::Busy);

        let route = tokio::time::timeout(WAIT, flow.wait_for_update()).await.unwrap();
        assert_eq!(route, Some(Route::Main));
        // MockServer verifies the single expected call on drop
    }

    /// Store whose writes take a long time, like a keychain waiting on a prompt
    struct SlowStore {
        inner: MemoryStore,
        write_delay: Duration,
    }

    impl KeyValueStore for SlowStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            std::thread::sleep(self.write_delay);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_slow_token_write_does_not_block_tick() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({ "token": "slow-write" })),
            1,
        )
        .await;
        let store = Arc::new(SlowStore {
            inner: MemoryStore::new(),
            write_delay: Duration::from_millis(800),
        });
        let api = ApiClient::with_base_url(&server.uri()).unwrap();
        let mut flow = LoginFlow::new(api, Session::new(store.clone()), Duration::ZERO);
        activated(&mut flow).await;

        flow.submit(Credentials::new("jane@example.com", "pw"));

        let deadline = Instant::now() + WAIT;
        let route = loop {
            let started = Instant::now();
            let route = flow.tick(started);
            assert!(
                started.elapsed() < Duration::from_millis(200),
                "tick blocked for {:?}",
                started.elapsed()
            );
            if route.is_some() {
                break route;
            }
            assert!(Instant::now() < deadline, "login never finished");
            tokio::time::sleep(Duration::from_millis(10)).await;
        };
        assert_eq!(route, Some(Route::Main));

        flow.finish_pending_writes().await;
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("slow-write"));
    }

    #[tokio::test]
    async fn test_token_write_survives_deactivate() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({ "token": "kept" })),
            1,
        )
        .await;
        let store = Arc::new(MemoryStore::new());
        let mut flow = flow_for(&server.uri(), store.clone());
        activated(&mut flow).await;

        flow.submit(Credentials::new("jane@example.com", "pw"));
        let route = tokio::time::timeout(WAIT, flow.wait_for_update()).await.unwrap();
        assert_eq!(route, Some(Route::Main));

        // Navigating away right after success must not cancel the write
        flow.deactivate();
        flow.finish_pending_writes().await;
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn test_stored_token_redirects_after_delay() {
        let server = MockServer::start().await;
        mount_login(&server, ResponseTemplate::new(200), 0).await;
        let store = Arc::new(MemoryStore::new());
        store.set(AUTH_TOKEN_KEY, "existing").unwrap();
        let mut flow = flow_for(&server.uri(), store);

        flow.activate();
        let start = Instant::now();
        let route = tokio::time::timeout(WAIT, flow.wait_for_update()).await.unwrap();
        assert_eq!(route, None);
        assert!(flow.redirect_pending());

        assert_eq!(flow.tick(start), None);
        assert_eq!(flow.tick(start + Duration::from_secs(1)), Some(Route::Main));
        // Fires once
        assert_eq!(flow.tick(start + Duration::from_secs(2)), None);
    }

    #[tokio::test]
    async fn test_no_stored_token_shows_form() {
        let server = MockServer::start().await;
        let mut flow = flow_for(&server.uri(), Arc::new(MemoryStore::new()));
        activated(&mut flow).await;

        assert!(!flow.redirect_pending());
        assert_eq!(flow.tick(Instant::now() + Duration::from_secs(5)), None);
    }

    #[tokio::test]
    async fn test_response_after_deactivate_is_discarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "token": "late" }))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        let store = Arc::new(MemoryStore::new());
        let mut flow = flow_for(&server.uri(), store.clone());
        activated(&mut flow).await;

        assert_eq!(
            flow.submit(Credentials::new("jane@example.com", "pw")),
            SubmitOutcome::Submitted
        );
        flow.deactivate();
        assert!(!flow.is_loading());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(flow.tick(Instant::now()), None);
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);
        assert_eq!(flow.alert(), None);
    }

    #[tokio::test]
    async fn test_stale_result_ignored_after_reactivation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "token": "stale" }))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        let store = Arc::new(MemoryStore::new());
        let mut flow = flow_for(&server.uri(), store.clone());
        activated(&mut flow).await;

        flow.submit(Credentials::new("jane@example.com", "pw"));
        flow.deactivate();
        activated(&mut flow).await;

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(flow.tick(Instant::now()), None);
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_submit_while_inactive() {
        let server = MockServer::start().await;
        mount_login(&server, ResponseTemplate::new(200), 0).await;
        let mut flow = flow_for(&server.uri(), Arc::new(MemoryStore::new()));

        assert_eq!(
            flow.submit(Credentials::new("jane@example.com", "pw")),
            SubmitOutcome::Inactive
        );
    }

    #[test]
    fn test_alert_texts() {
        let missing = LoginAlert::Validation(ValidationError::MissingFields);
        assert_eq!(missing.title(), "Validation Error");
        assert_eq!(missing.message(), "Please fill in all fields.");
    }
}
