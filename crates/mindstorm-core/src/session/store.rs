//! Session registry: creation with unique codes, lookup and eviction.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::bus::NotificationBus;
use super::code::{CodeGenerator, SessionCode};
use super::live::Session;
use super::model::CloseReason;
use crate::config::{CodeConfig, SubmissionLimits};
use crate::error::{MindstormError, Result};

/// Owns every live session, keyed by code.
///
/// `create`, `lookup` and `evict` are serialized through one registry lock,
/// so a code is never observed half-registered and never handed out twice.
/// Eviction removes the entry and then closes the session: callers that
/// already hold an `Arc` see their in-flight calls finish, after which every
/// mutation fails with `SessionClosed`.
pub struct SessionStore {
    limits: SubmissionLimits,
    codes: CodeConfig,
    generator: CodeGenerator,
    bus: Arc<NotificationBus>,
    sessions: RwLock<HashMap<SessionCode, Arc<Session>>>,
}

impl SessionStore {
    pub fn new(limits: SubmissionLimits, codes: CodeConfig, bus: Arc<NotificationBus>) -> Self {
        let generator = CodeGenerator::new(codes.length);
        Self {
            limits,
            codes,
            generator,
            bus,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a session under a freshly generated unique code and registers
    /// its event channel.
    pub async fn create(&self, topic: &str, moderator: &str) -> Result<Arc<Session>> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(MindstormError::validation("topic must not be empty"));
        }
        let chars = topic.chars().count();
        if chars > self.limits.max_topic_chars {
            return Err(MindstormError::validation(format!(
                "topic exceeds {} characters (got {chars})",
                self.limits.max_topic_chars
            )));
        }
        let moderator = moderator.trim();
        if moderator.is_empty() {
            return Err(MindstormError::validation("moderator name must not be empty"));
        }

        let mut sessions = self.sessions.write().await;
        let code = self.unique_code(&sessions)?;
        let events = self.bus.register(code.clone());
        let session = Arc::new(Session::new(
            code.clone(),
            topic,
            moderator,
            self.limits.clone(),
            events,
        ));
        sessions.insert(code.clone(), Arc::clone(&session));
        tracing::info!(code = %code, topic, "session created");
        Ok(session)
    }

    fn unique_code(&self, sessions: &HashMap<SessionCode, Arc<Session>>) -> Result<SessionCode> {
        for _ in 0..self.codes.max_attempts {
            let code = self.generator.generate();
            if !sessions.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(MindstormError::resource_exhausted(format!(
            "no unique session code after {} attempts",
            self.codes.max_attempts
        )))
    }

    /// Looks up a session by code. Input is normalized first, so codes typed
    /// in lowercase work.
    pub async fn lookup(&self, code: &str) -> Result<Arc<Session>> {
        let code = SessionCode::normalize(code);
        let sessions = self.sessions.read().await;
        sessions
            .get(&code)
            .cloned()
            .ok_or_else(|| MindstormError::not_found("session", code.as_str()))
    }

    /// Removes a session from the registry and closes it.
    pub async fn evict(&self, code: &str, reason: CloseReason) -> Result<()> {
        let code = SessionCode::normalize(code);
        let session = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(&code)
        }
        .ok_or_else(|| MindstormError::not_found("session", code.as_str()))?;

        self.bus.unregister(&code);
        // Already closed is fine here.
        let _ = session.close(reason).await;
        tracing::info!(code = %code, ?reason, "session evicted");
        Ok(())
    }

    /// All live sessions, for sweeps and listings.
    pub async fn live_sessions(&self) -> Vec<Arc<Session>> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub fn bus(&self) -> &Arc<NotificationBus> {
        &self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionEvent;
    use tokio::task::JoinSet;

    fn relaxed_limits() -> SubmissionLimits {
        SubmissionLimits {
            min_interval_ms: 0,
            max_identical_per_author: 0,
            ..SubmissionLimits::default()
        }
    }

    fn new_store() -> SessionStore {
        SessionStore::new(
            relaxed_limits(),
            CodeConfig::default(),
            Arc::new(NotificationBus::default()),
        )
    }

    #[tokio::test]
    async fn test_create_validates_inputs() {
        let store = new_store();
        assert!(store.create("  ", "ana").await.unwrap_err().is_validation());
        assert!(
            store
                .create("Team offsite", "  ")
                .await
                .unwrap_err()
                .is_validation()
        );
        let long_topic = "x".repeat(201);
        assert!(
            store
                .create(&long_topic, "ana")
                .await
                .unwrap_err()
                .is_validation()
        );
    }

    #[tokio::test]
    async fn test_lookup_normalizes_code() {
        let store = new_store();
        let session = store.create("Team offsite", "ana").await.unwrap();
        let code = session.code().as_str().to_lowercase();

        let found = store.lookup(&format!("  {code} ")).await.unwrap();
        assert_eq!(found.code(), session.code());
    }

    #[tokio::test]
    async fn test_lookup_unknown_code_is_not_found() {
        let store = new_store();
        let err = store.lookup("NOPE42").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_created_sessions_get_distinct_codes() {
        let store = new_store();
        let mut codes = std::collections::HashSet::new();
        for _ in 0..50 {
            let session = store.create("Team offsite", "ana").await.unwrap();
            assert!(codes.insert(session.code().clone()));
        }
        assert_eq!(store.live_sessions().await.len(), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_never_collide() {
        let store = Arc::new(new_store());
        let mut tasks = JoinSet::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            tasks.spawn(async move { store.create("Team offsite", "ana").await.unwrap() });
        }

        let mut codes = std::collections::HashSet::new();
        while let Some(result) = tasks.join_next().await {
            let session = result.unwrap();
            assert!(codes.insert(session.code().clone()));
        }
    }

    #[tokio::test]
    async fn test_saturated_code_space_reports_resource_exhausted() {
        // One-character codes: 36 possible values. Creating sessions until
        // failure must end in ResourceExhausted, never a duplicate code.
        let store = SessionStore::new(
            relaxed_limits(),
            CodeConfig {
                length: 1,
                max_attempts: 8,
            },
            Arc::new(NotificationBus::default()),
        );

        let mut codes = std::collections::HashSet::new();
        let err = loop {
            match store.create("Team offsite", "ana").await {
                Ok(session) => assert!(codes.insert(session.code().clone())),
                Err(err) => break err,
            }
            assert!(codes.len() <= 36, "more codes than the space allows");
        };
        assert!(matches!(err, MindstormError::ResourceExhausted { .. }));
    }

    #[tokio::test]
    async fn test_evict_closes_and_forgets_the_session() {
        let store = new_store();
        let session = store.create("Team offsite", "ana").await.unwrap();
        let code = session.code().as_str().to_string();
        session.submit_idea("ana", "beach day").await.unwrap();

        store.evict(&code, CloseReason::IdleTimeout).await.unwrap();

        // The code is gone from the registry.
        assert!(store.lookup(&code).await.unwrap_err().is_not_found());

        // A caller still holding the Arc gets a clean close error, not a
        // dangling reference.
        let err = session.submit_idea("bob", "too late").await.unwrap_err();
        assert!(matches!(err, MindstormError::SessionClosed { .. }));

        // Reads keep working on the evicted session.
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.idea_count(), 1);
    }

    #[tokio::test]
    async fn test_evict_unknown_code_is_not_found() {
        let store = new_store();
        let err = store
            .evict("NOPE42", CloseReason::IdleTimeout)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_eviction_delivers_close_event_to_subscribers() {
        let store = new_store();
        let session = store.create("Team offsite", "ana").await.unwrap();
        let mut events = store
            .bus()
            .subscribe(session.code())
            .unwrap();

        store
            .evict(session.code().as_str(), CloseReason::IdleTimeout)
            .await
            .unwrap();

        match events.next().await.unwrap() {
            SessionEvent::Closed { reason } => assert_eq!(reason, CloseReason::IdleTimeout),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_explicit_close_keeps_session_readable_via_lookup() {
        let store = new_store();
        let session = store.create("Team offsite", "ana").await.unwrap();
        session.submit_idea("ana", "beach day").await.unwrap();
        session.close(CloseReason::Moderator).await.unwrap();

        // Closed but not evicted: still in the registry for viewing.
        let found = store.lookup(session.code().as_str()).await.unwrap();
        assert!(found.status().await.is_closed());
        assert_eq!(found.snapshot().await.idea_count(), 1);
    }
}
