use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::info;

pub const HOME_ROUTE: &str = "/home";

/// Authenticated identity returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Value,
    pub token: String,
}

pub trait SessionStore: Send + Sync {
    fn set_login(&self, session: Session);
}

pub trait Navigator: Send + Sync {
    fn go_to(&self, route: &str);
}

/// Process-wide session holder; other components observe it via
/// [`InMemorySessionStore::subscribe`].
pub struct InMemorySessionStore {
    current: watch::Sender<Option<Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn set_login(&self, session: Session) {
        self.current.send_replace(Some(session));
    }
}

/// Navigator that only records the requested route.
pub struct RecordingNavigator {
    route: watch::Sender<Option<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        let (route, _) = watch::channel(None);
        Self { route }
    }

    pub fn current_route(&self) -> Option<String> {
        self.route.borrow().clone()
    }
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, route: &str) {
        info!(route, "navigation: route change requested");
        self.route.send_replace(Some(route.to_string()));
    }
}

pub struct SessionEstablisher {
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    home_route: String,
}

impl SessionEstablisher {
    pub fn new(store: Arc<dyn SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            home_route: HOME_ROUTE.to_string(),
        }
    }

    pub fn with_home_route(mut self, route: impl Into<String>) -> Self {
        self.home_route = route.into();
        self
    }

    /// Hands the session to the store, then moves to the authenticated area.
    /// Takes the session by value so one login answer commits at most once.
    pub fn commit(&self, session: Session) {
        info!(route = %self.home_route, "session: login committed");
        self.store.set_login(session);
        self.navigator.go_to(&self.home_route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commit_stores_session_then_navigates_home() {
        let store = Arc::new(InMemorySessionStore::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let mut sessions = store.subscribe();
        let establisher = SessionEstablisher::new(store.clone(), navigator.clone());

        let session = Session {
            user: json!({"_id": "u1", "username": "gunner"}),
            token: "jwt".to_string(),
        };
        establisher.commit(session.clone());

        assert!(sessions.has_changed().expect("store alive"));
        assert_eq!(*sessions.borrow_and_update(), Some(session.clone()));
        assert_eq!(store.current(), Some(session));
        assert_eq!(navigator.current_route().as_deref(), Some(HOME_ROUTE));
    }

    #[test]
    fn home_route_is_configurable() {
        let navigator = Arc::new(RecordingNavigator::new());
        SessionEstablisher::new(Arc::new(InMemorySessionStore::new()), navigator.clone())
            .with_home_route("/feed")
            .commit(Session {
                user: json!({"id": 1}),
                token: "t".to_string(),
            });
        assert_eq!(navigator.current_route().as_deref(), Some("/feed"));
    }
}
