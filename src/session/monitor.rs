use super::SessionManager;
use crate::expiry::ExpiryPolicy;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Notifications for the view that owns the monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Session is about to expire; shown once per danger window
    ExpiryWarning { minutes_remaining: i64 },
    Renewed { minutes_remaining: i64 },
    /// Renewal failed and the session has been torn down
    SessionEnded,
}

/// Background expiry check for one mounted view.
///
/// Dropping the monitor cancels its task.
pub struct SessionMonitor {
    handle: JoinHandle<()>,
    visible: watch::Sender<bool>,
}

impl SessionMonitor {
    pub fn spawn(
        session: Arc<SessionManager>,
        policy: ExpiryPolicy,
        period: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (visible_tx, visible_rx) = watch::channel(true);

        let handle = tokio::spawn(run(session, policy, period, visible_rx, events_tx));

        (
            Self {
                handle,
                visible: visible_tx,
            },
            events_rx,
        )
    }

    /// Pause checks while hidden; a check runs right away on becoming visible
    pub fn set_visible(&self, visible: bool) {
        self.visible.send_replace(visible);
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    session: Arc<SessionManager>,
    policy: ExpiryPolicy,
    period: Duration,
    mut visible: watch::Receiver<bool>,
    events: mpsc::UnboundedSender<MonitorEvent>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut warned = false;

    loop {
        if !*visible.borrow_and_update() {
            tracing::debug!("Session monitor paused");
            if visible.wait_for(|v| *v).await.is_err() {
                break;
            }
            tracing::debug!("Session monitor resumed");
            ticker.reset_immediately();
        }

        tokio::select! {
            _ = ticker.tick() => {}
            changed = visible.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        if !check(&session, &policy, &mut warned, &events).await {
            break;
        }
    }

    tracing::debug!("Session monitor stopped");
}

/// One tick. Returns `false` once nobody is listening any more.
async fn check(
    session: &SessionManager,
    policy: &ExpiryPolicy,
    warned: &mut bool,
    events: &mpsc::UnboundedSender<MonitorEvent>,
) -> bool {
    // A refresh token alone still counts: the missing access token reads as expired
    if session.access_token().is_none() && !session.has_refresh_token() {
        return !events.is_closed();
    }

    let remaining = session.time_remaining_minutes();
    let decision = policy.evaluate(remaining, warned);
    tracing::debug!("Session check: {} minutes remaining", remaining);

    if decision.warn
        && events
            .send(MonitorEvent::ExpiryWarning {
                minutes_remaining: remaining,
            })
            .is_err()
    {
        return false;
    }

    if decision.refresh {
        let event = if session.renew_if_expiring(policy.refresh_at_minutes).await {
            let minutes_remaining = session.time_remaining_minutes();
            if minutes_remaining > policy.warn_at_minutes {
                *warned = false;
            }
            MonitorEvent::Renewed { minutes_remaining }
        } else {
            MonitorEvent::SessionEnded
        };

        if events.send(event).is_err() {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::test_tokens::token_expiring_in;
    use crate::auth::{MemoryStore, MockAuthApi, SessionStore, REFRESH_TOKEN_KEY, TOKEN_KEY};
    use crate::error::TrackerError;
    use crate::models::TokenPair;

    const PERIOD: Duration = Duration::from_secs(60);

    fn session_with(token: &str, api: MockAuthApi) -> (Arc<SessionManager>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, token).unwrap();
        store.set(REFRESH_TOKEN_KEY, "r-1").unwrap();
        (
            Arc::new(SessionManager::new(store.clone(), Arc::new(api))),
            store,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_healthy_session_is_quiet() {
        let mut api = MockAuthApi::new();
        api.expect_refresh_token().times(0);
        let (session, _store) = session_with(&token_expiring_in(chrono::Duration::hours(1)), api);

        let (monitor, mut events) = SessionMonitor::spawn(session, ExpiryPolicy::default(), PERIOD);
        tokio::time::sleep(PERIOD * 3).await;

        assert!(events.try_recv().is_err());
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_warns_once_then_renews() {
        let mut api = MockAuthApi::new();
        api.expect_refresh_token().times(1).returning(|_| {
            Ok(TokenPair {
                token: token_expiring_in(chrono::Duration::minutes(30)),
                refresh_token: "r-2".to_string(),
            })
        });
        let (session, store) =
            session_with(&token_expiring_in(chrono::Duration::seconds(100)), api);

        let (_monitor, mut events) =
            SessionMonitor::spawn(session, ExpiryPolicy::default(), PERIOD);

        let first = events.recv().await.unwrap();
        assert_eq!(
            first,
            MonitorEvent::ExpiryWarning {
                minutes_remaining: 1
            }
        );

        match events.recv().await.unwrap() {
            MonitorEvent::Renewed { minutes_remaining } => assert!(minutes_remaining >= 29),
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r-2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_renewal_ends_session() {
        let mut api = MockAuthApi::new();
        api.expect_refresh_token().times(1).returning(|_| {
            Err(TrackerError::Api {
                status: 401,
                message: "expired".to_string(),
            })
        });
        let (session, store) =
            session_with(&token_expiring_in(-chrono::Duration::minutes(1)), api);

        let (_monitor, mut events) =
            SessionMonitor::spawn(session, ExpiryPolicy::default(), PERIOD);

        assert!(matches!(
            events.recv().await,
            Some(MonitorEvent::ExpiryWarning { .. })
        ));
        assert_eq!(events.recv().await, Some(MonitorEvent::SessionEnded));
        assert!(store.keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_renews_when_only_refresh_token_is_stored() {
        let mut api = MockAuthApi::new();
        api.expect_refresh_token()
            .withf(|refresh_token| refresh_token == "r-1")
            .times(1)
            .returning(|_| {
                Ok(TokenPair {
                    token: token_expiring_in(chrono::Duration::minutes(30)),
                    refresh_token: "r-2".to_string(),
                })
            });
        let store = Arc::new(MemoryStore::new());
        store.set(REFRESH_TOKEN_KEY, "r-1").unwrap();
        let session = Arc::new(SessionManager::new(store.clone(), Arc::new(api)));

        let (_monitor, mut events) =
            SessionMonitor::spawn(session, ExpiryPolicy::default(), PERIOD);

        assert_eq!(
            events.recv().await,
            Some(MonitorEvent::ExpiryWarning {
                minutes_remaining: 0
            })
        );
        match events.recv().await.unwrap() {
            MonitorEvent::Renewed { minutes_remaining } => assert!(minutes_remaining >= 29),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(store.get(TOKEN_KEY).unwrap().is_some());
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r-2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_store_is_quiet() {
        let mut api = MockAuthApi::new();
        api.expect_refresh_token().times(0);
        let session = Arc::new(SessionManager::new(
            Arc::new(MemoryStore::new()),
            Arc::new(api),
        ));

        let (monitor, mut events) = SessionMonitor::spawn(session, ExpiryPolicy::default(), PERIOD);
        tokio::time::sleep(PERIOD * 3).await;

        assert!(events.try_recv().is_err());
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_view_skips_checks() {
        let mut api = MockAuthApi::new();
        api.expect_refresh_token().times(0);
        // Inside the warn window but above the refresh watermark
        let expires_in = chrono::Duration::minutes(3) + chrono::Duration::seconds(30);
        let (session, _store) = session_with(&token_expiring_in(expires_in), api);

        let (monitor, mut events) =
            SessionMonitor::spawn(session, ExpiryPolicy::default(), PERIOD);
        monitor.set_visible(false);
        tokio::time::sleep(PERIOD * 2).await;
        // The first tick may already have fired before the pause took effect
        let before = std::iter::from_fn(|| events.try_recv().ok()).count();
        assert!(before <= 1);

        tokio::time::sleep(PERIOD * 5).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_task() {
        let api = MockAuthApi::new();
        let (session, _store) = session_with(&token_expiring_in(chrono::Duration::hours(1)), api);

        let (monitor, mut events) = SessionMonitor::spawn(session, ExpiryPolicy::default(), PERIOD);
        monitor.stop();

        // Sender dropped with the aborted task
        assert_eq!(events.recv().await, None);
    }
}
