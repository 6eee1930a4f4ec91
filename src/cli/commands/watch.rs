use crate::cli::open_session;
use crate::error::{Result, TrackerError};
use crate::session::{MonitorEvent, SessionEvent, SessionMonitor};
use tokio::sync::broadcast::error::RecvError;

pub async fn execute(api_url: Option<String>) -> Result<()> {
    let (config, session) = open_session(api_url)?;

    if !session.is_authenticated() {
        return Err(TrackerError::NoSessionFound);
    }

    let policy = config.session.expiry_policy();
    let period = config.session.check_interval();
    let mut session_events = session.subscribe();
    let (monitor, mut events) = SessionMonitor::spawn(session.clone(), policy, period);

    println!(
        "Watching session (expires in {} minutes). Press Ctrl-C to stop.",
        session.time_remaining_minutes()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopped watching.");
                break;
            }
            event = events.recv() => match event {
                Some(MonitorEvent::ExpiryWarning { minutes_remaining }) => {
                    println!(
                        "⚠ Session expires in {} minute(s); it will be renewed automatically",
                        minutes_remaining
                    );
                }
                Some(MonitorEvent::Renewed { minutes_remaining }) => {
                    println!("✓ Session renewed (expires in {} minutes)", minutes_remaining);
                }
                Some(MonitorEvent::SessionEnded) | None => break,
            },
            event = session_events.recv() => match event {
                Ok(SessionEvent::LoginRequired) | Ok(SessionEvent::LoggedOut) => break,
                Ok(SessionEvent::Refreshed) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
        }
    }

    monitor.stop();

    if session.is_authenticated() {
        Ok(())
    } else {
        Err(TrackerError::AuthenticationFailed(
            "Session ended; run 'jornada login' or 'jornada cedula' again".to_string(),
        ))
    }
}
