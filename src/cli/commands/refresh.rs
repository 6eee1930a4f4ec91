use crate::cli::open_session;
use crate::error::{Result, TrackerError};

pub async fn execute(api_url: Option<String>, force: bool) -> Result<()> {
    let (_config, session) = open_session(api_url)?;

    if !session.has_refresh_token() {
        return Err(TrackerError::NoSessionFound);
    }

    let renewed = if force {
        session.renew_if_expiring(i64::MAX).await
    } else {
        session.refresh_if_needed().await
    };

    if !renewed {
        return Err(TrackerError::AuthenticationFailed(
            "Session could not be renewed and has been cleared; log in again".to_string(),
        ));
    }

    println!(
        "✓ Session valid (expires in {} minutes)",
        session.time_remaining_minutes()
    );

    Ok(())
}
