use crate::cli::open_session;
use crate::error::Result;

pub async fn execute(api_url: Option<String>) -> Result<()> {
    let (_config, session) = open_session(api_url)?;

    session.logout().await;

    println!("✓ Logged out successfully");
    println!("  Run 'jornada login' or 'jornada cedula' to start a new session.");

    Ok(())
}
