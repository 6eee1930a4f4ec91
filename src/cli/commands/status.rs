use crate::cli::open_session;
use crate::error::Result;
use crate::expiry;
use crate::models::SessionStatus;

pub async fn execute(api_url: Option<String>, json: bool) -> Result<()> {
    let (config, session) = open_session(api_url)?;
    let policy = config.session.expiry_policy();

    let status = session.status(&policy);
    let authenticated = session.is_authenticated();
    let minutes = session.time_remaining_minutes();
    let renewable = session.has_refresh_token();

    if json {
        let value = serde_json::json!({
            "status": status.as_str(),
            "authenticated": authenticated,
            "renewable": renewable,
            "expires_in_minutes": minutes,
            "user": session.user(),
            "operario": session.operario(),
        });
        println!("{}", value);
    } else {
        match status {
            SessionStatus::NoSession => println!("No session found"),
            SessionStatus::Expired if renewable => {
                println!("Access token expired (renewable with 'jornada refresh')")
            }
            SessionStatus::Expired => println!("Session expired"),
            SessionStatus::Expiring | SessionStatus::Active => {
                let remaining = session
                    .access_token()
                    .map(|token| expiry::describe_remaining(&token))
                    .unwrap_or_else(|| format!("{}m", minutes));
                println!("Session {} (expires in {})", status.as_str(), remaining);
            }
        }

        if let Some(user) = session.user() {
            println!("  User: {} <{}> ({})", user.nombre, user.email, user.rol.as_str());
        }
        if let Some(operario) = session.operario() {
            println!("  Operario: {} ({})", operario.nombre, operario.cedula);
        }
    }

    if authenticated {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
