use crate::cli::open_session;
use crate::error::Result;
use crate::expiry;

pub async fn execute(api_url: Option<String>, email: &str, password: &str) -> Result<()> {
    let (_config, session) = open_session(api_url)?;

    let user = session.login(email, password).await?;

    println!("✓ Login successful!");
    println!(
        "  User: {} <{}> ({})",
        user.nombre,
        user.email,
        user.rol.as_str()
    );

    if let Some(token) = session.access_token() {
        println!("  Token expires in: {}", expiry::describe_remaining(&token));
    }

    Ok(())
}
