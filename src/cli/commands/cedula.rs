use crate::cli::open_session;
use crate::error::Result;

pub async fn execute(api_url: Option<String>, cedula: &str) -> Result<()> {
    let (_config, session) = open_session(api_url)?;

    let operario = session.validate_cedula(cedula).await?;

    println!("✓ Cédula validated");
    println!("  Operario: {} ({})", operario.nombre, operario.cedula);
    println!(
        "  Session valid for {} minutes",
        session.time_remaining_minutes()
    );

    Ok(())
}
