use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::error::Result;

pub fn execute(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init => {
            Config::create_sample()?;
        }
        ConfigCommand::Path => {
            let config_path = Config::config_file_path()?;
            println!("Config file path: {}", config_path.display());

            if config_path.exists() {
                println!("Status: File exists");

                match Config::load() {
                    Ok(config) => {
                        println!("Valid: Yes");
                        match config.base_url() {
                            Ok(base_url) => {
                                println!("\nBackend: {}", base_url);
                                println!(
                                    "Session checks every {}s, warn at {} min, renew at {} min",
                                    config.session.check_interval_secs,
                                    config.session.warn_minutes,
                                    config.session.refresh_minutes
                                );
                            }
                            Err(_) => println!("Complete: No (missing api.base_url)"),
                        }
                    }
                    Err(e) => {
                        println!("Valid: No");
                        println!("Error: {}", e);
                    }
                }
            } else {
                println!("Status: File does not exist");
                println!("\nTo create a sample config file, run:");
                println!("  jornada config init");
            }
        }
    }

    Ok(())
}
