//! `chatbridge config` — Configuration management commands.

use chatbridge_config::{AppConfig, QueryMode};

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   Config parsed successfully");

            let mut warnings = Vec::new();

            if config.gateway.allowed_origins.iter().any(|o| o == "*") {
                warnings.push("CORS allows any origin (set ALLOWED_ORIGINS to restrict)");
            }

            if config.gateway.debug_mode {
                warnings.push("debug_mode logs full request payloads");
            }

            if config.upstream.max_retries == 0 {
                warnings.push("Upstream retries are disabled");
            }

            if warnings.is_empty() {
                println!("   All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   warning: {w}");
                }
            }

            let query_mode = match config.prompt.query_mode {
                QueryMode::LatestMessage => "latest_message",
                QueryMode::Transcript => "transcript",
            };

            println!();
            println!(
                "   Gateway:     {}:{}",
                config.gateway.host, config.gateway.port
            );
            println!("   Upstream:    {}", config.upstream.api_url);
            println!("   Query mode:  {query_mode}");
            println!("   Strict roles: {}", config.prompt.strict_roles);
        }
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn print_default() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::default_toml());
    Ok(())
}
