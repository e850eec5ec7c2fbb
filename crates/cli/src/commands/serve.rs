//! `chatbridge serve` — Start the HTTP gateway.

use chatbridge_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("ChatBridge Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Upstream:  {}", config.upstream.api_url);
    println!("   Debug:     {}", config.gateway.debug_mode);

    chatbridge_gateway::start(config).await?;

    Ok(())
}
