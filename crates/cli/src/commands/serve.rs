//! `leadsbox serve` — Start the HTTP API server.

use std::sync::Arc;

use leadsbox_config::AppConfig;
use leadsbox_gateway::AppState;
use leadsbox_store::SqliteStore;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.server.port = port;
    }

    // A store that cannot open at startup is unrecoverable: log and
    // exit deliberately.
    let store = match SqliteStore::open(&config.store.database_path).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, "Error connecting to store");
            std::process::exit(1);
        }
    };

    println!("LeadsBox API");
    println!("   Listening: {}:{}", config.server.host, config.server.port);
    println!("   Environment: {}", config.env);

    let state = Arc::new(AppState::new(config, store.clone(), store));
    leadsbox_gateway::start(state).await?;

    Ok(())
}
