use std::sync::{Arc, Mutex};

use tracing::info;
use tracing_subscriber::EnvFilter;

use molopt::config::Config;
use molopt::mopac::MopacCalculator;
use molopt::server::{router, AppState};
use molopt::store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("molopt=info")),
        )
        .init();

    let config = Config::from_env();
    let store = Store::open(&config.database)?;
    let state = AppState {
        store: Arc::new(Mutex::new(store)),
        calculator: Arc::new(MopacCalculator::new(config.mopac_command.clone())),
    };

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!("listening on {}", config.addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
