// src/main.rs
use carton_planner::api;
use carton_planner::config::AppConfig;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = std::env::var("CARTON_PLANNER_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();
    init_tracing();
    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    info!("Carton planner starting...");
    if let Err(err) = api::start_api_server(app_config.api, app_config.optimizer).await {
        error!("API server terminated with an error: {err}");
        std::process::exit(1);
    }
}
