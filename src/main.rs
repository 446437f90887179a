use herb::api::server::start_server;
use herb::config::{self, Config};

#[tokio::main]
async fn main() {
    herb::init_tracing();

    let config = Config::from_env();
    tracing::info!("Herb starting v{}", config::APP_VERSION);

    if config.api_key.is_empty() {
        tracing::warn!(
            "GOOGLE_GEMINI_API_KEY is not set; the inference service will reject calls"
        );
    }

    let ctx = herb::build_context(&config);
    let mut server = match start_server(ctx, &config.bind_addr).await {
        Ok(server) => server,
        Err(error) => {
            tracing::error!("{error}");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %server.addr, "Herb API listening");

    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {error}");
    }

    server.shutdown();
}
