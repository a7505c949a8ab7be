use axum::serve;
use modelviz::api::handlers::AppState;
use modelviz::api::routes::create_router;
use modelviz::config::AppConfig;
use modelviz::seed;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new().filter_level(LevelFilter::Info).init();

    // Load configuration
    let config = AppConfig::load()?;
    log::info!(
        "configuration loaded: server={}:{}, relation_limit={}",
        config.server.host,
        config.server.port,
        config.inspector.relation_limit
    );

    // The demo binary registers its own dataset; a real host embeds
    // `modelviz::run_server` with its live mapping layer instead.
    let paradigm =
        std::env::var("MODELVIZ_DEMO_PARADIGM").unwrap_or_else(|_| "relational".to_string());
    let host = seed::demo_host(&paradigm)?;

    // One-shot detection; the adapter is held for the process lifetime
    let adapter = modelviz::adapter::detect(host)?;
    log::info!("{} mapping layer active", adapter.paradigm().as_str());

    let state = AppState {
        adapter,
        inspector: config.inspector.clone(),
    };

    let mut app = create_router().with_state(state);

    // Serve the bundled frontend if one has been built
    if std::path::Path::new("public").is_dir() {
        app = app.fallback_service(ServeDir::new("public"));
    }

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("modelviz server running on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
