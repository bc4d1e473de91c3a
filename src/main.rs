use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use kupets_api::config::{LoggingSettings, Settings};
use kupets_api::error::{handle_json_payload_error, handle_path_error, handle_query_payload_error};
use kupets_api::routes::{self, AppState};
use kupets_api::services::PostgresClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// LOG_LEVEL and RUST_LOG win over the config file, LOG_FORMAT picks json or pretty output
fn init_tracing(logging: &LoggingSettings) {
    let level = std::env::var("LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| logging.level.clone());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    init_tracing(&settings.logging);
    info!("Starting Kupets API...");

    let postgres = PostgresClient::from_settings(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    info!(
        "PostgreSQL client initialized (max: {} connections)",
        settings.database.max_connections.unwrap_or(10)
    );

    let app_state = AppState::from_settings(&settings, postgres).map_err(|e| {
        error!("Failed to build application state: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    app_state.scheduler.start();
    let scheduler = app_state.scheduler.clone();

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    let result = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await;

    scheduler.shutdown();
    info!("Kupets API stopped");
    result
}
