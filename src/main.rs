use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use swipe_match::config::{LoggingSettings, Settings};
use swipe_match::core::{Clock, SystemClock};
use swipe_match::error::{handle_json_payload_error, handle_query_payload_error};
use swipe_match::routes::{self, AppState};
use swipe_match::services::{MemoryStore, PostgresStore, TokenService};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    init_logging(&settings.logging);

    info!("Starting Swipe Match service...");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tokens = TokenService::new(
        &settings.auth.jwt_secret,
        settings.auth.issuer.clone(),
        settings.auth.token_ttl_secs,
    );

    let app_state = if settings.database.in_memory {
        warn!("Using the in-memory store; data is lost on restart");
        AppState::new(Arc::new(MemoryStore::new()), clock, tokens, &settings.limits)
    } else {
        let postgres = PostgresStore::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e)
        })?;

        info!("PostgreSQL store initialized (max: {:?} connections)", settings.database.max_connections);

        AppState::new(Arc::new(postgres), clock, tokens, &settings.limits)
    };

    info!(
        daily_view_limit = settings.limits.daily_view_limit,
        subscription_months = settings.limits.subscription_months,
        "Limits configured"
    );

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
