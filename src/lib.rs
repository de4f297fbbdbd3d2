//! Wedding Backend - library for app logic and testing

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod startup;
pub mod state;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::TokenService;
use crate::config::Settings;
use crate::state::AppState;
use crate::storage::{BlobGateway, LOCAL_URL_PREFIX};

/// Room for multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// CORS from `CORS_ORIGINS`. A literal `*` allows any origin, without
/// credentials.
pub fn configure_cors(settings: &Settings) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if settings.cors_origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(origins).allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.settings);
    let body_limit = state.settings.max_upload_bytes + MULTIPART_OVERHEAD;
    let uploads = ServeDir::new(&state.settings.static_dir);

    Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/login-form", post(routes::auth::login_form))
        .route("/auth/verify", post(routes::auth::verify))
        .route(
            "/api/home",
            get(routes::home::get_home).put(routes::home::update_home),
        )
        .route("/api/home/reset-defaults", post(routes::home::reset_defaults))
        .route(
            "/api/story/sections",
            get(routes::story::list_sections).post(routes::story::create_section),
        )
        .route(
            "/api/story/sections/{id}",
            put(routes::story::update_section).delete(routes::story::delete_section),
        )
        .route(
            "/api/story/images",
            get(routes::story::list_images).post(routes::story::create_image),
        )
        .route("/api/story/images/reorder", put(routes::story::reorder_images))
        .route(
            "/api/story/images/{id}",
            put(routes::story::update_image).delete(routes::story::delete_image),
        )
        .route(
            "/api/info",
            get(routes::info::list_sections).post(routes::info::create_section),
        )
        .route("/api/info/reorder", put(routes::info::reorder_sections))
        .route(
            "/api/info/{id}",
            put(routes::info::update_section).delete(routes::info::delete_section),
        )
        .route(
            "/api/timeline",
            get(routes::timeline::list_events).post(routes::timeline::create_event),
        )
        .route("/api/timeline/reorder", put(routes::timeline::reorder_events))
        .route(
            "/api/timeline/{id}",
            put(routes::timeline::update_event).delete(routes::timeline::delete_event),
        )
        .route(
            "/api/gallery",
            get(routes::gallery::list_images).post(routes::gallery::create_image),
        )
        .route(
            "/api/gallery/{id}",
            put(routes::gallery::update_image).delete(routes::gallery::delete_image),
        )
        .route(
            "/api/gifts",
            get(routes::gifts::list_items).post(routes::gifts::create_item),
        )
        .route(
            "/api/gifts/{id}",
            put(routes::gifts::update_item).delete(routes::gifts::delete_item),
        )
        .route(
            "/api/rsvp",
            get(routes::rsvp::list_rsvps).post(routes::rsvp::create_rsvp),
        )
        .route("/api/upload", post(routes::upload::upload_file))
        .route(
            "/api/upload/{filename}",
            delete(routes::upload::delete_file),
        )
        .route(
            "/api/seed/demo",
            post(routes::seed::seed_demo).delete(routes::seed::clear_demo),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .nest_service(LOCAL_URL_PREFIX, uploads)
        .fallback(routes::spa::fallback)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;

    // Guards MUST be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init(&settings);

    settings.check_production_safety()?;

    let db = startup::bootstrap(&settings).await;
    if db.is_none() {
        tracing::warn!("Running without a database; content endpoints will answer 503");
    }

    let tokens = TokenService::from_settings(&settings);
    let blobs = BlobGateway::from_settings(&settings);
    let address = format!("{}:{}", settings.host, settings.port);

    let app = create_app(AppState::new(settings, db, tokens, blobs));

    let listener = TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
