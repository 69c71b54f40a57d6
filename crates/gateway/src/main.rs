//! Auditbase API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication (shared-password bootstrap + JWT sessions)
//! - Resource CRUD for audits, non-conformities and the document library
//! - The attachment lifecycle (upload, list, serve, delete)
//! - Rate limiting and observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use auditbase_common::{
    auth::JwtManager,
    config::AppConfig,
    db::{models::ResourceKind, DbPool},
    metrics::{register_metrics, LATENCY_BUCKETS},
    storage::AttachmentStore,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub store: AttachmentStore,
    pub jwt: JwtManager,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("Starting Auditbase API Gateway v{}", auditbase_common::VERSION);

    let config = Arc::new(config);

    // Initialize metrics
    register_metrics();
    if config.observability.metrics_port != 0 {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.observability.metrics_port))
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                LATENCY_BUCKETS,
            )?
            .install()?;
        info!(
            port = config.observability.metrics_port,
            "Prometheus exporter started"
        );
    }

    // Initialize database connection and apply pending migrations
    let db = DbPool::new(&config.database).await?;
    db.migrate().await?;

    // Initialize the attachment store and verify the upload root works
    let store = AttachmentStore::new(&config.storage.upload_dir);
    store.validate().await?;
    info!(upload_dir = %config.storage.upload_dir.display(), "Attachment store ready");

    let jwt = JwtManager::from_config(&config.auth)?;

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        store,
        jwt,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Routes shared by every attachment-owning resource. The owning
/// `ResourceKind` arrives via an Extension layer set on each resource
/// router, so the handlers are written once instead of per resource type.
fn attachment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/attachments",
            post(handlers::attachments::upload).get(handlers::attachments::list),
        )
        .route(
            "/{id}/attachments/{file_id}",
            get(handlers::attachments::serve).delete(handlers::attachments::delete),
        )
}

fn audit_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::audits::list)
                .post(handlers::audits::create)
                .delete(handlers::audits::bulk_delete),
        )
        .route(
            "/{id}",
            get(handlers::audits::get).put(handlers::audits::update),
        )
        .merge(attachment_routes())
        .layer(Extension(ResourceKind::Audit))
}

fn non_conformity_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::non_conformities::list)
                .post(handlers::non_conformities::create)
                .delete(handlers::non_conformities::bulk_delete),
        )
        .route(
            "/{id}",
            get(handlers::non_conformities::get).put(handlers::non_conformities::update),
        )
        .merge(attachment_routes())
        .layer(Extension(ResourceKind::NonConformity))
}

/// The five uniform library resource types share one set of handlers;
/// only the route prefix and the kind extension differ.
fn library_routes(kind: ResourceKind) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::library::list)
                .post(handlers::library::create)
                .delete(handlers::library::bulk_delete),
        )
        .route(
            "/{id}",
            get(handlers::library::get).put(handlers::library::update),
        )
        .merge(attachment_routes())
        .layer(Extension(kind))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::users::list).post(handlers::users::create),
        )
        .route(
            "/{id}",
            get(handlers::users::get)
                .put(handlers::users::update)
                .delete(handlers::users::delete),
        )
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Session bootstrap (no token required for login)
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/password", post(handlers::auth::change_password))
        // Resource routes, each carrying its kind for the attachment layer
        .nest("/audits", audit_routes())
        .nest("/non-conformities", non_conformity_routes())
        .nest("/policies", library_routes(ResourceKind::Policy))
        .nest("/guidelines", library_routes(ResourceKind::Guideline))
        .nest("/templates", library_routes(ResourceKind::Template))
        .nest("/certificates", library_routes(ResourceKind::Certificate))
        .nest("/advisories", library_routes(ResourceKind::Advisory))
        // User management
        .nest("/users", user_routes())
        // Per-file size is enforced in the upload handler; this only has to
        // admit a full multipart batch plus framing overhead
        .layer(DefaultBodyLimit::max(
            state.config.storage.max_upload_bytes * 4,
        ));

    let mut app = Router::new()
        .nest("/api", api_routes)
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Legacy direct mount of the upload directory
        .nest_service(
            "/uploads",
            ServeDir::new(&state.config.storage.upload_dir),
        );

    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        app = app.layer(axum::middleware::from_fn(move |request, next| {
            let limiter = limiter.clone();
            async move { middleware::rate_limit::rate_limit_middleware(request, next, limiter).await }
        }));
    }

    app.layer(axum::middleware::from_fn(middleware::metrics::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
