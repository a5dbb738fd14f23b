//! # Server Configuration
//!
//! Application state, routing and the serve loop for the job desk API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::blob::{self, BlobError, BlobStore};
use crate::config::AppConfig;
use crate::feed::JobFeed;
use crate::format::Formatter;
use crate::handlers;
use crate::job_number::JobNumberGenerator;
use crate::session::{DbIdentityProvider, SessionManager, SessionStore};
use crate::telemetry::trace_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub sessions: SessionManager,
    pub feed: JobFeed,
    pub blob_store: Arc<dyn BlobStore>,
    pub job_numbers: JobNumberGenerator,
    pub formatter: Formatter,
}

impl AppState {
    /// Wire the collaborators for `config` around an open connection.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Result<Self, BlobError> {
        let provider = Arc::new(DbIdentityProvider::new(db.clone()));
        let store = Arc::new(SessionStore::from_minutes(config.session_ttl_minutes));
        let sessions = SessionManager::new(
            db.clone(),
            provider,
            store,
            config.superadmin_marker.clone(),
        );

        Ok(Self {
            blob_store: blob::from_config(&config)?,
            job_numbers: JobNumberGenerator::new(&config.job_numbers),
            formatter: Formatter::new(config.date_format.clone()),
            feed: JobFeed::new(CancellationToken::new()),
            sessions,
            db,
            config: Arc::new(config),
        })
    }

    pub fn with_blob_store(mut self, blob_store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = blob_store;
        self
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .route("/api/v1/auth/session", get(handlers::auth::current_session))
        .route(
            "/api/v1/jobs",
            get(handlers::jobs::list_jobs).post(handlers::jobs::create_job),
        )
        .route("/api/v1/jobs/filter-options", get(handlers::jobs::filter_options))
        .route("/api/v1/jobs/report", get(handlers::jobs::job_report))
        .route("/api/v1/jobs/stream", get(handlers::jobs::stream_jobs))
        .route(
            "/api/v1/jobs/{id}",
            get(handlers::jobs::get_job).put(handlers::jobs::update_job),
        )
        .route(
            "/api/v1/entities/{kind}",
            get(handlers::entities::list_entities).post(handlers::entities::create_entity),
        )
        .route(
            "/api/v1/entities/{kind}/{id}",
            put(handlers::entities::update_entity).delete(handlers::entities::delete_entity),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server and blocks until a shutdown signal arrives
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let profile = config.profile.clone();

    let state = AppState::new(config, db)?;
    state.feed.refresh(&state.db).await?;
    let feed = state.feed.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received; closing job streams");
            feed.close();
        })
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
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

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::readyz,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::current_session,
        crate::handlers::jobs::list_jobs,
        crate::handlers::jobs::create_job,
        crate::handlers::jobs::get_job,
        crate::handlers::jobs::update_job,
        crate::handlers::jobs::filter_options,
        crate::handlers::jobs::job_report,
        crate::handlers::jobs::stream_jobs,
        crate::handlers::entities::list_entities,
        crate::handlers::entities::create_entity,
        crate::handlers::entities::update_entity,
        crate::handlers::entities::delete_entity,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::session::Session,
            crate::session::Role,
            crate::session::LoginMethod,
            crate::domain::Job,
            crate::domain::JobDraft,
            crate::domain::JobStatus,
            crate::domain::ShipmentType,
            crate::domain::TransportMode,
            crate::domain::Counterparty,
            crate::domain::CounterpartyDraft,
            crate::domain::EntityKind,
            crate::date_value::DateValue,
            crate::handlers::jobs::JobListResponse,
            crate::handlers::jobs::FilterOptionsResponse,
            crate::columns::ReportTable,
            crate::columns::ReportColumn,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Job Desk API",
        description = "Shipment job management for relationship managers and administrators",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
