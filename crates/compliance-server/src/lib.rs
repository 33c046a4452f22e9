//! Compliance Server - research compliance HTTP API
//!
//! JSON REST endpoints under `/api` over `compliance-core`.

pub mod error;
pub mod http;

use std::sync::{Arc, Mutex};

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use compliance_core::{ComplianceConfig, Repository, Result};

pub use error::ApiError;

/// Shared application state
pub struct AppState {
    pub repository: Mutex<Repository>,
    pub config: ComplianceConfig,
}

impl AppState {
    pub fn new(repository: Repository, config: ComplianceConfig) -> Self {
        Self {
            repository: Mutex::new(repository),
            config,
        }
    }

    /// Open the database the configuration names
    pub fn from_config(config: ComplianceConfig) -> Result<Self> {
        let repository = if config.database.is_in_memory() {
            Repository::in_memory()?
        } else {
            Repository::new(&config.database.path)?
        };
        tracing::info!(path = ?config.database.path, "Opened compliance database");
        Ok(Self::new(repository, config))
    }

    /// In-memory state with default settings (for testing)
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Repository::in_memory()?, ComplianceConfig::default()))
    }

    /// Run `f` while holding the repository lock
    pub fn with_repo<T, E>(
        &self,
        f: impl FnOnce(&Repository) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, ApiError>
    where
        ApiError: From<E>,
    {
        let repo = self
            .repository
            .lock()
            .map_err(|e| ApiError::Internal(format!("Mutex poisoned: {}", e)))?;
        f(&repo).map_err(ApiError::from)
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Scientists
        .route(
            "/api/scientists",
            get(http::list_scientists).post(http::create_scientist),
        )
        .route(
            "/api/scientists/{id}",
            get(http::get_scientist).patch(http::update_scientist),
        )
        // Research activities and teams
        .route(
            "/api/research-activities",
            get(http::list_research_activities).post(http::create_research_activity),
        )
        .route(
            "/api/research-activities/{id}",
            get(http::get_research_activity),
        )
        .route(
            "/api/research-activities/{id}/members",
            get(http::list_members).post(http::add_member),
        )
        .route(
            "/api/research-activities/{id}/members/role-options",
            get(http::member_role_options),
        )
        .route(
            "/api/research-activities/{id}/members/{member_id}",
            delete(http::remove_member),
        )
        // IBC
        .route(
            "/api/ibc-applications",
            get(http::list_ibc_applications).post(http::create_ibc_application),
        )
        .route(
            "/api/ibc-applications/{id}",
            get(http::get_ibc_application).patch(http::transition_ibc_application),
        )
        .route(
            "/api/ibc-applications/{id}/transitions",
            get(http::ibc_transitions),
        )
        .route(
            "/api/ibc-applications/{id}/personnel",
            get(http::list_personnel).post(http::add_personnel),
        )
        .route(
            "/api/ibc-board-members",
            get(http::list_board_members).post(http::create_board_member),
        )
        // Publications
        .route(
            "/api/publications",
            get(http::list_publications).post(http::create_publication),
        )
        .route("/api/publications/{id}", get(http::get_publication))
        .route(
            "/api/publications/{id}/authors",
            get(http::list_authors).post(http::add_author),
        )
        .route(
            "/api/publications/{id}/authors/{scientist_id}",
            delete(http::remove_author),
        )
        .route(
            "/api/publications/{id}/status",
            patch(http::change_publication_status),
        )
        .route(
            "/api/publications/{id}/transitions",
            get(http::publication_transitions),
        )
        .route(
            "/api/publications/{id}/history",
            get(http::publication_history),
        )
        // Facilities
        .route(
            "/api/buildings",
            get(http::list_buildings).post(http::create_building),
        )
        .route("/api/rooms", get(http::list_rooms).post(http::create_room))
        .route(
            "/api/rooms/{id}",
            get(http::get_room).patch(http::update_room),
        )
        // Certifications
        .route(
            "/api/certification-modules",
            get(http::list_modules).post(http::create_module),
        )
        .route("/api/certifications/matrix", get(http::certification_matrix))
        .route(
            "/api/certificates/process-batch",
            post(http::process_batch),
        )
        .route(
            "/api/certificates/confirm-batch",
            post(http::confirm_batch),
        )
        .route("/api/pdf-import-history", get(http::import_history))
        // System
        .route("/api/health", get(http::health))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Compliance server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
