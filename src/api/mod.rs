mod handlers;
pub mod middleware;

use axum::{
    extract::FromRef,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::db::Database;
pub use handlers::ConflictScanResponse;
pub use middleware::SecurityConfig;

/// Shared handler state. Handlers extract the part they need.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub security: SecurityConfig,
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for SecurityConfig {
    fn from_ref(state: &AppState) -> Self {
        state.security.clone()
    }
}

/// Router with no admin key (local development and tests).
pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, SecurityConfig::disabled())
}

pub fn create_router_with_config(db: Database, security: SecurityConfig) -> Router {
    let state = AppState {
        db,
        security: security.clone(),
    };

    let admin = Router::new()
        // Catalog management
        .route("/courses", post(handlers::create_course))
        .route("/courses/{id}", put(handlers::update_course))
        .route("/courses/{id}", delete(handlers::delete_course))
        .route("/courses/{id}/registrations", get(handlers::list_course_registrations))
        // Registration management
        .route("/registrations/{id}", put(handlers::update_registration))
        .route("/registrations/{id}", delete(handlers::delete_registration))
        // Conflict review
        .route("/conflicts", get(handlers::list_conflicts))
        // Dashboard
        .route("/stats", get(handlers::get_stats))
        .route("/stats/departments", get(handlers::get_department_enrollment))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_admin));

    let api = Router::new()
        // Courses
        .route("/courses", get(handlers::list_courses))
        .route("/courses/{id}", get(handlers::get_course))
        // Students
        .route("/students", get(handlers::list_students))
        .route("/students", post(handlers::create_student))
        .route("/students/{id}", get(handlers::get_student))
        .route("/students/{id}/registrations", get(handlers::list_student_registrations))
        .route("/students/{id}/schedule", get(handlers::get_student_schedule))
        // Registrations
        .route("/registrations", post(handlers::register))
        .route("/registrations/{id}", get(handlers::get_registration))
        .route("/registrations/{id}/drop", post(handlers::drop_registration))
        // Conflict checks
        .route("/conflicts/check", post(handlers::check_registration))
        .route("/schedule/parse", get(handlers::parse_schedule))
        // Health
        .route("/health", get(handlers::health))
        .merge(admin);

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&security)),
        )
        .with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    match &security.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
        }
        None => CorsLayer::permissive(),
    }
}
