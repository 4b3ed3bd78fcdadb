pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::database::models::MeasurementKind;
use crate::handlers::protected;
use crate::middleware::jwt_auth_middleware;

pub use crate::state::AppState;

/// Full router with permissive CORS
pub fn app(state: AppState) -> Router {
    app_with_cors(state, CorsLayer::permissive())
}

pub fn app_with_cors(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Permissive when no origins are configured
pub fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    let mut router = Router::new()
        .route("/auth/me", get(protected::auth::me_get))
        .route("/measurements", get(protected::measurements::overview_get))
        .route(
            "/athletes",
            get(protected::athletes::list_get).post(protected::athletes::create_post),
        )
        .route(
            "/athletes/:id",
            put(protected::athletes::update_put).delete(protected::athletes::delete),
        );

    for kind in MeasurementKind::ALL {
        router = router.merge(measurement_routes(kind));
    }

    router.route_layer(axum::middleware::from_fn_with_state(
        state,
        jwt_auth_middleware,
    ))
}

/// Collection and record routes for one measurement kind
fn measurement_routes(kind: MeasurementKind) -> Router<AppState> {
    use handlers::protected::measurements;

    let collection = format!("/{}", kind.as_str());
    let record = format!("/{}/:id", kind.as_str());

    Router::new()
        .route(
            &collection,
            get(measurements::list_get).post(measurements::create_post),
        )
        .route(
            &record,
            put(measurements::update_put).delete(measurements::delete),
        )
        .layer(Extension(kind))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Athlete Metrics API",
        "version": version,
        "endpoints": {
            "public": "POST /auth/register, POST /auth/login",
            "me": "GET /auth/me",
            "anthropometric": "/anthropometric[/:id]",
            "performance": "/performance[/:id]",
            "health": "/health[/:id]",
            "measurements": "GET /measurements",
            "athletes": "/athletes[/:id]",
        }
    }))
}
