use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config;
use crate::database::store::{AccessStore, HealthCheck, LocationStore};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{LocationService, Seeder, UserService};

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub locations: LocationService,
    pub users: UserService,
    pub access: Arc<dyn AccessStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: LocationStore + AccessStore + HealthCheck + 'static,
    {
        let locations: Arc<dyn LocationStore> = store.clone();
        let access: Arc<dyn AccessStore> = store.clone();
        let health: Arc<dyn HealthCheck> = store;
        Self {
            locations: LocationService::new(locations),
            users: UserService::new(access.clone()),
            access,
            health,
        }
    }

    pub fn seeder(&self) -> Seeder {
        Seeder::new(self.access.clone(), config::config().seed.clone())
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(location_routes())
        .merge(user_routes())
        .layer(from_fn(jwt_auth_middleware));

    let settings = &config::config().api;
    let app = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected (JWT)
        .merge(api)
        .with_state(state)
        // Global middleware
        .layer(DefaultBodyLimit::max(settings.max_request_size_bytes))
        .layer(cors_layer());

    if settings.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

fn location_routes() -> Router<AppState> {
    use protected::locations;

    Router::new()
        .route("/api/locations", get(locations::list).post(locations::create))
        .route("/api/locations/root", get(locations::roots))
        .route("/api/locations/hierarchy", get(locations::hierarchy))
        .route(
            "/api/locations/bounds/:ne_lat/:ne_lng/:sw_lat/:sw_lng",
            get(locations::bounds),
        )
        .route(
            "/api/locations/:id",
            get(locations::show)
                .patch(locations::update)
                .delete(locations::delete),
        )
        .route("/api/locations/:id/children", get(locations::children))
        .route("/api/locations/:id/descendants", get(locations::descendants))
        .route("/api/locations/:id/ancestors", get(locations::ancestors))
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/api/users/menu", get(users::menu))
        .route("/api/users/:id/roles", put(users::assign_roles).get(users::roles))
        .route("/api/roles", get(users::list_roles))
}

fn cors_layer() -> CorsLayer {
    let security = &config::config().security;
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
