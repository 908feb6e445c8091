//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::common::utils::ExpoClient;
use crate::config::CoreConfig;
use crate::domains::notifications::ChannelDispatcher;
use crate::kernel::{PostgresStore, ReminderScheduler, ServerDeps, Store};
use crate::server::auth::JwtService;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    pub jwt_service: Arc<JwtService>,
    /// `None` when running on the in-memory store
    pub db_pool: Option<PgPool>,
    /// `None` when the scheduler is not started in this process
    pub reminders: Option<Arc<ReminderScheduler>>,
}

impl AppState {
    pub fn new(deps: Arc<ServerDeps>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            deps,
            jwt_service,
            db_pool: None,
            reminders: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    pub fn with_reminders(mut self, reminders: Arc<ReminderScheduler>) -> Self {
        self.reminders = Some(reminders);
        self
    }
}

/// Wire the Postgres store, notification channels and reminder window.
pub fn build_server_deps(pool: PgPool, config: &CoreConfig) -> ServerDeps {
    let store: Arc<dyn Store> = Arc::new(PostgresStore::new(pool));

    let mut dispatcher = ChannelDispatcher::new(store.clone());
    if config.push_notifications_enabled {
        dispatcher = dispatcher.with_push(Arc::new(ExpoClient::new(config.expo_access_token.clone())));
    }

    ServerDeps::new(
        store,
        Arc::new(dispatcher),
        config.reminder_window,
        config.app_base_url.clone(),
    )
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // No configured origins - allow any origin for development
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let jwt_service_for_middleware = state.jwt_service.clone();

    let api = Router::new()
        // Matches
        .route("/matches", post(create_match_handler))
        .route("/matches/:id", get(get_match_handler))
        .route("/teams/:id/matches", get(team_matches_handler))
        .route("/matches/:id/start", post(start_match_handler))
        .route("/matches/:id/complete", post(complete_match_handler))
        .route("/matches/:id/cancel", post(cancel_match_handler))
        .route("/matches/:id/score", put(update_score_handler))
        // Requests
        .route(
            "/matches/:id/requests",
            post(create_request_handler).get(list_requests_handler),
        )
        .route("/requests/:id/accept", post(accept_request_handler))
        .route("/requests/:id/reject", post(reject_request_handler))
        .route("/requests/:id/withdraw", post(withdraw_request_handler))
        // Availability
        .route(
            "/matches/:id/availability",
            get(availability_summary_handler).put(respond_handler),
        )
        // Notification feed
        .route("/notifications", get(notifications_handler))
        .route("/notifications/:id/read", post(mark_read_handler));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service_for_middleware.clone(), req, next)
        }))
        .layer(Extension(state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
