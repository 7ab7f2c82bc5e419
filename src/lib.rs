//! GraphQL API over a MongoDB `persons` collection, secured with bearer
//! tokens from an OpenID-Connect identity provider.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod db;
pub mod graphql;
pub mod middleware;
pub mod utils;

use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::graphql::graphql_routes;
use crate::api::health::health_routes;
use crate::app_state::AppState;
use crate::graphql::graph_schema::create_schema;
use crate::middleware::auth::jwt_middleware;
use crate::middleware::request_logger::log_requests;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Full application router: health checks plus the token-aware GraphQL endpoint.
pub fn build_router(state: AppState) -> Router {
    let graphql_schema = create_schema(state.store.clone(), state.policy.clone());

    // Bearer tokens are optional here; resolvers decide what anonymous callers may see.
    let graphql = graphql_routes(graphql_schema)
        .route_layer(from_fn_with_state(state.clone(), jwt_middleware));

    Router::new()
        .merge(health_routes())
        .merge(graphql)
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
