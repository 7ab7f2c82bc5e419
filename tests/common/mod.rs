#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use persons_graphql::app_state::AppState;
use persons_graphql::auth::{AccessPolicy, TokenVerifier};
use persons_graphql::build_router;
use persons_graphql::db::models::person::Person;
use persons_graphql::db::queries::person::{PersonStore, StoreError};

pub const SECRET: &str = "graphql-integration-shared-secret";
pub const CLIENT_ID: &str = "demo";

/// In-memory stand-in for the `persons` collection.
pub struct MemoryStore(pub Vec<Person>);

#[async_trait]
impl PersonStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Person>, StoreError> {
        Ok(self.0.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store whose every call fails the way an unreachable MongoDB does.
pub struct UnavailableStore;

fn connection_refused() -> StoreError {
    let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
    StoreError::Database(mongodb::error::Error::from(io))
}

#[async_trait]
impl PersonStore for UnavailableStore {
    async fn find_all(&self) -> Result<Vec<Person>, StoreError> {
        Err(connection_refused())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(connection_refused())
    }
}

/// The five documents the demo data set ships with.
pub fn five_persons() -> Vec<Person> {
    [
        ("Ada", "Lovelace"),
        ("Grace", "Hopper"),
        ("Alan", "Turing"),
        ("Edsger", "Dijkstra"),
        ("Barbara", "Liskov"),
    ]
    .iter()
    .enumerate()
    .map(|(i, (first, last))| Person {
        id: format!("64b7f0c2a1d3e5f7a9b0c1d{i}"),
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        e_mail: Some(format!("{}@example.com", first.to_lowercase())),
    })
    .collect()
}

pub fn app_with(persons: Vec<Person>) -> Router {
    app_with_store(Arc::new(MemoryStore(persons)))
}

pub fn app_with_store(store: Arc<dyn PersonStore>) -> Router {
    let state = AppState::new(
        store,
        TokenVerifier::with_secret(SECRET),
        AccessPolicy::default(),
        CLIENT_ID,
    );
    build_router(state)
}

pub fn app() -> Router {
    app_with(five_persons())
}

/// Keycloak-shaped access token claims for `username` with `roles` on the demo client.
pub fn claims(username: &str, roles: &[&str]) -> Value {
    json!({
        "sub": "f5e6c1b2-0000-4000-8000-000000000001",
        "preferred_username": username,
        "aud": "account",
        "exp": (Utc::now() + Duration::minutes(5)).timestamp(),
        "iat": Utc::now().timestamp(),
        "resource_access": {
            CLIENT_ID: { "roles": roles },
            "account": { "roles": ["manage-account", "view-profile"] }
        }
    })
}

pub fn sign(claims: &Value) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(SECRET.as_bytes()))
        .expect("Failed to encode token")
}

pub async fn post_graphql(app: Router, query: &str, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = request
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap();

    send(app, request).await
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into()))
    };
    (status, json)
}
