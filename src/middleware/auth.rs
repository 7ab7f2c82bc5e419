use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::app_state::AppState;
use crate::auth::{extract_roles, AuthError, Principal};

/// Who is calling: set on every request that passes [`jwt_middleware`].
/// `None` means no bearer token was presented.
#[derive(Clone, Debug, Default)]
pub struct Caller(pub Option<Principal>);

impl Caller {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

/// ✅ **JWT Middleware** (Optional bearer authentication)
///
/// Requests without an `Authorization` header continue anonymously. A header
/// that is present must hold a valid bearer token whose claims carry the
/// configured client's roles, otherwise the request is rejected here.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    // Step 1: Extract Authorization header, none means anonymous
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map(str::to_owned));
    let Some(auth_header) = auth_header else {
        debug!("No Authorization header, continuing anonymously");
        req.extensions_mut().insert(Caller::default());
        return Ok(next.run(req).await);
    };

    // Step 2: Convert header to string and strip the "Bearer " prefix
    let token = auth_header
        .ok()
        .as_deref()
        .and_then(bearer_token)
        .map(str::to_owned)
        .ok_or_else(|| {
            warn!("Invalid Authorization header format");
            AuthError::MissingBearer.into_response()
        })?;

    // Step 3: Verify signature, expiry and issuer
    let verified = state.verifier.verify(&token).await.map_err(|e| {
        match &e {
            AuthError::KeyDiscovery(_) => error!("Signing key discovery failed: {}", e),
            _ => warn!("JWT verification failed: {}", e),
        }
        e.into_response()
    })?;

    // Step 4: Derive roles; tokens without the role claims are rejected outright
    let roles = extract_roles(&verified, &state.client_id).map_err(|e| {
        error!("Rejecting token with malformed claims: {}", e);
        e.into_response()
    })?;

    let principal = Principal::new(verified, roles);
    debug!(
        username = principal.username().as_deref().unwrap_or("<none>"),
        roles = ?principal.roles,
        "JWT verified"
    );

    // Step 5: Insert the caller into request extensions
    req.extensions_mut().insert(Caller(Some(principal)));

    // Step 6: Proceed to the next middleware
    Ok(next.run(req).await)
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
