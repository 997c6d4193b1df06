/// Identity resolution middleware for Axum
///
/// The resolver inspects the `Authorization` header of one inbound request and
/// either attaches a [`Principal`] to the request extensions or leaves the
/// request anonymous. It never rejects the request itself: routes that need an
/// identity ask for a [`Principal`] extractor, which fails with
/// [`AuthError::Unauthenticated`] when nothing was attached.
///
/// ```text
/// NoHeader -> "Bearer <token>" -> Verifying -> Authenticated(principal)
///     |              |                 |
///     +--------------+-----------------+--> Rejected
/// ```
///
/// Only a syntactically well-formed bearer header reaches the token service.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use hearth_shared::auth::jwt::TokenService;
/// use hearth_shared::auth::middleware::resolve_identity;
/// use hearth_shared::auth::principal::Principal;
///
/// async fn me(principal: Principal) -> String {
///     principal.email
/// }
///
/// let tokens = TokenService::with_default_ttl("a-secret-key-of-at-least-32-bytes!!");
/// let app: Router = Router::new()
///     .route("/me", get(me))
///     .layer(middleware::from_fn_with_state(tokens, resolve_identity));
/// ```

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::jwt::{TokenError, TokenService};
use super::principal::Principal;

const BEARER_PREFIX: &str = "Bearer ";

/// Why a request was left without an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No `Authorization` header
    MissingHeader,

    /// Header present but not a bearer credential (or not valid text)
    UnsupportedScheme,

    /// `Bearer ` followed by nothing
    EmptyToken,

    /// Token failed signature, structure or claim checks
    InvalidToken(String),

    /// Token signature is fine but its lifetime is over
    ExpiredToken,
}

/// Outcome of resolving one request's identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Authenticated(Principal),
    Rejected(Rejection),
}

/// Resolves the caller's identity from request headers
///
/// Pure apart from token verification; holds no state between calls.
pub fn resolve(headers: &HeaderMap, tokens: &TokenService) -> Resolution {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Resolution::Rejected(Rejection::MissingHeader);
    };

    let Some(token) = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
    else {
        return Resolution::Rejected(Rejection::UnsupportedScheme);
    };

    let token = token.trim();
    if token.is_empty() {
        return Resolution::Rejected(Rejection::EmptyToken);
    }

    match tokens.verify(token) {
        Ok(principal) => Resolution::Authenticated(principal),
        Err(TokenError::Expired) => Resolution::Rejected(Rejection::ExpiredToken),
        Err(e) => Resolution::Rejected(Rejection::InvalidToken(e.to_string())),
    }
}

/// Attaches a [`Principal`] to the request when its bearer token verifies
///
/// Any principal already present in the extensions is removed first, so a
/// rejected request can never carry an identity from an earlier layer.
pub async fn resolve_identity(
    State(tokens): State<TokenService>,
    mut req: Request,
    next: Next,
) -> Response {
    req.extensions_mut().remove::<Principal>();

    match resolve(req.headers(), &tokens) {
        Resolution::Authenticated(principal) => {
            req.extensions_mut().insert(principal);
        }
        Resolution::Rejected(Rejection::MissingHeader) => {}
        Resolution::Rejected(reason) => {
            tracing::debug!(?reason, "Request left unauthenticated");
        }
    }

    next.run(req).await
}

/// Error returned when a route requires an identity the request lacks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Unauthenticated,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "unauthorized",
            "message": self.to_string(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
