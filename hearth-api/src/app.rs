/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use hearth_api::{app::AppState, config::Config};
/// use hearth_shared::store::memory::InMemoryMembershipStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(InMemoryMembershipStore::new()), config);
/// let app = hearth_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use hearth_shared::auth::jwt::TokenService;
use hearth_shared::auth::middleware::resolve_identity;
use hearth_shared::auth::password::{Argon2Verifier, CredentialVerifier};
use hearth_shared::services::{AuthService, Clock, HouseholdService, InvitationService, SystemClock};
use hearth_shared::store::MembershipStore;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Every field
/// is an `Arc` or wraps one.
#[derive(Clone)]
pub struct AppState {
    /// Membership store backing every service
    pub store: Arc<dyn MembershipStore>,

    pub auth: Arc<AuthService>,
    pub households: Arc<HouseholdService>,
    pub invitations: Arc<InvitationService>,

    /// Token issuer and verifier, shared with the identity middleware
    pub tokens: TokenService,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates application state with Argon2 hashing and the system clock
    pub fn new(store: Arc<dyn MembershipStore>, config: Config) -> Self {
        Self::with_parts(
            store,
            Arc::new(Argon2Verifier::default()),
            Arc::new(SystemClock),
            config,
        )
    }

    /// Creates application state with explicit collaborators
    ///
    /// Tests use this to substitute a cheap hasher and a controllable clock.
    pub fn with_parts(
        store: Arc<dyn MembershipStore>,
        credentials: Arc<dyn CredentialVerifier>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt.secret, config.token_ttl());

        Self {
            auth: Arc::new(AuthService::new(store.clone(), credentials, tokens.clone())),
            households: Arc::new(HouseholdService::new(store.clone())),
            invitations: Arc::new(InvitationService::new(store.clone(), clock)),
            store,
            tokens,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                       # Health check (public)
/// └── /api/
///     ├── /auth/                        # Public
///     │   ├── POST /register
///     │   └── POST /login
///     ├── /households                   # Authenticated
///     │   ├── GET  /
///     │   ├── PUT  /
///     │   └── POST /invitations
///     └── /users                        # Authenticated
///         ├── GET /
///         ├── GET /me
///         ├── GET /me/invitations
///         ├── GET /:id
///         └── DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. CORS (tower-http CorsLayer)
/// 2. Logging (tower-http TraceLayer)
/// 3. Identity resolution, which attaches a `Principal` when the bearer
///    token verifies; handlers that need one reject with 401 otherwise
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let household_routes = Router::new()
        .route(
            "/",
            get(routes::households::get_household).put(routes::households::update_household),
        )
        .route("/invitations", post(routes::households::create_invitation));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/me", get(routes::users::get_me))
        .route("/me/invitations", get(routes::users::my_invitations))
        .route(
            "/:id",
            get(routes::users::get_user).delete(routes::users::delete_user),
        );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/households", household_routes)
        .nest("/users", user_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.tokens.clone(),
            resolve_identity,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
