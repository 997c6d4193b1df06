/// Common test utilities for integration tests
///
/// Every context runs the real router on the in-memory store, a manual clock
/// and cheap Argon2 parameters, so no database is needed.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hearth_api::app::{build_router, AppState};
use hearth_api::config::Config;
use hearth_shared::auth::password::Argon2Verifier;
use hearth_shared::services::ManualClock;
use hearth_shared::store::memory::InMemoryMembershipStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const PASSWORD: &str = "password123";

/// Test context containing the app and handles on its collaborators
pub struct TestContext {
    pub app: Router,
    pub store: Arc<InMemoryMembershipStore>,
    pub clock: Arc<ManualClock>,
    pub config: Config,
}

/// A registered user as seen by the client
pub struct TestUser {
    pub token: String,
    pub id: String,
    pub household_id: String,
    pub email: String,
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "STORE_BACKEND" => Some("memory".to_string()),
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            _ => None,
        })
        .expect("test configuration is valid");

        let store = Arc::new(InMemoryMembershipStore::new());
        let clock = Arc::new(ManualClock::starting_now());
        let credentials =
            Arc::new(Argon2Verifier::with_params(1024, 1, 1).expect("cheap argon2 params"));

        let state = AppState::with_parts(store.clone(), credentials, clock.clone(), config.clone());

        Self {
            app: build_router(state),
            store,
            clock,
            config,
        }
    }

    /// Sends a request and returns the status and JSON body (`Null` if empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("Non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send("GET", uri, Some(token), None).await
    }

    /// Registers a user and panics unless it succeeds
    pub async fn register(&self, first_name: &str, last_name: &str, email: &str) -> TestUser {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "firstName": first_name,
                    "lastName": last_name,
                    "email": email,
                    "password": PASSWORD,
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            token: body["token"].as_str().unwrap().to_string(),
            id: body["user"]["id"].as_str().unwrap().to_string(),
            household_id: body["user"]["householdId"].as_str().unwrap().to_string(),
            email: email.to_string(),
        }
    }

    /// Invites `email` into the household of `inviter`
    pub async fn invite(&self, inviter: &TestUser, email: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/households/invitations",
            Some(&inviter.token),
            Some(json!({ "email": email })),
        )
        .await
    }
}
