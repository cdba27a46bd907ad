use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use tippspiel::{build_router, AppState, InMemoryRoundRepository, SeasonClock};

pub const ADMIN_PASSWORD: &str = "Mond";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestApp {
    pub router: Router,
    pub repository: Arc<InMemoryRoundRepository>,
}

pub struct TestAppBuilder {
    admin_password: Option<String>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            admin_password: None,
        }
    }

    pub fn with_admin_password(mut self) -> Self {
        self.admin_password = Some(ADMIN_PASSWORD.to_string());
        self
    }

    pub fn build(self) -> TestApp {
        let repository = Arc::new(InMemoryRoundRepository::new());
        let state = AppState::new(
            repository.clone(),
            SeasonClock::default(),
            self.admin_password,
        );

        TestApp {
            router: build_router(state),
            repository,
        }
    }
}

impl TestApp {
    /// Sends a request through the full router and decodes the JSON body
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        password: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(password) = password {
            builder = builder.header("Authorization", format!("Bearer {password}"));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None, None).await
    }

    pub async fn submit(&self, winning_number: Value, guesses: &str) -> (StatusCode, Value) {
        let body = serde_json::json!({
            "winning_number": winning_number,
            "guesses": guesses,
        });
        self.request("POST", "/api/rounds", Some(body), Some(ADMIN_PASSWORD))
            .await
    }

    pub async fn delete_last_round(&self) -> (StatusCode, Value) {
        self.request("DELETE", "/api/rounds", None, Some(ADMIN_PASSWORD))
            .await
    }
}
