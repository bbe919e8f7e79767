#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use jotpad_api::config::ServerConfig;
use jotpad_api::router::build_app_router;
use jotpad_api::state::AppState;
use jotpad_events::ChangeFeed;
use jotpad_store::auth::{Claims, JwtConfig};
use jotpad_store::MemoryGateway;
use jsonwebtoken::{encode, EncodingKey, Header};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            audience: None,
        },
    }
}

/// The app plus handles on its in-memory backend.
pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<MemoryGateway>,
    pub feed: Arc<ChangeFeed>,
    pub shutdown: CancellationToken,
}

/// Build the full application router, with the production middleware
/// stack, over an in-memory gateway.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let feed = Arc::new(ChangeFeed::default());
    let gateway = Arc::new(MemoryGateway::with_feed(Arc::clone(&feed)));
    let shutdown = CancellationToken::new();

    let state = AppState {
        gateway: gateway.clone(),
        pool: None,
        feed: Arc::clone(&feed),
        config: Arc::new(config.clone()),
        shutdown: shutdown.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        gateway,
        feed,
        shutdown,
    }
}

/// A valid access token for `user_id`.
pub fn token_for(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id,
        email: Some("ada@example.com".to_string()),
        exp: chrono::Utc::now().timestamp() + 900,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_with_token(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
