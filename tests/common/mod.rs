#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use harvest_trace::{
    build_router,
    config::AppConfig,
    db::{self, DbConfig},
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN_NATIONAL_ID: &str = "00000000000";
pub const ADMIN_PASSWORD: &str = "admin-pass";

/// Application state and router over a private in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

/// A registered account and its session token.
pub struct Account {
    pub id: i64,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "127.0.0.1".to_string(),
            3001,
            "test".to_string(),
        );
        // Cheap argon2 parameters keep the suite fast.
        cfg.password_hash_memory_kib = 1024;
        cfg.password_hash_iterations = 1;
        cfg.bootstrap_admin_national_id = Some(ADMIN_NATIONAL_ID.to_string());
        cfg.bootstrap_admin_password = Some(ADMIN_PASSWORD.to_string());

        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("failed to open in-memory database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg).expect("valid auth config for tests");
        state
            .services
            .accounts
            .ensure_bootstrap_admin(ADMIN_NATIONAL_ID, ADMIN_PASSWORD, "Administrator")
            .await
            .expect("bootstrap admin");

        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and returns the status with the decoded JSON body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, token).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    pub async fn register_producer(&self, name: &str, national_id: &str) -> Account {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/cadastro-produtor",
                Some(json!({ "nome": name, "cpf": national_id, "senha": "secret-1" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register producer: {body}");

        let token = self.login("/api/login-produtor", national_id, "secret-1").await;
        Account {
            id: body["data"]["id"].as_i64().expect("producer id"),
            token,
        }
    }

    pub async fn register_transporter(&self, name: &str, national_id: &str) -> Account {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/cadastro-transportador",
                Some(json!({
                    "nome": name,
                    "cpf": national_id,
                    "senha": "secret-1",
                    "telefone": "+55 31 99999-0000"
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register transporter: {body}");

        let token = self
            .login("/api/login-transportador", national_id, "secret-1")
            .await;
        Account {
            id: body["data"]["id"].as_i64().expect("transporter id"),
            token,
        }
    }

    pub async fn admin_token(&self) -> String {
        self.login("/api/login-admin", ADMIN_NATIONAL_ID, ADMIN_PASSWORD)
            .await
    }

    pub async fn login(&self, path: &str, national_id: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                path,
                Some(json!({ "cpf": national_id, "senha": password })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login: {body}");
        body["data"]["token"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// Registers a lot through the API and returns its id.
    pub async fn register_lot(&self, producer: &Account, product: &str, harvest_date: &str) -> i64 {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/lotes",
                Some(json!({
                    "produtor_id": producer.id,
                    "produto": product,
                    "quantidade": 100.0,
                    "data_colheita": harvest_date,
                    "local_producao": "Fazenda Boa Vista"
                })),
                Some(&producer.token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register lot: {body}");
        body["data"]["lot"]["id"].as_i64().expect("lot id")
    }
}

pub async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    })
}
