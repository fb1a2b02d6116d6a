mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, ADMIN_NATIONAL_ID};
use harvest_trace::models::producer;
use rstest::rstest;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

#[tokio::test]
async fn producer_registers_and_logs_in() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/cadastro-produtor",
            Some(json!({ "name": "Ana Lima", "national_id": "12345678901", "password": "colheita" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Ana Lima");
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = app
        .call(
            Method::POST,
            "/api/login-produtor",
            Some(json!({ "cpf": "12345678901", "senha": "colheita" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "producer");
    assert_eq!(body["data"]["account"]["national_id"], "12345678901");
    assert_eq!(body["data"]["token"]["token_type"], "Bearer");
}

#[tokio::test]
async fn stored_password_is_an_argon2_hash() {
    let app = TestApp::new().await;
    app.register_producer("Ana", "12345678901").await;

    let stored = producer::Entity::find()
        .filter(producer::Column::NationalId.eq("12345678901"))
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("producer row");

    assert_ne!(stored.password_hash, "secret-1");
    assert!(stored.password_hash.starts_with("$argon2id$"));
    assert!(app
        .state
        .auth
        .passwords()
        .verify("secret-1", &stored.password_hash)
        .unwrap());
}

#[tokio::test]
async fn duplicate_national_id_conflicts() {
    let app = TestApp::new().await;
    app.register_producer("Ana", "12345678901").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/cadastro-produtor",
            Some(json!({ "nome": "Outra", "cpf": "12345678901", "senha": "abcd1234" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");
}

#[rstest]
#[case(json!({ "cpf": "1", "senha": "abcd" }), "name is required")]
#[case(json!({ "nome": "Ana", "senha": "abcd" }), "national_id is required")]
#[case(json!({ "nome": "Ana", "cpf": "1" }), "password is required")]
#[tokio::test]
async fn registration_requires_every_field(#[case] payload: serde_json::Value, #[case] message: &str) {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(Method::POST, "/api/cadastro-transportador", Some(payload), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains(message));
}

#[rstest]
#[case("12345678901", "wrong-password")]
#[case("99999999999", "secret-1")]
#[tokio::test]
async fn bad_credentials_get_one_generic_answer(#[case] national_id: &str, #[case] password: &str) {
    let app = TestApp::new().await;
    app.register_producer("Ana", "12345678901").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/login-produtor",
            Some(json!({ "cpf": national_id, "senha": password })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized: Invalid national ID or password");
}

#[tokio::test]
async fn login_is_scoped_to_the_account_kind() {
    let app = TestApp::new().await;
    app.register_producer("Ana", "12345678901").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/login-transportador",
            Some(json!({ "cpf": "12345678901", "senha": "secret-1" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bootstrap_admin_can_log_in_once_created() {
    let app = TestApp::new().await;
    let created_again = app
        .state
        .services
        .accounts
        .ensure_bootstrap_admin(ADMIN_NATIONAL_ID, "other", "Someone")
        .await
        .unwrap();
    assert!(!created_again);

    let token = app.admin_token().await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn producer_profile_is_private_to_its_owner() {
    let app = TestApp::new().await;
    let ana = app.register_producer("Ana", "12345678901").await;
    let bia = app.register_producer("Bia", "10987654321").await;
    let uri = format!("/api/produtor/{}", ana.id);

    let (status, _) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call(Method::GET, &uri, None, Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call(Method::GET, &uri, None, Some(&bia.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.call(Method::GET, &uri, None, Some(&ana.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ana");

    let admin = app.admin_token().await;
    let (status, _) = app.call(Method::GET, &uri, None, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn producer_updates_name_and_password() {
    let app = TestApp::new().await;
    let ana = app.register_producer("Ana", "12345678901").await;
    let uri = format!("/api/produtor/{}", ana.id);

    let (status, body) = app
        .call(
            Method::PUT,
            &uri,
            Some(json!({ "nome": "Ana Maria", "senha": "nova-senha" })),
            Some(&ana.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ana Maria");
    assert_eq!(body["data"]["national_id"], "12345678901");

    let token = app
        .login("/api/login-produtor", "12345678901", "nova-senha")
        .await;
    assert!(!token.is_empty());

    let (status, _) = app
        .call(Method::PUT, &uri, Some(json!({ "nome": "  " })), Some(&ana.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transporter_directory_is_sorted_by_name() {
    let app = TestApp::new().await;
    let zeca = app.register_transporter("Zeca Fretes", "22222222222").await;
    app.register_transporter("Alfa Cargas", "33333333333").await;

    let (status, _) = app.call(Method::GET, "/api/transportadores", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(Method::GET, "/api/transportadores", None, Some(&zeca.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alfa Cargas", "Zeca Fretes"]);
}
