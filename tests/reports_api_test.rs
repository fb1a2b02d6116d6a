mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rstest::rstest;

#[tokio::test]
async fn production_report_sums_per_product_within_inclusive_range() {
    let app = TestApp::new().await;
    let ana = app.register_producer("Ana", "11111111111").await;
    let bia = app.register_producer("Bia", "22222222222").await;

    app.register_lot(&ana, "Cafe", "2024-01-01").await;
    app.register_lot(&ana, "Cafe", "2024-01-31").await;
    app.register_lot(&ana, "Milho", "2024-01-15").await;
    app.register_lot(&ana, "Cafe", "2024-02-01").await;
    app.register_lot(&bia, "Cafe", "2024-01-10").await;

    let uri = format!(
        "/api/relatorios/producao?produtor_id={}&inicio=2024-01-01&fim=2024-01-31",
        ana.id
    );
    let (status, body) = app.call(Method::GET, &uri, None, Some(&ana.token)).await;
    assert_eq!(status, StatusCode::OK);

    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["product"], "Cafe");
    assert_eq!(rows[0]["total_quantity"].as_f64(), Some(200.0));
    assert_eq!(rows[0]["lot_count"], 2);
    assert_eq!(rows[1]["product"], "Milho");
    assert_eq!(rows[1]["lot_count"], 1);
}

#[tokio::test]
async fn production_report_filters_by_product() {
    let app = TestApp::new().await;
    let ana = app.register_producer("Ana", "11111111111").await;
    app.register_lot(&ana, "Cafe", "2024-01-01").await;
    app.register_lot(&ana, "Milho", "2024-01-02").await;

    let (status, body) = app
        .call(
            Method::GET,
            "/api/relatorios/producao?inicio=2024-01-01&fim=2024-12-31&produto=Milho",
            None,
            Some(&ana.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["product"], "Milho");
}

#[rstest]
#[case("inicio=2024-02-01&fim=2024-01-01", "start must not be after end")]
#[case("fim=2024-01-01", "start is required")]
#[case("inicio=2024-01-01", "end is required")]
#[tokio::test]
async fn production_report_validates_range(#[case] query: &str, #[case] message: &str) {
    let app = TestApp::new().await;
    let ana = app.register_producer("Ana", "11111111111").await;

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/relatorios/producao?{query}"),
            None,
            Some(&ana.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains(message));
}

#[tokio::test]
async fn production_report_is_private_to_the_producer() {
    let app = TestApp::new().await;
    let ana = app.register_producer("Ana", "11111111111").await;
    let bia = app.register_producer("Bia", "22222222222").await;
    let uri = format!(
        "/api/relatorios/producao?produtor_id={}&inicio=2024-01-01&fim=2024-01-31",
        ana.id
    );

    let (status, _) = app.call(Method::GET, &uri, None, Some(&bia.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin_token().await;
    let (status, _) = app.call(Method::GET, &uri, None, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
}
