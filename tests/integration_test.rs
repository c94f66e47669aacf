use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

mod common;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_predict_level_is_pure_and_needs_no_database() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(json_post(
            "/api/quiz/predict-level",
            serde_json::json!({"score": 10, "timeTaken": 1, "attempts": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["predictedDifficulty"], "hard");
}

#[tokio::test]
async fn test_predict_level_medium_band() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(json_post(
            "/api/quiz/predict-level",
            serde_json::json!({"score": 4, "timeTaken": 1, "attempts": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["predictedDifficulty"], "medium");
}

#[tokio::test]
async fn test_predict_level_requires_score_and_time() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(json_post(
            "/api/quiz/predict-level",
            serde_json::json!({"score": 5}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_quiz_generation_degrades_without_database() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot({
            let mut request = json_post(
                "/api/quiz/generate",
                serde_json::json!({"topic": "math", "difficulty": "easy", "count": 5}),
            );
            request
                .headers_mut()
                .insert("x-user-id", "demo".parse().unwrap());
            request
        })
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_quiz_generation_requires_user_header() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(json_post(
            "/api/quiz/generate",
            serde_json::json!({"topic": "math"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generated_questions_never_error_without_provider() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(json_post(
            "/api/quiz/generate-ai",
            serde_json::json!({"topic": "Algorithms", "difficulty": "medium", "count": 3}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["questions"], serde_json::json!([]));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
}
