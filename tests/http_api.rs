//! End-to-end tests for the HTTP surface, with the inference API replaced by
//! an in-process stub serving canned chat-completion responses.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use lopdf::content::Content;
use lopdf::{Document, Object};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use recipeforge::config::Config;
use recipeforge::inference::InferenceClient;
use recipeforge::server::http::app;

/// Stub upstream whose every completion is `recipe #<n>`, n counting calls.
async fn spawn_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    let router = Router::new().route(
        "/chat/completions",
        post(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                let content = format!("recipe #{n}");
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": content}}]
                }))
            }
        }),
    );

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Stub upstream that records the `model` field of every request body.
async fn spawn_recording_upstream() -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let models = Arc::new(Mutex::new(Vec::new()));
    let recorder = models.clone();

    let router = Router::new().route(
        "/chat/completions",
        post(move |Json(body): Json<Value>| {
            let recorder = recorder.clone();
            async move {
                let model = body["model"].as_str().unwrap_or_default().to_string();
                recorder.lock().unwrap().push(model);
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "ok"}}]
                }))
            }
        }),
    );

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), models)
}

/// Stub upstream that returns a 200 with no `choices` at all.
async fn spawn_empty_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = Router::new().route(
        "/chat/completions",
        post(|| async { Json(json!({"id": "gen-empty"})) }),
    );

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn test_app(api_base: &str, export_dir: &str) -> Router {
    let mut config = Config::default();
    config.export.dir = export_dir.to_string();
    let client = InferenceClient::new(api_base, "test-key", "text-model", "vision-model");
    app(config, client)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn pdf_rows(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    let mut rows = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        for op in &content.operations {
            if op.operator == "Tj" {
                if let Object::String(text, _) = &op.operands[0] {
                    rows.push(String::from_utf8(text.clone()).unwrap());
                }
            }
        }
    }
    rows
}

#[tokio::test]
async fn health_check_responds() {
    let app = test_app("http://127.0.0.1:9", ".");
    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn empty_ingredients_are_rejected_without_an_outbound_call() {
    // Unroutable api_base: if the handler dispatched a request the test
    // would surface a 500, not the 422 guard.
    let app = test_app("http://127.0.0.1:9", ".");

    let (status, body) = send(
        &app,
        "POST",
        "/api/recipes/from-ingredients",
        Some(json!({"ingredients": "   "})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Please enter at least one ingredient.");
}

#[tokio::test]
async fn empty_dish_name_is_rejected_without_an_outbound_call() {
    let app = test_app("http://127.0.0.1:9", ".");

    let (status, body) = send(
        &app,
        "POST",
        "/api/recipes/by-name",
        Some(json!({"dish_name": ""})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Please enter a dish name.");
}

#[tokio::test]
async fn missing_image_payload_is_rejected() {
    let app = test_app("http://127.0.0.1:9", ".");

    let (status, body) = send(
        &app,
        "POST",
        "/api/detect/dish",
        Some(json!({"image_base64": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Please upload an image first.");

    let (status, body) = send(
        &app,
        "POST",
        "/api/detect/ingredients",
        Some(json!({"image_base64": "not//valid=base64!!"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Image payload is not valid base64.");
}

#[tokio::test]
async fn export_before_any_generation_is_not_found() {
    let app = test_app("http://127.0.0.1:9", ".");
    let (status, body) = send(&app, "GET", "/api/export/pdf", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Generate some recipes first before exporting.");
}

#[tokio::test]
async fn generation_stores_the_recipe_and_export_serves_it() {
    let upstream = spawn_upstream().await;
    let export_dir = tempfile::tempdir().unwrap();
    let app = test_app(&upstream, export_dir.path().to_str().unwrap());

    let (status, body) = send(
        &app,
        "POST",
        "/api/recipes/from-ingredients",
        Some(json!({"ingredients": "eggs, flour", "dietary_preferences": ["Vegan"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipe"], "recipe #1");
    assert_eq!(body["message"], Value::Null);

    // Second generation overwrites the slot.
    let (status, body) = send(
        &app,
        "POST",
        "/api/recipes/by-name",
        Some(json!({"dish_name": "Ramen"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipe"], "recipe #2");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/export/pdf")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    // The export contains the overwritten (latest) recipe.
    let rows = pdf_rows(&bytes);
    assert_eq!(rows, vec!["Generated Recipes", "recipe #2"]);

    // Side effect: the file also lands on disk under the export dir.
    assert!(export_dir.path().join("recipes_export.pdf").exists());
}

#[tokio::test]
async fn dish_detection_chains_probe_then_recipe() {
    let upstream = spawn_upstream().await;
    let app = test_app(&upstream, ".");

    let (status, body) = send(
        &app,
        "POST",
        "/api/detect/dish",
        Some(json!({"image_base64": "QUJD", "media_type": "image/png"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // First upstream call answers the vision probe, second the recipe.
    assert_eq!(body["detected"], "recipe #1");
    assert_eq!(body["recipe"], "recipe #2");
}

#[tokio::test]
async fn image_actions_probe_with_vision_then_generate_with_text_model() {
    let (upstream, models) = spawn_recording_upstream().await;
    let app = test_app(&upstream, ".");

    let (status, _) = send(
        &app,
        "POST",
        "/api/detect/dish",
        Some(json!({"image_base64": "QUJD"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/detect/ingredients",
        Some(json!({"image_base64": "QUJD"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/recipes/from-ingredients",
        Some(json!({"ingredients": "eggs"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/recipes/by-name",
        Some(json!({"dish_name": "Pho"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Only the two image probes use the vision model; every chained or
    // text-only generation goes to the text model.
    let recorded = models.lock().unwrap().clone();
    assert_eq!(
        recorded,
        vec![
            "vision-model",
            "text-model",
            "vision-model",
            "text-model",
            "text-model",
            "text-model",
        ]
    );
}

#[tokio::test]
async fn ingredient_detection_caches_ingredients_in_the_session() {
    let upstream = spawn_upstream().await;
    let app = test_app(&upstream, ".");

    let (status, body) = send(
        &app,
        "POST",
        "/api/detect/ingredients",
        Some(json!({"image_base64": "QUJD"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detected"], "recipe #1");

    let (status, body) = send(&app, "GET", "/api/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detected_ingredients"], "recipe #1");
    assert_eq!(body["has_recipe"], true);
}

#[tokio::test]
async fn upstream_without_choices_is_an_empty_state_not_an_error() {
    let upstream = spawn_empty_upstream().await;
    let app = test_app(&upstream, ".");

    let (status, body) = send(
        &app,
        "POST",
        "/api/recipes/from-ingredients",
        Some(json!({"ingredients": "eggs"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipe"], Value::Null);
    assert_eq!(body["message"], "No recipe was generated.");

    // Detection reports the original warning strings.
    let (status, body) = send(
        &app,
        "POST",
        "/api/detect/dish",
        Some(json!({"image_base64": "QUJD"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Could not identify dish from image.");

    let (status, body) = send(
        &app,
        "POST",
        "/api/detect/ingredients",
        Some(json!({"image_base64": "QUJD"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No ingredients found in the image.");

    // Nothing was stored, so export still has nothing to serve.
    let (status, _) = send(&app, "GET", "/api/export/pdf", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upstream_failure_becomes_one_flat_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "upstream down") }),
    );
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let app = test_app(&format!("http://{addr}"), ".");
    let (status, body) = send(
        &app,
        "POST",
        "/api/recipes/by-name",
        Some(json!({"dish_name": "Pho"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("503"), "got: {message}");
}
