//! HTTP surface for the recipe front-end.
//!
//! One interactive session is assumed: a single last-recipe slot shared by
//! all generation actions, overwritten on every success and read by the PDF
//! export. Each action is one blocking round-trip to the inference API.

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::export::render_pdf;
use crate::inference::{ImageData, InferenceClient, InferenceError};
use crate::prompts;
use crate::session::SessionState;

pub struct Server {
    config: Config,
    client: InferenceClient,
}

struct AppState {
    config: Config,
    client: InferenceClient,
    session: Mutex<SessionState>,
}

impl Server {
    pub fn new(config: &Config) -> Result<Self> {
        let client = InferenceClient::from_config(&config.inference)?;
        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr =
            format!("{}:{}", self.config.server.bind, self.config.server.port).parse()?;
        let router = app(self.config, self.client);

        info!("Starting recipe server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;
        Ok(())
    }
}

/// Build the full router. Separate from [`Server::run`] so tests can drive it
/// without binding a socket.
pub fn app(config: Config, client: InferenceClient) -> Router {
    let state = Arc::new(AppState {
        config,
        client,
        session: Mutex::new(SessionState::default()),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(super::assets::index))
        .route("/health", get(health_check))
        .route("/api/status", get(status))
        .route("/api/session", get(session_info))
        .route("/api/detect/dish", post(detect_dish))
        .route("/api/detect/ingredients", post(detect_ingredients))
        .route("/api/recipes/from-ingredients", post(recipes_from_ingredients))
        .route("/api/recipes/by-name", post(recipe_by_name))
        .route("/api/export/pdf", get(export_pdf))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Flat error response: every failure surfaces as one message, no
// classification beyond the status code.
struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        AppError(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

async fn health_check() -> &'static str {
    "OK"
}

#[derive(Serialize)]
struct StatusResponse {
    version: String,
    text_model: String,
    vision_model: String,
    has_recipe: bool,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let session = state.session.lock().await;
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        text_model: state.client.text_model().to_string(),
        vision_model: state.client.vision_model().to_string(),
        has_recipe: session.last_recipe().is_some(),
    })
}

#[derive(Serialize)]
struct SessionInfoResponse {
    detected_ingredients: Option<String>,
    has_recipe: bool,
}

// The UI prefills the ingredients tab with whatever the last photo probe
// detected, like the original session-state carry-over.
async fn session_info(State(state): State<Arc<AppState>>) -> Json<SessionInfoResponse> {
    let session = state.session.lock().await;
    Json(SessionInfoResponse {
        detected_ingredients: session.detected_ingredients().map(str::to_string),
        has_recipe: session.last_recipe().is_some(),
    })
}

#[derive(Deserialize)]
struct ImageRequest {
    image_base64: String,
    media_type: Option<String>,
}

#[derive(Serialize)]
struct DetectionResponse {
    detected: Option<String>,
    recipe: Option<String>,
    message: Option<String>,
}

fn decode_image(request: &ImageRequest) -> Result<ImageData, AppError> {
    if request.image_base64.trim().is_empty() {
        return Err(AppError(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Please upload an image first.".to_string(),
        ));
    }
    if BASE64.decode(request.image_base64.as_bytes()).is_err() {
        return Err(AppError(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Image payload is not valid base64.".to_string(),
        ));
    }
    Ok(ImageData {
        data: request.image_base64.clone(),
        // The original always labeled uploads as JPEG; keep that default.
        media_type: request
            .media_type
            .clone()
            .unwrap_or_else(|| "image/jpeg".to_string()),
    })
}

async fn detect_dish(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImageRequest>,
) -> Result<Json<DetectionResponse>, AppError> {
    let image = decode_image(&request)?;

    let detected = state
        .client
        .describe_image(prompts::DISH_PROBE, &image, prompts::VISION_SAMPLING)
        .await?;

    let Some(dish_name) = detected else {
        return Ok(Json(DetectionResponse {
            detected: None,
            recipe: None,
            message: Some("Could not identify dish from image.".to_string()),
        }));
    };

    let prompt = prompts::recipe_from_detected_dish(&dish_name);
    let recipe = state
        .client
        .complete_text(&prompt, prompts::RECIPE_SAMPLING)
        .await?;

    let (recipe, message) = store_recipe(&state, recipe).await;
    Ok(Json(DetectionResponse {
        detected: Some(dish_name),
        recipe,
        message,
    }))
}

async fn detect_ingredients(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImageRequest>,
) -> Result<Json<DetectionResponse>, AppError> {
    let image = decode_image(&request)?;

    let detected = state
        .client
        .describe_image(prompts::INGREDIENT_PROBE, &image, prompts::VISION_SAMPLING)
        .await?;

    let Some(ingredients) = detected else {
        return Ok(Json(DetectionResponse {
            detected: None,
            recipe: None,
            message: Some("No ingredients found in the image.".to_string()),
        }));
    };

    state
        .session
        .lock()
        .await
        .record_ingredients(ingredients.clone());

    let prompt = prompts::creative_recipes_from_ingredients(&ingredients);
    let recipe = state
        .client
        .complete_text(&prompt, prompts::RECIPE_SAMPLING)
        .await?;

    let (recipe, message) = store_recipe(&state, recipe).await;
    Ok(Json(DetectionResponse {
        detected: Some(ingredients),
        recipe,
        message,
    }))
}

#[derive(Deserialize)]
struct IngredientsRequest {
    ingredients: String,
    #[serde(default)]
    dietary_preferences: Vec<String>,
}

#[derive(Serialize)]
struct RecipeResponse {
    recipe: Option<String>,
    message: Option<String>,
}

async fn recipes_from_ingredients(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngredientsRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    if request.ingredients.trim().is_empty() {
        return Err(AppError(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Please enter at least one ingredient.".to_string(),
        ));
    }

    let prompt = prompts::recipes_from_ingredients(
        &request.ingredients,
        &request.dietary_preferences,
    );
    let recipe = state
        .client
        .complete_text(&prompt, prompts::RECIPE_SAMPLING)
        .await?;

    let (recipe, message) = store_recipe(&state, recipe).await;
    Ok(Json(RecipeResponse { recipe, message }))
}

#[derive(Deserialize)]
struct DishNameRequest {
    dish_name: String,
    available_ingredients: Option<String>,
}

async fn recipe_by_name(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DishNameRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    if request.dish_name.trim().is_empty() {
        return Err(AppError(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Please enter a dish name.".to_string(),
        ));
    }

    let prompt = prompts::recipe_by_dish_name(
        &request.dish_name,
        request.available_ingredients.as_deref(),
    );
    let recipe = state
        .client
        .complete_text(&prompt, prompts::RECIPE_SAMPLING)
        .await?;

    let (recipe, message) = store_recipe(&state, recipe).await;
    Ok(Json(RecipeResponse { recipe, message }))
}

/// Overwrite the session slot on success; map an empty `choices` outcome to
/// the empty-state message instead of an error.
async fn store_recipe(
    state: &Arc<AppState>,
    recipe: Option<String>,
) -> (Option<String>, Option<String>) {
    match recipe {
        Some(text) => {
            state.session.lock().await.record_recipe(text.clone());
            (Some(text), None)
        }
        None => (None, Some("No recipe was generated.".to_string())),
    }
}

async fn export_pdf(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let session = state.session.lock().await;
    let Some(text) = session.last_recipe() else {
        return Err(AppError(
            StatusCode::NOT_FOUND,
            "Generate some recipes first before exporting.".to_string(),
        ));
    };

    let bytes = render_pdf(text, &state.config.export.title)
        .map_err(|e| AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    drop(session);

    // Keep the original's side effect of leaving the file on disk; the
    // download itself does not depend on the write succeeding.
    let path = Path::new(&state.config.export.dir).join(&state.config.export.filename);
    if let Err(e) = tokio::fs::write(&path, &bytes).await {
        warn!("Failed to write export file {}: {}", path.display(), e);
    }

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", state.config.export.filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
