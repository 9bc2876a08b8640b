use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use validator::Validate;

use crate::config::Config;
use crate::error::AppError;
use crate::generation::{fallback_batch, BonusDraft, GeneratedBatch, RecipeGenerator};
use crate::store::{RecipeRecord, RecipeStore};

#[derive(Clone)]
pub struct AppState {
    store: Arc<RecipeStore>,
    generator: Arc<RecipeGenerator>,
    config: Config,
}

impl AppState {
    pub fn new(store: RecipeStore, generator: RecipeGenerator, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            generator: Arc::new(generator),
            config,
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, message = "Please provide at least one ingredient"))]
    ingredients: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    ingredients: Option<String>,
}

/// A stored bonus recipe plus the shopping list that rides on the response
/// only; the record itself has no shopping-list field.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusRecipe {
    #[serde(flatten)]
    pub record: RecipeRecord,
    pub shopping_list: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub recipes: Vec<RecipeRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<BonusRecipe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_fallback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub recipes: Vec<RecipeRecord>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

type ApiResult<T> = Result<Json<T>, AppError>;

/// Create and configure the API router.
pub fn create_api(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/recipes/generate", post(generate_handler))
        .route("/api/recipes", get(list_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(state)
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> ApiResult<GenerateResponse> {
    // Deserialize by hand so a missing or mistyped field is a 400, not a
    // framework-shaped 422.
    let request: GenerateRequest = serde_json::from_value(payload)
        .map_err(|_| AppError::InvalidRequest("Invalid request data".into()))?;

    // Reject before any external call: empty and whitespace-only alike.
    request
        .validate()
        .map_err(|_| AppError::InvalidRequest("Please provide at least one ingredient".into()))?;
    if request.ingredients.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Please provide at least one ingredient".into(),
        ));
    }

    let ingredients = request.ingredients.as_str();
    let mut used_fallback = false;

    let batch: GeneratedBatch = match state.generator.generate(ingredients).await {
        Ok(batch) => batch,
        Err(e) if state.config.fallback_on_failure => {
            warn!(error = %e, ingredients, "completion call failed, serving fallback recipes");
            used_fallback = true;
            fallback_batch(
                ingredients,
                state.config.recipe_count,
                state.config.bonus_enabled,
            )
        }
        Err(e) => {
            warn!(ingredients, "recipe generation failed");
            return Err(e.into());
        }
    };

    // One write per draft, issued concurrently and awaited jointly; a single
    // failed write fails the whole request.
    let recipes = try_join_all(
        batch
            .recipes
            .into_iter()
            .map(|draft| state.store.create_recipe(draft, ingredients)),
    )
    .await?;

    let bonus = match batch.bonus {
        Some(BonusDraft {
            recipe,
            shopping_list,
        }) => {
            let record = state.store.create_recipe(recipe, ingredients).await?;
            Some(BonusRecipe {
                record,
                shopping_list,
            })
        }
        None => None,
    };

    info!(
        ingredients,
        count = recipes.len(),
        used_fallback,
        "stored generated recipes"
    );

    Ok(Json(GenerateResponse {
        recipes,
        bonus,
        used_fallback: used_fallback.then_some(true),
        message: used_fallback
            .then(|| "AI service unavailable - showing demo recipes".to_string()),
    }))
}

async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ListResponse> {
    let query = params
        .ingredients
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            AppError::InvalidRequest("Ingredients query parameter is required".into())
        })?;

    let recipes = state.store.find_by_ingredient_substring(&query).await;
    Ok(Json(ListResponse { recipes }))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
