use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{AppState, upstream::RecipeGenerator as _, utils::error_body};

use super::model::{RecipeRequest, RecipeResponse};

/// 按食材列表同步生成菜谱文本
/// 上游文本接口延迟可控，这里不走任务队列，也不计入图像生成额度
#[axum::debug_handler]
pub async fn suggest_recipes(
    State(state): State<AppState>,
    Json(req): Json<RecipeRequest>,
) -> Response {
    let ingredients = req.ingredients.unwrap_or_default();
    let ingredients = ingredients.trim();
    if ingredients.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_body("Ingredients are required."),
        )
            .into_response();
    }

    match state.recipes.suggest(ingredients).await {
        Ok(result) => (StatusCode::OK, Json(RecipeResponse { result })).into_response(),
        Err(e) => {
            tracing::error!("recipe generation failed: {}", e);
            (StatusCode::BAD_GATEWAY, error_body("Recipe generation failed"))
                .into_response()
        }
    }
}
