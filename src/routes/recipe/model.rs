use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub ingredients: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub result: String,
}
