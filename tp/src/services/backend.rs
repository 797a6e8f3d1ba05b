//! Recommendation backend client
//!
//! Implements ingredient generation and pricing over the backend's GET
//! endpoints. Bodies come back in several shapes: bare JSON, wrapped as
//! `{"success": true, "recommendation": ..}`, fenced in markdown, or an
//! `{"error": ..}` payload.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{GenerationRequest, IngredientGenerator, PricingRequest, PricingService, ServiceError, http_client};
use crate::config::ServicesConfig;
use crate::domain::{Ingredient, RecommendationResult};

/// Backend HTTP client
pub struct BackendClient {
    base_url: String,
    generate_path: String,
    recommendation_path: String,
    http: Client,
}

impl BackendClient {
    pub fn from_config(config: &ServicesConfig) -> Result<Self, ServiceError> {
        debug!(base_url = %config.backend_url, "from_config: called");
        Ok(Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            generate_path: config.generate_path.clone(),
            recommendation_path: config.recommendation_path.clone(),
            http: http_client(config)?,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, ServiceError> {
        let url = self.endpoint(path);
        debug!(%url, "get: called");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status().as_u16();

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(status, "get: API error");
            return Err(ServiceError::ApiError { status, message: text });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl IngredientGenerator for BackendClient {
    async fn generate(&self, request: GenerationRequest) -> Result<Vec<Ingredient>, ServiceError> {
        debug!(dish = %request.dish, people = request.people_count, "generate: called");
        let body = self
            .get(
                &self.generate_path,
                &[("dish", request.dish), ("people", request.people_count.to_string())],
            )
            .await?;
        parse_ingredients(&body)
    }
}

#[async_trait]
impl PricingService for BackendClient {
    async fn recommend(&self, request: PricingRequest) -> Result<RecommendationResult, ServiceError> {
        debug!(
            people = request.people_count,
            budget = request.budget,
            items = request.ingredients.len(),
            "recommend: called"
        );
        let ingredients = serde_json::to_string(&request.ingredients)?;
        let body = self
            .get(
                &self.recommendation_path,
                &[
                    ("people", request.people_count.to_string()),
                    ("budget", request.budget.to_string()),
                    ("ingredients", ingredients),
                ],
            )
            .await?;
        parse_recommendation(&body)
    }
}

/// Remove a surrounding markdown code fence (```json .. ```), if any
pub(crate) fn strip_fences(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches("json"),
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Decode a body and peel off the success envelope
fn unwrap_envelope(body: &str) -> Result<Value, ServiceError> {
    let mut value: Value = serde_json::from_str(strip_fences(body))?;

    // The backend sometimes double-encodes: a JSON string holding JSON
    if let Value::String(inner) = &value {
        value = serde_json::from_str(strip_fences(inner))?;
    }

    if let Some(error) = value.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        warn!(%message, "unwrap_envelope: service returned an error payload");
        return Err(ServiceError::Rejected(message));
    }

    if value.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ServiceError::Rejected("request was not successful".to_string()));
    }

    match value {
        Value::Object(mut map) if map.contains_key("recommendation") => {
            let inner = map.remove("recommendation").unwrap_or(Value::Null);
            match inner {
                Value::String(s) => Ok(serde_json::from_str(strip_fences(&s))?),
                other => Ok(other),
            }
        }
        other => Ok(other),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IngredientsBody {
    Wrapped { ingredients: Vec<Ingredient> },
    Bare(Vec<Ingredient>),
}

pub(crate) fn parse_ingredients(body: &str) -> Result<Vec<Ingredient>, ServiceError> {
    let value = unwrap_envelope(body)?;
    let parsed: IngredientsBody = serde_json::from_value(value)
        .map_err(|e| ServiceError::InvalidResponse(format!("ingredient list: {}", e)))?;
    let ingredients = match parsed {
        IngredientsBody::Wrapped { ingredients } => ingredients,
        IngredientsBody::Bare(ingredients) => ingredients,
    };
    debug!(count = ingredients.len(), "parse_ingredients: parsed");
    Ok(ingredients)
}

pub(crate) fn parse_recommendation(body: &str) -> Result<RecommendationResult, ServiceError> {
    let value = unwrap_envelope(body)?;
    if !value.is_object() {
        return Err(ServiceError::InvalidResponse(format!(
            "expected a recommendation object, got {}",
            value
        )));
    }
    let result: RecommendationResult = serde_json::from_value(value)?;
    debug!(
        store = %result.recommended_store,
        items = result.ingredients.len(),
        "parse_recommendation: parsed"
    );
    Ok(result)
}
