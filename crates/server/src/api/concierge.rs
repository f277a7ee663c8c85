use axum::{extract::State, routing::post, Json, Router};
use caliope_agent::{Recommendation, RecommendationSource};
use caliope_core::catalog::Catalog;
use caliope_core::domain::catalog::{CatalogItem, WellnessService};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};

/// Services shown when the generator is missing or comes back empty.
pub const FALLBACK_SERVICE_COUNT: usize = 5;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/concierge", post(recommend))
        .route("/api/v1/recommendations/services", post(generate_services))
}

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    #[serde(default)]
    pub preferences: String,
}

#[derive(Debug, Serialize)]
pub struct ConciergeResponse {
    pub items: Vec<CatalogItem>,
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl From<Recommendation> for ConciergeResponse {
    fn from(recommendation: Recommendation) -> Self {
        let (source, reason) = match recommendation.source {
            RecommendationSource::EmptyRequest => ("empty", None),
            RecommendationSource::Ai => ("ai", None),
            RecommendationSource::Keyword(reason) => ("keyword", Some(reason.reason_code())),
        };
        Self { items: recommendation.items, source, reason }
    }
}

async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<PreferencesRequest>,
) -> Result<Json<ConciergeResponse>, ApiError> {
    let services = state.repositories.services.list_all().await?;
    let products = state.repositories.products.list_all().await?;
    let catalog = Catalog::new(services, products);

    let recommendation = state.concierge.recommend(&request.preferences, &catalog).await;
    Ok(Json(recommendation.into()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedServicesResponse {
    pub services: Vec<WellnessService>,
    pub generated: bool,
}

async fn generate_services(
    State(state): State<AppState>,
    Json(request): Json<PreferencesRequest>,
) -> Result<Json<GeneratedServicesResponse>, ApiError> {
    if let Some(generator) = &state.generator {
        let services = generator.generate(&request.preferences).await;
        if !services.is_empty() {
            return Ok(Json(GeneratedServicesResponse { services, generated: true }));
        }
    }

    let mut services = state.repositories.services.list_all().await?;
    services.truncate(FALLBACK_SERVICE_COUNT);
    Ok(Json(GeneratedServicesResponse { services, generated: false }))
}
