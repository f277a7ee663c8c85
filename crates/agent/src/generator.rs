use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use caliope_core::domain::catalog::{ServiceId, WellnessService, DEFAULT_SERVICE_IMAGE};

use crate::concierge::strip_code_fences;
use crate::llm::LlmClient;

pub const GENERATED_SERVICE_COUNT: usize = 3;

/// Drafts new wellness services for a free-text need.
pub struct ServiceGenerator {
    client: Arc<dyn LlmClient>,
    timeout: Duration,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftService {
    name: String,
    category: String,
    description: String,
    price: u64,
    #[serde(default)]
    rating: f32,
    #[serde(default)]
    review_count: u32,
    #[serde(default = "default_duration")]
    duration: u32,
    #[serde(default)]
    image: Option<String>,
}

fn default_duration() -> u32 {
    60
}

impl ServiceGenerator {
    pub fn new(client: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Empty on any failure; callers decide what to show instead.
    pub async fn generate(&self, preferences: &str) -> Vec<WellnessService> {
        if preferences.trim().is_empty() {
            return Vec::new();
        }

        let outcome = tokio::time::timeout(self.timeout, self.draft(preferences)).await;
        match outcome {
            Ok(Ok(services)) => {
                info!(
                    event_name = "generator.services.drafted",
                    count = services.len(),
                    "AI drafted services"
                );
                services
            }
            Ok(Err(error)) => {
                warn!(event_name = "generator.services.failed", error = %error, "service drafting failed");
                Vec::new()
            }
            Err(_) => {
                warn!(event_name = "generator.services.timeout", "service drafting timed out");
                Vec::new()
            }
        }
    }

    async fn draft(&self, preferences: &str) -> Result<Vec<WellnessService>> {
        let raw = self.client.complete(&generation_prompt(preferences)).await?;
        parse_drafts(&raw, Utc::now())
    }
}

fn generation_prompt(preferences: &str) -> String {
    format!(
        "Actúa como un experto Concierge de Bienestar y Spa para la app \"Caliope\".\n\
         El usuario te dirá cómo se siente o qué necesita. Recomiéndale {GENERATED_SERVICE_COUNT} servicios \
         específicos que alivien sus dolencias o mejoren su estado.\n\n\
         Entrada del usuario: \"{}\"\n\n\
         Responde ÚNICAMENTE con un array JSON de objetos con los campos \
         name, category, description, price, rating, reviewCount, duration e image.\n\
         Usa precios realistas en pesos colombianos entre 80000 y 400000, categorías como \
         'Masajes', 'Faciales', 'Terapias' o 'Meditación', y rating entre 4.5 y 5.0.",
        preferences.trim()
    )
}

fn parse_drafts(raw: &str, now: DateTime<Utc>) -> Result<Vec<WellnessService>> {
    let drafts: Vec<DraftService> = serde_json::from_str(&strip_code_fences(raw))
        .context("generated services were not a JSON array of service objects")?;

    let stamp = now.timestamp_millis();
    Ok(drafts
        .into_iter()
        .take(GENERATED_SERVICE_COUNT)
        .enumerate()
        .map(|(index, draft)| WellnessService {
            id: ServiceId(format!("ai-{stamp}-{index}")),
            name: draft.name,
            category: draft.category,
            description: draft.description,
            price: draft.price,
            rating: draft.rating.clamp(0.0, 5.0),
            review_count: draft.review_count,
            duration: draft.duration,
            image: draft
                .image
                .filter(|image| !image.trim().is_empty())
                .or_else(|| Some(DEFAULT_SERVICE_IMAGE.to_string())),
            created_at: now,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use caliope_core::domain::catalog::DEFAULT_SERVICE_IMAGE;

    use super::{parse_drafts, ServiceGenerator};
    use crate::llm::LlmClient;

    struct FixedClient(Result<&'static str, &'static str>);

    #[async_trait]
    impl LlmClient for FixedClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.0.map(str::to_string).map_err(|message| anyhow!(message))
        }
    }

    fn generator(reply: Result<&'static str, &'static str>) -> ServiceGenerator {
        ServiceGenerator::new(Arc::new(FixedClient(reply)), Duration::from_secs(1))
    }

    const DRAFTS: &str = r#"```json
    [
      {"id": "generated-1", "name": "Masaje Descontracturante", "category": "Masajes",
       "description": "Alivia la tensión de la espalda", "price": 150000, "rating": 4.8,
       "reviewCount": 120, "duration": 60, "image": ""},
      {"name": "Meditación Guiada", "category": "Meditación",
       "description": "Calma la mente", "price": 80000, "rating": 7.5}
    ]
    ```"#;

    #[test]
    fn drafts_get_synthetic_ids_and_default_image() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid time");
        let services = parse_drafts(DRAFTS, now).expect("parse");

        assert_eq!(services.len(), 2);
        let stamp = now.timestamp_millis();
        assert_eq!(services[0].id.0, format!("ai-{stamp}-0"));
        assert_eq!(services[1].id.0, format!("ai-{stamp}-1"));
        assert_eq!(services[0].image.as_deref(), Some(DEFAULT_SERVICE_IMAGE));
        assert_eq!(services[1].duration, 60);
        assert_eq!(services[1].rating, 5.0);
        assert!(services.iter().all(|service| service.created_at == now));
    }

    #[tokio::test]
    async fn failures_yield_an_empty_list() {
        assert!(generator(Err("quota exceeded")).generate("estrés").await.is_empty());
        assert!(generator(Ok("{\"name\": \"x\"}")).generate("estrés").await.is_empty());
        assert!(generator(Ok(DRAFTS)).generate("  ").await.is_empty());
    }

    #[tokio::test]
    async fn successful_draft_is_returned() {
        let services = generator(Ok(DRAFTS)).generate("dolor de espalda").await;
        assert_eq!(services.len(), 2);
        assert!(services[0].id.0.starts_with("ai-"));
    }
}
