//! Wellness concierge: turns free-text preferences into a short list of catalog items.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{info, warn};

use caliope_core::catalog::Catalog;
use caliope_core::domain::catalog::CatalogItem;

use crate::llm::LlmClient;

pub const DEFAULT_MAX_RESULTS: usize = 6;
pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(8);

#[async_trait]
pub trait Recommender: Send + Sync {
    fn name(&self) -> &'static str;
    async fn recommend(&self, preferences: &str, catalog: &Catalog) -> Result<Vec<CatalogItem>>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShuffleMode {
    #[default]
    Random,
    Seeded(u64),
}

/// Substring match on keywords, shuffled and truncated.
#[derive(Clone, Debug)]
pub struct KeywordRecommender {
    max_results: usize,
    shuffle: ShuffleMode,
}

impl Default for KeywordRecommender {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS)
    }
}

impl KeywordRecommender {
    pub fn new(max_results: usize) -> Self {
        Self { max_results, shuffle: ShuffleMode::Random }
    }

    pub fn with_shuffle(mut self, shuffle: ShuffleMode) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn matches(&self, preferences: &str, catalog: &Catalog) -> Vec<CatalogItem> {
        let keywords = keywords(preferences);
        if keywords.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<CatalogItem> = catalog
            .items()
            .into_iter()
            .filter(|item| {
                let entry = item.entry();
                let haystack =
                    format!("{} {} {}", entry.name(), entry.description(), entry.category())
                        .to_lowercase();
                keywords.iter().any(|keyword| haystack.contains(keyword.as_str()))
            })
            .collect();

        match self.shuffle {
            ShuffleMode::Random => hits.shuffle(&mut rand::thread_rng()),
            ShuffleMode::Seeded(seed) => hits.shuffle(&mut StdRng::seed_from_u64(seed)),
        }
        hits.truncate(self.max_results);
        hits
    }
}

#[async_trait]
impl Recommender for KeywordRecommender {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn recommend(&self, preferences: &str, catalog: &Catalog) -> Result<Vec<CatalogItem>> {
        Ok(self.matches(preferences, catalog))
    }
}

/// Lowercased keywords split on whitespace and commas.
pub fn keywords(preferences: &str) -> Vec<String> {
    preferences
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Asks the language model to pick ids from a compact catalog listing.
pub struct AiRecommender {
    client: Arc<dyn LlmClient>,
    max_results: usize,
}

impl AiRecommender {
    pub fn new(client: Arc<dyn LlmClient>, max_results: usize) -> Self {
        Self { client, max_results }
    }
}

#[async_trait]
impl Recommender for AiRecommender {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn recommend(&self, preferences: &str, catalog: &Catalog) -> Result<Vec<CatalogItem>> {
        let prompt = selection_prompt(preferences, catalog);
        let raw = self.client.complete(&prompt).await?;
        let ids = parse_id_list(&raw)?;

        let mut items: Vec<CatalogItem> = Vec::new();
        for id in &ids {
            if items.iter().any(|item| item.id() == id) {
                continue;
            }
            if let Some(item) = catalog.find_item(id) {
                items.push(item);
            }
        }
        items.truncate(self.max_results);
        Ok(items)
    }
}

pub fn catalog_context(catalog: &Catalog) -> String {
    catalog
        .items()
        .iter()
        .map(|item| {
            let entry = item.entry();
            format!(
                "{}|{}|{}|{}|{}",
                item.kind().as_str(),
                item.id(),
                entry.name(),
                entry.category(),
                entry.description()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn selection_prompt(preferences: &str, catalog: &Catalog) -> String {
    format!(
        "Actúa como un experto concierge de bienestar y estética.\n\n\
         CATÁLOGO DISPONIBLE:\n{}\n\n\
         SOLICITUD DEL USUARIO: \"{}\"\n\n\
         TAREA:\n\
         Analiza la solicitud y selecciona los 3-5 mejores ítems del catálogo que satisfagan la necesidad del usuario.\n\
         Prioriza la relevancia semántica sobre la coincidencia exacta de palabras.\n\n\
         FORMATO DE RESPUESTA:\n\
         Devuelve SOLO un array JSON válido de strings con los IDs de los items seleccionados.\n\
         Ejemplo: [\"srv-001\", \"prod-004\"]\n\
         NO incluyas markdown, explicaciones ni texto adicional. Solo el JSON.",
        catalog_context(catalog),
        preferences.trim()
    )
}

/// Removes markdown code fences a model may wrap its answer in.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn parse_id_list(raw: &str) -> Result<Vec<String>> {
    let cleaned = strip_code_fences(raw);
    let value: serde_json::Value =
        serde_json::from_str(&cleaned).context("AI response was not valid JSON")?;
    if !value.is_array() {
        bail!("AI response was not a JSON array");
    }
    serde_json::from_value(value).context("AI response array must contain only string ids")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    NoCollaborator,
    CollaboratorFailed,
    TimedOut,
}

impl FallbackReason {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::NoCollaborator => "ai_not_configured",
            Self::CollaboratorFailed => "ai_failed",
            Self::TimedOut => "ai_timed_out",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecommendationSource {
    EmptyRequest,
    Ai,
    Keyword(FallbackReason),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub items: Vec<CatalogItem>,
    pub source: RecommendationSource,
}

/// Chooses between the AI and keyword strategies. Never fails outward.
pub struct Concierge {
    ai: Option<AiRecommender>,
    keyword: KeywordRecommender,
    ai_timeout: Duration,
}

impl Concierge {
    pub fn new(client: Option<Arc<dyn LlmClient>>, max_results: usize, ai_timeout: Duration) -> Self {
        Self {
            ai: client.map(|client| AiRecommender::new(client, max_results)),
            keyword: KeywordRecommender::new(max_results),
            ai_timeout,
        }
    }

    pub fn offline(max_results: usize) -> Self {
        Self::new(None, max_results, DEFAULT_AI_TIMEOUT)
    }

    pub fn with_shuffle(mut self, shuffle: ShuffleMode) -> Self {
        self.keyword = self.keyword.with_shuffle(shuffle);
        self
    }

    pub fn has_ai(&self) -> bool {
        self.ai.is_some()
    }

    pub async fn recommend(&self, preferences: &str, catalog: &Catalog) -> Recommendation {
        if preferences.trim().is_empty() {
            return Recommendation { items: Vec::new(), source: RecommendationSource::EmptyRequest };
        }

        let Some(ai) = &self.ai else {
            return self.fallback(preferences, catalog, FallbackReason::NoCollaborator);
        };

        match tokio::time::timeout(self.ai_timeout, ai.recommend(preferences, catalog)).await {
            Ok(Ok(items)) => {
                info!(
                    event_name = "concierge.ai.selected",
                    strategy = ai.name(),
                    count = items.len(),
                    "AI recommendations resolved"
                );
                Recommendation { items, source: RecommendationSource::Ai }
            }
            Ok(Err(error)) => {
                warn!(
                    event_name = "concierge.ai.failed",
                    error = %error,
                    "AI recommendation failed; using keyword matching"
                );
                self.fallback(preferences, catalog, FallbackReason::CollaboratorFailed)
            }
            Err(_) => {
                warn!(
                    event_name = "concierge.ai.timeout",
                    timeout_ms = self.ai_timeout.as_millis() as u64,
                    "AI recommendation timed out; using keyword matching"
                );
                self.fallback(preferences, catalog, FallbackReason::TimedOut)
            }
        }
    }

    fn fallback(&self, preferences: &str, catalog: &Catalog, reason: FallbackReason) -> Recommendation {
        let items = self.keyword.matches(preferences, catalog);
        info!(
            event_name = "concierge.fallback.used",
            strategy = self.keyword.name(),
            reason_code = reason.reason_code(),
            count = items.len(),
            "keyword recommendations resolved"
        );
        Recommendation { items, source: RecommendationSource::Keyword(reason) }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::Utc;

    use caliope_core::catalog::Catalog;
    use caliope_core::domain::catalog::{Product, ProductId, ServiceId, WellnessService};

    use super::{
        catalog_context, keywords, parse_id_list, Concierge, FallbackReason, KeywordRecommender,
        RecommendationSource, ShuffleMode,
    };
    use crate::llm::LlmClient;

    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    struct ScriptedClient {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self { reply, calls: AtomicUsize::new(0) })
        }
    }

    fn concierge(client: &Arc<ScriptedClient>, timeout: Duration) -> Concierge {
        let client: Arc<dyn LlmClient> = client.clone();
        Concierge::new(Some(client), 6, timeout)
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(anyhow!("provider unavailable")),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok("[]".to_string())
                }
            }
        }
    }

    fn service(id: &str, name: &str, category: &str, description: &str) -> WellnessService {
        WellnessService {
            id: ServiceId(id.to_string()),
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            price: 100_000,
            rating: 4.5,
            review_count: 10,
            duration: 60,
            image: None,
            created_at: Utc::now(),
        }
    }

    fn catalog() -> Catalog {
        let mut services = vec![
            service("srv-1", "Masaje Terapéutico", "Masajes", "Alivio para dolor de espalda"),
            service("srv-2", "Facial Hidratante", "Faciales", "Hidratación profunda"),
        ];
        for index in 0..10 {
            services.push(service(
                &format!("srv-relax-{index}"),
                &format!("Ritual Relax {index}"),
                "Masajes",
                "Sesión para soltar tensión",
            ));
        }
        let products = vec![Product {
            id: ProductId("prod-1".to_string()),
            name: "Crema de Árnica".to_string(),
            category: "Cuidado Corporal".to_string(),
            description: "Para la espalda cansada".to_string(),
            price: 32_000,
            rating: 4.6,
            review_count: 5,
            in_stock: true,
            image_url: String::new(),
            created_at: Utc::now(),
        }];
        Catalog::new(services, products)
    }

    fn ids(items: &[caliope_core::domain::catalog::CatalogItem]) -> Vec<String> {
        items.iter().map(|item| item.id().to_string()).collect()
    }

    #[test]
    fn keywords_split_on_whitespace_and_commas() {
        assert_eq!(keywords("Dolor de Espalda,estrés"), vec!["dolor", "de", "espalda", "estrés"]);
        assert!(keywords(" , ").is_empty());
    }

    #[test]
    fn keyword_match_finds_back_pain_items() {
        let hits = KeywordRecommender::default()
            .with_shuffle(ShuffleMode::Seeded(7))
            .matches("espalda", &catalog());

        let mut found = ids(&hits);
        found.sort();
        assert_eq!(found, vec!["prod-1", "srv-1"]);
    }

    #[test]
    fn keyword_match_is_capped_and_seeded_shuffle_is_repeatable() {
        let recommender = KeywordRecommender::new(6).with_shuffle(ShuffleMode::Seeded(42));
        let first = recommender.matches("relax", &catalog());
        let second = recommender.matches("relax", &catalog());

        assert_eq!(first.len(), 6);
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn context_lines_carry_kind_and_id() {
        let context = catalog_context(&catalog());
        assert!(context.starts_with("SERVICE|srv-1|Masaje Terapéutico|Masajes|"));
        assert!(context.contains("PRODUCT|prod-1|Crema de Árnica|Cuidado Corporal|"));
    }

    #[test]
    fn id_list_parsing_strips_fences_and_rejects_non_arrays() {
        assert_eq!(
            parse_id_list("```json\n[\"srv-1\", \"prod-1\"]\n```").expect("fenced"),
            vec!["srv-1", "prod-1"]
        );
        assert!(parse_id_list("{\"ids\": [\"srv-1\"]}").is_err());
        assert!(parse_id_list("[1, 2]").is_err());
        assert!(parse_id_list("no tengo idea").is_err());
    }

    #[tokio::test]
    async fn empty_preferences_never_call_the_collaborator() {
        let client = ScriptedClient::new(Reply::Text("[\"srv-1\"]"));
        let concierge = concierge(&client, Duration::from_secs(1));

        let result = concierge.recommend("   ", &catalog()).await;

        assert!(result.items.is_empty());
        assert_eq!(result.source, RecommendationSource::EmptyRequest);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ai_selection_drops_unknown_ids() {
        let client = ScriptedClient::new(Reply::Text("[\"srv-2\", \"srv-404\", \"prod-1\"]"));
        let concierge = concierge(&client, Duration::from_secs(1));

        let result = concierge.recommend("piel seca", &catalog()).await;

        assert_eq!(result.source, RecommendationSource::Ai);
        assert_eq!(ids(&result.items), vec!["srv-2", "prod-1"]);
    }

    #[tokio::test]
    async fn ai_failure_falls_back_to_keywords() {
        let client = ScriptedClient::new(Reply::Fail);
        let concierge = concierge(&client, Duration::from_secs(1));

        let result = concierge.recommend("espalda", &catalog()).await;

        assert_eq!(result.source, RecommendationSource::Keyword(FallbackReason::CollaboratorFailed));
        assert!(ids(&result.items).contains(&"srv-1".to_string()));
    }

    #[tokio::test]
    async fn unparseable_answer_falls_back() {
        let client = ScriptedClient::new(Reply::Text("Te recomiendo un masaje"));
        let concierge = concierge(&client, Duration::from_secs(1));

        let result = concierge.recommend("espalda", &catalog()).await;

        assert_eq!(result.source, RecommendationSource::Keyword(FallbackReason::CollaboratorFailed));
    }

    #[tokio::test]
    async fn unknown_ids_are_dropped_without_keyword_fallback() {
        let client = ScriptedClient::new(Reply::Text("[\"srv-999\"]"));
        let concierge = concierge(&client, Duration::from_secs(1));

        let result = concierge.recommend("espalda", &catalog()).await;

        assert_eq!(result.source, RecommendationSource::Ai);
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn empty_ai_answer_is_an_empty_selection() {
        let client = ScriptedClient::new(Reply::Text("[]"));
        let concierge = concierge(&client, Duration::from_secs(1));

        let result = concierge.recommend("espalda", &catalog()).await;

        assert_eq!(result.source, RecommendationSource::Ai);
        assert!(result.items.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_collaborator_times_out_into_fallback() {
        let client = ScriptedClient::new(Reply::Hang);
        let concierge = concierge(&client, Duration::from_secs(8));

        let result = concierge.recommend("espalda", &catalog()).await;

        assert_eq!(result.source, RecommendationSource::Keyword(FallbackReason::TimedOut));
    }

    #[tokio::test]
    async fn offline_concierge_uses_keywords() {
        let result = Concierge::offline(6).recommend("espalda", &catalog()).await;

        assert_eq!(result.source, RecommendationSource::Keyword(FallbackReason::NoCollaborator));
        assert!(result.items.len() <= 6);
    }
}
