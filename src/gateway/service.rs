// src/gateway/service.rs
// Operation façades: one async method per generation operation. Each composes
// build -> call -> extract -> validate -> post-process, with caching for ideas and trends.

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::{Config, ModelSettings, DEFAULT_PLACEHOLDER_IMAGE};
use crate::error::{AccessError, GenerationError};
use crate::gateway::cache::{cache_key, FileStore, MemoryStore, KeyValueStore, ResponseCache};
use crate::gateway::extract::{expect_array, extract_json, image_data_uri, into_schema, Container};
use crate::gateway::prompts::{build_request, GenerationRequest};
use crate::gateway::scenes::{attribute_scenes, sort_script};
use crate::gateway::transport::{call, GenerationTransport};
use crate::gemini_client::GeminiClient;
use crate::models::generation::{
    AspectRatio, Idea, Language, OperationKind, PromptSet, StorytellingObject, TrendVideo,
};
use crate::models::profile::UserProfile;
use crate::services::credits;

pub const FALLBACK_TREND_THUMBNAIL: &str =
    "https://images.unsplash.com/photo-1611162617474-5b21e879e113?w=400&h=700&fit=crop";
const TIKTOK_SEARCH_URL: &str = "https://www.tiktok.com/search?q=";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    Generated,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedImage {
    /// Data URI for generated images, the placeholder URL otherwise.
    pub url: String,
    pub source: ImageSource,
}

impl GeneratedImage {
    pub fn is_generated(&self) -> bool {
        self.source == ImageSource::Generated
    }
}

/// Image produced for one storytelling object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectImage {
    pub object_id: String,
    #[serde(flatten)]
    pub image: GeneratedImage,
}

#[derive(Clone)]
pub struct GenerationGateway {
    transport: Arc<dyn GenerationTransport>,
    cache: ResponseCache,
    settings: ModelSettings,
    placeholder_image_url: String,
}

impl GenerationGateway {
    pub fn new(transport: Arc<dyn GenerationTransport>, cache: ResponseCache, settings: ModelSettings) -> Self {
        Self {
            transport,
            cache,
            settings,
            placeholder_image_url: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
        }
    }

    pub fn with_placeholder_image(mut self, url: impl Into<String>) -> Self {
        self.placeholder_image_url = url.into();
        self
    }

    /// Gemini-backed gateway with a file cache when `CACHE_DIR` is set, in-memory otherwise.
    pub fn from_config(config: &Config) -> Self {
        let client = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_base_url.clone());

        let store: Arc<dyn KeyValueStore> = match config.cache_dir.as_ref() {
            Some(dir) => match FileStore::new(dir) {
                Ok(store) => {
                    tracing::info!("📦 Response cache stored in {}", dir.display());
                    Arc::new(store)
                }
                Err(e) => {
                    tracing::warn!("Cache dir {} unusable ({}), using memory cache", dir.display(), e);
                    Arc::new(MemoryStore::new())
                }
            },
            None => Arc::new(MemoryStore::new()),
        };

        Self::new(
            Arc::new(client),
            ResponseCache::with_ttl(store, config.cache_ttl_hours),
            config.models.clone(),
        )
        .with_placeholder_image(config.placeholder_image_url.clone())
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub async fn generate_ideas(&self, niche: &str, language: Language) -> Result<Vec<Idea>, GenerationError> {
        let key = cache_key(OperationKind::Idea, niche, language);
        if let Some(cached) = self.cache.get::<Vec<Idea>>(&key) {
            tracing::info!("💾 Ideas for '{}' served from cache", niche);
            return Ok(cached);
        }

        tracing::info!("💡 Generating ideas for niche '{}' ({})", niche, language.code());
        let built = build_request(&GenerationRequest::ideas(niche, language), &self.settings);
        let output = call(self.transport.as_ref(), &built).await?;
        let items = expect_array(extract_json(&output.text, Container::Array)?)?;
        let ideas = validate_ideas(items)?;

        self.cache.set(&key, &ideas);
        tracing::info!("✅ {} ideas generated for '{}'", ideas.len(), niche);
        Ok(ideas)
    }

    /// Trend concepts for a niche. Trends are optional: any failure yields an empty list.
    pub async fn discover_trends(&self, niche: &str, language: Language) -> Vec<TrendVideo> {
        let key = cache_key(OperationKind::Trend, niche, language);
        if let Some(cached) = self.cache.get::<Vec<TrendVideo>>(&key) {
            tracing::info!("💾 Trends for '{}' served from cache", niche);
            return cached;
        }

        match self.fetch_trends(niche, language).await {
            Ok(trends) => {
                if !trends.is_empty() {
                    self.cache.set(&key, &trends);
                }
                trends
            }
            Err(e) => {
                tracing::warn!("Trend discovery failed for '{}': {}", niche, e);
                Vec::new()
            }
        }
    }

    async fn fetch_trends(&self, niche: &str, language: Language) -> Result<Vec<TrendVideo>, GenerationError> {
        let built = build_request(&GenerationRequest::trends(niche, language), &self.settings);
        let output = call(self.transport.as_ref(), &built).await?;
        let items = expect_array(extract_json(&output.text, Container::Array)?)?;

        Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<TrendVideo>(item).ok())
            .filter(|trend| !trend.title.trim().is_empty())
            .map(|trend| repair_trend(trend, niche))
            .collect())
    }

    /// Strategy and script for an idea, or a refinement of a prior result. Never cached.
    pub async fn generate_prompts(&self, request: &GenerationRequest) -> Result<PromptSet, GenerationError> {
        tracing::info!(
            "🎬 Generating strategy ({} plan, {} objects{})",
            request.plan,
            request.plan.object_quota(),
            if request.is_refinement() { ", refinement" } else { "" }
        );

        let built = build_request(request, &self.settings);
        let output = call(self.transport.as_ref(), &built).await?;
        let value = extract_json(&output.text, Container::Object)?;
        let set: PromptSet = into_schema(value, "strategy")?;

        let set = finalize_prompt_set(set, request.plan.object_quota(), &output.text)?;
        tracing::info!(
            "✅ Strategy ready: {} objects, {} script lines, score {}",
            set.objects.len(),
            set.script.len(),
            set.viral_score.total
        );
        Ok(set)
    }

    /// One image for `prompt`. Gate failures return before any network call; remote
    /// failures degrade to the placeholder image.
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        profile: &UserProfile,
    ) -> Result<GeneratedImage, AccessError> {
        credits::ensure_image_access(profile)?;
        Ok(self.render_or_placeholder(prompt, aspect_ratio).await)
    }

    /// One image per object, issued concurrently. Results arrive in completion order.
    /// Non-admin profiles get at most as many images as they have credits left.
    pub async fn generate_object_images(
        &self,
        objects: &[StorytellingObject],
        aspect_ratio: AspectRatio,
        profile: &UserProfile,
    ) -> Result<Vec<ObjectImage>, AccessError> {
        credits::ensure_image_access(profile)?;

        let allowance = credits::image_allowance(profile).unwrap_or(objects.len());
        if allowance < objects.len() {
            tracing::warn!(
                "Only {} of {} object images fit in the remaining credits of {}",
                allowance,
                objects.len(),
                profile.email
            );
        }

        let mut pending: FuturesUnordered<_> = objects
            .iter()
            .take(allowance)
            .map(|object| async move {
                let image = self.render_or_placeholder(&object.image_prompt, aspect_ratio).await;
                ObjectImage {
                    object_id: object.id.clone(),
                    image,
                }
            })
            .collect();

        let mut finished = Vec::with_capacity(pending.len());
        while let Some(result) = pending.next().await {
            tracing::debug!("Image for object {} finished ({:?})", result.object_id, result.image.source);
            finished.push(result);
        }
        Ok(finished)
    }

    async fn render_or_placeholder(&self, prompt: &str, aspect_ratio: AspectRatio) -> GeneratedImage {
        match self.render_image(prompt, aspect_ratio).await {
            Ok(url) => GeneratedImage {
                url,
                source: ImageSource::Generated,
            },
            Err(e) => {
                tracing::warn!("Image generation failed, using placeholder: {}", e);
                GeneratedImage {
                    url: self.placeholder_image_url.clone(),
                    source: ImageSource::Placeholder,
                }
            }
        }
    }

    async fn render_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String, GenerationError> {
        let built = build_request(&GenerationRequest::image(prompt, aspect_ratio), &self.settings);
        let output = call(self.transport.as_ref(), &built).await?;
        let image = output.images.first().ok_or(GenerationError::EmptyResponse)?;
        image_data_uri(image)
    }
}

/// Keep only well-formed ideas and give every idea an id.
fn validate_ideas(items: Vec<Value>) -> Result<Vec<Idea>, GenerationError> {
    let total = items.len();
    let ideas: Vec<Idea> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<Idea>(item).ok())
        .filter(|idea| !idea.title.trim().is_empty() && !idea.description.trim().is_empty())
        .map(|mut idea| {
            if idea.id.trim().is_empty() {
                idea.id = uuid::Uuid::new_v4().to_string();
            }
            idea
        })
        .collect();

    if ideas.len() < total {
        tracing::warn!("Dropped {} malformed idea(s) from model output", total - ideas.len());
    }
    if ideas.is_empty() {
        return Err(GenerationError::format("model returned no usable ideas"));
    }
    Ok(ideas)
}

fn repair_trend(mut trend: TrendVideo, niche: &str) -> TrendVideo {
    if trend.id.trim().is_empty() {
        trend.id = uuid::Uuid::new_v4().to_string();
    }
    if !trend.thumbnail.starts_with("http") {
        trend.thumbnail = FALLBACK_TREND_THUMBNAIL.to_string();
    }
    if !trend.url.starts_with("http") {
        trend.url = format!("{}{}", TIKTOK_SEARCH_URL, urlencoding::encode(&trend.title));
    }
    if trend.niche.trim().is_empty() {
        trend.niche = niche.to_string();
    }
    trend
}

/// Post-process a parsed strategy: ordered script, exact object quota, clamped
/// score, object ids, scene attribution and the raw text kept as context.
pub fn finalize_prompt_set(mut set: PromptSet, quota: usize, raw_text: &str) -> Result<PromptSet, GenerationError> {
    if set.objects.len() < quota {
        return Err(GenerationError::format(format!(
            "expected {} storytelling objects, got {}",
            quota,
            set.objects.len()
        )));
    }
    set.objects.truncate(quota);

    sort_script(&mut set.script);
    set.viral_score = set.viral_score.normalized();

    for (idx, object) in set.objects.iter_mut().enumerate() {
        if object.id.trim().is_empty() {
            object.id = (idx + 1).to_string();
        }
    }
    let scenes: Vec<Vec<usize>> = set
        .objects
        .iter()
        .map(|object| attribute_scenes(object, &set.script))
        .collect();
    for (object, scenes) in set.objects.iter_mut().zip(scenes) {
        object.scenes = scenes;
    }

    set.original_context = Some(raw_text.to_string());
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::generation::SubscriptionPlan;
    use crate::models::profile::UserRole;
    use crate::test_support::{image_response, profile, strategy_json, MockTransport, Reply};
    use std::time::{Duration, Instant};

    fn gateway(transport: Arc<MockTransport>) -> GenerationGateway {
        GenerationGateway::new(transport, ResponseCache::in_memory(), ModelSettings::default())
            .with_placeholder_image("https://placeholder.test/img.png")
    }

    fn idea() -> Idea {
        Idea {
            id: "idea-1".into(),
            title: "A geladeira fofoqueira".into(),
            description: "Eletrodomésticos trocam segredos".into(),
            emoji: "🧊".into(),
        }
    }

    #[tokio::test]
    async fn test_ideas_are_cached_per_niche_and_language() {
        let mock = Arc::new(MockTransport::always_text(
            r#"Aqui: [{"title": "A", "description": "d1", "emoji": "🧼"}, {"id": "x", "title": "B", "description": "d2"}]"#,
        ));
        let gateway = gateway(mock.clone());

        let first = gateway.generate_ideas("Pet Shop", Language::Pt).await.unwrap();
        let second = gateway.generate_ideas("  pet   shop ", Language::Pt).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(mock.calls(), 1);
        assert_eq!(first.len(), 2);
        assert!(!first[0].id.is_empty());
        assert_eq!(first[1].id, "x");

        gateway.generate_ideas("Pet Shop", Language::En).await.unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_ideas_never_return_a_non_array() {
        let mock = Arc::new(MockTransport::always_text(r#"{"ideas": [{"title": "A"}]} and [oops"#));
        let err = gateway(mock).generate_ideas("Padaria", Language::Pt).await.unwrap_err();
        assert!(matches!(err, GenerationError::Parse(_) | GenerationError::Format(_)));

        let mock = Arc::new(MockTransport::always_text(r#"{"ideas": "none"}"#));
        let err = gateway(mock).generate_ideas("Padaria", Language::Pt).await.unwrap_err();
        assert!(matches!(err, GenerationError::Parse(_)));

        let mock = Arc::new(MockTransport::always_text(r#"[{"title": "", "description": "x"}]"#));
        let err = gateway(mock).generate_ideas("Padaria", Language::Pt).await.unwrap_err();
        assert!(matches!(err, GenerationError::Format(_)));
    }

    #[tokio::test]
    async fn test_failed_ideas_are_not_cached() {
        let mock = Arc::new(MockTransport::new(vec![Reply::Http(503, "overloaded")]));
        let gateway = gateway(mock.clone());
        let err = gateway.generate_ideas("Academia", Language::Pt).await.unwrap_err();
        assert!(matches!(err, GenerationError::Http { status: 503, .. }));
        assert!(gateway.generate_ideas("Academia", Language::Pt).await.is_err());
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_trends_swallow_failures() {
        let mock = Arc::new(MockTransport::new(vec![Reply::Empty]));
        assert!(gateway(mock).discover_trends("Padaria", Language::Pt).await.is_empty());
    }

    #[tokio::test]
    async fn test_trends_repair_links() {
        let mock = Arc::new(MockTransport::always_text(
            r#"[{"title": "Pão falante", "thumbnail": "n/a", "url": "tiktok", "niche": ""},
                {"title": "Forno", "thumbnail": "https://img.test/a.png", "url": "https://tiktok.com/x"}]"#,
        ));
        let gateway = gateway(mock.clone());
        let trends = gateway.discover_trends("Padaria", Language::Pt).await;
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].thumbnail, FALLBACK_TREND_THUMBNAIL);
        assert_eq!(trends[0].url, "https://www.tiktok.com/search?q=P%C3%A3o%20falante");
        assert_eq!(trends[0].niche, "Padaria");
        assert_eq!(trends[1].url, "https://tiktok.com/x");

        gateway.discover_trends("padaria", Language::Pt).await;
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_free_plan_strategy_has_exactly_three_objects() {
        let mock = Arc::new(MockTransport::always_text(&strategy_json(5)));
        let request = GenerationRequest::strategy(idea(), Language::Pt, AspectRatio::Portrait, SubscriptionPlan::Free);
        let set = gateway(mock).generate_prompts(&request).await.unwrap();

        assert_eq!(set.objects.len(), 3);
        assert_eq!(set.objects[0].id, "1");
        assert!(set.objects.iter().all(|o| !o.scenes.is_empty()));
        assert_eq!(set.objects[0].scenes, vec![1]);
        assert_eq!(set.objects[1].scenes, vec![3]);
        let times: Vec<&str> = set.script.iter().map(|l| l.time.as_str()).collect();
        assert_eq!(times, vec!["0-3s", "3-6s", "6-9s"]);
        assert_eq!(set.viral_score.total, 100.0);
        assert_eq!(set.viral_score.retention, 0.0);
        assert_eq!(set.viral_score.cta, 70.0);
        assert!(set.original_context.is_some());
    }

    #[tokio::test]
    async fn test_paid_plan_rejects_short_strategies() {
        let mock = Arc::new(MockTransport::always_text(&strategy_json(5)));
        let request = GenerationRequest::strategy(idea(), Language::Pt, AspectRatio::Portrait, SubscriptionPlan::Basic);
        let err = gateway(mock).generate_prompts(&request).await.unwrap_err();
        assert!(matches!(err, GenerationError::Format(msg) if msg.contains("expected 9")));
    }

    #[tokio::test]
    async fn test_strategy_is_never_cached() {
        let mock = Arc::new(MockTransport::always_text(&strategy_json(3)));
        let gateway = gateway(mock.clone());
        let request = GenerationRequest::strategy(idea(), Language::Pt, AspectRatio::Portrait, SubscriptionPlan::Free);
        gateway.generate_prompts(&request).await.unwrap();
        gateway.generate_prompts(&request).await.unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_professional_plan_strategy_has_ten_objects() {
        let mock = Arc::new(MockTransport::always_text(&strategy_json(10)));
        let request =
            GenerationRequest::strategy(idea(), Language::Pt, AspectRatio::Portrait, SubscriptionPlan::Professional);
        let set = gateway(mock).generate_prompts(&request).await.unwrap();

        assert_eq!(set.objects.len(), 10);
        assert!(set.objects.iter().all(|o| !o.id.is_empty()));
        assert!(set.objects.iter().all(|o| !o.scenes.is_empty()));
    }

    #[tokio::test]
    async fn test_expired_ideas_are_fetched_again() {
        let mock = Arc::new(MockTransport::always_text(r#"[{"title": "A", "description": "d1"}]"#));
        let cache = ResponseCache::with_ttl(Arc::new(MemoryStore::new()), -1);
        let gateway = GenerationGateway::new(mock.clone(), cache, ModelSettings::default());

        gateway.generate_ideas("Pet Shop", Language::Pt).await.unwrap();
        gateway.generate_ideas("Pet Shop", Language::Pt).await.unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_slow_strategy_times_out() {
        let mock = Arc::new(MockTransport::always_text(&strategy_json(3)).with_delay(Duration::from_secs(5)));
        let settings = ModelSettings {
            text_timeout: Duration::from_millis(50),
            ..ModelSettings::default()
        };
        let gateway = GenerationGateway::new(mock, ResponseCache::in_memory(), settings);
        let request = GenerationRequest::strategy(idea(), Language::Pt, AspectRatio::Portrait, SubscriptionPlan::Free);

        let started = Instant::now();
        let err = gateway.generate_prompts(&request).await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_free_user_image_makes_no_call() {
        let mock = Arc::new(MockTransport::new(vec![Reply::Ok(image_response("image/png", "iVBORw0KGgo="))]));
        let user = profile(SubscriptionPlan::Free, UserRole::User);
        let err = gateway(mock.clone())
            .generate_image("toaster", AspectRatio::Portrait, &user)
            .await
            .unwrap_err();
        assert_eq!(err, AccessError::PlanRestricted);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_image_success_and_placeholder() {
        let mock = Arc::new(MockTransport::new(vec![
            Reply::Ok(image_response("image/png", "iVBORw0KGgo=")),
            Reply::Http(500, "internal"),
        ]));
        let gateway = gateway(mock);
        let user = profile(SubscriptionPlan::Basic, UserRole::User);

        let image = gateway.generate_image("toaster", AspectRatio::Portrait, &user).await.unwrap();
        assert!(image.is_generated());
        assert_eq!(image.url, "data:image/png;base64,iVBORw0KGgo=");

        let image = gateway.generate_image("toaster", AspectRatio::Portrait, &user).await.unwrap();
        assert_eq!(image.source, ImageSource::Placeholder);
        assert_eq!(image.url, "https://placeholder.test/img.png");
    }

    #[tokio::test]
    async fn test_text_only_image_reply_uses_placeholder() {
        let mock = Arc::new(MockTransport::always_text("I can't draw that"));
        let admin = profile(SubscriptionPlan::Free, UserRole::Admin);
        let image = gateway(mock).generate_image("x", AspectRatio::Landscape, &admin).await.unwrap();
        assert_eq!(image.source, ImageSource::Placeholder);
    }

    #[tokio::test]
    async fn test_object_images_respect_remaining_credits() {
        let mock = Arc::new(MockTransport::new(vec![
            Reply::Ok(image_response("image/png", "iVBORw0KGgo=")),
            Reply::Ok(image_response("image/png", "iVBORw0KGgo=")),
            Reply::Ok(image_response("image/png", "iVBORw0KGgo=")),
        ]));
        let mut user = profile(SubscriptionPlan::Basic, UserRole::User);
        user.image_credits_used = user.image_credits_total - 2;

        let objects: Vec<StorytellingObject> = (1..=3)
            .map(|i| StorytellingObject {
                id: i.to_string(),
                title: format!("Objeto {}", i),
                persona: "Persona".into(),
                image_prompt: "prompt".into(),
                scenes: vec![1],
            })
            .collect();

        let images = gateway(mock.clone())
            .generate_object_images(&objects, AspectRatio::Portrait, &user)
            .await
            .unwrap();
        assert_eq!(images.len(), 2);
        assert!(images.iter().all(|i| i.image.is_generated()));
        assert_eq!(mock.calls(), 2);
    }
}
