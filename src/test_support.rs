// src/test_support.rs
// Fixtures shared by unit tests across modules.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::config::ModelSettings;
use crate::error::GenerationError;
use crate::gateway::{GenerationGateway, ResponseCache};
use crate::gateway::transport::GenerationTransport;
use crate::gemini_client::{GenerateContentRequest, GenerateContentResponse};
use crate::models::generation::SubscriptionPlan;
use crate::middleware::rate_limit::RateLimiter;
use crate::models::profile::{AccountStatus, UserProfile, UserRole};
use crate::store::memory::{MemoryHistoryStore, MemoryPlanStore, MemoryProfileStore};
use crate::AppState;

pub fn profile(plan: SubscriptionPlan, role: UserRole) -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        email: format!("{}@example.com", Uuid::new_v4().simple()),
        role,
        plan,
        status: AccountStatus::Active,
        credits_total: 50,
        credits_used: 0,
        image_credits_total: 10,
        image_credits_used: 0,
        last_login: None,
    }
}

/// A fenced strategy reply with `objects` storytelling objects.
pub fn strategy_json(objects: usize) -> String {
    let objetos: Vec<Value> = (0..objects)
        .map(|i| {
            json!({
                "id": if i == 0 { String::new() } else { format!("obj-{}", i) },
                "title": format!("Objeto {}", i),
                "persona": format!("Persona {}", i),
                "imagePrompt": "a talking object, pixar style"
            })
        })
        .collect();
    let body = json!({
        "sequencia_storytelling": "Objetos discutem",
        "objetos": objetos,
        "roteiro_unificado": [
            {"time": "6-9s", "speaker": "Persona 1", "text": "Chega!", "emotion": "raiva"},
            {"time": "0-3s", "speaker": "Persona 0", "text": "Olá", "emotion": "feliz"},
            {"time": "3-6s", "speaker": "Narrador", "text": "E então...", "emotion": "calmo"}
        ],
        "videoPrompt_Tecnico": "cinematic close-up",
        "watermark_instruction": "bottom right",
        "viral_score": {"total": 120, "hook": 90, "retention": -5, "cta": 70.4, "feedback": "bom"}
    });
    format!("```json\n{}\n```", body)
}

pub fn text_response(text: &str) -> GenerateContentResponse {
    serde_json::from_value(json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    }))
    .unwrap()
}

pub fn image_response(mime: &str, data: &str) -> GenerateContentResponse {
    serde_json::from_value(json!({
        "candidates": [{"content": {"parts": [{"inlineData": {"mimeType": mime, "data": data}}]}}]
    }))
    .unwrap()
}

/// A reply the mock hands out once per call.
pub enum Reply {
    Ok(GenerateContentResponse),
    Http(u16, &'static str),
    Empty,
}

/// Scripted transport: replays queued replies in order, then answers with the
/// fallback text if one is set, else HTTP 500. Counts calls.
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Option<String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerateContentRequest>>,
}

impl MockTransport {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: Mutex::new(None),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call answers with the same text.
    pub fn always_text(text: &str) -> Self {
        let mock = Self::new(Vec::new());
        *mock.fallback.lock().unwrap() = Some(text.to_string());
        mock
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerateContentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationTransport for MockTransport {
    async fn generate(
        &self,
        _model: &str,
        _api_version: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Ok(response)) => Ok(response),
            Some(Reply::Http(status, message)) => Err(GenerationError::Http {
                status,
                message: message.to_string(),
            }),
            Some(Reply::Empty) => Ok(serde_json::from_value(json!({"candidates": []})).unwrap()),
            None => match self.fallback.lock().unwrap().clone() {
                Some(text) => Ok(text_response(&text)),
                None => Err(GenerationError::Http {
                    status: 500,
                    message: "no scripted reply".into(),
                }),
            },
        }
    }
}

/// Application state wired to a mock transport and in-memory stores.
pub struct TestState {
    pub app: Arc<AppState>,
    pub transport: Arc<MockTransport>,
    pub profiles: Arc<MemoryProfileStore>,
}

impl TestState {
    /// Store `profile` with a bcrypt hash of `password`.
    pub fn seed_profile(&self, profile: UserProfile, password: &str) -> UserProfile {
        self.profiles.insert(profile, &bcrypt::hash(password, 4).unwrap())
    }
}

pub fn test_state() -> TestState {
    test_state_with(MockTransport::new(Vec::new()))
}

pub fn test_state_with(transport: MockTransport) -> TestState {
    let transport = Arc::new(transport);
    let profiles = Arc::new(MemoryProfileStore::new());
    let gateway = GenerationGateway::new(transport.clone(), ResponseCache::in_memory(), ModelSettings::default())
        .with_placeholder_image("https://placeholder.test/img.png");

    let app = Arc::new(AppState {
        gateway,
        profiles: profiles.clone(),
        history: Arc::new(MemoryHistoryStore::new()),
        plans: Arc::new(MemoryPlanStore::seeded()),
        jwt_secret: "test_secret".to_string(),
        generation_limiter: RateLimiter::new(100, 60),
        db_pool: None,
        generation_configured: true,
    });

    TestState { app, transport, profiles }
}
