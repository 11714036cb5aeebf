// src/gateway/prompts.rs
// Request construction for every generation operation. Everything here is pure:
// no I/O, no shared state.

use std::time::Duration;

use crate::config::ModelSettings;
use crate::gemini_client::{
    Content, GenerateContentRequest, GenerationConfig, ImageConfig, InlineData, Part,
};
use crate::models::generation::{
    AspectRatio, GenerationMode, Idea, Language, OperationKind, Persona, PromptSet,
    SubscriptionPlan,
};

pub const IDEA_COUNT: usize = 10;
pub const TREND_COUNT: usize = 3;

/// What the operation is about.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    Niche(String),
    Idea(Idea),
    ImagePrompt(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub kind: OperationKind,
    pub subject: Subject,
    pub language: Language,
    pub plan: SubscriptionPlan,
    pub aspect_ratio: AspectRatio,
    pub mode: GenerationMode,
    pub persona: Option<Persona>,
    pub refinement: Option<String>,
    pub prior_result: Option<PromptSet>,
    /// Optional reference photo sent alongside the strategy prompt.
    pub reference_image: Option<InlineData>,
}

impl GenerationRequest {
    fn base(kind: OperationKind, subject: Subject, language: Language) -> Self {
        Self {
            kind,
            subject,
            language,
            plan: SubscriptionPlan::Free,
            aspect_ratio: AspectRatio::default(),
            mode: GenerationMode::default(),
            persona: None,
            refinement: None,
            prior_result: None,
            reference_image: None,
        }
    }

    pub fn ideas(niche: impl Into<String>, language: Language) -> Self {
        Self::base(OperationKind::Idea, Subject::Niche(niche.into()), language)
    }

    pub fn trends(niche: impl Into<String>, language: Language) -> Self {
        Self::base(OperationKind::Trend, Subject::Niche(niche.into()), language)
    }

    pub fn strategy(
        idea: Idea,
        language: Language,
        aspect_ratio: AspectRatio,
        plan: SubscriptionPlan,
    ) -> Self {
        Self {
            plan,
            aspect_ratio,
            ..Self::base(OperationKind::Strategy, Subject::Idea(idea), language)
        }
    }

    pub fn image(prompt: impl Into<String>, aspect_ratio: AspectRatio) -> Self {
        Self {
            aspect_ratio,
            ..Self::base(
                OperationKind::Image,
                Subject::ImagePrompt(prompt.into()),
                Language::En,
            )
        }
    }

    pub fn with_persona(mut self, persona: Option<Persona>) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_reference_image(mut self, image: Option<InlineData>) -> Self {
        self.reference_image = image;
        self
    }

    /// Turn the request into a revision of `prior`.
    pub fn with_refinement(mut self, command: impl Into<String>, prior: PromptSet) -> Self {
        self.refinement = Some(command.into());
        self.prior_result = Some(prior);
        self
    }

    pub fn is_refinement(&self) -> bool {
        self.refinement.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub api_version: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub response_mime_type: Option<String>,
    pub image_aspect_ratio: Option<AspectRatio>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRequest {
    pub kind: OperationKind,
    pub system_instruction: Option<String>,
    pub prompt: String,
    pub reference_image: Option<InlineData>,
    pub params: GenerationParams,
}

impl BuiltRequest {
    pub fn to_payload(&self) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = &self.reference_image {
            parts.push(Part::InlineData {
                inline_data: image.clone(),
            });
        }
        parts.push(Part::text(self.prompt.clone()));

        let params = &self.params;
        let image_config = params.image_aspect_ratio.map(|ratio| ImageConfig {
            aspect_ratio: ratio.as_str().to_string(),
        });
        let response_modalities = image_config
            .as_ref()
            .map(|_| vec!["IMAGE".to_string()]);

        GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: self.system_instruction.as_ref().map(|text| Content {
                parts: vec![Part::text(text.clone())],
                role: None,
            }),
            generation_config: Some(GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
                response_mime_type: params.response_mime_type.clone(),
                response_modalities,
                image_config,
            }),
        }
    }
}

pub fn build_request(request: &GenerationRequest, settings: &ModelSettings) -> BuiltRequest {
    match request.kind {
        OperationKind::Idea => build_ideas(request, settings),
        OperationKind::Trend => build_trends(request, settings),
        OperationKind::Strategy => build_strategy(request, settings),
        OperationKind::Image => build_image(request, settings),
    }
}

fn subject_text(subject: &Subject) -> &str {
    match subject {
        Subject::Niche(text) | Subject::ImagePrompt(text) => text,
        Subject::Idea(idea) => &idea.title,
    }
}

fn json_params(model: &str, settings: &ModelSettings, temperature: f32, max_tokens: u32) -> GenerationParams {
    GenerationParams {
        model: model.to_string(),
        api_version: settings.api_version.clone(),
        temperature: Some(temperature),
        max_output_tokens: Some(max_tokens),
        response_mime_type: Some("application/json".to_string()),
        image_aspect_ratio: None,
        timeout: settings.text_timeout,
    }
}

fn build_ideas(request: &GenerationRequest, settings: &ModelSettings) -> BuiltRequest {
    let language = request.language.display_name();
    let niche = subject_text(&request.subject);

    let prompt = format!(
        r#"Act as the Chief Strategist of "Vira Express".
Generate exactly {count} ideas for "Talking Object Ecosystems" for the niche: "{niche}".
RULES:
1. Think in Ecosystems: objects that interact, or a central iconic object from the niche.
2. Viral Dialogue: discuss a secret, pain point, or current meme of the niche in a comic or sarcastic way.
3. OUTPUT LANGUAGE: you MUST write "title" and "description" in {language}. This is a hard requirement.
OUTPUT FORMAT: respond ONLY with a JSON array of {count} objects shaped like
[{{"id": "unique id", "title": "impactful title in {language}", "description": "dynamics description in {language}", "emoji": "emoji for the main object"}}]"#,
        count = IDEA_COUNT,
        niche = niche,
        language = language,
    );

    BuiltRequest {
        kind: OperationKind::Idea,
        system_instruction: None,
        prompt,
        reference_image: None,
        params: json_params(&settings.idea_model, settings, 1.0, 4096),
    }
}

fn build_trends(request: &GenerationRequest, settings: &ModelSettings) -> BuiltRequest {
    let language = request.language.display_name();
    let niche = subject_text(&request.subject);

    let prompt = format!(
        r#"As a TikTok trend analyst, identify {count} viral video concepts for "Talking Objects" for the niche: "{niche}".
Provide hook suggestions and define the protagonist object.
CRITICAL: all generated text MUST be in {language}.
OUTPUT FORMAT: respond ONLY with a JSON array shaped like
[{{"id": "unique id", "title": "concept title in {language}", "thumbnail": "Unsplash image URL related to the niche", "url": "TikTok search link", "niche": "niche name in {language}"}}]"#,
        count = TREND_COUNT,
        niche = niche,
        language = language,
    );

    BuiltRequest {
        kind: OperationKind::Trend,
        system_instruction: None,
        prompt,
        reference_image: None,
        params: json_params(&settings.idea_model, settings, 0.7, 2048),
    }
}

fn build_strategy(request: &GenerationRequest, settings: &ModelSettings) -> BuiltRequest {
    let language = request.language.display_name();
    let quota = request.plan.object_quota();
    let personality = match &request.persona {
        Some(persona) => format!("{}: {}", persona.name, persona.trait_description),
        None => "Standard Viral 2026".to_string(),
    };

    let system_instruction = format!(
        r#"Act as a Storytelling Director and Animation Scriptwriter 2026.
MISSION: create viral narratives for "Vira Express".

1. PERSONALITY: {personality}.
2. LOGIC A-B-A: Conflict, Resolution, CTA (Call to Action).
3. OBJECTS: create EXACTLY {quota} storytelling objects in "objetos". No more, no fewer.
4. VIRAL SCORE: analyze the script and give 0-100 scores for hook, retention and cta, plus a total.
5. TECHNICAL LANGUAGE: the "imagePrompt" and "videoPrompt_Tecnico" fields MUST BE IN ENGLISH for AI tool compatibility.
6. CONTENT LANGUAGE: all user-facing text (sequencia_storytelling, roteiro_unificado, feedback, object titles and personas) MUST BE IN {language}.
7. SCRIPT: every line of "roteiro_unificado" starts its "time" with the second it begins (e.g. "0-3s") and names a speaker using the object's persona.

RESPONSE LANGUAGE: {language}.
OUTPUT FORMAT: respond ONLY with one JSON object shaped like
{{"sequencia_storytelling": "narrative summary", "objetos": [{{"id": "1", "title": "object title", "persona": "persona role", "imagePrompt": "Pixar style prompt in English"}}], "roteiro_unificado": [{{"time": "0-3s", "speaker": "persona", "text": "dialogue", "emotion": "emotion"}}], "videoPrompt_Tecnico": "detailed cinematic prompt in English", "watermark_instruction": "watermark placement instructions", "viral_score": {{"total": 0, "hook": 0, "retention": 0, "cta": 0, "feedback": "analysis feedback"}}}}"#,
        personality = personality,
        quota = quota,
        language = language,
    );

    let prompt = match (&request.refinement, &request.prior_result) {
        (Some(command), prior) => {
            let context = prior
                .as_ref()
                .map(|p| PromptSet {
                    original_context: None,
                    ..p.clone()
                })
                .and_then(|p| serde_json::to_string(&p).ok())
                .unwrap_or_else(|| "{}".to_string());
            format!(
                "ADJUSTMENT: \"{}\". Keep exactly {} objects. PREVIOUS CONTEXT: {}.",
                command, quota, context
            )
        }
        (None, _) => {
            let (title, description) = match &request.subject {
                Subject::Idea(idea) => (idea.title.as_str(), idea.description.as_str()),
                other => (subject_text(other), ""),
            };
            format!(
                "Generate strategy for: {}. Description: {}. Mode: {}. Ratio: {}. Persona: {}. Objects: {}.",
                title,
                description,
                request.mode.as_str(),
                request.aspect_ratio,
                request
                    .persona
                    .as_ref()
                    .map(|p| p.name.as_str())
                    .unwrap_or("Default"),
                quota
            )
        }
    };

    BuiltRequest {
        kind: OperationKind::Strategy,
        system_instruction: Some(system_instruction),
        prompt,
        reference_image: request.reference_image.clone(),
        params: json_params(&settings.strategy_model, settings, 0.8, 8192),
    }
}

fn build_image(request: &GenerationRequest, settings: &ModelSettings) -> BuiltRequest {
    BuiltRequest {
        kind: OperationKind::Image,
        system_instruction: None,
        prompt: subject_text(&request.subject).to_string(),
        reference_image: None,
        params: GenerationParams {
            model: settings.image_model.clone(),
            api_version: settings.api_version.clone(),
            temperature: None,
            max_output_tokens: None,
            response_mime_type: None,
            image_aspect_ratio: Some(request.aspect_ratio),
            timeout: settings.image_timeout,
        },
    }
}
