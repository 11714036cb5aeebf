// src/models/generation.rs
// Domain types produced and consumed by the generation gateway.
// Wire names on PromptSet follow the JSON contract the model is instructed to emit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "PT")]
    Pt,
    #[serde(rename = "EN")]
    En,
    #[serde(rename = "ES")]
    Es,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Pt => "PT",
            Language::En => "EN",
            Language::Es => "ES",
        }
    }

    /// Name used inside prompts when instructing the model which language to write in.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Pt => "Portuguese (Brazil)",
            Language::En => "English",
            Language::Es => "Spanish",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Pt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Landscape => "16:9",
        }
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio::Portrait
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    #[default]
    Viral,
    TiktokShop,
    Realism,
    Tone,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Viral => "viral",
            GenerationMode::TiktokShop => "tiktok_shop",
            GenerationMode::Realism => "realism",
            GenerationMode::Tone => "tone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionPlan {
    Free,
    Basic,
    Professional,
}

impl SubscriptionPlan {
    /// Number of storytelling objects a strategy must contain for this plan.
    /// Free accounts get fewer objects to bound downstream image cost.
    pub fn object_quota(&self) -> usize {
        match self {
            SubscriptionPlan::Free => 3,
            SubscriptionPlan::Basic => 9,
            SubscriptionPlan::Professional => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "Free",
            SubscriptionPlan::Basic => "Basic",
            SubscriptionPlan::Professional => "Professional",
        }
    }
}

impl FromStr for SubscriptionPlan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Free" => Ok(SubscriptionPlan::Free),
            "Basic" => Ok(SubscriptionPlan::Basic),
            "Professional" => Ok(SubscriptionPlan::Professional),
            other => Err(format!("Unknown subscription plan: {}", other)),
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Idea,
    Trend,
    Strategy,
    Image,
}

impl OperationKind {
    /// Prefix used when composing cache keys for this operation.
    pub fn cache_prefix(&self) -> &'static str {
        match self {
            OperationKind::Idea => "ideas",
            OperationKind::Trend => "trends",
            OperationKind::Strategy => "strategy",
            OperationKind::Image => "image",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cache_prefix())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendVideo {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub niche: String,
}

/// Tone/personality template applied to the generated dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(rename = "trait", default)]
    pub trait_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorytellingObject {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub persona: String,
    /// English-only prompt for the image tool.
    #[serde(rename = "imagePrompt")]
    pub image_prompt: String,
    /// 1-based indices into the sorted script where this object appears.
    #[serde(default)]
    pub scenes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLine {
    #[serde(default)]
    pub time: String,
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub emotion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViralScore {
    pub total: f64,
    pub hook: f64,
    pub retention: f64,
    pub cta: f64,
    #[serde(default)]
    pub feedback: String,
}

impl ViralScore {
    /// Clamp every component into 0..=100 and round to whole points.
    pub fn normalized(self) -> Self {
        fn clamp(v: f64) -> f64 {
            if v.is_nan() {
                0.0
            } else {
                v.clamp(0.0, 100.0).round()
            }
        }
        Self {
            total: clamp(self.total),
            hook: clamp(self.hook),
            retention: clamp(self.retention),
            cta: clamp(self.cta),
            feedback: self.feedback,
        }
    }
}

/// Result of the strategy operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSet {
    #[serde(rename = "sequencia_storytelling")]
    pub narrative_summary: String,
    #[serde(rename = "objetos")]
    pub objects: Vec<StorytellingObject>,
    #[serde(rename = "roteiro_unificado")]
    pub script: Vec<ScriptLine>,
    #[serde(rename = "videoPrompt_Tecnico")]
    pub video_prompt: String,
    #[serde(default)]
    pub watermark_instruction: String,
    pub viral_score: ViralScore,
    /// Raw model text the set was built from, kept for later refinements.
    #[serde(rename = "contexto_original", default, skip_serializing_if = "Option::is_none")]
    pub original_context: Option<String>,
}
