// src/models/history.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::generation::{AspectRatio, Idea, Persona, PromptSet};

/// Maximum number of entries returned when listing a user's history.
pub const HISTORY_LIMIT: i64 = 50;

/// An idea saved by the user together with everything generated for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedIdea {
    #[serde(flatten)]
    pub idea: Idea,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_prompts: Option<PromptSet>,
    /// Object id -> generated image URL or data URI.
    #[serde(default)]
    pub saved_images: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_video_url: Option<String>,
}

impl SavedIdea {
    pub fn id(&self) -> &str {
        &self.idea.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_idea_flattens_idea_fields() {
        let raw = r#"{
            "id": "idea-1",
            "title": "A vassoura cansada",
            "description": "Vassoura reclama do chão",
            "emoji": "🧹",
            "aspectRatio": "9:16",
            "userHandle": "@loja"
        }"#;
        let saved: SavedIdea = serde_json::from_str(raw).unwrap();
        assert_eq!(saved.id(), "idea-1");
        assert_eq!(saved.aspect_ratio, Some(AspectRatio::Portrait));
        assert!(saved.saved_images.is_empty());

        let back = serde_json::to_value(&saved).unwrap();
        assert_eq!(back["title"], "A vassoura cansada");
        assert_eq!(back["userHandle"], "@loja");
        assert!(back.get("savedPrompts").is_none());
    }
}
