// src/gateway/scenes.rs
// Post-processing of strategy results: script ordering and scene attribution.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::generation::{ScriptLine, StorytellingObject};

/// Minimum length of the first word of a name before it is used as a prefix fallback.
pub const PREFIX_MIN_LEN: usize = 4;

fn leading_integer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([+-]?\d+)").expect("static regex"))
}

/// Leading integer of a time marker ("0-3s" -> 0, "12s" -> 12). Anything else is 0.
pub fn parse_time_marker(marker: &str) -> i64 {
    leading_integer()
        .captures(marker)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(0)
}

/// Stable ascending sort by parsed time marker.
pub fn sort_script(script: &mut [ScriptLine]) {
    script.sort_by_key(|line| parse_time_marker(&line.time));
}

/// 1-based indices of the script lines where an object appears.
///
/// Heuristic, applied to the object's persona and title (lowercased):
/// 1. a line matches when its speaker or text contains the name, or the
///    speaker (at least `PREFIX_MIN_LEN` chars) is contained in the name;
/// 2. if nothing matched, the first word of each name is tried as a plain
///    substring, but only when that word has at least `PREFIX_MIN_LEN` chars;
/// 3. if still nothing matched the object is anchored to scene 1.
///
/// The result is never empty.
pub fn attribute_scenes(object: &StorytellingObject, script: &[ScriptLine]) -> Vec<usize> {
    let names: Vec<String> = [object.persona.as_str(), object.title.as_str()]
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();

    let lines: Vec<(String, String)> = script
        .iter()
        .map(|line| (line.speaker.trim().to_lowercase(), line.text.to_lowercase()))
        .collect();

    let direct: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, (speaker, text))| {
            names.iter().any(|name| {
                speaker.contains(name.as_str())
                    || text.contains(name.as_str())
                    || (speaker.chars().count() >= PREFIX_MIN_LEN && name.contains(speaker.as_str()))
            })
        })
        .map(|(idx, _)| idx + 1)
        .collect();
    if !direct.is_empty() {
        return direct;
    }

    let prefixes: Vec<&str> = names
        .iter()
        .filter_map(|name| name.split_whitespace().next())
        .filter(|word| word.chars().count() >= PREFIX_MIN_LEN)
        .collect();

    let by_prefix: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, (speaker, text))| {
            prefixes
                .iter()
                .any(|prefix| speaker.contains(prefix) || text.contains(prefix))
        })
        .map(|(idx, _)| idx + 1)
        .collect();
    if !by_prefix.is_empty() {
        return by_prefix;
    }

    vec![1]
}
