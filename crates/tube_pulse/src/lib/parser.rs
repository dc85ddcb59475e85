//! # Script Parser
//!
//! This module builds the script-writing prompt and parses the LLM's reply
//! into a structured [`ScriptDraft`].
//!
//! The model is asked to answer in three labelled sections:
//!
//! ```text
//! TITLE: ...
//! SCRIPT:
//! ...
//! TAGS: a, b, c
//! ```
//!
//! Models often decorate the labels (`**TITLE:**`, `## SCRIPT:`), so the
//! markers are matched loosely. Missing sections fall back to sensible
//! defaults instead of failing the run.

use std::{ops::Deref, sync::LazyLock};

use itertools::Itertools;
use regex::Regex;

use tube_datastore::Topic;

use crate::llm::writer::ScriptDraft;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s*#]*TITLE[ \t*]*:[ \t*]*(.*?)[ \t*]*$").unwrap()
});
static SCRIPT_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[\s*#]*SCRIPT[\s*]*:[ \t*]*").unwrap());
static TAGS_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[\s*#]*TAGS[\s*]*:[ \t*]*").unwrap());

pub const MAX_TAGS: usize = 8;

pub const SYSTEM_PROMPT: &str = "You are an expert YouTube scriptwriter who creates engaging, \
conversational video scripts that keep viewers hooked.";

/// Builds the user prompt asking for a script of roughly `duration_secs`
pub fn build_prompt(topic: &Topic, duration_secs: u32) -> String {
    let words = (duration_secs as f64 * 2.5) as u32;
    let main_secs = duration_secs.saturating_sub(15);

    let mut context = String::new();
    if !topic.description.is_empty() {
        context.push_str(&format!("\nContext: {}", topic.description));
    }
    if !topic.keywords.is_empty() {
        context.push_str(&format!("\nKeywords to weave in: {}", topic.keywords.join(", ")));
    }

    format!(
        "Create a compelling {duration_secs}-second YouTube video script about: {title}{context}

Requirements:
- Target length: approximately {words} words
- Structure:
  1. HOOK (first 5 seconds): Grab attention immediately with a question or bold statement
  2. MAIN CONTENT (next {main_secs} seconds): Deliver the core message with 3-5 key points
  3. CALL-TO-ACTION (last 10 seconds): Encourage engagement (like, subscribe, comment)

Style Guidelines:
- Conversational and engaging tone
- Short, punchy sentences
- Use \"you\" to address the viewer directly
- Include rhetorical questions to maintain engagement
- Avoid jargon unless explaining it
- End with an open question to drive comments

Format your response EXACTLY like this:

TITLE: [Catchy video title here]

SCRIPT:
[Your script here - write it as one continuous piece that flows naturally when spoken]

TAGS: [5-8 relevant tags, comma-separated]

Do not include timestamps, scene descriptions, or narrator notes. Just write the exact words to be spoken.",
        title = topic.title,
    )
}

/// Raw completion text returned by the script-writing model
pub struct LlmResponse(String);

impl Deref for LlmResponse {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl LlmResponse {
    pub fn new(content: String) -> Self {
        LlmResponse(content)
    }

    /// Splits the response into title, body and tags, falling back to
    /// `topic` where a section is missing
    pub fn parse_script(&self, topic: &str) -> ScriptDraft {
        let title = TITLE_RE
            .captures(self)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().trim().trim_matches('"').trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| topic.to_string());

        let tags_marker = TAGS_MARKER_RE.find(self);
        let body = match SCRIPT_MARKER_RE.find(self) {
            Some(script) => {
                let end = tags_marker
                    .filter(|tags| tags.start() >= script.end())
                    .map(|tags| tags.start())
                    .unwrap_or(self.len());
                self[script.end()..end].trim().to_string()
            }
            None => self.trim().to_string(),
        };

        let mut tags = tags_marker
            .map(|m| parse_tags(&self[m.end()..]))
            .unwrap_or_default();
        if tags.is_empty() {
            tags = topic
                .to_lowercase()
                .split_whitespace()
                .map(str::to_string)
                .chain(["youtube".to_string(), "educational".to_string()])
                .collect();
        }
        tags.truncate(MAX_TAGS);

        ScriptDraft { title, body, tags }
    }
}

impl From<String> for LlmResponse {
    fn from(value: String) -> Self {
        LlmResponse(value)
    }
}

fn parse_tags(section: &str) -> Vec<String> {
    section
        .split(',')
        .map(|tag| tag.trim().trim_matches('*').trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .unique()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_well_formed_response() {
        let content = "TITLE: Why Octopuses Are Aliens\n\nSCRIPT:\nDid you know octopuses have three hearts?\nStick around.\n\nTAGS: octopus, ocean, science";

        let draft = LlmResponse::from(content.to_string()).parse_script("Octopuses");

        assert_eq!(draft.title, "Why Octopuses Are Aliens");
        assert_eq!(
            draft.body,
            "Did you know octopuses have three hearts?\nStick around."
        );
        assert_eq!(draft.tags, vec!["octopus", "ocean", "science"]);
    }

    #[test]
    fn test_parses_markdown_decorated_labels() {
        let content = "**TITLE:** \"The Hidden Life of Bees\"\n\n**SCRIPT:**\nBees dance to talk.\n\n**TAGS:** bees, nature";

        let draft = LlmResponse::new(content.to_string()).parse_script("Bees");

        assert_eq!(draft.title, "The Hidden Life of Bees");
        assert_eq!(draft.body, "Bees dance to talk.");
        assert_eq!(draft.tags, vec!["bees", "nature"]);
    }

    #[test]
    fn test_missing_markers_fall_back_to_topic_and_whole_text() {
        let content = "  Just some narration without any labels.  ";

        let draft = LlmResponse::new(content.to_string()).parse_script("Deep Sea Life");

        assert_eq!(draft.title, "Deep Sea Life");
        assert_eq!(draft.body, "Just some narration without any labels.");
        assert_eq!(draft.tags, vec!["deep", "sea", "life", "youtube", "educational"]);
    }

    #[test]
    fn test_empty_title_line_falls_back_to_topic() {
        let content = "TITLE:\nSCRIPT:\nHello there.\nTAGS: a";

        let draft = LlmResponse::new(content.to_string()).parse_script("Bees");

        assert_eq!(draft.title, "Bees");
        assert_eq!(draft.body, "Hello there.");
        assert_eq!(draft.tags, vec!["a"]);
    }

    #[test]
    fn test_script_without_tags_runs_to_end() {
        let content = "TITLE: T\nSCRIPT:\nLine one.\nLine two.";

        let draft = LlmResponse::new(content.to_string()).parse_script("topic");

        assert_eq!(draft.body, "Line one.\nLine two.");
    }

    #[test]
    fn test_tags_are_deduplicated_and_capped() {
        let content = "TITLE: T\nSCRIPT: x\nTAGS: a, b, a, c, d, e, f, g, h, i, , j";

        let draft = LlmResponse::new(content.to_string()).parse_script("topic");

        assert_eq!(draft.tags.len(), MAX_TAGS);
        assert_eq!(draft.tags, vec!["a", "b", "c", "d", "e", "f", "g", "h"]);
    }

    #[test]
    fn test_prompt_mentions_topic_and_word_target() {
        let prompt = build_prompt(&Topic::from_title("Volcanoes"), 60);

        assert!(prompt.contains("60-second YouTube video script about: Volcanoes\n"));
        assert!(prompt.contains("approximately 150 words"));
        assert!(prompt.contains("next 45 seconds"));
        assert!(!prompt.contains("Context:"));
    }

    #[test]
    fn test_prompt_includes_topic_context() {
        let topic = Topic {
            title: "Volcanoes".into(),
            keywords: vec!["lava".into(), "magma".into()],
            description: "How eruptions shape islands".into(),
            visual_queries: vec![],
        };

        let prompt = build_prompt(&topic, 90);

        assert!(prompt.contains("Context: How eruptions shape islands"));
        assert!(prompt.contains("Keywords to weave in: lava, magma"));
        assert!(prompt.contains("approximately 225 words"));
    }
}
