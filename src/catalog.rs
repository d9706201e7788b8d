//! Read-only content catalog
//!
//! The catalog holds the reference materials (topics with subtopics), the
//! quiz lessons, and the "about" text. It is loaded once from a JSON
//! document at startup and never mutated by the running bot.
//!
//! Menu tokens carry truncated topic/subtopic names (callback payloads have
//! a length limit), so lookups accept a prefix and resolve it back to the
//! full catalog name. Two entries sharing the same truncated prefix resolve
//! to whichever sorts first; this is a latent collision kept for token
//! compatibility.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::BotError;

/// A materials topic: minimum level to see it, plus its subtopics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicEntry {
    /// Minimum user level required to see this topic.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Subtopic name -> body text.
    #[serde(default)]
    pub subtopics: BTreeMap<String, String>,
}

/// A quiz lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Minimum user level required to unlock this lesson.
    #[serde(default = "default_level")]
    pub level: u32,
    /// The lesson prompt shown to the user.
    pub text: String,
    /// Candidate answers, in presentation order.
    pub answers: Vec<String>,
    /// Must be one of `answers`. Checked by exact string equality.
    pub correct_answer: String,
}

fn default_level() -> u32 {
    1
}

/// The full content catalog.
///
/// BTreeMap keys give deterministic menu ordering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentCatalog {
    #[serde(default)]
    pub materials: BTreeMap<String, TopicEntry>,
    #[serde(default)]
    pub lessons: BTreeMap<String, Lesson>,
    #[serde(default)]
    pub about: String,
}

impl ContentCatalog {
    /// Load the catalog from a JSON document.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        let catalog: ContentCatalog = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse catalog file {}", path.display()))?;
        info!(
            topics = catalog.materials.len(),
            lessons = catalog.lessons.len(),
            "Content catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse a catalog from an in-memory JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse catalog document")
    }

    /// Topic names visible at the given user level, in catalog order.
    pub fn topics_for_level(&self, level: u32) -> Vec<&str> {
        self.materials
            .iter()
            .filter(|(_, entry)| entry.level <= level)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Resolve a possibly-truncated topic name to the full catalog name.
    ///
    /// Falls back to the literal input when no entry matches, so exact
    /// names always pass through unchanged.
    pub fn resolve_topic<'a>(&'a self, prefix: &'a str) -> &'a str {
        self.materials
            .keys()
            .find(|name| name.starts_with(prefix))
            .map(String::as_str)
            .unwrap_or(prefix)
    }

    /// Resolve a possibly-truncated subtopic name within a topic.
    pub fn resolve_subtopic<'a>(&'a self, topic: &str, prefix: &'a str) -> &'a str {
        self.materials
            .get(topic)
            .and_then(|entry| entry.subtopics.keys().find(|name| name.starts_with(prefix)))
            .map(String::as_str)
            .unwrap_or(prefix)
    }

    /// Subtopic names of a topic, in catalog order. Empty if the topic is
    /// unknown.
    pub fn subtopics(&self, topic: &str) -> Vec<&str> {
        self.materials
            .get(topic)
            .map(|entry| entry.subtopics.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Body text of a subtopic.
    pub fn body(&self, topic: &str, subtopic: &str) -> crate::error::Result<&str> {
        self.materials
            .get(topic)
            .and_then(|entry| entry.subtopics.get(subtopic))
            .map(String::as_str)
            .ok_or_else(|| BotError::NotFound(format!("{} / {}", topic, subtopic)))
    }

    /// Lesson names unlocked at the given user level, in catalog order.
    pub fn lessons_for_level(&self, level: u32) -> Vec<&str> {
        self.lessons
            .iter()
            .filter(|(_, lesson)| lesson.level <= level)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Look up a lesson by its full name.
    pub fn lesson(&self, name: &str) -> crate::error::Result<&Lesson> {
        self.lessons
            .get(name)
            .ok_or_else(|| BotError::NotFound(format!("lesson {}", name)))
    }

    /// The static "about" text.
    pub fn about(&self) -> &str {
        &self.about
    }

    /// Validate catalog consistency: every lesson's correct answer must be
    /// one of its candidate answers.
    pub fn validate(&self) -> crate::error::Result<()> {
        for (name, lesson) in &self.lessons {
            if lesson.answers.is_empty() {
                return Err(BotError::Validation(format!(
                    "Lesson '{}' has no candidate answers",
                    name
                )));
            }
            if !lesson.answers.iter().any(|a| a == &lesson.correct_answer) {
                return Err(BotError::Validation(format!(
                    "Lesson '{}': correct answer '{}' is not among its candidate answers",
                    name, lesson.correct_answer
                )));
            }
        }
        Ok(())
    }
}
