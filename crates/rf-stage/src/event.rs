//! StageEvent — A stage occurrence with metadata
//!
//! Wraps a Stage with timing, the configured presentation set and tags.

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// A stage event with full metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// The canonical stage
    pub stage: Stage,

    /// Timestamp in milliseconds (from feature start)
    pub timestamp_ms: f64,

    /// Presentation set id configured for this moment, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation: Option<String>,

    /// Custom tags for filtering/routing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl StageEvent {
    /// Create a new stage event
    pub fn new(stage: Stage, timestamp_ms: f64) -> Self {
        Self {
            stage,
            timestamp_ms,
            presentation: None,
            tags: Vec::new(),
        }
    }

    /// Attach a presentation set id
    pub fn with_presentation(mut self, presentation: impl Into<String>) -> Self {
        self.presentation = Some(presentation.into());
        self
    }

    /// Attach an optional presentation set id
    pub fn with_presentation_opt(mut self, presentation: Option<&str>) -> Self {
        self.presentation = presentation.map(str::to_string);
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Get stage type name
    pub fn type_name(&self) -> &'static str {
        self.stage.type_name()
    }
}
