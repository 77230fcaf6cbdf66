use serde::{Deserialize, Serialize};

use super::content::{MeetingContent, QuizQuestion};

/// Module-level content shares the meeting layout.
pub type ModuleContent = MeetingContent;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: i64,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub order: i64,
    /// Legacy flat question list, kept for modules without meetings.
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub content: Option<ModuleContent>,
}
