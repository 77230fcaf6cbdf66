//! Learning content stored as JSON on modules and meetings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingContent {
    #[serde(default)]
    pub opening_text: Option<String>,
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub story: Option<Story>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,
    #[serde(default)]
    pub closing_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub title: String,
    #[serde(default)]
    pub pages: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Expected answer of a selection activity. A multi answer is compared
/// without regard to order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Answer {
    Single(usize),
    Multi(Vec<usize>),
}

impl Answer {
    /// Number of picks needed before the selection is judged.
    pub fn picks(&self) -> usize {
        match self {
            Answer::Single(_) => 1,
            Answer::Multi(indices) => indices.len(),
        }
    }

    pub fn matches(&self, selected: &[usize]) -> bool {
        match self {
            Answer::Single(index) => selected == [*index],
            Answer::Multi(indices) => {
                let mut expected = indices.clone();
                let mut actual = selected.to_vec();
                expected.sort_unstable();
                actual.sort_unstable();
                expected == actual
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DragItem {
    pub label: String,
    /// Index into the activity's targets.
    pub target: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub name: String,
    #[serde(default)]
    pub sound_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaceRound {
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Activity {
    #[serde(rename_all = "camelCase")]
    Choice {
        instruction: String,
        options: Vec<String>,
        answer: Answer,
    },
    #[serde(rename_all = "camelCase")]
    DragDrop {
        instruction: String,
        targets: Vec<String>,
        items: Vec<DragItem>,
    },
    #[serde(rename_all = "camelCase")]
    BodyPartsTouch {
        instruction: String,
        parts: Vec<String>,
        /// Part indices to touch, in order.
        sequence: Vec<usize>,
    },
    #[serde(rename_all = "camelCase")]
    MatchLine {
        instruction: String,
        left: Vec<String>,
        right: Vec<String>,
        /// For each left entry, the index of its right partner.
        matches: Vec<usize>,
    },
    #[serde(rename_all = "camelCase")]
    AnimalMimic {
        instruction: String,
        animals: Vec<Animal>,
    },
    #[serde(rename_all = "camelCase")]
    AlphabetRace {
        instruction: String,
        rounds: Vec<RaceRound>,
    },
    #[serde(rename_all = "camelCase")]
    ReadingRace {
        instruction: String,
        rounds: Vec<RaceRound>,
    },
    #[serde(rename_all = "camelCase")]
    TextInput {
        instruction: String,
        answer: String,
    },
    #[serde(rename_all = "camelCase")]
    ImageGrid {
        instruction: String,
        images: Vec<String>,
        answer: Answer,
    },
    #[serde(rename_all = "camelCase")]
    Info { text: String },
}

impl Activity {
    pub fn kind(&self) -> &'static str {
        match self {
            Activity::Choice { .. } => "choice",
            Activity::DragDrop { .. } => "drag-drop",
            Activity::BodyPartsTouch { .. } => "body-parts-touch",
            Activity::MatchLine { .. } => "match-line",
            Activity::AnimalMimic { .. } => "animal-mimic",
            Activity::AlphabetRace { .. } => "alphabet-race",
            Activity::ReadingRace { .. } => "reading-race",
            Activity::TextInput { .. } => "text-input",
            Activity::ImageGrid { .. } => "image-grid",
            Activity::Info { .. } => "info",
        }
    }
}
