use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: String,
    pub student_id: String,
    pub meeting_id: Option<i64>,
    pub module_id: i64,
    pub raw_points: Option<i64>,
    pub total_questions: Option<i64>,
    pub score: i64,
    pub stars: i64,
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InsertQuizResult {
    #[validate(length(min = 1, message = "Student is required"))]
    pub student_id: String,
    #[serde(default)]
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub meeting_id: Option<i64>,
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub module_id: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "Must not be negative"))]
    pub raw_points: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Must not be negative"))]
    pub total_questions: Option<i64>,
    #[validate(range(min = 0, max = 100, message = "Must be between 0 and 100"))]
    pub score: i64,
    #[validate(range(min = 1, max = 3, message = "Must be between 1 and 3"))]
    pub stars: i64,
}

/// Body of `POST /api/students/{id}/progress`, also sent by the kiosk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub meeting_id: i64,
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub module_id: i64,
    /// Checked against the stored meeting; scoring uses the stored order.
    #[validate(range(min = 1, message = "Must be at least 1"))]
    pub meeting_order: i64,
    #[validate(range(min = 0, message = "Must not be negative"))]
    pub raw_points: i64,
    #[validate(range(min = 0, message = "Must not be negative"))]
    pub total_questions: i64,
    #[validate(range(min = 0, max = 100, message = "Must be between 0 and 100"))]
    pub score: i64,
    #[validate(range(min = 1, max = 3, message = "Must be between 1 and 3"))]
    pub stars: i64,
}

/// A quiz result joined with the titles it refers to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub student_id: String,
    pub meeting_id: Option<i64>,
    pub module_id: i64,
    pub raw_points: Option<i64>,
    pub total_questions: Option<i64>,
    pub score: i64,
    pub stars: i64,
    pub completed_at: String,
    pub module_title: String,
    pub meeting_title: Option<String>,
    pub meeting_order: Option<i64>,
}
