use serde::{Deserialize, Serialize};

use super::content::MeetingContent;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    /// 1-based position inside the module.
    pub order: i64,
    pub content: MeetingContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingWithLock {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub locked: bool,
}
