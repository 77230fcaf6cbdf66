use serde::{Deserialize, Serialize};

use super::{HistoryEntry, Student};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub student: Student,
    pub activities: Vec<HistoryEntry>,
    pub analysis: ReportAnalysis,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportAnalysis {
    pub modules: Vec<ModuleAnalysis>,
    pub overall_average: u8,
    pub total_stars: i64,
    pub total_activities: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleAnalysis {
    pub module_id: i64,
    pub title: String,
    pub meetings_completed: usize,
    pub average_score: u8,
    pub passed: bool,
}
