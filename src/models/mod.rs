pub mod content;
pub mod meeting;
pub mod module;
pub mod quiz_result;
pub mod report;
pub mod student;

pub use content::{
    Activity, Animal, Answer, DragItem, MeetingContent, QuizQuestion, RaceRound, Story, Video,
};
pub use meeting::{Meeting, MeetingWithLock};
pub use module::{Module, ModuleContent};
pub use quiz_result::{HistoryEntry, InsertQuizResult, ProgressRequest, QuizResult};
pub use report::{ModuleAnalysis, ReportAnalysis, StudentReport};
pub use student::{LoginRequest, Student};
