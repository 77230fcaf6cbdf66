mod validate;

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::scoring;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeetingQueryParams {
    #[serde(default)]
    student_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/students", get(list_students))
        .route("/students/login", post(login))
        .route("/students/{id}/history", get(student_history))
        .route("/students/{id}/progress", post(record_progress))
        .route("/admin/students/{id}/report", get(student_report))
        .route("/modules", get(list_modules))
        .route("/modules/{id}", get(get_module))
        .route("/modules/{id}/meetings", get(list_meetings))
        .route("/meetings/{id}", get(get_meeting))
        .route("/quiz-results", post(create_quiz_result));

    Router::new().nest("/api", api).with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        message: "FunBox learning API is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

async fn list_students(State(state): State<AppState>) -> Result<Json<Vec<Student>>, AppError> {
    let students = repository::fetch_students(&state.db).await?;
    Ok(Json(students))
}

/// Looks a student up by name and class, creating the row on first login.
async fn login(
    State(state): State<AppState>,
    Json(mut req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    validate::login(&mut req)?;

    if let Some(student) =
        repository::find_student_by_name_class(&state.db, &req.name, &req.class_name).await?
    {
        info!("student {} logged in", student.id);
        return Ok((StatusCode::OK, Json(student)));
    }

    let (student, created) = repository::insert_student(&state.db, req).await?;
    if !created {
        info!("student {} logged in", student.id);
        return Ok((StatusCode::OK, Json(student)));
    }
    info!("created student {} ({} / {})", student.id, student.name, student.class_name);
    Ok((StatusCode::CREATED, Json(student)))
}

async fn student_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    repository::find_student_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
    let history = repository::fetch_history_for_student(&state.db, &id).await?;
    Ok(Json(history))
}

/// Records a finished meeting. The score and stars are recomputed from the
/// raw points so every client is scored by the same table.
async fn record_progress(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(req): Json<ProgressRequest>,
) -> Result<(StatusCode, Json<QuizResult>), AppError> {
    validate::progress(&req)?;

    repository::find_student_by_id(&state.db, &student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
    let meeting = repository::find_meeting_by_id(&state.db, req.meeting_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Meeting".to_string()))?;
    if meeting.module_id != req.module_id {
        return Err(AppError::BadRequest(format!(
            "meeting {} does not belong to module {}",
            meeting.id, req.module_id
        )));
    }
    if meeting.order != req.meeting_order {
        return Err(AppError::BadRequest(format!(
            "meeting {} is number {} in its module, not {}",
            meeting.id, meeting.order, req.meeting_order
        )));
    }

    let score = scoring::calculate_meeting_score(req.raw_points, meeting.module_id, meeting.order);
    let stars = scoring::stars_for_score(score);
    if i64::from(score) != req.score || i64::from(stars) != req.stars {
        warn!(
            "client score {}/{} stars differs from computed {}/{} for meeting {}",
            req.score, req.stars, score, stars, req.meeting_id
        );
    }

    let result = repository::insert_quiz_result(
        &state.db,
        InsertQuizResult {
            student_id,
            meeting_id: Some(req.meeting_id),
            module_id: req.module_id,
            raw_points: Some(req.raw_points),
            total_questions: Some(req.total_questions),
            score: i64::from(score),
            stars: i64::from(stars),
        },
    )
    .await?;

    info!(
        "recorded progress for student {} meeting {}: score {}",
        result.student_id, req.meeting_id, result.score
    );
    Ok((StatusCode::CREATED, Json(result)))
}

async fn student_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StudentReport>, AppError> {
    let student = repository::find_student_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
    let activities = repository::fetch_history_for_student(&state.db, &id).await?;
    let modules = repository::fetch_modules(&state.db).await?;

    let analysis = analyze(&modules, &activities);
    Ok(Json(StudentReport {
        student,
        activities,
        analysis,
    }))
}

/// Per-module averages divide by a fixed meeting count, so unfinished
/// modules report low.
fn analyze(modules: &[Module], activities: &[HistoryEntry]) -> ReportAnalysis {
    let mut by_module: BTreeMap<i64, (Vec<u8>, Vec<i64>)> = BTreeMap::new();
    for entry in activities {
        let Some(meeting_id) = entry.meeting_id else {
            continue;
        };
        let (scores, meetings) = by_module.entry(entry.module_id).or_default();
        scores.push(entry.score.clamp(0, 100) as u8);
        if !meetings.contains(&meeting_id) {
            meetings.push(meeting_id);
        }
    }

    let module_analysis: Vec<ModuleAnalysis> = modules
        .iter()
        .filter_map(|module| {
            let (scores, meetings) = by_module.get(&module.id)?;
            let average_score = scoring::module_report_average(scores);
            Some(ModuleAnalysis {
                module_id: module.id,
                title: module.title.clone(),
                meetings_completed: meetings.len(),
                average_score,
                passed: scoring::passes_module(average_score),
            })
        })
        .collect();

    let averages: Vec<u8> = module_analysis.iter().map(|m| m.average_score).collect();
    ReportAnalysis {
        overall_average: scoring::calculate_module_final_grade(&averages),
        total_stars: activities.iter().map(|a| a.stars).sum(),
        total_activities: activities.len(),
        modules: module_analysis,
    }
}

async fn list_modules(State(state): State<AppState>) -> Result<Json<Vec<Module>>, AppError> {
    let modules = repository::fetch_modules(&state.db).await?;
    Ok(Json(modules))
}

async fn get_module(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Module>, AppError> {
    let module = repository::find_module_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Module".to_string()))?;
    Ok(Json(module))
}

/// Meeting N+1 stays locked until meeting N has a result for the student.
/// Without a student only the first meeting is open.
async fn list_meetings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<MeetingQueryParams>,
) -> Result<Json<Vec<MeetingWithLock>>, AppError> {
    repository::find_module_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Module".to_string()))?;
    let meetings = repository::fetch_meetings_for_module(&state.db, id).await?;

    let completed = match params.student_id.as_deref().filter(|s| !s.is_empty()) {
        Some(student_id) => repository::completed_meeting_ids(&state.db, student_id).await?,
        None => Default::default(),
    };

    let mut previous_done = true;
    let with_locks = meetings
        .into_iter()
        .enumerate()
        .map(|(position, meeting)| {
            let locked = position > 0 && !previous_done;
            previous_done = completed.contains(&meeting.id);
            MeetingWithLock { meeting, locked }
        })
        .collect();

    Ok(Json(with_locks))
}

async fn get_meeting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Meeting>, AppError> {
    let meeting = repository::find_meeting_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Meeting".to_string()))?;
    Ok(Json(meeting))
}

async fn create_quiz_result(
    State(state): State<AppState>,
    Json(mut req): Json<InsertQuizResult>,
) -> Result<(StatusCode, Json<QuizResult>), AppError> {
    validate::quiz_result(&mut req)?;

    repository::find_student_by_id(&state.db, &req.student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
    repository::find_module_by_id(&state.db, req.module_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Module".to_string()))?;

    let result = repository::insert_quiz_result(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: i64, title: &str) -> Module {
        Module {
            id,
            title: title.to_string(),
            category: "Umum".to_string(),
            description: String::new(),
            image_url: None,
            order: id,
            questions: Vec::new(),
            content: None,
        }
    }

    fn entry(module_id: i64, meeting_id: Option<i64>, score: i64, stars: i64) -> HistoryEntry {
        HistoryEntry {
            id: format!("r-{}-{:?}-{}", module_id, meeting_id, score),
            student_id: "s".to_string(),
            meeting_id,
            module_id,
            raw_points: None,
            total_questions: None,
            score,
            stars,
            completed_at: "2026-01-01T00:00:00Z".to_string(),
            module_title: String::new(),
            meeting_title: None,
            meeting_order: None,
        }
    }

    #[test]
    fn test_analyze_divides_by_four_meetings() {
        let modules = vec![module(1, "Huruf"), module(2, "Angka"), module(3, "Warna")];
        let activities = vec![
            entry(1, Some(11), 100, 3),
            entry(1, Some(12), 100, 3),
            entry(2, Some(21), 80, 3),
            entry(2, Some(22), 80, 3),
            entry(2, Some(23), 80, 3),
            entry(2, Some(24), 80, 3),
            entry(2, None, 40, 1),
        ];

        let analysis = analyze(&modules, &activities);
        assert_eq!(analysis.modules.len(), 2);
        assert_eq!(analysis.modules[0].average_score, 50);
        assert!(!analysis.modules[0].passed);
        assert_eq!(analysis.modules[0].meetings_completed, 2);
        assert_eq!(analysis.modules[1].average_score, 80);
        assert!(analysis.modules[1].passed);
        assert_eq!(analysis.overall_average, 65);
        assert_eq!(analysis.total_stars, 19);
        assert_eq!(analysis.total_activities, 7);
    }
}
