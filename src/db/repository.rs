use std::collections::HashSet;

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::models::{
    HistoryEntry, InsertQuizResult, LoginRequest, Meeting, MeetingContent, Module, QuizQuestion,
    QuizResult, Student,
};

#[derive(Debug, FromRow)]
struct ModuleRow {
    id: i64,
    title: String,
    category: String,
    description: String,
    image_url: Option<String>,
    sort_order: i64,
    questions: String,
    content: Option<String>,
}

impl TryFrom<ModuleRow> for Module {
    type Error = sqlx::Error;

    fn try_from(row: ModuleRow) -> Result<Self, Self::Error> {
        let questions: Vec<QuizQuestion> = decode_json("modules.questions", &row.questions)?;
        let content = row
            .content
            .as_deref()
            .map(|raw| decode_json::<MeetingContent>("modules.content", raw))
            .transpose()?;

        Ok(Module {
            id: row.id,
            title: row.title,
            category: row.category,
            description: row.description,
            image_url: row.image_url,
            order: row.sort_order,
            questions,
            content,
        })
    }
}

#[derive(Debug, FromRow)]
struct MeetingRow {
    id: i64,
    module_id: i64,
    title: String,
    sort_order: i64,
    content: String,
}

impl TryFrom<MeetingRow> for Meeting {
    type Error = sqlx::Error;

    fn try_from(row: MeetingRow) -> Result<Self, Self::Error> {
        Ok(Meeting {
            id: row.id,
            module_id: row.module_id,
            title: row.title,
            order: row.sort_order,
            content: decode_json("meetings.content", &row.content)?,
        })
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(column: &str, raw: &str) -> Result<T, sqlx::Error> {
    serde_json::from_str(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, sqlx::Error> {
    serde_json::to_string(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

// Students

pub async fn find_student_by_id(db: &SqlitePool, id: &str) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "SELECT id, name, class_name, teacher_name, created_at FROM students WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_student_by_name_class(
    db: &SqlitePool,
    name: &str,
    class_name: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        r#"
        SELECT id, name, class_name, teacher_name, created_at
        FROM students
        WHERE name = ?1 AND class_name = ?2
        ORDER BY created_at ASC
        LIMIT 1
        "#,
    )
    .bind(name)
    .bind(class_name)
    .fetch_optional(db)
    .await
}

/// Inserts the student unless the name and class are already taken, then
/// reads the row back. The flag is true when this call created it.
pub async fn insert_student(
    db: &SqlitePool,
    req: LoginRequest,
) -> Result<(Student, bool), sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    let inserted = sqlx::query(
        r#"
        INSERT INTO students (id, name, class_name, teacher_name, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(name, class_name) DO NOTHING
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.class_name)
    .bind(&req.teacher_name)
    .bind(&now)
    .execute(db)
    .await?
    .rows_affected();

    let student = find_student_by_name_class(db, &req.name, &req.class_name)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok((student, inserted > 0))
}

pub async fn fetch_students(db: &SqlitePool) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "SELECT id, name, class_name, teacher_name, created_at FROM students ORDER BY class_name, name",
    )
    .fetch_all(db)
    .await
}

// Modules

pub async fn fetch_modules(db: &SqlitePool) -> Result<Vec<Module>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ModuleRow>(
        r#"
        SELECT id, title, category, description, image_url, sort_order, questions, content
        FROM modules
        ORDER BY sort_order ASC, id ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    rows.into_iter().map(Module::try_from).collect()
}

pub async fn find_module_by_id(db: &SqlitePool, id: i64) -> Result<Option<Module>, sqlx::Error> {
    let row = sqlx::query_as::<_, ModuleRow>(
        r#"
        SELECT id, title, category, description, image_url, sort_order, questions, content
        FROM modules
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(Module::try_from).transpose()
}

pub async fn upsert_module(db: &SqlitePool, module: &Module) -> Result<Module, sqlx::Error> {
    let questions = encode_json(&module.questions)?;
    let content = module.content.as_ref().map(encode_json).transpose()?;

    sqlx::query(
        r#"
        INSERT INTO modules (id, title, category, description, image_url, sort_order, questions, content)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            category = excluded.category,
            description = excluded.description,
            image_url = excluded.image_url,
            sort_order = excluded.sort_order,
            questions = excluded.questions,
            content = excluded.content
        "#,
    )
    .bind(module.id)
    .bind(&module.title)
    .bind(&module.category)
    .bind(&module.description)
    .bind(&module.image_url)
    .bind(module.order)
    .bind(questions)
    .bind(content)
    .execute(db)
    .await?;

    find_module_by_id(db, module.id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

// Meetings

pub async fn fetch_meetings_for_module(
    db: &SqlitePool,
    module_id: i64,
) -> Result<Vec<Meeting>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MeetingRow>(
        r#"
        SELECT id, module_id, title, sort_order, content
        FROM meetings
        WHERE module_id = ?
        ORDER BY sort_order ASC
        "#,
    )
    .bind(module_id)
    .fetch_all(db)
    .await?;

    rows.into_iter().map(Meeting::try_from).collect()
}

pub async fn find_meeting_by_id(db: &SqlitePool, id: i64) -> Result<Option<Meeting>, sqlx::Error> {
    let row = sqlx::query_as::<_, MeetingRow>(
        "SELECT id, module_id, title, sort_order, content FROM meetings WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(Meeting::try_from).transpose()
}

pub async fn upsert_meeting(db: &SqlitePool, meeting: &Meeting) -> Result<Meeting, sqlx::Error> {
    let content = encode_json(&meeting.content)?;

    sqlx::query(
        r#"
        INSERT INTO meetings (id, module_id, title, sort_order, content)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
            module_id = excluded.module_id,
            title = excluded.title,
            sort_order = excluded.sort_order,
            content = excluded.content
        "#,
    )
    .bind(meeting.id)
    .bind(meeting.module_id)
    .bind(&meeting.title)
    .bind(meeting.order)
    .bind(content)
    .execute(db)
    .await?;

    find_meeting_by_id(db, meeting.id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

// Quiz results

pub async fn insert_quiz_result(
    db: &SqlitePool,
    req: InsertQuizResult,
) -> Result<QuizResult, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO quiz_results
            (id, student_id, meeting_id, module_id, raw_points, total_questions,
            score, stars, completed_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&id)
    .bind(&req.student_id)
    .bind(req.meeting_id)
    .bind(req.module_id)
    .bind(req.raw_points)
    .bind(req.total_questions)
    .bind(req.score)
    .bind(req.stars)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(QuizResult {
        id,
        student_id: req.student_id,
        meeting_id: req.meeting_id,
        module_id: req.module_id,
        raw_points: req.raw_points,
        total_questions: req.total_questions,
        score: req.score,
        stars: req.stars,
        completed_at: now,
    })
}

/// Every attempt of a student, newest first. Attempts are not deduplicated.
pub async fn fetch_history_for_student(
    db: &SqlitePool,
    student_id: &str,
) -> Result<Vec<HistoryEntry>, sqlx::Error> {
    sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT
            r.id, r.student_id, r.meeting_id, r.module_id, r.raw_points,
            r.total_questions, r.score, r.stars, r.completed_at,
            m.title AS module_title,
            mt.title AS meeting_title,
            mt.sort_order AS meeting_order
        FROM quiz_results r
        JOIN modules m ON m.id = r.module_id
        LEFT JOIN meetings mt ON mt.id = r.meeting_id
        WHERE r.student_id = ?
        ORDER BY r.completed_at DESC, r.rowid DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(db)
    .await
}

pub async fn completed_meeting_ids(
    db: &SqlitePool,
    student_id: &str,
) -> Result<HashSet<i64>, sqlx::Error> {
    let ids: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT meeting_id
        FROM quiz_results
        WHERE student_id = ? AND meeting_id IS NOT NULL
        "#,
    )
    .bind(student_id)
    .fetch_all(db)
    .await?;

    Ok(ids.into_iter().collect())
}
