use validator::Validate;

use crate::error::AppError;
use crate::models::{InsertQuizResult, LoginRequest, ProgressRequest};

/// Trims the login fields in place before checking them.
pub fn login(req: &mut LoginRequest) -> Result<(), AppError> {
    req.name = req.name.trim().to_string();
    req.class_name = req.class_name.trim().to_string();
    req.teacher_name = req
        .teacher_name
        .take()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    req.validate()?;
    Ok(())
}

pub fn progress(req: &ProgressRequest) -> Result<(), AppError> {
    req.validate()?;
    Ok(())
}

pub fn quiz_result(req: &mut InsertQuizResult) -> Result<(), AppError> {
    req.student_id = req.student_id.trim().to_string();
    req.validate()?;
    Ok(())
}
