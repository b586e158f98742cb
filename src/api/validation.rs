use std::collections::BTreeSet;

use time::{Date, Time};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::{AttendanceEntry, ScoreSheet};
use crate::services::report_card;

pub(crate) const MAX_SCORE: f64 = 100.0;

pub(crate) fn validate_date_range(start: Date, end: Date) -> Result<(), ApiError> {
    if end < start {
        return Err(ApiError::UnprocessableEntity(
            "end_date must not be before start_date".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_lesson_times(start: Time, end: Time) -> Result<(), ApiError> {
    if end <= start {
        return Err(ApiError::UnprocessableEntity("end_time must be after start_time".to_string()));
    }
    Ok(())
}

/// Scores are blank or within 0..=100.
pub(crate) fn validate_scores(scores: &ScoreSheet) -> Result<(), ApiError> {
    for (student_id, score) in scores {
        if student_id.trim().is_empty() {
            return Err(ApiError::BadRequest("scores contain an empty student id".to_string()));
        }
        if let Some(score) = score {
            if !score.is_finite() || !(0.0..=MAX_SCORE).contains(score) {
                return Err(ApiError::UnprocessableEntity(format!(
                    "score for {student_id} must be between 0 and {MAX_SCORE}"
                )));
            }
        }
    }
    Ok(())
}

/// One entry per student per session.
pub(crate) fn validate_attendance_entries(entries: &[AttendanceEntry]) -> Result<(), ApiError> {
    let mut seen = BTreeSet::new();
    for entry in entries {
        if entry.student_id.trim().is_empty() {
            return Err(ApiError::BadRequest("records contain an empty student id".to_string()));
        }
        if !seen.insert(entry.student_id.as_str()) {
            return Err(ApiError::UnprocessableEntity(format!(
                "student {} is listed more than once",
                entry.student_id
            )));
        }
    }
    Ok(())
}

/// Every referenced student must currently belong to the class.
pub(crate) async fn ensure_class_members<'a, I>(
    state: &AppState,
    class_id: &str,
    student_ids: I,
) -> Result<(), ApiError>
where
    I: IntoIterator<Item = &'a str>,
{
    let roster = report_card::load_roster(state.db(), class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class roster"))?;

    for student_id in student_ids {
        if !roster.iter().any(|student| student.id == student_id) {
            return Err(ApiError::UnprocessableEntity(format!(
                "student {student_id} is not in this class"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::AttendanceStatus;
    use time::macros::{date, time};

    #[test]
    fn rejects_reversed_dates_and_times() {
        assert!(validate_date_range(date!(2024 - 07 - 15), date!(2024 - 12 - 20)).is_ok());
        assert!(validate_date_range(date!(2024 - 07 - 15), date!(2024 - 07 - 14)).is_err());
        assert!(validate_lesson_times(time!(7:00), time!(8:30)).is_ok());
        assert!(validate_lesson_times(time!(8:30), time!(8:30)).is_err());
    }

    #[test]
    fn scores_allow_blanks_but_not_out_of_range() {
        let mut scores = ScoreSheet::new();
        scores.insert("ani".to_string(), Some(100.0));
        scores.insert("budi".to_string(), None);
        assert!(validate_scores(&scores).is_ok());

        scores.insert("citra".to_string(), Some(101.0));
        assert!(matches!(validate_scores(&scores), Err(ApiError::UnprocessableEntity(_))));
    }

    #[test]
    fn duplicate_attendance_entries_are_rejected() {
        let entry = |id: &str| AttendanceEntry {
            student_id: id.to_string(),
            status: AttendanceStatus::Hadir,
            notes: None,
        };
        assert!(validate_attendance_entries(&[entry("ani"), entry("budi")]).is_ok());
        assert!(validate_attendance_entries(&[entry("ani"), entry("ani")]).is_err());
    }
}
