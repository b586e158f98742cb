use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::core::time::{deserialize_date, deserialize_option_date, format_date, format_primitive};
use crate::db::models::{AttendanceEntry, AttendanceRecord};
use crate::services::attendance_tally::AttendanceSummary;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttendanceCreate {
    #[serde(alias = "academicYearId")]
    pub(crate) academic_year_id: String,
    #[serde(alias = "classId")]
    pub(crate) class_id: String,
    #[serde(alias = "subjectId")]
    pub(crate) subject_id: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) date: Date,
    #[validate(length(min = 1, message = "records must not be empty"))]
    pub(crate) records: Vec<AttendanceEntry>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttendanceUpdate {
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(crate) date: Option<Date>,
    #[serde(default)]
    #[validate(length(min = 1, message = "records must not be empty"))]
    pub(crate) records: Option<Vec<AttendanceEntry>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttendanceListQuery {
    #[serde(default, alias = "academicYearId")]
    pub(crate) academic_year_id: Option<String>,
    #[serde(default, alias = "classId")]
    pub(crate) class_id: Option<String>,
    #[serde(default, alias = "subjectId")]
    pub(crate) subject_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(crate) date: Option<Date>,
}

/// Scope of a recap; the active year is used when none is given.
#[derive(Debug, Deserialize)]
pub(crate) struct RecapQuery {
    #[serde(default, alias = "academicYearId")]
    pub(crate) academic_year_id: Option<String>,
    #[serde(alias = "classId")]
    pub(crate) class_id: String,
    #[serde(default, alias = "subjectId")]
    pub(crate) subject_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct YearQuery {
    #[serde(default, alias = "academicYearId")]
    pub(crate) academic_year_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttendanceResponse {
    pub(crate) id: String,
    pub(crate) academic_year_id: String,
    pub(crate) class_id: String,
    pub(crate) subject_id: String,
    pub(crate) teacher_id: String,
    pub(crate) date: String,
    pub(crate) records: Vec<AttendanceEntry>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AttendanceResponse {
    pub(crate) fn from_db(record: AttendanceRecord) -> Self {
        Self {
            id: record.id,
            academic_year_id: record.academic_year_id,
            class_id: record.class_id,
            subject_id: record.subject_id,
            teacher_id: record.teacher_id,
            date: format_date(record.date),
            records: record.records.0,
            created_at: format_primitive(record.created_at),
            updated_at: format_primitive(record.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectRateResponse {
    pub(crate) subject_id: String,
    pub(crate) subject_name: Option<String>,
    #[serde(flatten)]
    pub(crate) summary: AttendanceSummary,
    pub(crate) present_rate: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct MyAttendanceResponse {
    pub(crate) academic_year_id: String,
    #[serde(flatten)]
    pub(crate) summary: AttendanceSummary,
    pub(crate) present_rate: u32,
    pub(crate) has_sessions: bool,
    pub(crate) subjects: Vec<SubjectRateResponse>,
}
