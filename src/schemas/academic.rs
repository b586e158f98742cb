use serde::{Deserialize, Serialize};
use time::{Date, Time};
use validator::Validate;

use crate::core::time::{
    deserialize_clock, deserialize_date, deserialize_option_clock, deserialize_option_date,
    format_clock, format_date, format_primitive,
};
use crate::db::models::{AcademicYear, Schedule, SchoolClass, Subject};
use crate::db::types::SchoolDay;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AcademicYearCreate {
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(alias = "startDate", deserialize_with = "deserialize_date")]
    pub(crate) start_date: Date,
    #[serde(alias = "endDate", deserialize_with = "deserialize_date")]
    pub(crate) end_date: Date,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AcademicYearUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default, alias = "startDate", deserialize_with = "deserialize_option_date")]
    pub(crate) start_date: Option<Date>,
    #[serde(default, alias = "endDate", deserialize_with = "deserialize_option_date")]
    pub(crate) end_date: Option<Date>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AcademicYearResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AcademicYearResponse {
    pub(crate) fn from_db(year: AcademicYear) -> Self {
        Self {
            id: year.id,
            name: year.name,
            start_date: format_date(year.start_date),
            end_date: format_date(year.end_date),
            is_active: year.is_active,
            created_at: format_primitive(year.created_at),
            updated_at: format_primitive(year.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassCreate {
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, max = 20, message = "level must not be empty"))]
    pub(crate) level: String,
    #[serde(default)]
    #[serde(alias = "waliKelasId")]
    pub(crate) wali_kelas_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "level must not be empty"))]
    pub(crate) level: Option<String>,
    #[serde(default)]
    #[serde(alias = "waliKelasId")]
    pub(crate) wali_kelas_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) level: String,
    pub(crate) wali_kelas_id: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ClassResponse {
    pub(crate) fn from_db(class: SchoolClass) -> Self {
        Self {
            id: class.id,
            name: class.name,
            level: class.level,
            wali_kelas_id: class.wali_kelas_id,
            created_at: format_primitive(class.created_at),
            updated_at: format_primitive(class.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectCreate {
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, max = 20, message = "code must be 1..20 characters"))]
    pub(crate) code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "code must be 1..20 characters"))]
    pub(crate) code: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) code: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl SubjectResponse {
    pub(crate) fn from_db(subject: Subject) -> Self {
        Self {
            id: subject.id,
            name: subject.name,
            code: subject.code,
            created_at: format_primitive(subject.created_at),
            updated_at: format_primitive(subject.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ScheduleCreate {
    #[serde(alias = "academicYearId")]
    pub(crate) academic_year_id: String,
    #[serde(alias = "classId")]
    pub(crate) class_id: String,
    #[serde(alias = "subjectId")]
    pub(crate) subject_id: String,
    #[serde(alias = "teacherId")]
    pub(crate) teacher_id: String,
    pub(crate) day: SchoolDay,
    #[serde(alias = "startTime", deserialize_with = "deserialize_clock")]
    pub(crate) start_time: Time,
    #[serde(alias = "endTime", deserialize_with = "deserialize_clock")]
    pub(crate) end_time: Time,
    #[serde(default)]
    #[validate(length(max = 50, message = "room must be at most 50 characters"))]
    pub(crate) room: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ScheduleUpdate {
    #[serde(default, alias = "subjectId")]
    pub(crate) subject_id: Option<String>,
    #[serde(default, alias = "teacherId")]
    pub(crate) teacher_id: Option<String>,
    #[serde(default)]
    pub(crate) day: Option<SchoolDay>,
    #[serde(default, alias = "startTime", deserialize_with = "deserialize_option_clock")]
    pub(crate) start_time: Option<Time>,
    #[serde(default, alias = "endTime", deserialize_with = "deserialize_option_clock")]
    pub(crate) end_time: Option<Time>,
    #[serde(default)]
    #[validate(length(max = 50, message = "room must be at most 50 characters"))]
    pub(crate) room: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleListQuery {
    #[serde(default, alias = "academicYearId")]
    pub(crate) academic_year_id: Option<String>,
    #[serde(default, alias = "classId")]
    pub(crate) class_id: Option<String>,
    #[serde(default, alias = "teacherId")]
    pub(crate) teacher_id: Option<String>,
    #[serde(default)]
    pub(crate) day: Option<SchoolDay>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScheduleResponse {
    pub(crate) id: String,
    pub(crate) academic_year_id: String,
    pub(crate) class_id: String,
    pub(crate) subject_id: String,
    pub(crate) teacher_id: String,
    pub(crate) day: SchoolDay,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) room: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ScheduleResponse {
    pub(crate) fn from_db(schedule: Schedule) -> Self {
        Self {
            id: schedule.id,
            academic_year_id: schedule.academic_year_id,
            class_id: schedule.class_id,
            subject_id: schedule.subject_id,
            teacher_id: schedule.teacher_id,
            day: schedule.day,
            start_time: format_clock(schedule.start_time),
            end_time: format_clock(schedule.end_time),
            room: schedule.room,
            created_at: format_primitive(schedule.created_at),
            updated_at: format_primitive(schedule.updated_at),
        }
    }
}
