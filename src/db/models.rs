use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use thiserror::Error;
use time::{Date, PrimitiveDateTime, Time};

use crate::db::types::{AssessmentType, AttendanceStatus, Audience, SchoolDay, UserRole};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct AcademicYear {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_date: Date,
    pub(crate) end_date: Date,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct SchoolClass {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) level: String,
    pub(crate) wali_kelas_id: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Subject {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) code: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Schedule {
    pub(crate) id: String,
    pub(crate) academic_year_id: String,
    pub(crate) class_id: String,
    pub(crate) subject_id: String,
    pub(crate) teacher_id: String,
    pub(crate) day: SchoolDay,
    pub(crate) start_time: Time,
    pub(crate) end_time: Time,
    pub(crate) room: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One student's mark within a taught session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AttendanceEntry {
    pub(crate) student_id: String,
    pub(crate) status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct AttendanceRecord {
    pub(crate) id: String,
    pub(crate) academic_year_id: String,
    pub(crate) class_id: String,
    pub(crate) subject_id: String,
    pub(crate) teacher_id: String,
    pub(crate) date: Date,
    pub(crate) records: Json<Vec<AttendanceEntry>>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Student id to score. A `None` value is an explicit blank entered by the
/// teacher; aggregation treats it the same as an absent key.
pub(crate) type ScoreSheet = BTreeMap<String, Option<f64>>;

#[derive(Debug, Clone, FromRow)]
pub(crate) struct GradeRecord {
    pub(crate) id: String,
    pub(crate) academic_year_id: String,
    pub(crate) class_id: String,
    pub(crate) subject_id: String,
    pub(crate) teacher_id: String,
    pub(crate) assessment_type: AssessmentType,
    pub(crate) assessment_name: String,
    pub(crate) date: Date,
    pub(crate) scores: Json<ScoreSheet>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct GradeSettings {
    pub(crate) id: String,
    pub(crate) academic_year_id: String,
    pub(crate) tugas_percentage: f64,
    pub(crate) uts_percentage: f64,
    pub(crate) uas_percentage: f64,
    pub(crate) lainnya_percentage: Option<f64>,
    pub(crate) absence_percentage: Option<f64>,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Announcement {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) audience: Audience,
    pub(crate) author_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Raw `users` row. Converted into [`User`] before anything else looks at it.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserRow {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) role: String,
    pub(crate) class_id: Option<String>,
    pub(crate) nis: Option<String>,
    pub(crate) subject_ids: Vec<String>,
    pub(crate) homeroom_class_ids: Vec<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UserProfile {
    Admin,
    Guru { subject_ids: Vec<String>, homeroom_class_ids: Vec<String> },
    Siswa { class_id: String, nis: Option<String> },
}

#[derive(Debug, Clone)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) profile: UserProfile,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum UserConversionError {
    #[error("user {uid} has unrecognized role '{role}'")]
    UnknownRole { uid: String, role: String },
    #[error("student {uid} is not assigned to a class")]
    StudentWithoutClass { uid: String },
}

impl User {
    pub(crate) fn role(&self) -> UserRole {
        match self.profile {
            UserProfile::Admin => UserRole::Admin,
            UserProfile::Guru { .. } => UserRole::Guru,
            UserProfile::Siswa { .. } => UserRole::Siswa,
        }
    }

    pub(crate) fn student_class_id(&self) -> Option<&str> {
        match &self.profile {
            UserProfile::Siswa { class_id, .. } => Some(class_id),
            _ => None,
        }
    }

    pub(crate) fn is_homeroom_of(&self, class_id: &str) -> bool {
        match &self.profile {
            UserProfile::Guru { homeroom_class_ids, .. } => {
                homeroom_class_ids.iter().any(|id| id == class_id)
            }
            _ => false,
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = UserConversionError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<UserRole>().map_err(|role| {
            UserConversionError::UnknownRole { uid: row.id.clone(), role }
        })?;

        let profile = match role {
            UserRole::Admin => UserProfile::Admin,
            UserRole::Guru => UserProfile::Guru {
                subject_ids: row.subject_ids,
                homeroom_class_ids: row.homeroom_class_ids,
            },
            UserRole::Siswa => {
                let class_id = row
                    .class_id
                    .filter(|value| !value.trim().is_empty())
                    .ok_or_else(|| UserConversionError::StudentWithoutClass {
                        uid: row.id.clone(),
                    })?;
                UserProfile::Siswa { class_id, nis: row.nis }
            }
        };

        Ok(Self {
            id: row.id,
            email: row.email,
            name: row.name,
            profile,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
