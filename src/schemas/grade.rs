use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::core::time::{deserialize_date, deserialize_option_date, format_date, format_primitive};
use crate::db::models::{GradeRecord, GradeSettings, ScoreSheet};
use crate::db::types::AssessmentType;
use crate::services::grade_aggregator::FALLBACK_WEIGHTS;
use crate::services::grade_policy::PercentageInput;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeCreate {
    #[serde(alias = "academicYearId")]
    pub(crate) academic_year_id: String,
    #[serde(alias = "classId")]
    pub(crate) class_id: String,
    #[serde(alias = "subjectId")]
    pub(crate) subject_id: String,
    #[serde(alias = "assessmentType")]
    pub(crate) assessment_type: AssessmentType,
    #[serde(alias = "assessmentName")]
    #[validate(length(min = 1, max = 200, message = "assessment_name must not be empty"))]
    pub(crate) assessment_name: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) date: Date,
    #[serde(default)]
    pub(crate) scores: ScoreSheet,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeUpdate {
    #[serde(default, alias = "assessmentType")]
    pub(crate) assessment_type: Option<AssessmentType>,
    #[serde(default, alias = "assessmentName")]
    #[validate(length(min = 1, max = 200, message = "assessment_name must not be empty"))]
    pub(crate) assessment_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(crate) date: Option<Date>,
    #[serde(default)]
    pub(crate) scores: Option<ScoreSheet>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GradeListQuery {
    #[serde(default, alias = "academicYearId")]
    pub(crate) academic_year_id: Option<String>,
    #[serde(default, alias = "classId")]
    pub(crate) class_id: Option<String>,
    #[serde(default, alias = "subjectId")]
    pub(crate) subject_id: Option<String>,
    #[serde(default, alias = "assessmentType")]
    pub(crate) assessment_type: Option<AssessmentType>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GradeRecapQuery {
    #[serde(default, alias = "academicYearId")]
    pub(crate) academic_year_id: Option<String>,
    #[serde(alias = "classId")]
    pub(crate) class_id: String,
    #[serde(alias = "subjectId")]
    pub(crate) subject_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeResponse {
    pub(crate) id: String,
    pub(crate) academic_year_id: String,
    pub(crate) class_id: String,
    pub(crate) subject_id: String,
    pub(crate) teacher_id: String,
    pub(crate) assessment_type: AssessmentType,
    pub(crate) assessment_name: String,
    pub(crate) date: String,
    pub(crate) scores: ScoreSheet,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl GradeResponse {
    pub(crate) fn from_db(record: GradeRecord) -> Self {
        Self {
            id: record.id,
            academic_year_id: record.academic_year_id,
            class_id: record.class_id,
            subject_id: record.subject_id,
            teacher_id: record.teacher_id,
            assessment_type: record.assessment_type,
            assessment_name: record.assessment_name,
            date: format_date(record.date),
            scores: record.scores.0,
            created_at: format_primitive(record.created_at),
            updated_at: format_primitive(record.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GradeSettingsQuery {
    #[serde(alias = "academicYearId")]
    pub(crate) academic_year_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GradeSettingsUpdate {
    #[serde(alias = "tugasPercentage")]
    pub(crate) tugas_percentage: f64,
    #[serde(alias = "utsPercentage")]
    pub(crate) uts_percentage: f64,
    #[serde(alias = "uasPercentage")]
    pub(crate) uas_percentage: f64,
    #[serde(default, alias = "lainnyaPercentage")]
    pub(crate) lainnya_percentage: Option<f64>,
    #[serde(default, alias = "absencePercentage")]
    pub(crate) absence_percentage: Option<f64>,
}

impl GradeSettingsUpdate {
    pub(crate) fn percentages(&self) -> PercentageInput {
        PercentageInput {
            tugas: self.tugas_percentage,
            uts: self.uts_percentage,
            uas: self.uas_percentage,
            lainnya: self.lainnya_percentage,
            absence: self.absence_percentage,
        }
    }
}

/// `is_default` marks the fallback weights returned when a year has no
/// stored settings.
#[derive(Debug, Serialize)]
pub(crate) struct GradeSettingsResponse {
    pub(crate) academic_year_id: String,
    pub(crate) tugas_percentage: f64,
    pub(crate) uts_percentage: f64,
    pub(crate) uas_percentage: f64,
    pub(crate) lainnya_percentage: Option<f64>,
    pub(crate) absence_percentage: Option<f64>,
    pub(crate) is_default: bool,
    pub(crate) updated_at: Option<String>,
}

impl GradeSettingsResponse {
    pub(crate) fn from_db(settings: GradeSettings) -> Self {
        Self {
            academic_year_id: settings.academic_year_id,
            tugas_percentage: settings.tugas_percentage,
            uts_percentage: settings.uts_percentage,
            uas_percentage: settings.uas_percentage,
            lainnya_percentage: settings.lainnya_percentage,
            absence_percentage: settings.absence_percentage,
            is_default: false,
            updated_at: Some(format_primitive(settings.updated_at)),
        }
    }

    pub(crate) fn fallback(academic_year_id: String) -> Self {
        Self {
            academic_year_id,
            tugas_percentage: FALLBACK_WEIGHTS.tugas,
            uts_percentage: FALLBACK_WEIGHTS.uts,
            uas_percentage: FALLBACK_WEIGHTS.uas,
            lainnya_percentage: None,
            absence_percentage: None,
            is_default: true,
            updated_at: None,
        }
    }
}
