//! Report views assembled from raw records on every request.
//!
//! Each builder issues its independent reads concurrently, then hands the
//! rows to a pure `compose_*` function that does the aggregation.

use serde::Serialize;
use sqlx::PgPool;

use crate::db::models::{
    AcademicYear, AttendanceRecord, GradeRecord, GradeSettings, SchoolClass, Subject, User,
    UserProfile,
};
use crate::repositories;
use crate::services::attendance_tally::{self, AttendanceSummary};
use crate::services::grade_aggregator::{self, GradeBreakdown, RoundingPolicy, WeightScheme};

#[derive(Debug, Clone, Serialize)]
pub(crate) struct YearInfo {
    pub(crate) id: String,
    pub(crate) name: String,
}

impl YearInfo {
    fn from_db(year: &AcademicYear) -> Self {
        Self { id: year.id.clone(), name: year.name.clone() }
    }
}

/// `name` and `level` are `None` when the class row is gone.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ClassInfo {
    pub(crate) id: String,
    pub(crate) name: Option<String>,
    pub(crate) level: Option<String>,
    pub(crate) homeroom_teacher: Option<String>,
}

impl ClassInfo {
    fn resolve(
        class_id: &str,
        class: Option<&SchoolClass>,
        homeroom_teacher: Option<String>,
    ) -> Self {
        Self {
            id: class_id.to_string(),
            name: class.map(|class| class.name.clone()),
            level: class.map(|class| class.level.clone()),
            homeroom_teacher,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubjectInfo {
    pub(crate) id: String,
    pub(crate) name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StudentInfo {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) nis: Option<String>,
}

impl StudentInfo {
    fn from_user(user: &User) -> Self {
        let nis = match &user.profile {
            UserProfile::Siswa { nis, .. } => nis.clone(),
            _ => None,
        };
        Self { id: user.id.clone(), name: user.name.clone(), nis }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReportCardRow {
    pub(crate) subject_id: String,
    pub(crate) subject_name: Option<String>,
    #[serde(flatten)]
    pub(crate) grade: GradeBreakdown,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReportCard {
    pub(crate) student: StudentInfo,
    pub(crate) class: ClassInfo,
    pub(crate) academic_year: YearInfo,
    pub(crate) weights: WeightScheme,
    pub(crate) rows: Vec<ReportCardRow>,
    pub(crate) attendance: AttendanceSummary,
    pub(crate) present_rate: u32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AttendanceRecapRow {
    pub(crate) student: StudentInfo,
    #[serde(flatten)]
    pub(crate) summary: AttendanceSummary,
    pub(crate) present_rate: u32,
    pub(crate) has_sessions: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AttendanceRecap {
    pub(crate) class: ClassInfo,
    pub(crate) subject: Option<SubjectInfo>,
    pub(crate) academic_year: YearInfo,
    pub(crate) session_count: usize,
    pub(crate) rows: Vec<AttendanceRecapRow>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct GradeRecapRow {
    pub(crate) student: StudentInfo,
    pub(crate) grade: Option<GradeBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct GradeRecap {
    pub(crate) class: ClassInfo,
    pub(crate) subject: SubjectInfo,
    pub(crate) academic_year: YearInfo,
    pub(crate) weights: WeightScheme,
    pub(crate) assessment_count: usize,
    pub(crate) rows: Vec<GradeRecapRow>,
}

/// Everything a report card needs, already fetched.
pub(crate) struct ReportCardSources<'a> {
    pub(crate) student: &'a User,
    pub(crate) class_id: &'a str,
    pub(crate) class: Option<&'a SchoolClass>,
    pub(crate) homeroom_teacher: Option<String>,
    pub(crate) year: &'a AcademicYear,
    pub(crate) subjects: &'a [Subject],
    pub(crate) grades: &'a [GradeRecord],
    pub(crate) attendance: &'a [AttendanceRecord],
    pub(crate) settings: Option<&'a GradeSettings>,
}

pub(crate) fn compose_report_card(
    sources: ReportCardSources<'_>,
    rounding: RoundingPolicy,
) -> ReportCard {
    let weights = WeightScheme::resolve(sources.settings);
    let by_subject = grade_aggregator::aggregate_by_subject(
        sources.grades,
        &sources.student.id,
        weights,
        rounding,
    );
    let mut rows: Vec<ReportCardRow> = by_subject
        .into_iter()
        .map(|row| ReportCardRow {
            subject_name: subject_name(sources.subjects, &row.subject_id),
            subject_id: row.subject_id,
            grade: row.grade,
        })
        .collect();
    // Named subjects alphabetically, orphaned ones last by id.
    rows.sort_by(|a, b| {
        (a.subject_name.is_none(), &a.subject_name, &a.subject_id)
            .cmp(&(b.subject_name.is_none(), &b.subject_name, &b.subject_id))
    });

    let attendance = attendance_tally::tally_student(sources.attendance, &sources.student.id);

    ReportCard {
        student: StudentInfo::from_user(sources.student),
        class: ClassInfo::resolve(sources.class_id, sources.class, sources.homeroom_teacher),
        academic_year: YearInfo::from_db(sources.year),
        weights,
        rows,
        present_rate: attendance.present_rate(),
        attendance,
    }
}

pub(crate) async fn build_report_card(
    pool: &PgPool,
    rounding: RoundingPolicy,
    student: &User,
    year: &AcademicYear,
) -> Result<ReportCard, sqlx::Error> {
    let class_id = student.student_class_id().unwrap_or_default();

    let grade_filters = repositories::grades::ListGrades {
        academic_year_id: Some(year.id.clone()),
        class_id: Some(class_id.to_string()),
        ..Default::default()
    };
    let attendance_filters = repositories::attendance::ListAttendance {
        academic_year_id: Some(year.id.clone()),
        class_id: Some(class_id.to_string()),
        ..Default::default()
    };

    let (class, subjects, grades, attendance, settings) = tokio::try_join!(
        repositories::classes::find_by_id(pool, class_id),
        repositories::subjects::list(pool),
        repositories::grades::list(pool, &grade_filters),
        repositories::attendance::list(pool, &attendance_filters),
        repositories::grade_settings::find_by_year(pool, &year.id),
    )?;

    let homeroom_teacher = homeroom_teacher_name(pool, class.as_ref()).await?;

    Ok(compose_report_card(
        ReportCardSources {
            student,
            class_id,
            class: class.as_ref(),
            homeroom_teacher,
            year,
            subjects: &subjects,
            grades: &grades,
            attendance: &attendance,
            settings: settings.as_ref(),
        },
        rounding,
    ))
}

pub(crate) fn compose_attendance_recap(
    class: ClassInfo,
    subject: Option<SubjectInfo>,
    year: &AcademicYear,
    roster: &[User],
    records: &[AttendanceRecord],
) -> AttendanceRecap {
    let tally = attendance_tally::tally_class(records);
    let rows = roster
        .iter()
        .map(|student| {
            let summary = tally.get(&student.id).copied().unwrap_or_default();
            AttendanceRecapRow {
                student: StudentInfo::from_user(student),
                present_rate: summary.present_rate(),
                has_sessions: summary.has_sessions(),
                summary,
            }
        })
        .collect();

    AttendanceRecap {
        class,
        subject,
        academic_year: YearInfo::from_db(year),
        session_count: records.len(),
        rows,
    }
}

/// `None` when the class does not exist.
pub(crate) async fn build_attendance_recap(
    pool: &PgPool,
    year: &AcademicYear,
    class_id: &str,
    subject_id: Option<&str>,
) -> Result<Option<AttendanceRecap>, sqlx::Error> {
    let filters = repositories::attendance::ListAttendance {
        academic_year_id: Some(year.id.clone()),
        class_id: Some(class_id.to_string()),
        subject_id: subject_id.map(str::to_string),
        ..Default::default()
    };

    let (class, roster, records, subjects) = tokio::try_join!(
        repositories::classes::find_by_id(pool, class_id),
        load_roster(pool, class_id),
        repositories::attendance::list(pool, &filters),
        repositories::subjects::list(pool),
    )?;

    let Some(class) = class else {
        return Ok(None);
    };
    let homeroom_teacher = homeroom_teacher_name(pool, Some(&class)).await?;
    let subject = subject_id
        .map(|id| SubjectInfo { id: id.to_string(), name: subject_name(&subjects, id) });

    Ok(Some(compose_attendance_recap(
        ClassInfo::resolve(class_id, Some(&class), homeroom_teacher),
        subject,
        year,
        &roster,
        &records,
    )))
}

pub(crate) fn compose_grade_recap(
    class: ClassInfo,
    subject: SubjectInfo,
    year: &AcademicYear,
    roster: &[User],
    records: &[GradeRecord],
    settings: Option<&GradeSettings>,
    rounding: RoundingPolicy,
) -> GradeRecap {
    let weights = WeightScheme::resolve(settings);
    let student_ids: Vec<String> = roster.iter().map(|student| student.id.clone()).collect();
    let grades = grade_aggregator::aggregate_class(records, &student_ids, weights, rounding);

    let rows = roster
        .iter()
        .zip(grades)
        .map(|(student, grade)| GradeRecapRow {
            student: StudentInfo::from_user(student),
            grade: grade.grade,
        })
        .collect();

    GradeRecap {
        class,
        subject,
        academic_year: YearInfo::from_db(year),
        weights,
        assessment_count: records.len(),
        rows,
    }
}

/// `None` when the class does not exist.
pub(crate) async fn build_grade_recap(
    pool: &PgPool,
    rounding: RoundingPolicy,
    year: &AcademicYear,
    class_id: &str,
    subject_id: &str,
) -> Result<Option<GradeRecap>, sqlx::Error> {
    let filters = repositories::grades::ListGrades {
        academic_year_id: Some(year.id.clone()),
        class_id: Some(class_id.to_string()),
        subject_id: Some(subject_id.to_string()),
        ..Default::default()
    };

    let (class, subject, roster, records, settings) = tokio::try_join!(
        repositories::classes::find_by_id(pool, class_id),
        repositories::subjects::find_by_id(pool, subject_id),
        load_roster(pool, class_id),
        repositories::grades::list(pool, &filters),
        repositories::grade_settings::find_by_year(pool, &year.id),
    )?;

    let Some(class) = class else {
        return Ok(None);
    };
    let homeroom_teacher = homeroom_teacher_name(pool, Some(&class)).await?;

    Ok(Some(compose_grade_recap(
        ClassInfo::resolve(class_id, Some(&class), homeroom_teacher),
        SubjectInfo { id: subject_id.to_string(), name: subject.map(|subject| subject.name) },
        year,
        &roster,
        &records,
        settings.as_ref(),
        rounding,
    )))
}

/// Students of the class sorted by name. Rows that fail role conversion
/// are skipped with a warning.
pub(crate) async fn load_roster(pool: &PgPool, class_id: &str) -> Result<Vec<User>, sqlx::Error> {
    let rows = repositories::users::list_students_by_class(pool, class_id).await?;
    let mut roster: Vec<User> = rows
        .into_iter()
        .filter_map(|row| match User::try_from(row) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!(class_id, error = %err, "Skipping unusable student row");
                None
            }
        })
        .collect();
    roster.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    Ok(roster)
}

async fn homeroom_teacher_name(
    pool: &PgPool,
    class: Option<&SchoolClass>,
) -> Result<Option<String>, sqlx::Error> {
    match class.and_then(|class| class.wali_kelas_id.as_deref()) {
        Some(teacher_id) => repositories::users::find_name_by_id(pool, teacher_id).await,
        None => Ok(None),
    }
}

fn subject_name(subjects: &[Subject], subject_id: &str) -> Option<String> {
    subjects.iter().find(|subject| subject.id == subject_id).map(|subject| subject.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::db::models::{AttendanceEntry, ScoreSheet};
    use crate::db::types::{AssessmentType, AttendanceStatus};
    use sqlx::types::Json;
    use time::macros::date;

    fn student(id: &str, name: &str) -> User {
        let now = primitive_now_utc();
        User {
            id: id.to_string(),
            email: format!("{id}@sekolah.test"),
            name: name.to_string(),
            profile: UserProfile::Siswa {
                class_id: "7a".to_string(),
                nis: Some(format!("nis-{id}")),
            },
            created_at: now,
            updated_at: now,
        }
    }

    fn year() -> AcademicYear {
        let now = primitive_now_utc();
        AcademicYear {
            id: "2024-ganjil".to_string(),
            name: "2024/2025 Ganjil".to_string(),
            start_date: date!(2024 - 07 - 15),
            end_date: date!(2024 - 12 - 20),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn subject(id: &str, name: &str) -> Subject {
        let now = primitive_now_utc();
        Subject {
            id: id.to_string(),
            name: name.to_string(),
            code: id.to_uppercase(),
            created_at: now,
            updated_at: now,
        }
    }

    fn grade(subject: &str, kind: AssessmentType, scores: &[(&str, f64)]) -> GradeRecord {
        let now = primitive_now_utc();
        let sheet: ScoreSheet =
            scores.iter().map(|(id, score)| (id.to_string(), Some(*score))).collect();
        GradeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            academic_year_id: "2024-ganjil".to_string(),
            class_id: "7a".to_string(),
            subject_id: subject.to_string(),
            teacher_id: "guru-1".to_string(),
            assessment_type: kind,
            assessment_name: "Ulangan".to_string(),
            date: date!(2024 - 09 - 01),
            scores: Json(sheet),
            created_at: now,
            updated_at: now,
        }
    }

    fn session(marks: &[(&str, AttendanceStatus)]) -> AttendanceRecord {
        let now = primitive_now_utc();
        AttendanceRecord {
            id: uuid::Uuid::new_v4().to_string(),
            academic_year_id: "2024-ganjil".to_string(),
            class_id: "7a".to_string(),
            subject_id: "mtk".to_string(),
            teacher_id: "guru-1".to_string(),
            date: date!(2024 - 09 - 02),
            records: Json(
                marks
                    .iter()
                    .map(|(id, status)| AttendanceEntry {
                        student_id: id.to_string(),
                        status: *status,
                        notes: None,
                    })
                    .collect(),
            ),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn report_card_names_orphaned_subjects_as_missing() {
        let ani = student("ani", "Ani");
        let year = year();
        let subjects = vec![subject("mtk", "Matematika")];
        let grades = vec![
            grade("mtk", AssessmentType::Uas, &[("ani", 90.0)]),
            grade("seni", AssessmentType::Uts, &[("ani", 70.0)]),
        ];
        let attendance = vec![
            session(&[("ani", AttendanceStatus::Hadir)]),
            session(&[("ani", AttendanceStatus::Sakit)]),
        ];

        let card = compose_report_card(
            ReportCardSources {
                student: &ani,
                class_id: "7a",
                class: None,
                homeroom_teacher: None,
                year: &year,
                subjects: &subjects,
                grades: &grades,
                attendance: &attendance,
                settings: None,
            },
            RoundingPolicy::new(1),
        );

        assert_eq!(card.rows.len(), 2);
        assert_eq!(card.rows[0].subject_name.as_deref(), Some("Matematika"));
        assert_eq!(card.rows[1].subject_id, "seni");
        assert!(card.rows[1].subject_name.is_none());
        assert!(card.class.name.is_none());
        assert_eq!(card.attendance.total, 2);
        assert_eq!(card.present_rate, 50);
        assert!(matches!(card.weights, WeightScheme::Fallback { .. }));
    }

    #[test]
    fn report_card_rows_follow_subject_names() {
        let ani = student("ani", "Ani");
        let year = year();
        let subjects = vec![
            subject("0b5c", "Seni Budaya"),
            subject("7e21", "Bahasa Indonesia"),
            subject("c903", "Matematika"),
        ];
        let grades = vec![
            grade("0b5c", AssessmentType::Uas, &[("ani", 88.0)]),
            grade("7e21", AssessmentType::Uas, &[("ani", 76.0)]),
            grade("c903", AssessmentType::Uas, &[("ani", 90.0)]),
            grade("0000", AssessmentType::Uas, &[("ani", 60.0)]),
        ];

        let card = compose_report_card(
            ReportCardSources {
                student: &ani,
                class_id: "7a",
                class: None,
                homeroom_teacher: None,
                year: &year,
                subjects: &subjects,
                grades: &grades,
                attendance: &[],
                settings: None,
            },
            RoundingPolicy::new(1),
        );

        let order: Vec<&str> = card.rows.iter().map(|row| row.subject_id.as_str()).collect();
        assert_eq!(order, vec!["7e21", "c903", "0b5c", "0000"]);
    }

    #[test]
    fn attendance_recap_lists_whole_roster() {
        let roster = vec![student("budi", "Budi"), student("ani", "Ani")];
        let records = vec![session(&[
            ("budi", AttendanceStatus::Alpha),
            ("lulus", AttendanceStatus::Hadir),
        ])];
        let class = ClassInfo {
            id: "7a".to_string(),
            name: Some("VII A".to_string()),
            level: None,
            homeroom_teacher: None,
        };

        let recap = compose_attendance_recap(class, None, &year(), &roster, &records);

        assert_eq!(recap.rows.len(), 2);
        assert_eq!(recap.session_count, 1);
        assert_eq!(recap.rows[0].student.id, "budi");
        assert_eq!(recap.rows[0].summary.alpha, 1);
        assert!(!recap.rows[1].has_sessions);
        assert_eq!(recap.rows[1].present_rate, 0);
    }

    #[test]
    fn grade_recap_keeps_students_without_entries() {
        let roster = vec![student("ani", "Ani"), student("budi", "Budi")];
        let records = vec![grade("mtk", AssessmentType::TugasHarian, &[("ani", 80.0)])];
        let class =
            ClassInfo { id: "7a".to_string(), name: None, level: None, homeroom_teacher: None };
        let subject = SubjectInfo { id: "mtk".to_string(), name: Some("Matematika".to_string()) };

        let recap = compose_grade_recap(
            class,
            subject,
            &year(),
            &roster,
            &records,
            None,
            RoundingPolicy::new(1),
        );

        assert_eq!(recap.rows[0].grade.as_ref().map(|g| g.display_score), Some(40.0));
        assert!(recap.rows[1].grade.is_none());
        assert_eq!(recap.assessment_count, 1);
    }
}
