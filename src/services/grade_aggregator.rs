//! Weighted roll-up of raw assessment scores into one final grade per
//! (student, subject).
//!
//! Everything here is a pure function of its inputs: callers fetch the
//! records, resolve the [`WeightScheme`] and [`RoundingPolicy`] once, and
//! recompute on every request.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::config::GradingSettings;
use crate::db::models::{GradeRecord, GradeSettings};
use crate::db::types::AssessmentType;
use crate::services::grade_policy;

/// Category weights in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct Weights {
    pub(crate) tugas: f64,
    pub(crate) uts: f64,
    pub(crate) uas: f64,
    pub(crate) lainnya: f64,
}

/// Used when no settings exist for the academic year. "Lainnya" scores are
/// ignored under this scheme.
pub(crate) const FALLBACK_WEIGHTS: Weights =
    Weights { tugas: 50.0, uts: 25.0, uas: 25.0, lainnya: 0.0 };

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub(crate) enum WeightScheme {
    Configured {
        #[serde(flatten)]
        weights: Weights,
        /// Stored with the settings but not part of the formula.
        absence_percentage: Option<f64>,
    },
    Fallback {
        #[serde(flatten)]
        weights: Weights,
    },
}

impl WeightScheme {
    /// The one place weights are chosen for a request.
    pub(crate) fn resolve(settings: Option<&GradeSettings>) -> Self {
        let Some(settings) = settings else {
            return Self::Fallback { weights: FALLBACK_WEIGHTS };
        };

        if let Err(violation) = grade_policy::validate(&settings.into()) {
            // Rows written around the API are still authoritative.
            tracing::warn!(
                academic_year_id = %settings.academic_year_id,
                error = %violation,
                "Stored grade settings violate the percentage rules; using them as-is"
            );
        }

        Self::Configured {
            weights: Weights {
                tugas: settings.tugas_percentage,
                uts: settings.uts_percentage,
                uas: settings.uas_percentage,
                lainnya: settings.lainnya_percentage.unwrap_or(0.0),
            },
            absence_percentage: settings.absence_percentage,
        }
    }

    pub(crate) fn weights(&self) -> Weights {
        match self {
            Self::Configured { weights, .. } | Self::Fallback { weights } => *weights,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RoundingPolicy {
    decimals: u32,
}

impl RoundingPolicy {
    pub(crate) const fn new(decimals: u32) -> Self {
        Self { decimals }
    }

    pub(crate) fn from_settings(settings: GradingSettings) -> Self {
        Self::new(settings.score_decimals)
    }

    /// Half away from zero, matching how report cards are read by hand.
    pub(crate) fn round(self, value: f64) -> f64 {
        let factor = 10f64.powi(self.decimals as i32);
        (value * factor).round() / factor
    }

    pub(crate) fn format(self, value: f64) -> String {
        format!("{:.*}", self.decimals as usize, self.round(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum LetterGrade {
    A,
    B,
    C,
    D,
    E,
}

impl LetterGrade {
    pub(crate) fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            Self::A
        } else if score >= 75.0 {
            Self::B
        } else if score >= 60.0 {
            Self::C
        } else if score >= 50.0 {
            Self::D
        } else {
            Self::E
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Bucket {
    sum: f64,
    count: u32,
}

impl Bucket {
    fn push(&mut self, score: f64) {
        self.sum += score;
        self.count += 1;
    }

    fn average(self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / f64::from(self.count)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Buckets {
    tugas: Bucket,
    uts: Bucket,
    uas: Bucket,
    lainnya: Bucket,
}

impl Buckets {
    fn slot(&mut self, kind: AssessmentType) -> &mut Bucket {
        match kind {
            AssessmentType::TugasHarian => &mut self.tugas,
            AssessmentType::Uts => &mut self.uts,
            AssessmentType::Uas => &mut self.uas,
            AssessmentType::Lainnya => &mut self.lainnya,
        }
    }

    fn entry_count(&self) -> u32 {
        self.tugas.count + self.uts.count + self.uas.count + self.lainnya.count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct BucketAverages {
    pub(crate) tugas: f64,
    pub(crate) uts: f64,
    pub(crate) uas: f64,
    pub(crate) lainnya: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct BucketCounts {
    pub(crate) tugas: u32,
    pub(crate) uts: u32,
    pub(crate) uas: u32,
    pub(crate) lainnya: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct GradeBreakdown {
    pub(crate) averages: BucketAverages,
    pub(crate) counts: BucketCounts,
    /// Unrounded weighted sum.
    pub(crate) final_score: f64,
    pub(crate) display_score: f64,
    pub(crate) letter: LetterGrade,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SubjectGrade {
    pub(crate) subject_id: String,
    #[serde(flatten)]
    pub(crate) grade: GradeBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StudentGrade {
    pub(crate) student_id: String,
    pub(crate) grade: Option<GradeBreakdown>,
}

/// Scores of `student_id` across `records`, skipping blanks, missing keys
/// and non-finite values.
fn collect<'a, I>(records: I, student_id: &str) -> Buckets
where
    I: IntoIterator<Item = &'a GradeRecord>,
{
    let mut buckets = Buckets::default();
    for record in records {
        let score = record.scores.0.get(student_id).copied().flatten();
        if let Some(score) = score.filter(|value| value.is_finite()) {
            buckets.slot(record.assessment_type).push(score);
        }
    }
    buckets
}

fn finish(buckets: Buckets, scheme: WeightScheme, rounding: RoundingPolicy) -> GradeBreakdown {
    let averages = BucketAverages {
        tugas: buckets.tugas.average(),
        uts: buckets.uts.average(),
        uas: buckets.uas.average(),
        lainnya: buckets.lainnya.average(),
    };
    let weights = scheme.weights();

    let final_score = averages.tugas * weights.tugas / 100.0
        + averages.uts * weights.uts / 100.0
        + averages.uas * weights.uas / 100.0
        + averages.lainnya * weights.lainnya / 100.0;
    let display_score = rounding.round(final_score);

    GradeBreakdown {
        averages,
        counts: BucketCounts {
            tugas: buckets.tugas.count,
            uts: buckets.uts.count,
            uas: buckets.uas.count,
            lainnya: buckets.lainnya.count,
        },
        final_score,
        display_score,
        letter: LetterGrade::from_score(final_score),
    }
}

/// Final grade of one student over a single (class, subject, year) record
/// set. `None` when the student has no scored entry at all, so the caller
/// can leave the row out instead of printing a zero.
pub(crate) fn aggregate_student(
    records: &[GradeRecord],
    student_id: &str,
    scheme: WeightScheme,
    rounding: RoundingPolicy,
) -> Option<GradeBreakdown> {
    let buckets = collect(records, student_id);
    if buckets.entry_count() == 0 {
        return None;
    }
    Some(finish(buckets, scheme, rounding))
}

/// One row per subject for a class/year record set, ordered by subject id.
pub(crate) fn aggregate_by_subject(
    records: &[GradeRecord],
    student_id: &str,
    scheme: WeightScheme,
    rounding: RoundingPolicy,
) -> Vec<SubjectGrade> {
    let mut by_subject: BTreeMap<&str, Vec<&GradeRecord>> = BTreeMap::new();
    for record in records {
        by_subject.entry(record.subject_id.as_str()).or_default().push(record);
    }

    by_subject
        .into_iter()
        .filter_map(|(subject_id, subject_records)| {
            let buckets = collect(subject_records, student_id);
            (buckets.entry_count() > 0).then(|| SubjectGrade {
                subject_id: subject_id.to_string(),
                grade: finish(buckets, scheme, rounding),
            })
        })
        .collect()
}

/// Grade recap for a class roster within one subject scope. Students keep
/// their roster position; those without entries carry `None`.
pub(crate) fn aggregate_class(
    records: &[GradeRecord],
    student_ids: &[String],
    scheme: WeightScheme,
    rounding: RoundingPolicy,
) -> Vec<StudentGrade> {
    student_ids
        .iter()
        .map(|student_id| StudentGrade {
            student_id: student_id.clone(),
            grade: aggregate_student(records, student_id, scheme, rounding),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::db::models::ScoreSheet;
    use sqlx::types::Json;
    use time::macros::date;

    const ONE_DECIMAL: RoundingPolicy = RoundingPolicy::new(1);

    fn record(subject: &str, kind: AssessmentType, scores: &[(&str, Option<f64>)]) -> GradeRecord {
        let now = primitive_now_utc();
        let sheet: ScoreSheet =
            scores.iter().map(|(student, score)| (student.to_string(), *score)).collect();
        GradeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            academic_year_id: "2024-ganjil".to_string(),
            class_id: "7a".to_string(),
            subject_id: subject.to_string(),
            teacher_id: "guru-1".to_string(),
            assessment_type: kind,
            assessment_name: format!("{kind:?}"),
            date: date!(2024 - 08 - 01),
            scores: Json(sheet),
            created_at: now,
            updated_at: now,
        }
    }

    fn settings(tugas: f64, uts: f64, uas: f64, lainnya: f64, absence: f64) -> GradeSettings {
        GradeSettings {
            id: "gs-1".to_string(),
            academic_year_id: "2024-ganjil".to_string(),
            tugas_percentage: tugas,
            uts_percentage: uts,
            uas_percentage: uas,
            lainnya_percentage: Some(lainnya),
            absence_percentage: Some(absence),
            updated_at: primitive_now_utc(),
        }
    }

    /// Task=[80,90], Midterm=70, Final=85, Other=[].
    fn sample_records() -> Vec<GradeRecord> {
        vec![
            record("mtk", AssessmentType::TugasHarian, &[("ani", Some(80.0))]),
            record("mtk", AssessmentType::TugasHarian, &[("ani", Some(90.0))]),
            record("mtk", AssessmentType::Uts, &[("ani", Some(70.0))]),
            record("mtk", AssessmentType::Uas, &[("ani", Some(85.0))]),
        ]
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn configured_weights_produce_expected_final_score() {
        let scheme = WeightScheme::resolve(Some(&settings(40.0, 30.0, 20.0, 10.0, 0.0)));
        let grade = aggregate_student(&sample_records(), "ani", scheme, ONE_DECIMAL).unwrap();

        assert_close(grade.averages.tugas, 85.0);
        assert_close(grade.averages.lainnya, 0.0);
        assert_close(grade.final_score, 72.0);
        assert_close(grade.display_score, 72.0);
        assert_eq!(grade.letter, LetterGrade::C);
    }

    #[test]
    fn fallback_weights_ignore_other_bucket() {
        let mut records = sample_records();
        records.push(record("mtk", AssessmentType::Lainnya, &[("ani", Some(10.0))]));

        let grade =
            aggregate_student(&records, "ani", WeightScheme::resolve(None), ONE_DECIMAL).unwrap();

        assert_close(grade.final_score, 81.25);
        assert_close(grade.display_score, 81.3);
        assert_eq!(grade.counts.lainnya, 1);
        assert_eq!(grade.letter, LetterGrade::B);
    }

    #[test]
    fn fifty_twenty_five_settings_match_fallback() {
        let configured = WeightScheme::resolve(Some(&settings(50.0, 25.0, 25.0, 0.0, 0.0)));
        let fallback = WeightScheme::resolve(None);

        let a = aggregate_student(&sample_records(), "ani", configured, ONE_DECIMAL).unwrap();
        let b = aggregate_student(&sample_records(), "ani", fallback, ONE_DECIMAL).unwrap();

        assert_close(a.final_score, b.final_score);
    }

    #[test]
    fn null_and_missing_scores_are_skipped_not_zeroed() {
        let records = vec![
            record("mtk", AssessmentType::TugasHarian, &[("ani", Some(80.0))]),
            record("mtk", AssessmentType::TugasHarian, &[("ani", None)]),
            record("mtk", AssessmentType::TugasHarian, &[("budi", Some(60.0))]),
        ];

        let grade =
            aggregate_student(&records, "ani", WeightScheme::resolve(None), ONE_DECIMAL).unwrap();

        assert_close(grade.averages.tugas, 80.0);
        assert_eq!(grade.counts.tugas, 1);
    }

    #[test]
    fn empty_buckets_contribute_nothing() {
        let records = vec![record("mtk", AssessmentType::Uas, &[("ani", Some(90.0))])];
        let scheme = WeightScheme::resolve(Some(&settings(40.0, 30.0, 20.0, 10.0, 0.0)));

        let grade = aggregate_student(&records, "ani", scheme, ONE_DECIMAL).unwrap();

        assert_close(grade.averages.tugas, 0.0);
        assert_close(grade.averages.uts, 0.0);
        assert_close(grade.final_score, 18.0);
        assert_eq!(grade.letter, LetterGrade::E);
    }

    #[test]
    fn student_without_entries_has_no_row() {
        let records = vec![record("mtk", AssessmentType::Uts, &[("ani", None)])];
        assert!(aggregate_student(&records, "ani", WeightScheme::resolve(None), ONE_DECIMAL)
            .is_none());
        assert!(aggregate_student(&records, "citra", WeightScheme::resolve(None), ONE_DECIMAL)
            .is_none());
    }

    #[test]
    fn recomputation_is_idempotent() {
        let records = sample_records();
        let scheme = WeightScheme::resolve(Some(&settings(40.0, 30.0, 20.0, 10.0, 0.0)));

        let first = aggregate_by_subject(&records, "ani", scheme, ONE_DECIMAL);
        let second = aggregate_by_subject(&records, "ani", scheme, ONE_DECIMAL);

        assert_eq!(first, second);
    }

    // Open item: absence_percentage is persisted but no formula consumes it.
    #[test]
    fn absence_percentage_is_not_applied_to_final_grade() {
        let with_absence = WeightScheme::resolve(Some(&settings(40.0, 20.0, 20.0, 10.0, 10.0)));
        let mut no_absence = settings(40.0, 20.0, 20.0, 10.0, 10.0);
        no_absence.absence_percentage = None;
        let without_absence = WeightScheme::resolve(Some(&no_absence));

        let a = aggregate_student(&sample_records(), "ani", with_absence, ONE_DECIMAL).unwrap();
        let b = aggregate_student(&sample_records(), "ani", without_absence, ONE_DECIMAL).unwrap();

        assert_close(a.final_score, b.final_score);
    }

    #[test]
    fn by_subject_omits_subjects_without_entries() {
        let mut records = sample_records();
        records.push(record("ipa", AssessmentType::Uts, &[("budi", Some(75.0))]));
        records.push(record("bindo", AssessmentType::Uas, &[("ani", Some(60.0))]));

        let rows = aggregate_by_subject(&records, "ani", WeightScheme::resolve(None), ONE_DECIMAL);

        let subjects: Vec<&str> = rows.iter().map(|row| row.subject_id.as_str()).collect();
        assert_eq!(subjects, vec!["bindo", "mtk"]);
        assert_close(rows[0].grade.final_score, 15.0);
    }

    #[test]
    fn class_recap_keeps_roster_order() {
        let records = vec![
            record("mtk", AssessmentType::TugasHarian, &[("budi", Some(70.0)), ("ani", None)]),
        ];
        let roster = vec!["budi".to_string(), "ani".to_string()];

        let recap = aggregate_class(&records, &roster, WeightScheme::resolve(None), ONE_DECIMAL);

        assert_eq!(recap[0].student_id, "budi");
        assert_close(recap[0].grade.as_ref().unwrap().final_score, 35.0);
        assert!(recap[1].grade.is_none());
    }

    #[test]
    fn letter_thresholds_are_inclusive() {
        assert_eq!(LetterGrade::from_score(85.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_score(84.9), LetterGrade::B);
        assert_eq!(LetterGrade::from_score(75.0), LetterGrade::B);
        assert_eq!(LetterGrade::from_score(60.0), LetterGrade::C);
        assert_eq!(LetterGrade::from_score(50.0), LetterGrade::D);
        assert_eq!(LetterGrade::from_score(49.99), LetterGrade::E);
    }

    #[test]
    fn letter_follows_final_score_not_display_rounding() {
        let records = vec![
            record("mtk", AssessmentType::TugasHarian, &[("ani", Some(84.6))]),
            record("mtk", AssessmentType::Uts, &[("ani", Some(84.6))]),
            record("mtk", AssessmentType::Uas, &[("ani", Some(84.6))]),
        ];
        let scheme = WeightScheme::resolve(None);

        let whole = aggregate_student(&records, "ani", scheme, RoundingPolicy::new(0)).unwrap();
        let one_decimal = aggregate_student(&records, "ani", scheme, ONE_DECIMAL).unwrap();

        assert_close(whole.display_score, 85.0);
        assert_eq!(whole.letter, LetterGrade::B);
        assert_eq!(one_decimal.letter, whole.letter);
    }

    #[test]
    fn rounding_policy_is_configurable() {
        assert_eq!(RoundingPolicy::new(0).format(81.25), "81");
        assert_eq!(RoundingPolicy::new(1).format(81.25), "81.3");
        assert_eq!(RoundingPolicy::new(2).format(81.25), "81.25");
    }
}
