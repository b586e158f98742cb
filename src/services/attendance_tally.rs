use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::models::AttendanceRecord;
use crate::db::types::AttendanceStatus;

/// Per-student status counts. `total` counts sessions the student has an
/// entry in, not every session in scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct AttendanceSummary {
    pub(crate) hadir: u32,
    pub(crate) sakit: u32,
    pub(crate) izin: u32,
    pub(crate) alpha: u32,
    pub(crate) total: u32,
}

impl AttendanceSummary {
    pub(crate) fn record(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Hadir => self.hadir += 1,
            AttendanceStatus::Sakit => self.sakit += 1,
            AttendanceStatus::Izin => self.izin += 1,
            AttendanceStatus::Alpha => self.alpha += 1,
        }
        self.total += 1;
    }

    /// Whole-percent share of "Hadir". Zero when there is nothing to count.
    pub(crate) fn present_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (f64::from(self.hadir) / f64::from(self.total) * 100.0).round() as u32
    }

    pub(crate) fn has_sessions(&self) -> bool {
        self.total > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SubjectAttendance {
    pub(crate) subject_id: String,
    #[serde(flatten)]
    pub(crate) summary: AttendanceSummary,
}

pub(crate) fn tally_student<'a, I>(records: I, student_id: &str) -> AttendanceSummary
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut summary = AttendanceSummary::default();
    for record in records {
        if let Some(entry) = record.records.0.iter().find(|entry| entry.student_id == student_id) {
            summary.record(entry.status);
        }
    }
    summary
}

/// One summary per student appearing anywhere in `records`.
pub(crate) fn tally_class(records: &[AttendanceRecord]) -> BTreeMap<String, AttendanceSummary> {
    let mut summaries: BTreeMap<String, AttendanceSummary> = BTreeMap::new();
    for record in records {
        for entry in &record.records.0 {
            summaries.entry(entry.student_id.clone()).or_default().record(entry.status);
        }
    }
    summaries
}

/// Splits a class record set by subject. Every subject with at least one
/// session is listed, even when the student was never marked in it.
pub(crate) fn tally_by_subject(
    records: &[AttendanceRecord],
    student_id: &str,
) -> Vec<SubjectAttendance> {
    let mut by_subject: BTreeMap<&str, Vec<&AttendanceRecord>> = BTreeMap::new();
    for record in records {
        by_subject.entry(record.subject_id.as_str()).or_default().push(record);
    }

    by_subject
        .into_iter()
        .map(|(subject_id, subject_records)| SubjectAttendance {
            subject_id: subject_id.to_string(),
            summary: tally_student(subject_records, student_id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::db::models::AttendanceEntry;
    use sqlx::types::Json;
    use time::macros::date;

    fn session(subject: &str, marks: &[(&str, AttendanceStatus)]) -> AttendanceRecord {
        let now = primitive_now_utc();
        AttendanceRecord {
            id: uuid::Uuid::new_v4().to_string(),
            academic_year_id: "2024-ganjil".to_string(),
            class_id: "7a".to_string(),
            subject_id: subject.to_string(),
            teacher_id: "guru-1".to_string(),
            date: date!(2024 - 08 - 05),
            records: Json(
                marks
                    .iter()
                    .map(|(student, status)| AttendanceEntry {
                        student_id: student.to_string(),
                        status: *status,
                        notes: None,
                    })
                    .collect(),
            ),
            created_at: now,
            updated_at: now,
        }
    }

    fn repeated(
        subject: &str,
        student: &str,
        status: AttendanceStatus,
        n: usize,
    ) -> Vec<AttendanceRecord> {
        (0..n).map(|_| session(subject, &[(student, status)])).collect()
    }

    #[test]
    fn present_rate_rounds_to_whole_percent() {
        let mut records = repeated("mtk", "ani", AttendanceStatus::Hadir, 10);
        records.extend(repeated("mtk", "ani", AttendanceStatus::Sakit, 2));
        records.extend(repeated("mtk", "ani", AttendanceStatus::Izin, 1));
        records.extend(repeated("mtk", "ani", AttendanceStatus::Alpha, 1));

        let summary = tally_student(&records, "ani");

        assert_eq!(
            summary,
            AttendanceSummary { hadir: 10, sakit: 2, izin: 1, alpha: 1, total: 14 }
        );
        assert_eq!(summary.present_rate(), 71);
    }

    #[test]
    fn empty_summary_has_zero_rate() {
        let summary = tally_student(&[], "ani");
        assert_eq!(summary.present_rate(), 0);
        assert!(!summary.has_sessions());
    }

    #[test]
    fn sessions_without_the_student_are_not_counted() {
        let records = vec![
            session("mtk", &[("ani", AttendanceStatus::Hadir), ("budi", AttendanceStatus::Alpha)]),
            session("mtk", &[("budi", AttendanceStatus::Hadir)]),
        ];

        let summary = tally_student(&records, "ani");
        assert_eq!(summary.total, 1);
        assert_eq!(summary.present_rate(), 100);
    }

    #[test]
    fn class_tally_covers_every_marked_student() {
        let records = vec![
            session("mtk", &[("ani", AttendanceStatus::Hadir), ("budi", AttendanceStatus::Alpha)]),
            session("ipa", &[("budi", AttendanceStatus::Izin)]),
        ];

        let tally = tally_class(&records);

        assert_eq!(tally.len(), 2);
        assert_eq!(tally["budi"].alpha, 1);
        assert_eq!(tally["budi"].izin, 1);
        assert_eq!(tally["budi"].total, 2);
        assert_eq!(tally["ani"].present_rate(), 100);
    }

    #[test]
    fn by_subject_lists_unmarked_subjects_with_zero_totals() {
        let records = vec![
            session("mtk", &[("ani", AttendanceStatus::Hadir)]),
            session("ipa", &[("budi", AttendanceStatus::Hadir)]),
        ];

        let rows = tally_by_subject(&records, "ani");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].subject_id, "ipa");
        assert!(!rows[0].summary.has_sessions());
        assert_eq!(rows[1].summary.hadir, 1);
    }
}
