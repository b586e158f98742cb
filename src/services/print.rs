//! Printable HTML for report cards and attendance recaps.

use crate::services::grade_aggregator::RoundingPolicy;
use crate::services::report_card::{AttendanceRecap, ClassInfo, ReportCard};

pub(crate) const MISSING: &str = "Tidak ditemukan";

const STYLE: &str = "body{font-family:sans-serif;margin:2rem}\
table{border-collapse:collapse;width:100%;margin-top:1rem}\
th,td{border:1px solid #444;padding:4px 8px;text-align:left}\
td.num{text-align:right}\
@media print{button{display:none}}";

pub(crate) fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn or_missing(value: Option<&str>) -> String {
    escape_html(value.unwrap_or(MISSING))
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"id\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\
         <button onclick=\"window.print()\">Cetak</button>\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

fn class_label(class: &ClassInfo) -> String {
    or_missing(class.name.as_deref())
}

pub(crate) fn render_report_card(card: &ReportCard, rounding: RoundingPolicy) -> String {
    let mut body = String::from("<h1>Rapor Siswa</h1>\n");
    body.push_str(&format!(
        "<p>Nama: {}<br>NIS: {}<br>Kelas: {}<br>Wali Kelas: {}<br>Tahun Ajaran: {}</p>\n",
        escape_html(&card.student.name),
        or_missing(card.student.nis.as_deref()),
        class_label(&card.class),
        or_missing(card.class.homeroom_teacher.as_deref()),
        escape_html(&card.academic_year.name),
    ));

    body.push_str(
        "<table>\n<thead><tr><th>No</th><th>Mata Pelajaran</th><th>Tugas Harian</th>\
         <th>UTS</th><th>UAS</th><th>Lainnya</th><th>Nilai Akhir</th><th>Predikat</th></tr>\
         </thead>\n<tbody>\n",
    );
    if card.rows.is_empty() {
        body.push_str("<tr><td colspan=\"8\">Belum ada nilai</td></tr>\n");
    }
    let rows: String = card
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let grade = &row.grade;
            format!(
                "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
                 <td>{}</td></tr>\n",
                index + 1,
                or_missing(row.subject_name.as_deref()),
                rounding.format(grade.averages.tugas),
                rounding.format(grade.averages.uts),
                rounding.format(grade.averages.uas),
                rounding.format(grade.averages.lainnya),
                rounding.format(grade.display_score),
                grade.letter.as_str(),
            )
        })
        .collect();
    body.push_str(&rows);
    body.push_str("</tbody>\n</table>\n");

    let summary = &card.attendance;
    body.push_str(&format!(
        "<h2>Kehadiran</h2>\n<table>\n<thead><tr><th>Hadir</th><th>Sakit</th><th>Izin</th>\
         <th>Alpha</th><th>Total</th><th>Persentase</th></tr></thead>\n<tbody>\n\
         <tr><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
         <td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}%</td></tr>\n\
         </tbody>\n</table>\n",
        summary.hadir,
        summary.sakit,
        summary.izin,
        summary.alpha,
        summary.total,
        card.present_rate,
    ));

    page(&format!("Rapor {}", card.student.name), &body)
}

pub(crate) fn render_attendance_recap(recap: &AttendanceRecap) -> String {
    let subject = match &recap.subject {
        Some(subject) => or_missing(subject.name.as_deref()),
        None => "Semua mata pelajaran".to_string(),
    };

    let mut body = String::from("<h1>Rekap Kehadiran</h1>\n");
    body.push_str(&format!(
        "<p>Kelas: {}<br>Wali Kelas: {}<br>Mata Pelajaran: {}<br>Tahun Ajaran: {}<br>\
         Jumlah Pertemuan: {}</p>\n",
        class_label(&recap.class),
        or_missing(recap.class.homeroom_teacher.as_deref()),
        subject,
        escape_html(&recap.academic_year.name),
        recap.session_count,
    ));

    body.push_str(
        "<table>\n<thead><tr><th>No</th><th>NIS</th><th>Nama</th><th>Hadir</th><th>Sakit</th>\
         <th>Izin</th><th>Alpha</th><th>Total</th><th>Persentase</th></tr></thead>\n<tbody>\n",
    );
    if recap.rows.is_empty() {
        body.push_str("<tr><td colspan=\"9\">Belum ada siswa</td></tr>\n");
    }
    let rows: String = recap
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let rate = if row.has_sessions {
                format!("{}%", row.present_rate)
            } else {
                "-".to_string()
            };
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n",
                index + 1,
                or_missing(row.student.nis.as_deref()),
                escape_html(&row.student.name),
                row.summary.hadir,
                row.summary.sakit,
                row.summary.izin,
                row.summary.alpha,
                row.summary.total,
                rate,
            )
        })
        .collect();
    body.push_str(&rows);
    body.push_str("</tbody>\n</table>\n");

    let class_name = recap.class.name.as_deref().unwrap_or(&recap.class.id);
    page(&format!("Rekap Kehadiran {class_name}"), &body)
}

pub(crate) fn render_not_found(what: &str) -> String {
    page(MISSING, &format!("<h1>{MISSING}</h1>\n<p>{}</p>\n", escape_html(what)))
}
