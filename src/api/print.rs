//! Printable pages. Sessions are checked like the JSON API, but failures
//! are answered with a login redirect or an HTML not-found page.

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{self, PageUser};
use crate::api::reports;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::schemas::attendance::{RecapQuery, YearQuery};
use crate::services::print;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/report-card/:student_id", get(print_report_card))
        .route("/attendance-recap", get(print_attendance_recap))
}

async fn print_report_card(
    Path(student_id): Path<String>,
    Query(query): Query<YearQuery>,
    PageUser(viewer): PageUser,
    State(state): State<AppState>,
) -> Response {
    let year_id = query.academic_year_id.as_deref();
    let loaded = reports::load_report_card(&state, &viewer, &student_id, year_id).await;

    match loaded {
        Ok(card) => {
            metrics::record_report("report_card", "print", card.rows.len());
            Html(print::render_report_card(&card, state.rounding())).into_response()
        }
        Err(err) => page_error(err, "Rapor siswa tidak ditemukan."),
    }
}

async fn print_attendance_recap(
    Query(query): Query<RecapQuery>,
    PageUser(viewer): PageUser,
    State(state): State<AppState>,
) -> Response {
    match reports::load_attendance_recap(&state, &viewer, &query).await {
        Ok(recap) => {
            metrics::record_report("attendance_recap", "print", recap.rows.len());
            Html(print::render_attendance_recap(&recap)).into_response()
        }
        Err(err) => page_error(err, "Rekap kehadiran tidak ditemukan."),
    }
}

/// Role mismatches look the same as missing records on printable pages.
fn page_error(err: ApiError, what: &str) -> Response {
    match err {
        ApiError::Forbidden(_) | ApiError::NotFound(_) => guards::page_not_found(what),
        other => other.into_response(),
    }
}

#[cfg(test)]
mod tests;
