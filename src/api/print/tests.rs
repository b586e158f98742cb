use axum::http::{header, Method, StatusCode};
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::services::print::MISSING;
use crate::test_support;

#[tokio::test]
async fn report_card_page_renders_for_the_student() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    test_support::insert_year(db, "2024/2025", true).await;
    let class = test_support::insert_class(db, "7A", None).await;
    let student = test_support::insert_user(
        db,
        "siswa-1",
        "Ani <Lestari>",
        UserRole::Siswa,
        Some(&class.id),
    )
    .await;
    let cookie = test_support::session_cookie(&student, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/print/report-card/siswa-1",
            Some(&cookie),
            None,
        ))
        .await
        .expect("print report card");

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"), "content type: {content_type}");
    let html = test_support::read_text(response).await;
    assert!(html.contains("Ani &lt;Lestari&gt;"), "html: {html}");
    assert!(html.contains("window.print()"));
}

#[tokio::test]
async fn other_students_card_looks_missing() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    test_support::insert_year(db, "2024/2025", true).await;
    let class = test_support::insert_class(db, "7A", None).await;
    let student =
        test_support::insert_user(db, "siswa-1", "Ani", UserRole::Siswa, Some(&class.id)).await;
    test_support::insert_user(db, "siswa-2", "Budi", UserRole::Siswa, Some(&class.id)).await;
    let cookie = test_support::session_cookie(&student, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/print/report-card/siswa-2",
            Some(&cookie),
            None,
        ))
        .await
        .expect("print report card");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = test_support::read_text(response).await;
    assert!(html.contains(MISSING), "html: {html}");
    assert!(!html.contains("Budi"), "html: {html}");
}

#[tokio::test]
async fn recap_page_hides_classes_outside_the_teachers_reach() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    test_support::insert_year(db, "2024/2025", true).await;
    let class = test_support::insert_class(db, "7A", None).await;
    let teacher = test_support::insert_user(db, "guru-1", "Bu Sari", UserRole::Guru, None).await;
    let cookie = test_support::session_cookie(&teacher, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/print/attendance-recap?class_id={}", class.id),
            Some(&cookie),
            None,
        ))
        .await
        .expect("print recap");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = test_support::read_text(response).await;
    assert!(html.contains("Rekap kehadiran tidak ditemukan."), "html: {html}");
}

#[tokio::test]
async fn recap_page_renders_for_admin() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    test_support::insert_year(db, "2024/2025", true).await;
    let class = test_support::insert_class(db, "7A", None).await;
    let admin = test_support::insert_user(db, "admin-1", "Admin", UserRole::Admin, None).await;
    test_support::insert_user(db, "siswa-1", "Ani", UserRole::Siswa, Some(&class.id)).await;
    let cookie = test_support::session_cookie(&admin, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/print/attendance-recap?class_id={}", class.id),
            Some(&cookie),
            None,
        ))
        .await
        .expect("print recap");

    assert_eq!(response.status(), StatusCode::OK);
    let html = test_support::read_text(response).await;
    assert!(html.contains("Ani"), "html: {html}");
    assert!(html.contains("7A"), "html: {html}");
}
