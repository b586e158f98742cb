use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::test_support;

#[tokio::test]
async fn student_reads_own_report_card_but_not_a_classmates() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let year = test_support::insert_year(db, "2024/2025", true).await;
    let class = test_support::insert_class(db, "7A", None).await;
    let subject = test_support::insert_subject(db, "Matematika", "MTK").await;
    let admin = test_support::insert_user(db, "admin-1", "Admin", UserRole::Admin, None).await;
    let ani =
        test_support::insert_user(db, "siswa-1", "Ani", UserRole::Siswa, Some(&class.id)).await;
    test_support::insert_user(db, "siswa-2", "Budi", UserRole::Siswa, Some(&class.id)).await;

    let admin_cookie = test_support::session_cookie(&admin, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/grades",
            Some(&admin_cookie),
            Some(json!({
                "academic_year_id": year.id,
                "class_id": class.id,
                "subject_id": subject.id,
                "assessment_type": "UAS",
                "assessment_name": "UAS Ganjil",
                "date": "2024-12-09",
                "scores": { "siswa-1": 88 }
            })),
        ))
        .await
        .expect("record grades");
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = test_support::session_cookie(&ani, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/reports/me/report-card",
            Some(&cookie),
            None,
        ))
        .await
        .expect("own report card");

    let status = response.status();
    let card = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {card}");
    assert_eq!(card["student"]["name"], "Ani");
    assert_eq!(card["academic_year"]["id"], year.id.as_str());
    let rows = card["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["subject_name"], "Matematika");
    assert_eq!(rows[0]["letter"], "E");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/reports/report-card/siswa-2",
            Some(&cookie),
            None,
        ))
        .await
        .expect("classmate report card");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn homeroom_teacher_can_view_class_report_cards() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    test_support::insert_year(db, "2024/2025", true).await;
    let teacher = test_support::insert_user(db, "guru-1", "Bu Sari", UserRole::Guru, None).await;
    let class = test_support::insert_class(db, "7A", Some(&teacher.id)).await;
    let other = test_support::insert_class(db, "7B", None).await;
    test_support::insert_user(db, "siswa-1", "Ani", UserRole::Siswa, Some(&class.id)).await;
    test_support::insert_user(db, "siswa-2", "Budi", UserRole::Siswa, Some(&other.id)).await;
    let cookie = test_support::session_cookie(&teacher, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/reports/report-card/siswa-1",
            Some(&cookie),
            None,
        ))
        .await
        .expect("report card");

    let status = response.status();
    let card = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {card}");
    assert_eq!(card["class"]["name"], "7A");
    assert_eq!(card["class"]["homeroom_teacher"], "Bu Sari");
    assert_eq!(card["rows"], json!([]));
    assert_eq!(card["present_rate"], 0);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/reports/report-card/siswa-2",
            Some(&cookie),
            None,
        ))
        .await
        .expect("report card");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_student_is_not_found() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    test_support::insert_year(db, "2024/2025", true).await;
    let admin = test_support::insert_user(db, "admin-1", "Admin", UserRole::Admin, None).await;
    let cookie = test_support::session_cookie(&admin, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/reports/report-card/siswa-404",
            Some(&cookie),
            None,
        ))
        .await
        .expect("report card");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attendance_recap_lists_the_whole_roster() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    test_support::insert_year(db, "2024/2025", true).await;
    let class = test_support::insert_class(db, "7A", None).await;
    let admin = test_support::insert_user(db, "admin-1", "Admin", UserRole::Admin, None).await;
    test_support::insert_user(db, "siswa-1", "Ani", UserRole::Siswa, Some(&class.id)).await;
    test_support::insert_user(db, "siswa-2", "Budi", UserRole::Siswa, Some(&class.id)).await;
    let cookie = test_support::session_cookie(&admin, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/reports/attendance-recap?class_id={}", class.id),
            Some(&cookie),
            None,
        ))
        .await
        .expect("recap");

    let status = response.status();
    let recap = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {recap}");
    assert_eq!(recap["session_count"], 0);
    let rows = recap["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["has_sessions"] == false));
}
