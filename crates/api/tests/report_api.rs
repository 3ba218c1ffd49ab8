//! HTTP-level tests for finalized reports: visibility, follow-up tracking
//! and export.

mod common;

use axum::http::{header, StatusCode};
use common::{
    admin_token, body_bytes, body_json, finalized_partial_report, get_auth, inspector_token,
    other_inspector_token, post_auth, put_json_auth, set_item, start_fire_inspection, ADMIN_ID,
};
use serde_json::json;

#[tokio::test]
async fn report_is_visible_to_its_inspector_and_admins_only() {
    let app = common::build_test_app().await;
    let report_id = finalized_partial_report(app.app(), &inspector_token()).await;
    let uri = format!("/api/v1/reports/{report_id}");

    let response = get_auth(app.app(), &uri, &inspector_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = &body_json(response).await["data"];
    assert_eq!(data["id"], report_id);
    assert_eq!(data["control_name"], "Fire Extinguishers");
    assert_eq!(data["items"].as_array().unwrap().len(), 3);

    let response = get_auth(app.app(), &uri, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(app.app(), &uri, &other_inspector_token()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_report_returns_404() {
    let app = common::build_test_app().await;
    let response = get_auth(app.app(), "/api/v1/reports/999", &admin_token()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn follow_up_update_changes_only_the_follow_up() {
    let mut app = common::build_test_app().await;
    let report_id = finalized_partial_report(app.app(), &inspector_token()).await;
    app.drain_events();

    let response = put_json_auth(
        app.app(),
        &format!("/api/v1/reports/{report_id}/follow-up"),
        &admin_token(),
        json!({ "follow_up_date": "2024-07-22", "notes": "recharge scheduled" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = &body_json(response).await["data"];
    assert_eq!(data["follow_up"]["follow_up_date"], "2024-07-22");
    assert_eq!(data["follow_up"]["notes"], "recharge scheduled");
    assert_eq!(data["items"][1]["status"], "not_approved");
    assert_eq!(data["items"][1]["notes"], "gauge red");

    // The change is persisted.
    let response = get_auth(
        app.app(),
        &format!("/api/v1/reports/{report_id}"),
        &admin_token(),
    )
    .await;
    let data = &body_json(response).await["data"];
    assert_eq!(data["follow_up"]["follow_up_date"], "2024-07-22");

    let events = app.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "report.follow_up_updated");
    assert_eq!(events[0].source_entity_id, Some(report_id));
    assert_eq!(events[0].payload_str("follow_up_date"), Some("2024-07-22"));
}

#[tokio::test]
async fn resolving_requires_a_date_and_happens_once() {
    let app = common::build_test_app().await;
    let report_id = finalized_partial_report(app.app(), &inspector_token()).await;
    let resolve_uri = format!("/api/v1/reports/{report_id}/follow-up/resolve");

    let response = post_auth(app.app(), &resolve_uri, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = put_json_auth(
        app.app(),
        &format!("/api/v1/reports/{report_id}/follow-up"),
        &admin_token(),
        json!({ "follow_up_date": "2024-07-22" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_auth(app.app(), &resolve_uri, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let follow_up = &body_json(response).await["data"]["follow_up"];
    assert_eq!(follow_up["resolved"], true);
    assert_eq!(follow_up["resolved_by"], ADMIN_ID);
    assert!(follow_up["resolved_at"].is_string());

    let response = post_auth(app.app(), &resolve_uri, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");

    let response = put_json_auth(
        app.app(),
        &format!("/api/v1/reports/{report_id}/follow-up"),
        &admin_token(),
        json!({ "notes": "too late" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn approved_report_has_no_follow_up_to_manage() {
    let app = common::build_test_app().await;
    let token = inspector_token();
    let id = start_fire_inspection(app.app(), &token).await;
    for item in ["A", "B", "C"] {
        set_item(app.app(), id, item, &token, json!({ "status": "approved" })).await;
    }
    let response = post_auth(app.app(), &format!("/api/v1/inspections/{id}/finalize"), &token).await;
    let report_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = put_json_auth(
        app.app(),
        &format!("/api/v1/reports/{report_id}/follow-up"),
        &admin_token(),
        json!({ "follow_up_date": "2024-07-22" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");
}

#[tokio::test]
async fn export_downloads_csv_attachment() {
    let app = common::build_test_app().await;
    let report_id = finalized_partial_report(app.app(), &inspector_token()).await;

    let response = get_auth(
        app.app(),
        &format!("/api/v1/reports/{report_id}/export"),
        &inspector_token(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap(),
        format!("attachment; filename=\"inspection-report-{report_id}.csv\"")
    );

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.starts_with(&format!("report_id,{report_id}\n")));
    assert!(text.contains("overall_result,Partial\n"));
    assert!(text.contains("B,Safety pin intact,medium,Not Approved,gauge red,0\n"));
}
