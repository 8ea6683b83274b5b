mod common;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn anonymous_visitors_browse_and_filter_jobs() {
    let app = TestApp::new();
    let (token, _) = app.company("hr@acme.test", "Acme Labs").await;
    app.post_job(&token, "Rust Engineer", 90_000).await;
    app.post_job(&token, "Senior Rust Engineer", 150_000).await;
    app.post_job(&token, "Designer", 40_000).await;

    let (status, page) = app.call("GET", "/api/jobs", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);

    let (_, page) = app
        .call("GET", "/api/jobs?keyword=rust&min_salary=100000", None, None)
        .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["title"], "Senior Rust Engineer");
    assert_eq!(page["items"][0]["company_name"], "Acme Labs");

    let (_, page) = app.call("GET", "/api/jobs?search=acme", None, None).await;
    assert_eq!(page["total"], 3);

    let (_, page) = app
        .call("GET", "/api/jobs?page=2&page_size=2", None, None)
        .await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["total_pages"], 2);
}

#[tokio::test]
async fn job_defaults_fill_optional_fields() {
    let app = TestApp::new();
    let (token, company_id) = app.company("hr@acme.test", "Acme").await;
    let job = app.post_job(&token, "Intern", 10_000).await;
    assert_eq!(job["job_type"], "Full Time");
    assert_eq!(job["education"], "Bachelors");
    assert_eq!(job["experience"], "Fresher");
    assert_eq!(job["positions"], 1);
    assert_eq!(job["company_id"], company_id.as_str());
}

#[tokio::test]
async fn topic_stats_aggregate_matching_titles() {
    let app = TestApp::new();
    let (token, _) = app.company("hr@acme.test", "Acme").await;
    app.post_job(&token, "Python Developer", 50_000).await;
    app.post_job(&token, "Senior Python Developer", 100_000).await;

    let (status, stats) = app.call("GET", "/api/jobs/stats/python", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["count"], 2);
    assert_eq!(stats["avg_salary"], 75_000.0);
    assert_eq!(stats["max_salary"], 100_000);

    let (status, body) = app.call("GET", "/api/jobs/stats/cobol", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn posting_rules_are_enforced() {
    let app = TestApp::new();
    let (token, _) = app.company("hr@acme.test", "Acme").await;
    let candidate = app.signup("dev@mail.test", "candidate").await;
    let bare_company = app.signup("new@corp.test", "company").await;

    app.post_job(&token, "Backend Developer", 60_000).await;
    let (status, body) = app
        .call(
            "POST",
            "/api/jobs",
            Some(&token),
            Some(json!({ "title": "Backend Developer", "salary": 70_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "You have already posted a job with the same title.");

    let (status, _) = app
        .call(
            "POST",
            "/api/jobs",
            Some(&candidate),
            Some(json!({ "title": "Anything", "salary": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            "POST",
            "/api/jobs",
            Some(&bare_company),
            Some(json!({ "title": "Anything", "salary": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User does not have a company profile.");

    let (status, _) = app
        .call(
            "POST",
            "/api/jobs",
            None,
            Some(json!({ "title": "Anything", "salary": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_the_owning_company_edits_a_job() {
    let app = TestApp::new();
    let (owner, _) = app.company("hr@acme.test", "Acme").await;
    let (rival, _) = app.company("hr@globex.test", "Globex").await;
    let job = app.post_job(&owner, "QA Engineer", 45_000).await;
    let uri = format!("/api/jobs/{}", job["id"].as_str().unwrap());

    let (status, _) = app
        .call("PATCH", &uri, Some(&rival), Some(json!({ "salary": 1 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call("DELETE", &uri, Some(&rival), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call("PATCH", &uri, Some(&owner), Some(json!({ "salary": 55_000 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "saved");
    assert_eq!(body["job"]["salary"], 55_000);

    let (_, mine) = app.call("GET", "/api/jobs/mine", Some(&rival), None).await;
    assert!(mine.as_array().unwrap().is_empty());

    let (status, _) = app.call("DELETE", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_reflects_writes_immediately() {
    let app = TestApp::new();
    let (token, _) = app.company("hr@acme.test", "Acme").await;
    let (_, page) = app.call("GET", "/api/jobs", None, None).await;
    assert_eq!(page["total"], 0);

    let job = app.post_job(&token, "SRE", 80_000).await;
    let (_, page) = app.call("GET", "/api/jobs", None, None).await;
    assert_eq!(page["total"], 1);

    let uri = format!("/api/jobs/{}", job["id"].as_str().unwrap());
    app.call("PATCH", &uri, Some(&token), Some(json!({ "is_active": false })))
        .await;
    let (_, page) = app.call("GET", "/api/jobs", None, None).await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn expired_jobs_disappear_and_writes_past_last_date_remove_them() {
    let app = TestApp::new();
    let (token, _) = app.company("hr@acme.test", "Acme").await;
    let short = app.post_job(&token, "Short Gig", 20_000).await;
    let long = app.post_job(&token, "Long Gig", 20_000).await;
    let long_uri = format!("/api/jobs/{}", long["id"].as_str().unwrap());

    let far = (chrono::Utc::now() + Duration::days(60)).to_rfc3339();
    let (status, _) = app
        .call("PATCH", &long_uri, Some(&token), Some(json!({ "last_date": far })))
        .await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(Duration::days(11));
    let (_, page) = app.call("GET", "/api/jobs", None, None).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["title"], "Long Gig");

    let short_uri = format!("/api/jobs/{}", short["id"].as_str().unwrap());
    let (status, _) = app.call("GET", &short_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call("PATCH", &short_uri, Some(&token), Some(json!({ "salary": 25_000 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "expired");

    let (_, mine) = app.call("GET", "/api/jobs/mine", Some(&token), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn posting_with_a_past_last_date_stores_nothing() {
    let app = TestApp::new();
    let (token, _) = app.company("hr@acme.test", "Acme").await;
    let yesterday = (chrono::Utc::now() - Duration::days(1)).to_rfc3339();
    let (status, body) = app
        .call(
            "POST",
            "/api/jobs",
            Some(&token),
            Some(json!({ "title": "Late", "salary": 10, "last_date": yesterday })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "expired");

    let (_, mine) = app.call("GET", "/api/jobs/mine", Some(&token), None).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let app = TestApp::new();
    let (token, _) = app.company("hr@acme.test", "Acme").await;
    let (status, body) = app
        .call(
            "POST",
            "/api/jobs",
            Some(&token),
            Some(json!({ "title": "   ", "salary": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let job = app.post_job(&token, "Engineer", 10).await;
    let uri = format!("/api/jobs/{}", job["id"].as_str().unwrap());
    let (status, _) = app
        .call("PATCH", &uri, Some(&token), Some(json!({ "title": " " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn huge_page_number_yields_an_empty_page() {
    let app = TestApp::new();
    let (token, _) = app.company("hr@acme.test", "Acme").await;
    app.post_job(&token, "Engineer", 10).await;
    let (status, page) = app
        .call("GET", &format!("/api/jobs?page={}", usize::MAX), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert!(page["items"].as_array().unwrap().is_empty());
}
