mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn one_profile_per_account_and_role() {
    let app = TestApp::new();
    let (company, _) = app.company("hr@acme.test", "Acme").await;
    let candidate = app.signup("dev@mail.test", "candidate").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/profiles/company",
            Some(&company),
            Some(json!({ "company_name": "Acme 2", "industry": "IT", "location": "Pune" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A profile already exists for this user.");

    let (status, _) = app
        .call(
            "POST",
            "/api/profiles/company",
            Some(&candidate),
            Some(json!({ "company_name": "Nope", "industry": "IT", "location": "Pune" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            "POST",
            "/api/profiles/company",
            Some(&company),
            Some(json!({ "company_name": "  ", "industry": "IT", "location": "Pune" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn company_profile_is_private_but_public_view_is_open() {
    let app = TestApp::new();
    let (owner, id) = app.company("hr@acme.test", "Acme").await;
    let (rival, _) = app.company("hr@globex.test", "Globex").await;
    let uri = format!("/api/profiles/company/{id}");

    let (status, me) = app.call("GET", "/api/profiles/company/me", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], id.as_str());

    let (status, _) = app.call("GET", &uri, Some(&rival), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .call("PATCH", &uri, Some(&rival), Some(json!({ "location": "Goa" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .call(
            "PATCH",
            &uri,
            Some(&owner),
            Some(json!({ "location": "Goa", "website": "https://acme.test" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["location"], "Goa");

    let (status, companies) = app.call("GET", "/api/companies", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(companies.as_array().unwrap().len(), 2);
    assert!(companies[0].get("user_id").is_none());

    let (status, public) = app
        .call("GET", &format!("/api/companies/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["website"], "https://acme.test");

    let (status, _) = app.call("DELETE", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call("GET", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn candidate_manages_own_profile_and_experience() {
    let app = TestApp::new();
    let (token, id) = app.candidate("dev@mail.test", "Priya").await;
    let (other, _) = app.candidate("other@mail.test", "Arjun").await;

    let (status, body) = app
        .call(
            "PATCH",
            &format!("/api/profiles/candidate/{id}"),
            Some(&token),
            Some(json!({ "skills": "rust, sql", "birthday": "1998-02-14" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skills"], "rust, sql");
    assert_eq!(body["birthday"], "1998-02-14");

    let (status, exp) = app
        .call(
            "POST",
            "/api/experiences",
            Some(&token),
            Some(json!({
                "company_name": "Initech",
                "position": "Developer",
                "start_date": "2021-01-01",
                "end_date": "2023-06-30",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(exp["candidate_id"], id.as_str());
    let exp_uri = format!("/api/experiences/{}", exp["id"].as_str().unwrap());

    let (status, _) = app
        .call(
            "POST",
            "/api/experiences",
            Some(&token),
            Some(json!({
                "company_name": "Initech",
                "position": "Developer",
                "start_date": "2021-01-01",
                "end_date": "2020-06-30",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("GET", &exp_uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call("PATCH", &exp_uri, Some(&token), Some(json!({ "end_date": "2020-01-01" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let (_, list) = app.call("GET", "/api/experiences", Some(&token), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    let (_, list) = app.call("GET", "/api/experiences", Some(&other), None).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, _) = app.call("DELETE", &exp_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
