mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{parse_body, TestApp};
use std::collections::HashSet;
use tower::ServiceExt;

const ROSTER: &str = "Name,Email,Phone,Food Preference,USN,Class\n\
Asha Rao,asha@example.com,9000000001,Veg,1BM21CS001,CSE 5A\n\
Ravi Kumar,ravi@example.com,9000000002,Non-Veg,1BM21CS002,CSE 5A\n\
,nobody@example.com,,Veg,,\n\
Meera,meera@example.com,,Vegan,1BM21CS003,CSE 5B\n";

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_creates_one_attendee_per_named_row() {
    let app = TestApp::new().await;

    let response = app.upload_csv(ROSTER).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_body(response).await;
    assert_eq!(body["count"], 3);

    let users = body["users"].as_array().unwrap();
    let names: Vec<&str> = users.iter().map(|u| u["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Asha Rao", "Ravi Kumar", "Meera"]);

    assert_eq!(users[0]["meal_preference"], "veg");
    assert_eq!(users[1]["meal_preference"], "non-veg");
    assert_eq!(users[2]["meal_preference"], "veg");
    assert_eq!(users[0]["enrollment_id"], "1BM21CS001");
    assert_eq!(users[0]["class_name"], "CSE 5A");
    assert_eq!(users[0]["redeemed"], false);
    assert!(users[0]["redeemed_at"].is_null());
    assert!(users[0]["qr_image_path"].as_str().unwrap().ends_with(".png"));

    let tokens: HashSet<&str> = users.iter().map(|u| u["token"].as_str().unwrap()).collect();
    assert_eq!(tokens.len(), 3);
}

#[tokio::test]
async fn test_repeated_uploads_never_reuse_tokens() {
    let app = TestApp::new().await;

    let first = app.seed(ROSTER).await;
    let second = app.seed(ROSTER).await;

    let tokens: HashSet<String> = first.iter().chain(second.iter())
        .map(|u| u["token"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(tokens.len(), 6);

    let users = app.get_json("/users").await;
    assert_eq!(users.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_list_users_newest_first() {
    let app = TestApp::new().await;

    app.seed("name\nEarly Bird\n").await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    app.seed("name\nLate Comer\n").await;

    let users = app.get_json("/users").await;
    let users = users.as_array().unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["name"], "Late Comer");
    assert_eq!(users[1]["name"], "Early Bird");
}

#[tokio::test]
async fn test_upload_derives_enrollment_id_from_email() {
    let app = TestApp::new().await;

    let users = app.seed("Enter Your Name,Enter Your College Mail ID,What kind of food do you prefer\n\
Tara,4sf22cd044@college.edu,Non Vegetarian\n").await;

    assert_eq!(users[0]["enrollment_id"], "4SF22CD044");
    assert_eq!(users[0]["email"], "4sf22cd044@college.edu");
    assert_eq!(users[0]["meal_preference"], "non-veg");
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let app = TestApp::new().await;
    let boundary = "food-token-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = boundary
    );

    let response = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap()
    ).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(response).await;
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_malformed_csv_is_rejected() {
    let app = TestApp::new().await;
    let boundary = "food-token-test-boundary";

    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"csvFile\"; filename=\"roster.csv\"\r\n\r\nname\n",
        b = boundary
    ).into_bytes();
    body.extend_from_slice(&[0xff, 0xfe, b'\n']);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let response = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap()
    ).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let users = app.get_json("/users").await;
    assert!(users.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_csv_is_rejected() {
    let app = TestApp::new().await;

    let response = app.upload_csv("").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
