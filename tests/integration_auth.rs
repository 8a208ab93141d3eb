mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use aqar::aqar_auth::TokenType;
use common::{TestApp, get, json_request};

fn registration(email: &str, phone: &str) -> Value {
    json!({
        "name": "Maya Nasser",
        "email": email,
        "phone": phone,
        "password": "secret123",
        "userType": "landlord"
    })
}

#[tokio::test]
async fn test_register_login_refresh_flow() {
    let app = TestApp::new();

    let res = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            registration("Maya@Example.com", "0791112222"),
        ))
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "body: {}", res.body);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["user"]["email"], "maya@example.com");
    assert_eq!(res.body["user"]["userType"], "landlord");
    assert_eq!(res.body["user"]["isEmailVerified"], false);
    assert!(res.body["user"].get("password").is_none());

    let res = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "maya@example.com", "password": "secret123" }),
        ))
        .await;
    assert_eq!(res.status, StatusCode::OK, "body: {}", res.body);
    let access = res.body["token"].as_str().unwrap().to_string();
    let refresh = res.body["refreshToken"].as_str().unwrap().to_string();

    let me = app.send(get("/api/users/me", Some(&access))).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["name"], "Maya Nasser");

    let res = app
        .send(json_request(
            "POST",
            "/api/auth/refresh",
            None,
            json!({ "refreshToken": refresh }),
        ))
        .await;
    assert_eq!(res.status, StatusCode::OK, "body: {}", res.body);
    let renewed = res.body["token"].as_str().unwrap();
    assert!(app.tokens.decode_as(renewed, TokenType::Access).is_ok());
    assert!(
        app.tokens
            .decode_as(res.body["refreshToken"].as_str().unwrap(), TokenType::Refresh)
            .is_ok()
    );
}

#[tokio::test]
async fn test_duplicate_email() {
    let app = TestApp::new();
    app.send(json_request(
        "POST",
        "/api/auth/register",
        None,
        registration("dup@example.com", "0791112222"),
    ))
    .await;

    let res = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            registration("dup@example.com", "0793334444"),
        ))
        .await;

    res.assert_error(
        StatusCode::BAD_REQUEST,
        "Email already registered",
        "البريد الإلكتروني مسجل مسبقاً",
    );
}

#[tokio::test]
async fn test_duplicate_phone() {
    let app = TestApp::new();
    app.send(json_request(
        "POST",
        "/api/auth/register",
        None,
        registration("first@example.com", "0791112222"),
    ))
    .await;

    let res = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            registration("second@example.com", "0791112222"),
        ))
        .await;

    res.assert_error(
        StatusCode::BAD_REQUEST,
        "Phone number already registered",
        "رقم الهاتف مسجل مسبقاً",
    );
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::new();
    app.send(json_request(
        "POST",
        "/api/auth/register",
        None,
        registration("maya@example.com", "0791112222"),
    ))
    .await;

    let res = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "maya@example.com", "password": "wrong-password" }),
        ))
        .await;

    res.assert_error(
        StatusCode::UNAUTHORIZED,
        "Invalid email or password",
        "البريد الإلكتروني أو كلمة المرور غير صحيحة",
    );
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = TestApp::new();
    let user = app
        .seed_user(aqar::aqar_models::UserType::Tenant, true, true)
        .await;
    let access = app.access_token(user.id);

    let res = app
        .send(json_request(
            "POST",
            "/api/auth/refresh",
            None,
            json!({ "refreshToken": access }),
        ))
        .await;

    res.assert_error(StatusCode::UNAUTHORIZED, "Invalid token", "رمز غير صالح");
}

#[tokio::test]
async fn test_refresh_rejects_deactivated_account() {
    let app = TestApp::new();
    let user = app
        .seed_user(aqar::aqar_models::UserType::Tenant, true, false)
        .await;
    let refresh = app.tokens.issue(user.id, TokenType::Refresh).unwrap();

    let res = app
        .send(json_request(
            "POST",
            "/api/auth/refresh",
            None,
            json!({ "refreshToken": refresh }),
        ))
        .await;

    res.assert_error(StatusCode::UNAUTHORIZED, "Account is deactivated", "الحساب معطل");
}
