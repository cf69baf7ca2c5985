use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use schoolhub::router::init_router;
use schoolhub::state::AppState;
use schoolhub_config::{AcademicConfig, CorsConfig, JwtConfig, RateLimitConfig};
use schoolhub_core::{hash_code, hash_password};

pub const PASSWORD: &str = "testpass123";

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[allow(dead_code)]
pub struct TestSchool {
    pub id: Uuid,
    pub username: String,
}

/// Join codes for a fixture school. `None` leaves the code unset.
#[derive(Default)]
pub struct JoinCodes<'a> {
    pub students: Option<&'a str>,
    pub teachers: Option<&'a str>,
    pub school_staffs: Option<&'a str>,
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        access_token_expiry: 3600,
        membership_token_expiry: 604800,
    }
}

pub fn setup_test_app(pool: PgPool) -> Router {
    let state = AppState {
        db: pool,
        jwt_config: test_jwt_config(),
        cors_config: CorsConfig::default(),
        rate_limit_config: RateLimitConfig::disabled(),
        academic_config: AcademicConfig::default(),
    };
    init_router(state)
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

#[allow(dead_code)]
pub fn generate_unique_username(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

/// Inserts an account. `role` is the declared role (`STUDENT`, `TEACHER`,
/// `ADMIN`, `SCHOOLSTAFF`) or `None`.
pub async fn create_test_user(pool: &PgPool, email: &str, role: Option<&str>) -> TestUser {
    let hashed = hash_password(PASSWORD).unwrap();
    let name = "Test User".to_string();

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (email, username, name, password, role)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(email)
    .bind(generate_unique_username("user"))
    .bind(&name)
    .bind(hashed)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        email: email.to_string(),
        name,
    }
}

#[allow(dead_code)]
pub async fn create_test_school(
    pool: &PgPool,
    created_by: Option<Uuid>,
    codes: JoinCodes<'_>,
    required_verification: bool,
) -> TestSchool {
    let username = generate_unique_username("school");
    let hash = |code: Option<&str>| code.map(|c| hash_code(c).unwrap());

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO schools
            (username, name, students_code, teachers_code, school_staffs_code,
             required_verification_to_join_by_code, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
    )
    .bind(&username)
    .bind("Test School")
    .bind(hash(codes.students))
    .bind(hash(codes.teachers))
    .bind(hash(codes.school_staffs))
    .bind(required_verification)
    .bind(created_by)
    .fetch_one(pool)
    .await
    .unwrap();

    TestSchool { id, username }
}

#[allow(dead_code)]
pub async fn create_test_join_request(
    pool: &PgPool,
    school_id: Uuid,
    email: &str,
    role: &str,
    status: &str,
) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO school_join_requests (school_id, role, name, email, status)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(school_id)
    .bind(role)
    .bind("Test User")
    .bind(email)
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Sends a JSON request, with a bearer token when one is given.
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.oneshot(request).await.unwrap()
}

pub async fn get_auth_token(app: Router, email: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    let body = body_json(response).await;
    body["access_token"].as_str().unwrap().to_string()
}
