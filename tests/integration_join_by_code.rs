mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use schoolhub::modules::memberships::service::MembershipService;
use schoolhub_models::{SchoolId, UserId};

use common::{
    JoinCodes, body_json, create_test_school, create_test_user, generate_unique_email,
    get_auth_token, send, setup_test_app,
};

const STUDENT_CODE: &str = "STU-2025";
const TEACHER_CODE: &str = "TCH-2025";
const STAFF_CODE: &str = "STF-2025";

async fn count_join_requests(pool: &PgPool, school_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM school_join_requests WHERE school_id = $1")
        .bind(school_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn all_codes() -> JoinCodes<'static> {
    JoinCodes {
        students: Some(STUDENT_CODE),
        teachers: Some(TEACHER_CODE),
        school_staffs: Some(STAFF_CODE),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_joins_directly(pool: PgPool) {
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, Some("STUDENT")).await;
    let school = create_test_school(&pool, None, all_codes(), false).await;

    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;
    let response = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/school-join-requests/join",
        Some(&token),
        Some(json!({ "username": school.username, "code": format!(" {} ", STUDENT_CODE) })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["outcome"], "joined");
    assert_eq!(body["membership"]["kind"], "STUDENT");
    let membership_token = body["token"].as_str().unwrap().to_string();
    assert!(!membership_token.is_empty());

    let students: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE user_id = $1 AND school_id = $2")
            .bind(user.id)
            .bind(school.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(students, 1);
    assert_eq!(count_join_requests(&pool, school.id).await, 0);

    let response = send(
        setup_test_app(pool),
        "GET",
        "/api/users/me",
        Some(&membership_token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_code(pool: PgPool) {
    let email = generate_unique_email();
    create_test_user(&pool, &email, Some("TEACHER")).await;
    let school = create_test_school(&pool, None, all_codes(), false).await;

    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;
    let response = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/school-join-requests/join",
        Some(&token),
        Some(json!({ "username": school.username, "code": STUDENT_CODE })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid code");

    let teachers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teachers WHERE school_id = $1")
        .bind(school.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(teachers, 0);
    assert_eq!(count_join_requests(&pool, school.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_school(pool: PgPool) {
    let email = generate_unique_email();
    create_test_user(&pool, &email, Some("STUDENT")).await;

    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;
    let response = send(
        setup_test_app(pool),
        "POST",
        "/api/school-join-requests/join",
        Some(&token),
        Some(json!({ "username": "no-such-school", "code": STUDENT_CODE })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_cannot_join_by_code(pool: PgPool) {
    let email = generate_unique_email();
    create_test_user(&pool, &email, Some("ADMIN")).await;
    let school = create_test_school(&pool, None, all_codes(), false).await;

    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;
    let response = send(
        setup_test_app(pool),
        "POST",
        "/api/school-join-requests/join",
        Some(&token),
        Some(json!({ "username": school.username, "code": STAFF_CODE })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid role");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verification_creates_pending_request(pool: PgPool) {
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, Some("TEACHER")).await;
    let school = create_test_school(&pool, None, all_codes(), true).await;

    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;
    let response = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/school-join-requests/join",
        Some(&token),
        Some(json!({ "username": school.username, "code": TEACHER_CODE })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["outcome"], "pending_verification");
    assert_eq!(body["join_request"]["role"], "TEACHER");
    assert_eq!(body["join_request"]["status"], "pending");
    assert_eq!(body["join_request"]["user_id"], user.id.to_string());

    let teachers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teachers WHERE school_id = $1")
        .bind(school.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(teachers, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_staff_always_pending(pool: PgPool) {
    let email = generate_unique_email();
    create_test_user(&pool, &email, Some("SCHOOLSTAFF")).await;
    let school = create_test_school(&pool, None, all_codes(), false).await;

    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;

    let response = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/school-join-requests/join",
        Some(&token),
        Some(json!({ "username": school.username, "code": STAFF_CODE })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/school-join-requests/join",
        Some(&token),
        Some(json!({
            "username": school.username,
            "code": STAFF_CODE,
            "staff_role": "Secretary"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["outcome"], "pending_verification");
    assert_eq!(body["join_request"]["role"], "Secretary");

    let staff: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM school_staffs WHERE school_id = $1")
        .bind(school.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(staff, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_staff_pending_when_verification_required(pool: PgPool) {
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, Some("SCHOOLSTAFF")).await;
    let school = create_test_school(&pool, None, all_codes(), true).await;

    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;
    let response = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/school-join-requests/join",
        Some(&token),
        Some(json!({
            "username": school.username,
            "code": STAFF_CODE,
            "staff_role": "Bursar"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["outcome"], "pending_verification");
    assert_eq!(body["join_request"]["role"], "Bursar");
    assert_eq!(body["join_request"]["status"], "pending");
    assert_eq!(body["join_request"]["user_id"], user.id.to_string());

    let staff: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM school_staffs WHERE school_id = $1")
        .bind(school.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(staff, 0);
    assert_eq!(count_join_requests(&pool, school.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_join_waits_for_concurrent_membership(pool: PgPool) {
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, Some("STUDENT")).await;
    let school = create_test_school(&pool, None, all_codes(), false).await;
    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;

    // Another workflow is halfway through making the same user a teacher.
    let mut tx = pool.begin().await.unwrap();
    MembershipService::ensure_no_membership(
        &mut tx,
        UserId::from(user.id),
        SchoolId::from(school.id),
    )
    .await
    .unwrap();
    sqlx::query("INSERT INTO teachers (user_id, school_id, email, name) VALUES ($1, $2, $3, $4)")
        .bind(user.id)
        .bind(school.id)
        .bind(&email)
        .bind(&user.name)
        .execute(&mut *tx)
        .await
        .unwrap();

    let app = setup_test_app(pool.clone());
    let payload = json!({ "username": school.username, "code": STUDENT_CODE });
    let join = tokio::spawn(async move {
        send(
            app,
            "POST",
            "/api/school-join-requests/join",
            Some(&token),
            Some(payload),
        )
        .await
        .status()
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!join.is_finished());

    tx.commit().await.unwrap();
    assert_eq!(join.await.unwrap(), StatusCode::BAD_REQUEST);

    let students: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE user_id = $1 AND school_id = $2")
            .bind(user.id)
            .bind(school.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(students, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_join_twice_is_rejected(pool: PgPool) {
    let email = generate_unique_email();
    create_test_user(&pool, &email, Some("STUDENT")).await;
    let school = create_test_school(&pool, None, all_codes(), false).await;

    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;
    let payload = json!({ "username": school.username, "code": STUDENT_CODE });

    let first = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/school-join-requests/join",
        Some(&token),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = send(
        setup_test_app(pool),
        "POST",
        "/api/school-join-requests/join",
        Some(&token),
        Some(payload),
    )
    .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_join_requires_authentication(pool: PgPool) {
    let response = send(
        setup_test_app(pool),
        "POST",
        "/api/school-join-requests/join",
        None,
        Some(json!({ "username": "any", "code": STUDENT_CODE })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
