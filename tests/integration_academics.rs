mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use schoolhub::modules::academics::model::SetupAcademicStructureDto;
use schoolhub::modules::academics::service::AcademicService;
use schoolhub_config::AcademicConfig;
use schoolhub_core::{IdentSource, generate_code, generate_username};
use schoolhub_models::UserId;

use common::{
    JoinCodes, body_json, create_test_school, create_test_user, generate_unique_email,
    get_auth_token, send, setup_test_app,
};

async fn count(pool: &PgPool, table: &str, school_id: Uuid) -> i64 {
    sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE school_id = $1",
        table
    ))
    .bind(school_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

const TAKEN_CODE: &str = "TAKEN001";

/// Hands out [`TAKEN_CODE`] for every code draw `taken` picks by index.
struct CollidingIdents {
    taken: fn(usize) -> bool,
    draws: AtomicUsize,
}

impl CollidingIdents {
    fn new(taken: fn(usize) -> bool) -> Self {
        Self {
            taken,
            draws: AtomicUsize::new(0),
        }
    }
}

impl IdentSource for CollidingIdents {
    fn code(&self) -> String {
        let draw = self.draws.fetch_add(1, Ordering::SeqCst);
        if (self.taken)(draw) {
            TAKEN_CODE.to_string()
        } else {
            generate_code()
        }
    }

    fn username(&self, name: &str) -> String {
        generate_username(name)
    }
}

/// Occupies [`TAKEN_CODE`] with a class belonging to another school.
async fn seed_taken_code(pool: &PgPool) {
    let other = create_test_school(pool, None, JoinCodes::default(), false).await;
    sqlx::query(
        "INSERT INTO classes (school_id, name, code, username, education_lever, curriculum, academic_year)
         VALUES ($1, 'Seed', $2, 'seed-class', 'Primary', 'REB', '2024-2025')",
    )
    .bind(other.id)
    .bind(TAKEN_CODE)
    .execute(pool)
    .await
    .unwrap();
}

fn primary_dto(school_id: Uuid) -> SetupAcademicStructureDto {
    serde_json::from_value(json!({
        "school_id": school_id,
        "primary_subjects_offered": ["Mathematics"]
    }))
    .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_primary_structure(pool: PgPool) {
    let email = generate_unique_email();
    let creator = create_test_user(&pool, &email, Some("ADMIN")).await;
    let school = create_test_school(&pool, Some(creator.id), JoinCodes::default(), false).await;

    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;
    let response = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/schools/academic",
        Some(&token),
        Some(json!({
            "school_id": school.id,
            "primary_subjects_offered": ["Mathematics", "Kinyarwanda"],
            "primary_pass_mark": 50.0
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["total_classes"], 6);
    assert_eq!(body["total_modules"], 12);

    assert_eq!(count(&pool, "classes", school.id).await, 6);
    assert_eq!(count(&pool, "modules", school.id).await, 12);

    let (total_classes, total_modules): (i32, i32) =
        sqlx::query_as("SELECT total_classes, total_modules FROM schools WHERE id = $1")
            .bind(school.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!((total_classes, total_modules), (6, 12));

    let levers: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT education_lever FROM classes WHERE school_id = $1")
            .bind(school.id)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(levers, vec!["Primary".to_string()]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_a_level_combination_and_listing(pool: PgPool) {
    let email = generate_unique_email();
    let creator = create_test_user(&pool, &email, Some("ADMIN")).await;
    let school = create_test_school(&pool, Some(creator.id), JoinCodes::default(), false).await;

    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;
    let response = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/schools/academic",
        Some(&token),
        Some(json!({
            "school_id": school.id,
            "a_level_subject_combination": ["PCM"]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["total_classes"], 3);
    assert_eq!(body["total_modules"], 3);

    let response = send(
        setup_test_app(pool.clone()),
        "GET",
        &format!("/api/schools/{}/classes", school.id),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let classes = body_json(response).await;
    let mut names: Vec<String> = classes
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["S4 PCM", "S5 PCM", "S6 PCM"]);

    let response = send(
        setup_test_app(pool),
        "GET",
        &format!("/api/schools/{}", school.id),
        None,
        None,
    )
    .await;
    let school_body = body_json(response).await;
    assert_eq!(
        school_body["academic_profile"]["a_level_subject_combination"],
        json!(["PCM"])
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_running_twice_adds_a_second_set(pool: PgPool) {
    let email = generate_unique_email();
    let creator = create_test_user(&pool, &email, Some("ADMIN")).await;
    let school = create_test_school(&pool, Some(creator.id), JoinCodes::default(), false).await;
    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;
    let payload = json!({
        "school_id": school.id,
        "tvet_specialization": ["Software Development"],
        "tvet_optional_subjects": ["Entrepreneurship"]
    });

    for _ in 0..2 {
        let response = send(
            setup_test_app(pool.clone()),
            "POST",
            "/api/schools/academic",
            Some(&token),
            Some(payload.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["total_classes"], 3);
        assert_eq!(body["total_modules"], 6);
    }

    assert_eq!(count(&pool, "classes", school.id).await, 6);
    assert_eq!(count(&pool, "modules", school.id).await, 12);

    let total_classes: i32 = sqlx::query_scalar("SELECT total_classes FROM schools WHERE id = $1")
        .bind(school.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total_classes, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_only_creator_may_generate(pool: PgPool) {
    let creator = create_test_user(&pool, &generate_unique_email(), Some("ADMIN")).await;
    let other_email = generate_unique_email();
    create_test_user(&pool, &other_email, Some("ADMIN")).await;
    let school = create_test_school(&pool, Some(creator.id), JoinCodes::default(), false).await;

    let token = get_auth_token(setup_test_app(pool.clone()), &other_email).await;
    let response = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/schools/academic",
        Some(&token),
        Some(json!({
            "school_id": school.id,
            "primary_subjects_offered": ["Mathematics"]
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(count(&pool, "classes", school.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_school_and_invalid_payload(pool: PgPool) {
    let email = generate_unique_email();
    create_test_user(&pool, &email, Some("ADMIN")).await;
    let token = get_auth_token(setup_test_app(pool.clone()), &email).await;

    let response = send(
        setup_test_app(pool.clone()),
        "POST",
        "/api/schools/academic",
        Some(&token),
        Some(json!({ "school_id": Uuid::new_v4(), "primary_subjects_offered": ["Math"] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        setup_test_app(pool),
        "POST",
        "/api/schools/academic",
        Some(&token),
        Some(json!({
            "school_id": Uuid::new_v4(),
            "a_level_subject_combination": ["A", "B", "C", "D", "E", "F", "G"]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_colliding_code_is_redrawn(pool: PgPool) {
    let creator = create_test_user(&pool, &generate_unique_email(), Some("ADMIN")).await;
    let school = create_test_school(&pool, Some(creator.id), JoinCodes::default(), false).await;
    seed_taken_code(&pool).await;

    let idents = CollidingIdents::new(|draw| draw < 2);
    let result = AcademicService::setup_academic_structure_with(
        &pool,
        &AcademicConfig::default(),
        &idents,
        UserId::from(creator.id),
        primary_dto(school.id),
    )
    .await
    .unwrap();

    assert_eq!(result.total_classes, 6);
    assert_eq!(result.total_modules, 6);
    assert_eq!(count(&pool, "classes", school.id).await, 6);
    assert_eq!(count(&pool, "modules", school.id).await, 6);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_exhausted_identifiers_roll_back(pool: PgPool) {
    let creator = create_test_user(&pool, &generate_unique_email(), Some("ADMIN")).await;
    let school = create_test_school(&pool, Some(creator.id), JoinCodes::default(), false).await;
    seed_taken_code(&pool).await;

    let config = AcademicConfig {
        ident_max_attempts: 3,
        ..AcademicConfig::default()
    };
    // First class and its module go in, the second class never finds a free code.
    let idents = CollidingIdents::new(|draw| draw >= 2);
    let err = AcademicService::setup_academic_structure_with(
        &pool,
        &config,
        &idents,
        UserId::from(creator.id),
        primary_dto(school.id),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert!(err.error.to_string().contains("please resubmit"));
    assert_eq!(idents.draws.load(Ordering::SeqCst), 5);

    assert_eq!(count(&pool, "classes", school.id).await, 0);
    assert_eq!(count(&pool, "modules", school.id).await, 0);
    let (total_classes, has_profile): (i32, bool) = sqlx::query_as(
        "SELECT total_classes, academic_profile IS NOT NULL FROM schools WHERE id = $1",
    )
    .bind(school.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(total_classes, 0);
    assert!(!has_profile);
}
