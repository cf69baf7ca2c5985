use schoolhub_auth::{
    MembershipClaims, MembershipScope, create_access_token, create_membership_token,
    verify_membership_token, verify_token,
};
use schoolhub_config::JwtConfig;
use uuid::Uuid;

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
        membership_token_expiry: 604800,
    }
}

fn student_claims(class_id: Option<Uuid>) -> MembershipClaims {
    MembershipClaims {
        sub: Uuid::new_v4().to_string(),
        user_id: Uuid::new_v4(),
        school_id: Uuid::new_v4(),
        name: "Eric Mugisha".to_string(),
        email: "eric@example.com".to_string(),
        phone: None,
        gender: Some("M".to_string()),
        image: None,
        scope: MembershipScope::Student { class_id },
        aud: String::new(),
        exp: 0,
        iat: 0,
    }
}

#[test]
fn test_access_token_round_trip() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();
    let school_id = Uuid::new_v4();

    let token = create_access_token(
        user_id,
        "test@example.com",
        Some("TEACHER"),
        Some(school_id),
        &jwt_config,
    )
    .unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.email, "test@example.com");
    assert_eq!(claims.role.as_deref(), Some("TEACHER"));
    assert_eq!(claims.current_school_id, Some(school_id));
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[test]
fn test_access_token_without_role() {
    let jwt_config = get_test_jwt_config();
    let token = create_access_token(Uuid::new_v4(), "a@b.rw", None, None, &jwt_config).unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();
    assert!(claims.role.is_none());
    assert!(claims.current_school_id.is_none());
}

#[test]
fn test_verify_token_rejects_garbage() {
    let jwt_config = get_test_jwt_config();
    let err = verify_token("not.a.token", &jwt_config).unwrap_err();
    assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
}

#[test]
fn test_verify_token_wrong_secret() {
    let jwt_config = get_test_jwt_config();
    let token = create_access_token(Uuid::new_v4(), "a@b.rw", None, None, &jwt_config).unwrap();

    let other = JwtConfig {
        secret: "another_secret".to_string(),
        ..get_test_jwt_config()
    };
    assert!(verify_token(&token, &other).is_err());
}

#[test]
fn test_membership_token_keeps_student_class() {
    let jwt_config = get_test_jwt_config();
    let class_id = Uuid::new_v4();
    let claims = student_claims(Some(class_id));

    let token = create_membership_token(&claims, &jwt_config).unwrap();
    let decoded = verify_membership_token(&token, &jwt_config).unwrap();

    assert_eq!(decoded.sub, claims.sub);
    assert_eq!(decoded.scope, MembershipScope::Student { class_id: Some(class_id) });
    assert_eq!(decoded.exp - decoded.iat, 604800);
}

#[test]
fn test_membership_token_staff_scope() {
    let jwt_config = get_test_jwt_config();
    let claims = MembershipClaims {
        scope: MembershipScope::SchoolStaff {
            staff_role: "Bursar".to_string(),
        },
        ..student_claims(None)
    };

    let token = create_membership_token(&claims, &jwt_config).unwrap();
    let decoded = verify_membership_token(&token, &jwt_config).unwrap();
    assert_eq!(
        decoded.scope,
        MembershipScope::SchoolStaff {
            staff_role: "Bursar".to_string()
        }
    );
}

#[test]
fn test_membership_token_rejected_as_access_token() {
    let jwt_config = get_test_jwt_config();
    let claims = MembershipClaims {
        scope: MembershipScope::Teacher,
        ..student_claims(None)
    };

    let token = create_membership_token(&claims, &jwt_config).unwrap();
    assert!(verify_token(&token, &jwt_config).is_err());
}
