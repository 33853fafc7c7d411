use jsonwebtoken::{DecodingKey, Validation, decode};

use nook_api::auth;
use nook_api::error::ApiError;
use nook_api::middleware::Claims;
use nook_db::Database;
use nook_types::api::{LoginRequest, RegisterRequest};
use nook_types::models::Role;

const SECRET: &str = "test-secret";

fn register(db: &Database, email: &str, password: &str) -> Result<nook_types::models::User, ApiError> {
    auth::register_user(
        db,
        &RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        },
    )
}

#[test]
fn register_then_login_issues_a_decodable_token() {
    let db = Database::open_in_memory().unwrap();

    let user = register(&db, "alice@example.com", "correct horse").unwrap();
    assert_eq!(user.role, Role::User);

    let response = auth::login_user(
        &db,
        SECRET,
        120,
        &LoginRequest {
            email: "alice@example.com".to_string(),
            password: "correct horse".to_string(),
        },
    )
    .unwrap();
    assert_eq!(response.token_type, "bearer");

    let token = decode::<Claims>(
        &response.access_token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &Validation::default(),
    )
    .unwrap();
    assert_eq!(token.claims.sub, user.id);
    assert_eq!(token.claims.role, Role::User);
}

#[test]
fn duplicate_email_registration_conflicts() {
    let db = Database::open_in_memory().unwrap();

    register(&db, "alice@example.com", "password-one").unwrap();
    assert!(matches!(
        register(&db, "alice@example.com", "password-two"),
        Err(ApiError::Conflict(_))
    ));
}

#[test]
fn weak_or_malformed_credentials_are_rejected() {
    let db = Database::open_in_memory().unwrap();

    assert!(matches!(
        register(&db, "not-an-email", "long enough password"),
        Err(ApiError::BadRequest(_))
    ));
    assert!(matches!(
        register(&db, "alice@example.com", "short"),
        Err(ApiError::BadRequest(_))
    ));
}

#[test]
fn login_failures_are_indistinguishable() {
    let db = Database::open_in_memory().unwrap();
    register(&db, "alice@example.com", "correct horse").unwrap();

    let wrong_password = auth::login_user(
        &db,
        SECRET,
        120,
        &LoginRequest {
            email: "alice@example.com".to_string(),
            password: "wrong horse".to_string(),
        },
    );
    let unknown_email = auth::login_user(
        &db,
        SECRET,
        120,
        &LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "correct horse".to_string(),
        },
    );

    assert!(matches!(wrong_password, Err(ApiError::Unauthorized)));
    assert!(matches!(unknown_email, Err(ApiError::Unauthorized)));
}

#[test]
fn admin_seeding_is_idempotent_and_grants_admin_role() {
    let db = Database::open_in_memory().unwrap();

    auth::seed_admin(&db, "root@example.com", "super secret").unwrap();
    auth::seed_admin(&db, "root@example.com", "super secret").unwrap();

    let row = db.get_user_by_email("root@example.com").unwrap().unwrap();
    assert_eq!(row.role, Role::Admin.as_str());

    auth::login_user(
        &db,
        SECRET,
        120,
        &LoginRequest {
            email: "root@example.com".to_string(),
            password: "super secret".to_string(),
        },
    )
    .unwrap();
}
