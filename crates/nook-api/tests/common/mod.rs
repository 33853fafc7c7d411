use chrono::Utc;
use uuid::Uuid;

use nook_api::middleware::AuthUser;
use nook_db::{Database, models::UserRow};
use nook_types::models::Role;

/// Inserts a user row directly and returns the matching authenticated
/// caller, sidestepping the register flow (tested separately).
pub fn seed_user(db: &Database, email: &str, role: Role) -> AuthUser {
    let id = Uuid::new_v4();
    db.create_user(&UserRow {
        id: id.to_string(),
        email: email.to_string(),
        password: "not-a-real-hash".to_string(),
        role: role.as_str().to_string(),
        created_at: Utc::now().to_rfc3339(),
    })
    .unwrap();

    AuthUser {
        id,
        email: email.to_string(),
        role,
    }
}
