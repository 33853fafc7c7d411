//! Authorization resolver: pure decisions over (acting user, record owner).
//!
//! Ownership is checked before the role bypass is consulted, but either
//! condition alone grants access. Notes never get the admin bypass.

use nook_types::models::Role;

use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Update/delete rule for tasks: the record owner, or any admin.
pub fn can_modify(actor: &AuthUser, owner_id: &str) -> bool {
    if actor.id.to_string() == owner_id {
        return true;
    }
    match actor.role {
        Role::Admin => true,
        Role::User => false,
    }
}

pub fn require_owner_or_admin(
    actor: &AuthUser,
    owner_id: &str,
    denied: &'static str,
) -> Result<(), ApiError> {
    if can_modify(actor, owner_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(denied))
    }
}

/// Owner-only rule for notes: no admin bypass.
pub fn require_owner(
    actor: &AuthUser,
    owner_id: &str,
    denied: &'static str,
) -> Result<(), ApiError> {
    if actor.id.to_string() == owner_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(denied))
    }
}

/// Read scope for task listings: admins see everything, users see only
/// records they own.
pub fn list_scope(actor: &AuthUser) -> Option<String> {
    match actor.role {
        Role::Admin => None,
        Role::User => Some(actor.id.to_string()),
    }
}
