//! Access control evaluation
//!
//! Every policy is a pure function of the acting user (if any), the request
//! method and, for object-level checks, the owner of the target resource.
//! Nothing here touches storage or fails; handlers turn a [`Decision`] into
//! an HTTP error.

use axum::http::Method;

use crate::models::User;

/// Outcome of a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// The action needs a signed-in user (401)
    Unauthenticated,
    /// Signed in, but not allowed (403)
    Forbidden,
}

/// GET, HEAD and OPTIONS never modify state
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Any authenticated user
pub fn authenticated(actor: Option<&User>) -> Decision {
    match actor {
        Some(_) => Decision::Allow,
        None => Decision::Unauthenticated,
    }
}

/// Admins and superusers only, for every method
pub fn admin_only(actor: Option<&User>) -> Decision {
    match actor {
        None => Decision::Unauthenticated,
        Some(user) if user.is_admin() => Decision::Allow,
        Some(_) => Decision::Forbidden,
    }
}

/// Anyone may read; writes need an admin
pub fn admin_or_read_only(actor: Option<&User>, method: &Method) -> Decision {
    if is_safe_method(method) {
        return Decision::Allow;
    }
    admin_only(actor)
}

/// Anyone may read. Creating needs a signed-in user. Changing an existing
/// resource needs its author, a moderator or an admin.
///
/// `owner_id` is `None` for collection-level actions (create) and the author's
/// user ID for actions on an existing resource.
pub fn author_or_staff_or_read_only(
    actor: Option<&User>,
    method: &Method,
    owner_id: Option<i64>,
) -> Decision {
    if is_safe_method(method) {
        return Decision::Allow;
    }

    let Some(user) = actor else {
        return Decision::Unauthenticated;
    };

    match owner_id {
        None => Decision::Allow,
        Some(owner) if owner == user.id || user.is_staff_member() => Decision::Allow,
        Some(_) => Decision::Forbidden,
    }
}
