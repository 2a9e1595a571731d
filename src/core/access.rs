//! Request guards.
//!
//! Each guard inspects the [`Viewer`] attached by the session middleware and
//! either lets the request through or returns the rejection the web layer turns
//! into a response: a redirect for [`AppError::AlreadyAuthenticated`] and
//! [`AppError::LoginRequired`], a 404 for [`AppError::AccessDenied`].

use crate::domain::model::{SessionUser, Viewer, ADMIN_GROUP};
use crate::utils::error::{AppError, Result};

/// Keeps signed-in users away from the login and registration pages.
/// They are sent to their own landing page: `/` for admins, `/user/` otherwise.
pub fn unauthenticated_user(viewer: &Viewer) -> Result<()> {
    match viewer.user() {
        Some(user) => Err(AppError::AlreadyAuthenticated {
            landing: user.landing_path(),
        }),
        None => Ok(()),
    }
}

pub fn login_required<'a>(viewer: &'a Viewer, path: &str) -> Result<&'a SessionUser> {
    viewer.user().ok_or_else(|| AppError::LoginRequired {
        next: path.to_string(),
    })
}

/// Passes when the viewer belongs to any of `allowed`. Anonymous viewers have no groups.
pub fn allowed_groups(viewer: &Viewer, allowed: &[&str]) -> Result<()> {
    let groups = viewer.groups();
    tracing::debug!("Checking groups {:?} against {:?}", groups, allowed);

    if groups.iter().any(|group| allowed.contains(&group.as_str())) {
        Ok(())
    } else {
        Err(AppError::AccessDenied)
    }
}

/// `login_required` followed by `allowed_groups(["admin"])`.
pub fn admin_only<'a>(viewer: &'a Viewer, path: &str) -> Result<&'a SessionUser> {
    let user = login_required(viewer, path)?;
    allowed_groups(viewer, &[ADMIN_GROUP])?;
    Ok(user)
}
