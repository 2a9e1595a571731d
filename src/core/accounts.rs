//! Registration, credential checks and session lifecycle.

use crate::adapters::password;
use crate::core::forms::{FormErrors, Submission, REQUIRED};
use crate::domain::model::{NewUser, SessionUser, User, CUSTOMER_GROUP};
use crate::domain::ports::Store;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{is_valid_email, is_valid_username};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Base for resolving `next`; a target must keep this origin.
const LOCAL_ORIGIN: &str = "http://localhost/";

pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const DUPLICATE_USERNAME: &str = "A user with that username already exists.";
pub const BAD_CREDENTIALS: &str = "Username or password is incorrect.";

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "12345678", "123456789", "1234567890", "qwertyuiop", "iloveyou",
    "sunshine", "princess", "football", "baseball", "welcome1", "abc12345", "letmein1",
];

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
}

impl RegistrationForm {
    /// Field checks that need no database access.
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        let username = self.username.trim();

        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > MAX_USERNAME_LEN {
            errors.add(
                "username",
                format!("Ensure this value has at most {} characters.", MAX_USERNAME_LEN),
            );
        } else if !is_valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = self.email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        }
        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", "The two password fields didn't match.");
            } else {
                for message in password_problems(&self.password1, username) {
                    errors.add("password2", message);
                }
            }
        }

        errors
    }
}

fn password_problems(password: &str, username: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LEN
        ));
    }

    let lowered = password.to_lowercase();
    let user_lowered = username.to_lowercase();
    if user_lowered.chars().count() >= 3
        && (lowered.contains(&user_lowered) || user_lowered.contains(&lowered))
    {
        problems.push("The password is too similar to the username.".to_string());
    }

    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        problems.push("This password is too common.".to_string());
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    problems
}

/// Hashes off the async worker threads; argon2 is deliberately slow.
async fn hash_in_background(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| AppError::PasswordHashError {
            message: e.to_string(),
        })?
}

/// Creates a login and adds it to `group`.
pub async fn create_account(
    store: &dyn Store,
    username: &str,
    password: &str,
    email: Option<String>,
    group: &str,
) -> Result<User> {
    let password_hash = hash_in_background(password.to_string()).await?;
    let user = store
        .create_user(NewUser {
            username: username.to_string(),
            email: email.filter(|e| !e.is_empty()),
            password_hash,
        })
        .await?;
    store.add_user_to_group(user.id, group).await?;
    tracing::info!("Added '{}' to group '{}'", user.username, group);
    Ok(user)
}

/// Self-service sign up. New accounts always join the customer group.
pub async fn register(store: &dyn Store, form: &RegistrationForm) -> Result<Submission<User>> {
    let mut errors = form.validate();
    let username = form.username.trim();

    if !errors.has("username") && store.find_user_by_username(username).await?.is_some() {
        errors.add("username", DUPLICATE_USERNAME);
    }
    if !errors.is_empty() {
        return Ok(Submission::Rejected(errors));
    }

    match create_account(
        store,
        username,
        &form.password1,
        Some(form.email.trim().to_string()),
        CUSTOMER_GROUP,
    )
    .await
    {
        Ok(user) => Ok(Submission::Accepted(user)),
        // Lost a race with a concurrent sign-up for the same name.
        Err(AppError::ValidationError { message }) => {
            errors.add("username", message);
            Ok(Submission::Rejected(errors))
        }
        Err(e) => Err(e),
    }
}

/// Returns the user with their groups when the credentials match.
pub async fn authenticate(
    store: &dyn Store,
    username: &str,
    password: &str,
) -> Result<Option<SessionUser>> {
    let Some(user) = store.find_user_by_username(username.trim()).await? else {
        tracing::debug!("Login attempt for unknown user '{}'", username);
        return Ok(None);
    };

    let candidate = password.to_string();
    let stored = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || password::verify_password(&candidate, &stored))
        .await
        .map_err(|e| AppError::PasswordHashError {
            message: e.to_string(),
        })?;

    if !matches {
        tracing::debug!("Wrong password for '{}'", user.username);
        return Ok(None);
    }

    let groups = store.user_groups(user.id).await?;
    Ok(Some(SessionUser {
        id: user.id,
        username: user.username,
        groups,
    }))
}

pub async fn open_session(store: &dyn Store, user_id: i64, ttl_minutes: i64) -> Result<String> {
    let expires_at = Utc::now() + Duration::minutes(ttl_minutes);
    store.create_session(user_id, expires_at).await
}

pub async fn close_session(store: &dyn Store, token: &str) -> Result<()> {
    store.delete_session(token).await
}

/// Only same-origin absolute paths are honoured as post-login targets.
/// Whitespace and control characters are refused outright.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    let next = next?;
    if !next.starts_with('/')
        || next.contains('\\')
        || next.chars().any(|c| c.is_control() || c.is_whitespace())
    {
        return None;
    }

    let base = Url::parse(LOCAL_ORIGIN).ok()?;
    let resolved = base.join(next).ok()?;
    (resolved.origin() == base.origin()).then_some(next)
}
