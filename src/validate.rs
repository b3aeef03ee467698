//! Form validation for the login, sign-up and reset-password pages.
//!
//! Runs before the gateway is called; the remote service still has the
//! final say. Each field reports its first failing rule only.

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_FULL_NAME_LEN: usize = 3;
pub const PASSWORD_SPECIALS: &str = "!@#$%^&*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// # Errors
///
/// Returns every field that failed.
pub fn validate_login(email: &str, password: &str) -> Result<(), Vec<FieldError>> {
    collect([check_email(email), check_login_password(password)])
}

/// # Errors
///
/// Returns every field that failed.
pub fn validate_sign_up(email: &str, full_name: &str, password: &str, confirm: &str) -> Result<(), Vec<FieldError>> {
    collect([
        check_email(email),
        check_full_name(full_name),
        check_new_password(password),
        check_confirmation(password, confirm),
    ])
}

/// # Errors
///
/// Returns the e-mail error when the address is missing or malformed.
pub fn validate_reset(email: &str) -> Result<(), Vec<FieldError>> {
    collect([check_email(email)])
}

fn collect<const N: usize>(checks: [Option<FieldError>; N]) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = checks.into_iter().flatten().collect();
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn err(field: &'static str, message: &'static str) -> Option<FieldError> {
    Some(FieldError { field, message })
}

fn check_email(email: &str) -> Option<FieldError> {
    let email = email.trim();
    if email.is_empty() {
        return err("email", "E-mail is required");
    }
    if !is_email(email) {
        return err("email", "Invalid e-mail");
    }
    None
}

fn is_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

fn check_login_password(password: &str) -> Option<FieldError> {
    if password.is_empty() {
        return err("password", "Password is required");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return err("password", "Password must be at least 8 characters");
    }
    None
}

fn check_new_password(password: &str) -> Option<FieldError> {
    if let Some(e) = check_login_password(password) {
        return Some(e);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return err("password", "Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return err("password", "Password must contain at least one number");
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return err("password", "Password must contain at least one special character (!@#$%^&*)");
    }
    None
}

fn check_full_name(full_name: &str) -> Option<FieldError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return err("full_name", "Name is required");
    }
    if full_name.chars().count() < MIN_FULL_NAME_LEN {
        return err("full_name", "Name must be at least 3 characters");
    }
    None
}

fn check_confirmation(password: &str, confirm: &str) -> Option<FieldError> {
    if confirm.is_empty() {
        return err("confirm_password", "Password confirmation is required");
    }
    if password != confirm {
        return err("confirm_password", "Passwords do not match");
    }
    None
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
