use super::*;

fn fields(errors: &[FieldError]) -> Vec<&'static str> {
    errors.iter().map(|e| e.field).collect()
}

// =============================================================
// Login
// =============================================================

#[test]
fn login_accepts_valid_input() {
    assert!(validate_login("a@b.com", "12345678").is_ok());
}

#[test]
fn login_requires_both_fields() {
    let errors = validate_login("", "").unwrap_err();
    assert_eq!(fields(&errors), vec!["email", "password"]);
    assert_eq!(errors[0].message, "E-mail is required");
    assert_eq!(errors[1].message, "Password is required");
}

#[test]
fn login_rejects_short_password() {
    let errors = validate_login("a@b.com", "short").unwrap_err();
    assert_eq!(errors, vec![FieldError { field: "password", message: "Password must be at least 8 characters" }]);
}

#[test]
fn login_rejects_malformed_emails() {
    for email in ["plain", "a@b", "@b.com", "a@@b.com", "a@b..com", "a b@c.com"] {
        let errors = validate_login(email, "12345678").unwrap_err();
        assert_eq!(errors[0].message, "Invalid e-mail", "{email}");
    }
}

// =============================================================
// Sign-up
// =============================================================

#[test]
fn sign_up_accepts_strong_password() {
    assert!(validate_sign_up("a@b.com", "Ada Lovelace", "Str0ng!pass", "Str0ng!pass").is_ok());
}

#[test]
fn sign_up_reports_first_failing_password_rule() {
    let cases = [
        ("weakpass1!", "Password must contain at least one uppercase letter"),
        ("Weakpass!!", "Password must contain at least one number"),
        ("Weakpass11", "Password must contain at least one special character (!@#$%^&*)"),
        ("Sh0r!", "Password must be at least 8 characters"),
    ];
    for (password, message) in cases {
        let errors = validate_sign_up("a@b.com", "Ada", password, password).unwrap_err();
        assert_eq!(errors, vec![FieldError { field: "password", message }], "{password}");
    }
}

#[test]
fn sign_up_requires_matching_confirmation() {
    let errors = validate_sign_up("a@b.com", "Ada", "Str0ng!pass", "Str0ng!pas").unwrap_err();
    assert_eq!(errors, vec![FieldError { field: "confirm_password", message: "Passwords do not match" }]);
}

#[test]
fn sign_up_short_name_rejected() {
    let errors = validate_sign_up("a@b.com", " Al ", "Str0ng!pass", "Str0ng!pass").unwrap_err();
    assert_eq!(fields(&errors), vec!["full_name"]);
}

#[test]
fn sign_up_collects_every_field() {
    let errors = validate_sign_up("", "", "", "").unwrap_err();
    assert_eq!(fields(&errors), vec!["email", "full_name", "password", "confirm_password"]);
}

// =============================================================
// Reset
// =============================================================

#[test]
fn reset_checks_email_only() {
    assert!(validate_reset("a@b.com").is_ok());
    assert_eq!(fields(&validate_reset("nope").unwrap_err()), vec!["email"]);
}

#[test]
fn field_error_display() {
    let e = FieldError { field: "email", message: "Invalid e-mail" };
    assert_eq!(e.to_string(), "email: Invalid e-mail");
}
