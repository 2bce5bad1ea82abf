//! Field-level input validation, run once per write path before anything is
//! persisted. Each checker returns the full list of problems so the client
//! sees every message at once.

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{LoginRequest, SignupRequest};
use crate::posts::dto::CreatePostRequest;
use crate::users::dto::UpdateUserRequest;

pub const MAX_POST_TEXT: usize = 280;
pub const MAX_BIO: usize = 250;
pub const SPECIAL_CHARS: &str = "@$!%*?&#";

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9]{3,30}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// At least 6 characters with one lowercase, one uppercase, one digit and
/// one special character. Lengths count characters, not bytes.
pub fn is_valid_password(password: &str) -> bool {
    let len = password.chars().count();
    len >= 6
        && len <= 128
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIAL_CHARS.contains(c))
}

pub const PASSWORD_RULE: &str = "Password must be at least 6 characters long, \
     include one uppercase letter, one number, and one special character";

pub fn validate_signup(req: &SignupRequest) -> Vec<String> {
    let mut errors = Vec::new();
    let name_len = req.full_name.trim().chars().count();
    if !(3..=50).contains(&name_len) {
        errors.push("Full name must be between 3 and 50 characters".into());
    }
    if !is_valid_username(req.username.trim()) {
        errors.push("Username must be 3-30 letters and numbers".into());
    }
    if !is_valid_email(req.email.trim()) {
        errors.push("Email must be a valid email address".into());
    }
    if !is_valid_password(&req.password) {
        errors.push(PASSWORD_RULE.into());
    }
    errors
}

pub fn validate_login(req: &LoginRequest) -> Vec<String> {
    let mut errors = Vec::new();
    if req.username.trim().is_empty() {
        errors.push("Username is required".into());
    }
    if req.password.is_empty() {
        errors.push("Password is required".into());
    }
    errors
}

pub fn validate_update(req: &UpdateUserRequest) -> Vec<String> {
    let mut errors = Vec::new();
    if let Some(full_name) = req.full_name.as_deref().map(str::trim) {
        let name_len = full_name.chars().count();
        if name_len > 0 && !(3..=50).contains(&name_len) {
            errors.push("Full name must be between 3 and 50 characters".into());
        }
    }
    if let Some(username) = req.username.as_deref().map(str::trim) {
        if !username.is_empty() && !is_valid_username(username) {
            errors.push("Username must be 3-30 letters and numbers".into());
        }
    }
    if let Some(email) = req.email.as_deref().map(str::trim) {
        if !email.is_empty() && !is_valid_email(email) {
            errors.push("Email must be a valid email address".into());
        }
    }
    if let Some(bio) = req.bio.as_deref() {
        if bio.chars().count() > MAX_BIO {
            errors.push(format!("Bio must be at most {MAX_BIO} characters"));
        }
    }
    errors
}

pub fn validate_post(req: &CreatePostRequest) -> Vec<String> {
    let mut errors = Vec::new();
    let text = req.text.as_deref().unwrap_or("").trim();
    let img = req.img.as_deref();
    if text.chars().count() > MAX_POST_TEXT {
        errors.push(format!("Text must be at most {MAX_POST_TEXT} characters"));
    }
    if img == Some("") {
        errors.push("Image must not be empty".into());
    }
    if text.is_empty() && img.map_or(true, str::is_empty) {
        errors.push("A post must have either text or an image".into());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(full_name: &str, username: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            full_name: full_name.into(),
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn accepts_a_well_formed_signup() {
        let req = signup("Jane Doe", "jane42", "jane@example.com", "Sup3r$ecret");
        assert!(validate_signup(&req).is_empty());
    }

    #[test]
    fn rejects_bad_username_email_and_password_together() {
        let req = signup("Jo", "j!", "not-an-email", "weak");
        let errors = validate_signup(&req);
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn password_policy_requires_every_class() {
        assert!(is_valid_password("Abc1@x"));
        assert!(!is_valid_password("abc1@xyz")); // no uppercase
        assert!(!is_valid_password("ABC1@XYZ")); // no lowercase
        assert!(!is_valid_password("Abcd@xyz")); // no digit
        assert!(!is_valid_password("Abc1xyz2")); // no special
        assert!(!is_valid_password("A1@a")); // too short
    }

    #[test]
    fn post_requires_text_or_image() {
        let empty = CreatePostRequest {
            text: None,
            img: None,
        };
        let errors = validate_post(&empty);
        assert!(errors
            .iter()
            .any(|e| e.contains("either text or an image")));

        let text_only = CreatePostRequest {
            text: Some("hello".into()),
            img: None,
        };
        assert!(validate_post(&text_only).is_empty());

        let img_only = CreatePostRequest {
            text: None,
            img: Some("https://media.test/a.jpg".into()),
        };
        assert!(validate_post(&img_only).is_empty());
    }

    #[test]
    fn post_rejects_empty_image_string() {
        let req = CreatePostRequest {
            text: Some("hi".into()),
            img: Some("".into()),
        };
        assert!(validate_post(&req)
            .iter()
            .any(|e| e.contains("Image must not be empty")));
    }

    #[test]
    fn post_rejects_overlong_text() {
        let req = CreatePostRequest {
            text: Some("x".repeat(MAX_POST_TEXT + 1)),
            img: None,
        };
        assert_eq!(validate_post(&req).len(), 1);
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        // three characters, more than three bytes each
        let req = signup("Åsa Öberg", "asa42", "asa@example.com", "Sup3r$ecret");
        assert!(validate_signup(&req).is_empty());

        let post = CreatePostRequest {
            text: Some("é".repeat(MAX_POST_TEXT)),
            img: None,
        };
        assert!(validate_post(&post).is_empty());
        let post = CreatePostRequest {
            text: Some("é".repeat(MAX_POST_TEXT + 1)),
            img: None,
        };
        assert_eq!(validate_post(&post).len(), 1);

        let update = UpdateUserRequest {
            bio: Some("ü".repeat(MAX_BIO)),
            ..Default::default()
        };
        assert!(validate_update(&update).is_empty());
    }

    #[test]
    fn update_ignores_absent_fields_but_checks_present_ones() {
        let empty = UpdateUserRequest::default();
        assert!(validate_update(&empty).is_empty());

        let bad = UpdateUserRequest {
            username: Some("x".into()),
            email: Some("nope".into()),
            ..Default::default()
        };
        assert_eq!(validate_update(&bad).len(), 2);
    }
}
