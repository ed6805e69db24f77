//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.chars().count() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if username.chars().count() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").ok());

    if !regex.as_ref().is_some_and(|r| r.is_match(username)) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

    if !regex.as_ref().is_some_and(|r| r.is_match(email)) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.chars().count() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Trim a required text field and check its length in characters
pub fn required_text(field: &str, value: &str, max_chars: usize) -> Result<String, String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty.", field));
    }

    if trimmed.chars().count() > max_chars {
        return Err(format!(
            "{} must be at most {} characters long.",
            field, max_chars
        ));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice_01").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice@").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_required_text_trims_and_bounds() {
        assert_eq!(required_text("Content", "  hi  ", 10).unwrap(), "hi");
        assert_eq!(
            required_text("Content", "   ", 10).unwrap_err(),
            "Content cannot be empty."
        );
        assert!(required_text("Content", "abcdefghijk", 10).is_err());
    }
}
