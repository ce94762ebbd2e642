//! Input validation utilities

use std::sync::OnceLock;

use regex::Regex;

/// Validate a username: non-empty, at most 32 characters, letters,
/// digits and underscores only.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("username required".to_string());
    }

    if username.len() > 32 {
        return Err("username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("username regex compiles"));

    if !regex.is_match(username) {
        return Err("username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate an external media URL: http(s) scheme with a non-empty host.
pub fn validate_url(url: &str) -> Result<(), String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| "invalid url".to_string())?;

    let host = rest.split('/').next().unwrap_or("");
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err("invalid url".to_string());
    }

    Ok(())
}
