//! Input validation functions
//!
//! Validation utilities for account and enterprise input. Field limits
//! follow the storage schema (names 3-80, enterprise names 3-100, slugs
//! 3-50, passwords 12-72).

/// Validate a person's name
pub fn validate_name(name: &str) -> Result<(), String> {
    let len = name.trim().chars().count();
    if len < 3 {
        return Err("Name must be at least 3 characters long".to_string());
    }
    if len > 80 {
        return Err("Name must be at most 80 characters long".to_string());
    }
    Ok(())
}

/// Validate an enterprise name
pub fn validate_enterprise_name(name: &str) -> Result<(), String> {
    let len = name.trim().chars().count();
    if len < 3 {
        return Err("Enterprise name must be at least 3 characters long".to_string());
    }
    if len > 100 {
        return Err("Enterprise name must be at most 100 characters long".to_string());
    }
    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }
    let email_regex = regex_lite::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    if !email_regex.is_match(email) {
        return Err("Email must be a valid email address".to_string());
    }
    Ok(())
}

/// Validate password policy (12-72 characters)
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 12 {
        return Err("Password must be at least 12 characters long".to_string());
    }
    if password.len() > 72 {
        return Err("Password must be at most 72 characters long".to_string());
    }
    Ok(())
}

/// Validate a URL-safe enterprise slug
pub fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.len() < 3 {
        return Err("Slug must be at least 3 characters long".to_string());
    }
    if slug.len() > 50 {
        return Err("Slug must be at most 50 characters long".to_string());
    }
    let slug_regex = regex_lite::Regex::new(r"^[a-z0-9-]+$").unwrap();
    if !slug_regex.is_match(slug) {
        return Err(
            "Slug must contain only lowercase letters, digits, and hyphens".to_string(),
        );
    }
    Ok(())
}

/// Normalize a CNPJ to its canonical digits-only form.
///
/// All storage and comparison goes through this, so `12.345.678/0001-90`
/// and `12345678000190` refer to the same enterprise.
pub fn normalize_cnpj(cnpj: &str) -> String {
    cnpj.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate a CNPJ after normalization (14 digits)
pub fn validate_cnpj(cnpj: &str) -> Result<(), String> {
    if normalize_cnpj(cnpj).len() != 14 {
        return Err("CNPJ must contain exactly 14 digits".to_string());
    }
    Ok(())
}

/// Validate a hex color such as `#1A73E8`
pub fn validate_hex_color(color: &str) -> Result<(), String> {
    let color_regex = regex_lite::Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap();
    if !color_regex.is_match(color) {
        return Err("Color must be a hex code such as #1A73E8".to_string());
    }
    Ok(())
}
