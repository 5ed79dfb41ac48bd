use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Business name is required"))]
    pub business_name: String,
    pub business_address: Option<String>,
    pub business_industry: Option<String>,
}

/// Password policy for new passwords: at least one uppercase letter, one
/// lowercase letter, one digit and one special character.
pub fn check_password_strength(password: &str) -> Option<&'static str> {
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let special = password.chars().any(|c| !c.is_alphanumeric());

    if upper && lower && digit && special {
        None
    } else {
        Some("Password must include an uppercase letter, a lowercase letter, a digit and a special character")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password_passes() {
        assert_eq!(check_password_strength("Str0ng!pass"), None);
    }

    #[test]
    fn test_password_without_digit_fails() {
        assert!(check_password_strength("Strong!pass").is_some());
    }

    #[test]
    fn test_password_without_uppercase_fails() {
        assert!(check_password_strength("str0ng!pass").is_some());
    }

    #[test]
    fn test_password_without_special_fails() {
        assert!(check_password_strength("Str0ngpass").is_some());
    }
}
