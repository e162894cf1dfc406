use super::ApiError;

pub fn validate_id(id: i32, what: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {what} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_username(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Username cannot be empty"));
    }

    if name.len() > 50 {
        return Err(ApiError::validation(
            "Username must be 50 characters or less",
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(ApiError::validation(
            "Username can only contain letters, numbers, dots, hyphens, and underscores",
        ));
    }

    Ok(name)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let email = email.trim();
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@')
    });

    if !valid || email.chars().any(char::is_whitespace) {
        return Err(ApiError::validation(format!("Invalid email address: {email}")));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }
    if password.len() > 128 {
        return Err(ApiError::validation(
            "Password must be 128 characters or less",
        ));
    }
    Ok(password)
}

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Search query cannot be empty"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1, "product").is_ok());
        assert!(validate_id(12345, "order").is_ok());
        assert!(validate_id(0, "product").is_err());
        assert!(validate_id(-1, "cart item").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  alice ").unwrap(), "alice");
        assert!(validate_username("bob_the-seller.2").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("a".repeat(51).as_str()).is_err());
        assert!(validate_username("no spaces").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("buyer@example.com").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@localhost").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("x".repeat(129).as_str()).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert!(validate_search_query("laptop").is_ok());
        assert_eq!(validate_search_query("  trimmed  ").unwrap(), "trimmed");
        assert!(validate_search_query("").is_err());
        assert!(validate_search_query("   ").is_err());
    }
}
