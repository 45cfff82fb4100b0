use thiserror::Error;

/// Rejection of user-entered data. Raised before any backend call and
/// surfaced directly to the user; invalid input never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: &'static str,
}

fn invalid(field: &'static str, reason: &'static str) -> ValidationError {
    ValidationError { field, reason }
}

pub fn validate_required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "cannot be empty"));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid("email", "cannot be empty"));
    }
    if value.contains(char::is_whitespace) {
        return Err(invalid("email", "cannot contain whitespace"));
    }
    let Some((local, domain)) = value.split_once('@') else {
        return Err(invalid("email", "must contain @"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return Err(invalid("email", "is not a valid address"));
    }
    Ok(())
}

pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid("phone", "cannot be empty"));
    }
    let digits: String = value
        .strip_prefix('+')
        .unwrap_or(value)
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("phone", "may only contain digits, spaces and dashes"));
    }
    if !(8..=15).contains(&digits.len()) {
        return Err(invalid("phone", "must have between 8 and 15 digits"));
    }
    Ok(())
}

pub fn validate_plate(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let significant: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    if significant.is_empty() {
        return Err(invalid("plate", "cannot be empty"));
    }
    if !significant.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("plate", "may only contain letters, digits, spaces and dashes"));
    }
    if !(2..=12).contains(&significant.len()) {
        return Err(invalid("plate", "must have between 2 and 12 characters"));
    }
    Ok(())
}
