//! Common validation utilities.

use validator::ValidationError;

/// Largest accepted donation amount in major currency units.
const MAX_DONATION_AMOUNT: f64 = 1_000_000.0;

/// Maximum length of an image reference (URL or absolute path).
const MAX_IMAGE_REF_LENGTH: usize = 2048;

/// Validates that a required text field is not only whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a three letter uppercase currency code (e.g. USD, BYN, EUR).
pub fn validate_currency_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("currency_code");
        err.message = Some("Currency must be a three letter uppercase code".into());
        Err(err)
    }
}

/// Validates that a donation amount is positive and within limits.
pub fn validate_donation_amount(amount: f64) -> Result<(), ValidationError> {
    if amount.is_finite() && amount > 0.0 && amount <= MAX_DONATION_AMOUNT {
        Ok(())
    } else {
        let mut err = ValidationError::new("amount_range");
        err.message = Some("Amount must be greater than 0 and at most 1000000".into());
        Err(err)
    }
}

/// Validates an image reference.
///
/// Images live on an external media host, so we only store references:
/// either an http(s) URL or an absolute path served by the frontend.
pub fn validate_image_ref(value: &str) -> Result<(), ValidationError> {
    let ok = value.len() <= MAX_IMAGE_REF_LENGTH
        && (value.starts_with("https://")
            || value.starts_with("http://")
            || (value.starts_with('/') && !value.starts_with("//")));

    if ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("image_ref");
        err.message = Some("Image must be an http(s) URL or an absolute path".into());
        Err(err)
    }
}

/// Converts a decimal amount in major units to minor units (cents).
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Converts minor units (cents) back to a decimal amount.
pub fn from_minor_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}
