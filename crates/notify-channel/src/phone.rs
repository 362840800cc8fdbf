//! Phone number normalization.

/// Keep only ASCII digits.
pub fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Normalize a phone number to international digits without `+`.
///
/// A `00` international prefix and any trunk zeros are dropped. What is
/// left is national when it has exactly 10 digits and gets the country
/// code prefixed; anything else is returned as digits. No result has 10
/// digits or a leading zero, so applying it twice gives the same result.
pub fn normalize_phone(raw: &str, country_code: &str) -> String {
    let digits = digits(raw);
    let rest = digits.strip_prefix("00").unwrap_or(&digits);
    let number = rest.trim_start_matches('0');
    if number.len() == 10 {
        format!("{country_code}{number}")
    } else {
        number.to_string()
    }
}

/// Whether the number has a plausible length (10 to 15 digits).
pub fn is_valid_phone(raw: &str) -> bool {
    (10..=15).contains(&digits(raw).len())
}
