//! Detectors for values too sensitive to keep as alternative usernames.
//!
//! The parser records every plausible username field value alongside a saved
//! credential. Before the credential is persisted, values that look like
//! credit card numbers or US social security numbers are stripped out.

/// Strip spaces and dashes, the separators people type into number fields.
fn strip_separators(text: &str) -> String {
    text.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// True for a plausible credit card number: 12 to 19 digits passing the
/// Luhn checksum, separators allowed.
pub fn is_valid_credit_card_number(text: &str) -> bool {
    let number = strip_separators(text);
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if number.len() < 12 || number.len() > 19 {
        return false;
    }

    let mut sum = 0u32;
    let mut double = false;
    for c in number.chars().rev() {
        let mut digit = c.to_digit(10).unwrap_or(0);
        if double {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        double = !double;
    }
    sum % 10 == 0
}

/// True for a plausible US social security number: nine digits in the
/// AAA-GG-SSSS shape with a valid area (001-899, excluding 666), non-zero
/// group and non-zero serial. Separators allowed.
pub fn is_ssn(text: &str) -> bool {
    let number = strip_separators(text);
    if number.len() != 9 || !number.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let area: u32 = number[0..3].parse().unwrap_or(0);
    let group: u32 = number[3..5].parse().unwrap_or(0);
    let serial: u32 = number[5..9].parse().unwrap_or(0);

    if area == 0 || area == 666 || area >= 900 {
        return false;
    }
    if group == 0 || serial == 0 {
        return false;
    }
    true
}
