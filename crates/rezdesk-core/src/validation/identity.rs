//! Identity field validation: email shape and South African ID numbers.

use chrono::NaiveDate;

/// Why an SA ID number was rejected. Variants are ordered by check sequence:
/// shape first, then the embedded date of birth, then the Luhn checksum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdNumberError {
    #[error("ID number must be exactly 13 digits")]
    NotThirteenDigits,
    #[error("ID number contains an invalid date of birth")]
    InvalidBirthDate,
    #[error("ID number failed checksum validation")]
    ChecksumFailed,
}

/// Simple `local@domain` shape check. Intentionally loose: the identity
/// provider is the authority on deliverability, this only rejects obvious
/// garbage before it reaches an invitation or onboarding record.
pub fn validate_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if domain.contains('@') || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    domain.contains('.')
}

/// Validate a South African ID number: 13 digits, a parseable YYMMDD date of
/// birth in the first six digits, and a valid Luhn check digit.
///
/// Checks run in order, so a number that is wrong in several ways reports the
/// earliest failure: date-of-birth errors surface before checksum errors.
pub fn validate_sa_id_number(id_number: &str) -> Result<(), IdNumberError> {
    let id_number = id_number.trim();
    if id_number.len() != 13 || !id_number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdNumberError::NotThirteenDigits);
    }

    // YYMMDD date of birth. The century is ambiguous by design; pivot on 2030
    // so both 19xx and 20xx births parse.
    let yy: i32 = id_number[0..2].parse().unwrap_or(0);
    let mm: u32 = id_number[2..4].parse().unwrap_or(0);
    let dd: u32 = id_number[4..6].parse().unwrap_or(0);
    let year = if yy <= 30 { 2000 + yy } else { 1900 + yy };
    if NaiveDate::from_ymd_opt(year, mm, dd).is_none() {
        return Err(IdNumberError::InvalidBirthDate);
    }

    if !luhn_valid(id_number) {
        return Err(IdNumberError::ChecksumFailed);
    }

    Ok(())
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = (b - b'0') as u32;
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(validate_email("staff@res.example.com"));
        assert!(validate_email("  spaced@res.example.com  "));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!validate_email("no-at-sign"));
        assert!(!validate_email("@res.example.com"));
        assert!(!validate_email("staff@"));
        assert!(!validate_email("staff@nodot"));
        assert!(!validate_email("staff@.leading.dot"));
    }

    // 8001015009087 is the standard test ID: DOB 1980-01-01, valid Luhn.
    #[test]
    fn accepts_valid_id_number() {
        assert_eq!(validate_sa_id_number("8001015009087"), Ok(()));
    }

    #[test]
    fn rejects_wrong_length_or_non_digits() {
        assert_eq!(
            validate_sa_id_number("80010150090"),
            Err(IdNumberError::NotThirteenDigits)
        );
        assert_eq!(
            validate_sa_id_number("80010150090ab"),
            Err(IdNumberError::NotThirteenDigits)
        );
    }

    #[test]
    fn rejects_bad_checksum() {
        assert_eq!(
            validate_sa_id_number("8001015009088"),
            Err(IdNumberError::ChecksumFailed)
        );
    }

    #[test]
    fn birth_date_failure_reported_before_checksum_failure() {
        // Month 13 is impossible and the check digit is also wrong; the date
        // error must win.
        assert_eq!(
            validate_sa_id_number("8013015009088"),
            Err(IdNumberError::InvalidBirthDate)
        );
    }
}
