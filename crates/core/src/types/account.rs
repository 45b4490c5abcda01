//! Login account and password rules.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Account`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// The input string is empty after trimming.
    #[error("account cannot be empty")]
    Empty,
    /// The input contains an @ but is not a valid email address.
    #[error("invalid email address")]
    InvalidEmail,
    /// The input is not a valid mobile number.
    #[error("invalid phone number")]
    InvalidPhone,
}

/// Errors that can occur when validating a password.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The password is empty after trimming.
    #[error("password cannot be empty")]
    Empty,
    /// The password breaks the composition rule.
    #[error(
        "password must be at least {min} characters of letters and digits, with at least one of each"
    )]
    Weak {
        /// Minimum allowed length.
        min: usize,
    },
}

/// An account identifier: either an email address or a mainland mobile number.
///
/// ## Constraints
///
/// - Email: `local@domain.tld`, no whitespace, exactly one @, stored lowercase
/// - Phone: `1` followed by exactly 10 digits
///
/// ## Examples
///
/// ```
/// use mall_core::Account;
///
/// assert!(Account::parse("User@Example.com").unwrap().is_email());
/// assert!(!Account::parse("13800000000").unwrap().is_email());
/// assert!(Account::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Account {
    /// Lowercased email address.
    Email(String),
    /// Mobile number.
    Phone(String),
}

impl Account {
    /// Number of digits in a mobile number.
    pub const PHONE_LENGTH: usize = 11;

    /// Parse an `Account` from user input. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, looks like an email but is
    /// malformed, or is not a valid mobile number.
    pub fn parse(raw: &str) -> Result<Self, AccountError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(AccountError::Empty);
        }

        if s.contains('@') {
            if is_valid_email(s) {
                return Ok(Self::Email(s.to_lowercase()));
            }
            return Err(AccountError::InvalidEmail);
        }

        if is_valid_phone(s) {
            Ok(Self::Phone(s.to_owned()))
        } else {
            Err(AccountError::InvalidPhone)
        }
    }

    /// Returns the normalized account as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email(s) | Self::Phone(s) => s,
        }
    }

    /// Whether this account is an email address.
    #[must_use]
    pub const fn is_email(&self) -> bool {
        matches!(self, Self::Email(_))
    }

    /// The email, if this is an email account.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Email(s) => Some(s),
            Self::Phone(_) => None,
        }
    }

    /// The phone number, if this is a phone account.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        match self {
            Self::Phone(s) => Some(s),
            Self::Email(_) => None,
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Account {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Needs a dot with at least one character on each side.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn is_valid_phone(s: &str) -> bool {
    s.len() == Account::PHONE_LENGTH
        && s.starts_with('1')
        && s.bytes().all(|b| b.is_ascii_digit())
}

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate a password: at least 8 ASCII letters/digits with at least one
/// letter and one digit. Surrounding whitespace is ignored.
///
/// Returns the trimmed password on success.
///
/// # Errors
///
/// Returns [`PasswordError`] when the password is empty or too weak.
pub fn validate_password(raw: &str) -> Result<&str, PasswordError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(PasswordError::Empty);
    }

    let weak = PasswordError::Weak {
        min: MIN_PASSWORD_LENGTH,
    };
    if s.len() < MIN_PASSWORD_LENGTH || !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(weak);
    }
    let has_letter = s.bytes().any(|b| b.is_ascii_alphabetic());
    let has_digit = s.bytes().any(|b| b.is_ascii_digit());
    if has_letter && has_digit {
        Ok(s)
    } else {
        Err(weak)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // =========================================================================
    // Account
    // =========================================================================

    #[test]
    fn test_parse_email_is_lowercased() {
        let account = Account::parse("  Alice@Example.COM ").unwrap();
        assert_eq!(account, Account::Email("alice@example.com".to_owned()));
        assert_eq!(account.email(), Some("alice@example.com"));
        assert_eq!(account.phone(), None);
    }

    #[test]
    fn test_parse_invalid_emails() {
        for input in ["@example.com", "a@b", "a@.com", "a@com.", "a b@c.d", "a@b@c.d"] {
            assert_eq!(
                Account::parse(input),
                Err(AccountError::InvalidEmail),
                "{input}"
            );
        }
    }

    #[test]
    fn test_parse_phone() {
        let account = Account::parse("13812345678").unwrap();
        assert!(!account.is_email());
        assert_eq!(account.as_str(), "13812345678");
    }

    #[test]
    fn test_parse_invalid_phones() {
        for input in ["23812345678", "1381234567", "138123456789", "1381234567a"] {
            assert_eq!(
                Account::parse(input),
                Err(AccountError::InvalidPhone),
                "{input}"
            );
        }
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Account::parse("   "), Err(AccountError::Empty));
    }

    // =========================================================================
    // Password
    // =========================================================================

    #[test]
    fn test_password_valid() {
        assert_eq!(validate_password(" abc12345 ").unwrap(), "abc12345");
        assert!(validate_password("A1b2C3d4").is_ok());
    }

    #[test]
    fn test_password_rejections() {
        assert_eq!(validate_password(""), Err(PasswordError::Empty));
        for input in ["abc1234", "abcdefgh", "12345678", "abc_12345", "密码abc12345"] {
            assert!(
                matches!(validate_password(input), Err(PasswordError::Weak { .. })),
                "{input}"
            );
        }
    }
}
