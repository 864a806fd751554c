use lazy_static::lazy_static;
use regex::Regex;

use crate::shared::constants::PASSWORD_SPECIAL_CHARS;

lazy_static! {
    /// Any ASCII letter
    pub static ref LETTER_REGEX: Regex = Regex::new(r"[A-Za-z]").unwrap();

    /// Any ASCII digit
    pub static ref DIGIT_REGEX: Regex = Regex::new(r"[0-9]").unwrap();

    pub static ref UPPERCASE_REGEX: Regex = Regex::new(r"[A-Z]").unwrap();

    pub static ref LOWERCASE_REGEX: Regex = Regex::new(r"[a-z]").unwrap();

    /// One character out of `PASSWORD_SPECIAL_CHARS`
    /// - Valid: "a!", "#", "x-y"
    /// - Invalid: "abc", "123", "a b"
    pub static ref SPECIAL_CHAR_REGEX: Regex =
        Regex::new(&format!("[{}]", regex::escape(PASSWORD_SPECIAL_CHARS))).unwrap();
}

/// True when the password has a letter, a digit, an uppercase letter, a
/// lowercase letter and a special character.
pub fn is_strong_password(password: &str) -> bool {
    LETTER_REGEX.is_match(password)
        && DIGIT_REGEX.is_match(password)
        && UPPERCASE_REGEX.is_match(password)
        && LOWERCASE_REGEX.is_match(password)
        && SPECIAL_CHAR_REGEX.is_match(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_char_regex() {
        for c in PASSWORD_SPECIAL_CHARS.chars() {
            assert!(SPECIAL_CHAR_REGEX.is_match(&c.to_string()), "{c}");
        }
        assert!(!SPECIAL_CHAR_REGEX.is_match("abcXYZ123"));
        assert!(!SPECIAL_CHAR_REGEX.is_match("a b"));
        assert!(!SPECIAL_CHAR_REGEX.is_match(""));
    }

    #[test]
    fn test_is_strong_password_valid() {
        assert!(is_strong_password("Secret#1"));
        assert!(is_strong_password("aB3~"));
        assert!(is_strong_password("pass-Word-9"));
    }

    #[test]
    fn test_is_strong_password_invalid() {
        assert!(!is_strong_password("secret#1")); // no uppercase
        assert!(!is_strong_password("SECRET#1")); // no lowercase
        assert!(!is_strong_password("Secret#x")); // no digit
        assert!(!is_strong_password("Secret12")); // no special
        assert!(!is_strong_password(""));
    }
}
