use std::fmt;

use crate::phonenumberutil::{
    errors::{NotANumberError, ParseError},
    helper_constants::PLUS_SIGN,
};

/// A parsed telephone number.
///
/// Values are only handed out by [`PhoneNumberUtil`](super::PhoneNumberUtil)
/// (`parse`, `parse_and_keep_raw_input`, `create_number`), which guarantee a
/// known country calling code and a national significant number of 2 to 17
/// ASCII digits. There are no setters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber {
    country_code: i32,
    national_number: String,
    extension: Option<String>,
    italian_leading_zero: bool,
    raw_input: Option<String>,
}

impl PhoneNumber {
    pub(crate) fn new(country_code: i32, national_number: String) -> Self {
        let italian_leading_zero = national_number.len() > 1 && national_number.starts_with('0');
        Self {
            country_code,
            national_number,
            extension: None,
            italian_leading_zero,
            raw_input: None,
        }
    }

    pub(crate) fn with_raw_input(mut self, raw_input: String) -> Self {
        self.raw_input = Some(raw_input);
        self
    }

    /// Returns a copy of this number carrying `extension`, which has to be
    /// ASCII digits. An empty extension removes it.
    pub fn with_extension(mut self, extension: &str) -> Result<Self, ParseError> {
        if !extension.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NotANumberError::InvalidCharacters.into());
        }
        self.extension = (!extension.is_empty()).then(|| extension.to_owned());
        Ok(self)
    }

    pub fn country_code(&self) -> i32 {
        self.country_code
    }

    /// The national significant number: digits only, leading zeros kept.
    pub fn national_number(&self) -> &str {
        &self.national_number
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn has_extension(&self) -> bool {
        self.extension.is_some()
    }

    /// Whether the national number starts with a zero that is part of the
    /// number itself rather than a national prefix, as in Italy.
    pub fn italian_leading_zero(&self) -> bool {
        self.italian_leading_zero
    }

    /// The text the number was parsed from, when it was parsed with
    /// `parse_and_keep_raw_input`.
    pub fn raw_input(&self) -> Option<&str> {
        self.raw_input.as_deref()
    }
}

/// Writes the number in E.164 form, e.g. `+441234567890`.
impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", PLUS_SIGN, self.country_code, self.national_number)
    }
}

#[cfg(test)]
mod tests {
    use crate::phonenumberutil::errors::{NotANumberError, ParseError};

    use super::PhoneNumber;

    #[test]
    fn leading_zero_is_detected() {
        assert!(PhoneNumber::new(39, "0212345678".to_owned()).italian_leading_zero());
        assert!(!PhoneNumber::new(44, "1234567890".to_owned()).italian_leading_zero());
        assert!(!PhoneNumber::new(44, "0".to_owned()).italian_leading_zero());
    }

    #[test]
    fn with_extension_returns_new_value() {
        let number = PhoneNumber::new(44, "1234567890".to_owned());
        let with_extension = number.clone().with_extension("123").unwrap();
        assert_eq!(with_extension.extension(), Some("123"));
        assert_eq!(number.extension(), None);
        assert_ne!(number, with_extension);
        assert_eq!(with_extension.with_extension(""), Ok(number));
    }

    #[test]
    fn extension_must_be_digits() {
        let number = PhoneNumber::new(44, "1234567890".to_owned());
        for extension in ["abc;DROP", "12 3", "x123", "\u{0663}"] {
            assert_eq!(
                number.clone().with_extension(extension),
                Err(ParseError::NotANumber(NotANumberError::InvalidCharacters)),
                "{extension}"
            );
        }
    }

    #[test]
    fn displays_as_e164() {
        let number = PhoneNumber::new(39, "0212345678".to_owned());
        assert_eq!(number.to_string(), "+390212345678");
    }
}
