//! Validation entry point for host frameworks: decides whether a submitted
//! value is an acceptable phone number, optionally of a given type.

use std::{any::Any, collections::HashSet, fmt, sync::Arc};

use log::debug;
use thiserror::Error;

use crate::phonenumberutil::{
    PHONE_NUMBER_UTIL, PhoneNumber, PhoneNumberFormat, PhoneNumberType, PhoneNumberUtil,
    errors::ParseError,
};

/// A value submitted for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneNumberInput<'a> {
    /// No value. Never a violation: required-ness is the host's concern.
    Null,
    Text(&'a str),
    Number(&'a PhoneNumber),
}

impl<'a> From<&'a str> for PhoneNumberInput<'a> {
    fn from(value: &'a str) -> Self {
        PhoneNumberInput::Text(value)
    }
}

impl<'a> From<&'a String> for PhoneNumberInput<'a> {
    fn from(value: &'a String) -> Self {
        PhoneNumberInput::Text(value)
    }
}

impl<'a> From<&'a PhoneNumber> for PhoneNumberInput<'a> {
    fn from(value: &'a PhoneNumber) -> Self {
        PhoneNumberInput::Number(value)
    }
}

impl<'a, T> From<Option<T>> for PhoneNumberInput<'a>
where
    T: Into<PhoneNumberInput<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(PhoneNumberInput::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not resolve the default region: {message}")]
pub struct RegionResolutionError {
    message: String,
}

impl RegionResolutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Host capability that supplies the default region at validation time, for
/// example from a field of the object being validated.
///
/// `Ok(None)` (or an empty region) means no region is known, in which case
/// only numbers in international form can be parsed.
pub trait RegionResolver: Send + Sync {
    fn resolve_region(&self) -> Result<Option<String>, RegionResolutionError>;
}

impl<F> RegionResolver for F
where
    F: Fn() -> Result<Option<String>, RegionResolutionError> + Send + Sync,
{
    fn resolve_region(&self) -> Result<Option<String>, RegionResolutionError> {
        self()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The value is neither a string, null nor a `PhoneNumber`.
    #[error("Expected a string, null or PhoneNumber value, got {given}")]
    UnexpectedValueType { given: String },
    #[error(transparent)]
    RegionResolution(#[from] RegionResolutionError),
}

/// Per-call options. A region resolver, when set, takes precedence over the
/// static default region.
#[derive(Clone, Default)]
pub struct ValidationOptions {
    number_type: Option<PhoneNumberType>,
    default_region: Option<String>,
    region_resolver: Option<Arc<dyn RegionResolver>>,
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number_type(mut self, number_type: PhoneNumberType) -> Self {
        self.number_type = Some(number_type);
        self
    }

    pub fn with_default_region(mut self, region_code: impl Into<String>) -> Self {
        self.default_region = Some(region_code.into());
        self
    }

    pub fn with_region_resolver(mut self, resolver: impl RegionResolver + 'static) -> Self {
        self.region_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn number_type(&self) -> Option<PhoneNumberType> {
        self.number_type
    }

    pub fn default_region(&self) -> Option<&str> {
        self.default_region.as_deref()
    }

    fn resolve_default_region(&self) -> Result<Option<String>, RegionResolutionError> {
        let Some(resolver) = &self.region_resolver else {
            return Ok(self.default_region.clone());
        };
        let region = resolver
            .resolve_region()?
            .filter(|region| !region.trim().is_empty());
        if region.is_none() {
            debug!("Region resolver returned no region, parsing without a default region");
        }
        Ok(region)
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("number_type", &self.number_type)
            .field("default_region", &self.default_region)
            .field("region_resolver", &self.region_resolver.is_some())
            .finish()
    }
}

/// Result of one validation call. Hosts render their violation message from
/// `attempted_type` (its `Display` is the constraint name, e.g. `mobile`) and
/// `canonical_value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    /// Types the number was classified as. Empty when the value was empty,
    /// did not parse or is not a valid number.
    pub matched_types: HashSet<PhoneNumberType>,
    pub attempted_type: Option<PhoneNumberType>,
    /// E.164 form of the number when it parsed, otherwise the submitted text.
    pub canonical_value: Option<String>,
    pub parse_error: Option<ParseError>,
}

impl ValidationOutcome {
    fn empty(options: &ValidationOptions) -> Self {
        Self {
            is_valid: true,
            matched_types: HashSet::new(),
            attempted_type: options.number_type,
            canonical_value: None,
            parse_error: None,
        }
    }
}

/// Runs validations against one `PhoneNumberUtil`. The free functions
/// [`validate`] and [`validate_value`] use the process-wide instance.
#[derive(Clone, Copy)]
pub struct PhoneNumberValidator<'u> {
    util: &'u PhoneNumberUtil,
}

impl Default for PhoneNumberValidator<'static> {
    fn default() -> Self {
        Self::new(&PHONE_NUMBER_UTIL)
    }
}

impl<'u> PhoneNumberValidator<'u> {
    pub fn new(util: &'u PhoneNumberUtil) -> Self {
        Self { util }
    }

    pub fn validate<'a>(
        &self,
        input: impl Into<PhoneNumberInput<'a>>,
        options: &ValidationOptions,
    ) -> Result<ValidationOutcome, ValidationError> {
        let outcome = match input.into() {
            PhoneNumberInput::Null => ValidationOutcome::empty(options),
            PhoneNumberInput::Text(text) if text.is_empty() => ValidationOutcome::empty(options),
            PhoneNumberInput::Text(text) => {
                let default_region = options.resolve_default_region()?;
                match self.util.parse(text, default_region.as_deref()) {
                    Ok(phone_number) => self.evaluate(&phone_number, options),
                    Err(err) => {
                        debug!("Could not parse '{}' as a phone number: {}", text, err);
                        ValidationOutcome {
                            is_valid: false,
                            matched_types: HashSet::new(),
                            attempted_type: options.number_type,
                            canonical_value: Some(text.to_owned()),
                            parse_error: Some(err),
                        }
                    }
                }
            }
            PhoneNumberInput::Number(phone_number) => self.evaluate(phone_number, options),
        };
        debug!("Validation outcome: {:?}", outcome);
        Ok(outcome)
    }

    /// Validates a value of a type only known at runtime. `String`,
    /// `&'static str` and `PhoneNumber` are accepted, `None` is an empty value.
    pub fn validate_value<T: Any>(
        &self,
        value: Option<&T>,
        options: &ValidationOptions,
    ) -> Result<ValidationOutcome, ValidationError> {
        let Some(value) = value else {
            return self.validate(PhoneNumberInput::Null, options);
        };
        let value = value as &dyn Any;
        if let Some(text) = value.downcast_ref::<String>() {
            self.validate(text, options)
        } else if let Some(text) = value.downcast_ref::<&'static str>() {
            self.validate(*text, options)
        } else if let Some(phone_number) = value.downcast_ref::<PhoneNumber>() {
            self.validate(phone_number, options)
        } else {
            Err(ValidationError::UnexpectedValueType {
                given: std::any::type_name::<T>().to_owned(),
            })
        }
    }

    fn evaluate(&self, phone_number: &PhoneNumber, options: &ValidationOptions) -> ValidationOutcome {
        let canonical_value = Some(self.util.format(phone_number, PhoneNumberFormat::E164));
        let mut outcome = ValidationOutcome {
            is_valid: false,
            matched_types: HashSet::new(),
            attempted_type: options.number_type,
            canonical_value,
            parse_error: None,
        };
        if !self.util.is_valid_number(phone_number) {
            return outcome;
        }
        outcome.matched_types = self.util.classify(phone_number);
        outcome.is_valid = options
            .number_type
            .is_none_or(|number_type| self.util.matches_type(phone_number, number_type));
        outcome
    }
}

/// Validates `input` with the process-wide engine.
pub fn validate<'a>(
    input: impl Into<PhoneNumberInput<'a>>,
    options: &ValidationOptions,
) -> Result<ValidationOutcome, ValidationError> {
    PhoneNumberValidator::default().validate(input, options)
}

/// Validates a dynamically typed value with the process-wide engine.
pub fn validate_value<T: Any>(
    value: Option<&T>,
    options: &ValidationOptions,
) -> Result<ValidationOutcome, ValidationError> {
    PhoneNumberValidator::default().validate_value(value, options)
}
