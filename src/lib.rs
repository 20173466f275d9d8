mod interfaces;
/// This module is automatically generated from /resources/*.proto
mod proto_gen;
mod generated;
mod phonenumberutil;
mod regexp_cache;
mod regex_based_matcher;
mod validator;
pub mod i18n;
pub(crate) mod regex_util;

#[cfg(test)]
mod tests;

pub use proto_gen::phonemetadata;
pub use phonenumberutil::{
    CountryCodeSource, MetadataStore, NumberLengthType, PHONE_NUMBER_UTIL, PhoneNumber,
    PhoneNumberFormat, PhoneNumberType, PhoneNumberUtil, enums, errors,
};
pub use validator::{
    PhoneNumberInput, PhoneNumberValidator, RegionResolutionError, RegionResolver,
    ValidationError, ValidationOptions, ValidationOutcome, validate, validate_value,
};
