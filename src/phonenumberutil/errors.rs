// Copyright (C) 2009 The Libphonenumber Authors
// Copyright (C) 2025 Kashin Vladislav (Rust adaptation author)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;

use crate::regexp_cache::InvalidRegexError;

#[derive(Debug, PartialEq, Error)]
pub(crate) enum ParseErrorInternal {
    #[error("{0}")]
    FailedToParse(#[from] ParseError),
    #[error("{0}")]
    RegexError(#[from] InvalidRegexError),
}

/// Reasons why a piece of text could not be turned into a `PhoneNumber`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid country code")]
    InvalidCountryCode,
    #[error("Not a number: {0}")]
    NotANumber(#[from] NotANumberError),
    #[error("Too short after idd")]
    TooShortAfterIdd,
    #[error("Too short nsn")]
    TooShortNsn,
    /// The input exceeds the maximum input length or the national significant
    /// number has more than 17 digits.
    #[error("Too long")]
    TooLong,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotANumberError {
    #[error("Number not matched a valid number pattern")]
    NotMatchedValidNumberPattern,
    #[error("Number contains characters that are neither digits nor punctuation")]
    InvalidCharacters,
    #[error("{0}")]
    FailedToExtractNumber(#[from] ExtractNumberError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractNumberError {
    #[error("No valid start character found")]
    NoValidStartCharacter,
    #[error("Invalid number")]
    NotANumber,
}

/// Failures while building the metadata store. All of them are fatal for the
/// engine that was about to use the metadata.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetadataLoadError {
    #[error("Malformed metadata: {0}")]
    Malformed(String),
    #[error("Metadata for region {region} lacks required field {field}")]
    MissingField { region: String, field: &'static str },
    #[error("Region {0} is defined more than once")]
    DuplicateRegion(String),
    #[error("Invalid pattern in metadata for region {region}: {source}")]
    InvalidPattern {
        region: String,
        #[source]
        source: InvalidRegexError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetExampleNumberError {
    #[error("Parse error: {0}")]
    FailedToParse(#[from] ParseError),
    #[error("No example number")]
    NoExampleNumber,
    #[error("Invalid region code provided")]
    InvalidRegionCode,
}

/// Possible outcomes when testing if a PhoneNumber is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum NumberLengthError {
    /// The number has an invalid country calling code.
    #[error("The number has an invalid country calling code")]
    InvalidCountryCode,
    /// The number is shorter than all valid numbers for this region.
    #[error("The number is shorter than all valid numbers for this region")]
    TooShort,
    /// The number is longer than the shortest valid numbers for this region,
    /// shorter than the longest valid numbers for this region, and does not
    /// itself have a number length that matches valid numbers for this region.
    /// This is also returned when there are no numbers of the requested type
    /// at all in this region.
    #[error(
        "The number length does not match any valid number length for this region"
    )]
    InvalidLength,
    /// The number is longer than all valid numbers for this region.
    #[error("The number is longer than all valid numbers for this region")]
    TooLong,
}

impl From<ExtractNumberError> for ParseError {
    fn from(value: ExtractNumberError) -> Self {
        NotANumberError::FailedToExtractNumber(value).into()
    }
}

impl From<ExtractNumberError> for ParseErrorInternal {
    fn from(value: ExtractNumberError) -> Self {
        ParseError::from(value).into()
    }
}

impl From<NotANumberError> for ParseErrorInternal {
    fn from(value: NotANumberError) -> Self {
        ParseError::from(value).into()
    }
}

impl ParseErrorInternal {
    pub fn into_public(self) -> ParseError {
        match self {
            ParseErrorInternal::FailedToParse(err) => err,
            ParseErrorInternal::RegexError(err) => panic!(
                "Metadata patterns are checked when the store is built; this indicates a library bug! {}",
                err
            ),
        }
    }
}
