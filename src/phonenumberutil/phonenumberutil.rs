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

use std::{borrow::Cow, collections::HashSet};

use log::{error, trace, warn};
use regex::Regex;

use super::{
    metadata_store::MetadataStore,
    phone_number::PhoneNumber,
    phone_number_regexps_and_mappings::PhoneNumberRegExpsAndMappings,
};
use crate::{
    generated::metadata::METADATA,
    i18n,
    interfaces::MatcherApi,
    phonenumberutil::{
        CountryCodeSource, NumberLengthType, PhoneNumberFormat, PhoneNumberType,
        errors::{
            ExtractNumberError, GetExampleNumberError, MetadataLoadError, NotANumberError,
            NumberLengthError, ParseError, ParseErrorInternal,
        },
        helper_constants::{
            DEFAULT_EXTN_PREFIX, DEFAULT_INTERNATIONAL_PREFIX, MAX_INPUT_STRING_LENGTH,
            MAX_LENGTH_COUNTRY_CODE, MAX_LENGTH_FOR_NSN, MIN_LENGTH_FOR_NSN, RFC3966_EXTN_PREFIX,
        },
        helper_functions::{
            self, get_number_desc_by_type, get_supported_types_for_metadata, normalize_helper,
            prefix_number_with_country_calling_code, test_number_length,
            test_number_length_with_unknown_type,
        },
        helper_types::PhoneNumberWithCountryCodeSource,
    },
    proto_gen::phonemetadata::{
        NumberFormat, PhoneMetadata, PhoneMetadataCollection, PhoneNumberDesc,
    },
    regex_based_matcher::RegexBasedMatcher,
    regex_util::RegexConsume,
    regexp_cache::InvalidRegexError,
};

/// Order in which the specific number types are tried when classifying a
/// number. Fixed-line and mobile come last since they are the broadest.
const SPECIFIC_TYPES_IN_ORDER: [PhoneNumberType; 8] = [
    PhoneNumberType::PremiumRate,
    PhoneNumberType::TollFree,
    PhoneNumberType::SharedCost,
    PhoneNumberType::VoIP,
    PhoneNumberType::PersonalNumber,
    PhoneNumberType::Pager,
    PhoneNumberType::UAN,
    PhoneNumberType::VoiceMail,
];

pub struct PhoneNumberUtil {
    /// An API for validation checking.
    matcher_api: Box<dyn MatcherApi>,

    /// Helper class holding useful regular expressions and character mappings.
    reg_exps: PhoneNumberRegExpsAndMappings,

    /// Numbering-plan metadata, indexed by region and by calling code.
    metadata: MetadataStore,
}

impl PhoneNumberUtil {
    /// Creates an instance over the compiled-in numbering-plan table.
    pub fn try_new() -> Result<Self, MetadataLoadError> {
        Ok(Self::new_for_store(MetadataStore::from_text_format(METADATA)?))
    }

    /// Creates an instance over host-supplied metadata.
    pub fn new_for_metadata(
        metadata_collection: PhoneMetadataCollection,
    ) -> Result<Self, MetadataLoadError> {
        Ok(Self::new_for_store(MetadataStore::from_collection(
            metadata_collection,
        )?))
    }

    pub fn new_for_store(metadata: MetadataStore) -> Self {
        Self {
            matcher_api: Box::new(RegexBasedMatcher::new()),
            reg_exps: PhoneNumberRegExpsAndMappings::new(),
            metadata,
        }
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn get_supported_regions(&self) -> impl Iterator<Item = &str> {
        self.metadata.supported_regions()
    }

    pub fn get_supported_global_network_calling_codes(&self) -> HashSet<i32> {
        self.metadata.supported_global_network_calling_codes()
    }

    pub fn get_supported_calling_codes(&self) -> HashSet<i32> {
        self.metadata.supported_calling_codes()
    }

    pub fn get_supported_types_for_region(
        &self,
        region_code: &str,
    ) -> Option<HashSet<PhoneNumberType>> {
        self.metadata
            .lookup(region_code)
            .map(get_supported_types_for_metadata)
            .or_else(|| {
                warn!("Invalid or unknown region code provided: {}", region_code);
                None
            })
    }

    pub fn get_supported_types_for_non_geo_entity(
        &self,
        country_calling_code: i32,
    ) -> Option<HashSet<PhoneNumberType>> {
        self.metadata
            .lookup_non_geographical(country_calling_code)
            .map(get_supported_types_for_metadata)
            .or_else(|| {
                warn!(
                    "Unknown country calling code for a non-geographical entity provided: {}",
                    country_calling_code
                );
                None
            })
    }

    /// Returns the region code that matches the specific country calling code. In
    /// the case of no region code being found, the unknown region code will be
    /// returned.
    pub fn get_region_code_for_country_code(&self, country_calling_code: i32) -> &str {
        self.metadata
            .lookup_by_country_code(country_calling_code)
            .first()
            .map(String::as_str)
            .unwrap_or(i18n::RegionCode::get_unknown())
    }

    /// Returns the region codes that match the specific country calling code,
    /// main region first. Empty when the code is unknown.
    pub fn get_region_codes_for_country_calling_code(&self, country_calling_code: i32) -> &[String] {
        self.metadata.lookup_by_country_code(country_calling_code)
    }

    pub fn get_country_code_for_region(&self, region_code: &str) -> Option<i32> {
        self.metadata
            .lookup(region_code)
            .map(|metadata| metadata.country_code())
            .or_else(|| {
                warn!("Invalid or unknown region code ({}) provided.", region_code);
                None
            })
    }

    /// Returns the region a number belongs to, telling apart the regions that
    /// share its country calling code. Returns the unknown region "ZZ" when no
    /// region claims the number.
    pub fn get_region_code_for_number(&self, phone_number: &PhoneNumber) -> &str {
        let country_calling_code = phone_number.country_code();
        let region_codes = self.metadata.lookup_by_country_code(country_calling_code);
        match region_codes {
            [] => {
                trace!("Missing/invalid country calling code ({})", country_calling_code);
                i18n::RegionCode::get_unknown()
            }
            [region_code] => region_code.as_str(),
            _ => self.get_region_code_for_number_from_region_list(phone_number, region_codes),
        }
    }

    fn get_region_code_for_number_from_region_list<'b>(
        &self,
        phone_number: &PhoneNumber,
        region_codes: &'b [String],
    ) -> &'b str {
        let national_number = phone_number.national_number();
        for code in region_codes {
            let Some(metadata) = self.metadata.lookup(code) else {
                continue;
            };
            if metadata.has_leading_digits() {
                match self.reg_exps.regexp_cache.get_regex(metadata.leading_digits()) {
                    Ok(regex) if regex.matches_start(national_number) => return code,
                    Ok(_) => {}
                    Err(err) => error!("Invalid leading digits pattern for {}: {}", code, err),
                }
            } else if self.get_number_type_helper(national_number, metadata)
                != PhoneNumberType::Unknown
            {
                return code;
            }
        }
        i18n::RegionCode::get_unknown()
    }

    /// Checks whether a string looks like a phone number at all: at least two
    /// digits, only digits, punctuation and letters, and an optional extension.
    pub fn is_viable_phone_number(&self, phone_number: &str) -> bool {
        if phone_number.chars().count() < MIN_LENGTH_FOR_NSN {
            return false;
        }
        self.reg_exps.valid_phone_number_pattern.is_match(phone_number)
    }

    /// Parses a string into a phone number.
    ///
    /// `default_region` is used for numbers written without a country calling
    /// code; it may be omitted when the number is written in international
    /// form (`+44 ...`, or `00 44 ...`).
    pub fn parse(
        &self,
        number_to_parse: &str,
        default_region: Option<&str>,
    ) -> Result<PhoneNumber, ParseError> {
        self.parse_helper(number_to_parse, default_region, false)
            .map_err(ParseErrorInternal::into_public)
    }

    /// Same as [`parse`](Self::parse), but the returned number remembers the
    /// input text.
    pub fn parse_and_keep_raw_input(
        &self,
        number_to_parse: &str,
        default_region: Option<&str>,
    ) -> Result<PhoneNumber, ParseError> {
        self.parse_helper(number_to_parse, default_region, true)
            .map_err(ParseErrorInternal::into_public)
    }

    /// Builds a phone number from its parts, enforcing the same invariants as
    /// the parser: a known country calling code and a national significant
    /// number of 2 to 17 ASCII digits.
    pub fn create_number(
        &self,
        country_calling_code: i32,
        national_number: &str,
    ) -> Result<PhoneNumber, ParseError> {
        if self
            .metadata
            .lookup_by_country_code(country_calling_code)
            .is_empty()
        {
            return Err(ParseError::InvalidCountryCode);
        }
        if !national_number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NotANumberError::InvalidCharacters.into());
        }
        Self::check_national_number_length(national_number)?;
        Ok(PhoneNumber::new(
            country_calling_code,
            national_number.to_owned(),
        ))
    }

    fn check_national_number_length(national_number: &str) -> Result<(), ParseError> {
        if national_number.len() < MIN_LENGTH_FOR_NSN {
            return Err(ParseError::TooShortNsn);
        }
        if national_number.len() > MAX_LENGTH_FOR_NSN {
            return Err(ParseError::TooLong);
        }
        Ok(())
    }

    fn parse_helper(
        &self,
        number_to_parse: &str,
        default_region: Option<&str>,
        keep_raw_input: bool,
    ) -> Result<PhoneNumber, ParseErrorInternal> {
        if number_to_parse.chars().count() > MAX_INPUT_STRING_LENGTH {
            return Err(ParseError::TooLong.into());
        }
        let normalized_input = String::from(dec_from_char::normalize_decimals(number_to_parse));
        let national_number = self.extract_possible_number(&normalized_input)?;
        if !self.is_viable_phone_number(national_number) {
            trace!("The string supplied did not seem to be a phone number '{}'.", national_number);
            return Err(NotANumberError::NotMatchedValidNumberPattern.into());
        }

        let region_metadata = default_region.and_then(|region_code| {
            let metadata = self.metadata.lookup(region_code);
            if metadata.is_none() {
                warn!("Invalid or unknown region code ({}) provided.", region_code);
            }
            metadata
        });

        let (national_number, extension) = self.maybe_strip_extension(national_number);
        let (country_code, stripped) =
            self.maybe_extract_country_code(region_metadata, national_number)?;

        let metadata = if stripped.country_code_source == CountryCodeSource::FromDefaultCountry {
            let Some(metadata) = region_metadata else {
                trace!("Missing or invalid default country.");
                return Err(ParseError::InvalidCountryCode.into());
            };
            metadata
        } else {
            let region_code = self.get_region_code_for_country_code(country_code);
            self.metadata
                .metadata_for_region_or_calling_code(country_code, region_code)
                .ok_or(ParseError::InvalidCountryCode)?
        };
        let country_code = metadata.country_code();

        let mut normalized_national_number = stripped.phone_number;
        if normalized_national_number.len() < MIN_LENGTH_FOR_NSN {
            return Err(ParseError::TooShortNsn.into());
        }
        // A number taken without a plus sign has had its national prefix
        // handled already.
        if stripped.country_code_source != CountryCodeSource::FromNumberWithoutPlusSign {
            self.maybe_strip_national_prefix(&mut normalized_national_number, metadata)?;
        }
        Self::check_national_number_length(&normalized_national_number)?;

        let mut phone_number = PhoneNumber::new(country_code, normalized_national_number);
        if let Some(extension) = extension {
            phone_number = phone_number.with_extension(&extension)?;
        }
        if keep_raw_input {
            phone_number = phone_number.with_raw_input(number_to_parse.to_owned());
        }
        trace!(
            "Parsed '{}' as {} ({:?})",
            number_to_parse, phone_number, stripped.country_code_source
        );
        Ok(phone_number)
    }

    /// Attempts to extract a possible number from the string passed in. This
    /// currently strips all leading characters that cannot be used to start a
    /// phone number, trailing characters that are neither digits nor letters
    /// (except `#`), and everything from a marker of a second number on.
    fn extract_possible_number<'a>(
        &self,
        phone_number: &'a str,
    ) -> Result<&'a str, ExtractNumberError> {
        let Some(start) = self.reg_exps.valid_start_char_pattern.find(phone_number) else {
            trace!("Number '{}' has no valid start character.", phone_number);
            return Err(ExtractNumberError::NoValidStartCharacter);
        };
        let number = self.trim_unwanted_end_chars(&phone_number[start.start()..]);
        if number.is_empty() {
            return Err(ExtractNumberError::NotANumber);
        }
        // Check for extra numbers at the end.
        let number = self
            .reg_exps
            .capture_up_to_second_number_start_pattern
            .captures(number)
            .and_then(|captures| captures.get(1))
            .map(|first_number| first_number.as_str())
            .unwrap_or(number);
        Ok(number)
    }

    fn trim_unwanted_end_chars<'a>(&self, phone_number: &'a str) -> &'a str {
        let mut buf = [0u8; 4];
        let mut end = phone_number.len();
        for char in phone_number.chars().rev() {
            if !self
                .reg_exps
                .unwanted_end_char_pattern
                .is_match(char.encode_utf8(&mut buf))
            {
                break;
            }
            end -= char.len_utf8();
        }
        &phone_number[..end]
    }

    /// Strips any extension (as in, the part of the number dialled after the
    /// call is connected, usually indicated with extn, ext, x or similar) from
    /// the end of the number, and returns it.
    fn maybe_strip_extension<'a>(&self, phone_number: &'a str) -> (&'a str, Option<String>) {
        let Some(captures) = self.reg_exps.extn_pattern.captures(phone_number) else {
            return (phone_number, None);
        };
        let Some(full_match) = captures.get(0) else {
            return (phone_number, None);
        };
        // If we find a potential extension, and the number preceding this is a
        // viable number, we assume it is an extension.
        let number_without_extension = &phone_number[..full_match.start()];
        if !self.is_viable_phone_number(number_without_extension) {
            return (phone_number, None);
        }
        // The numbers are captured into groups in the regular expression; the
        // first non-empty one holds the extension.
        captures
            .iter()
            .skip(1)
            .flatten()
            .find(|group| !group.as_str().is_empty())
            .map(|extension| (number_without_extension, Some(extension.as_str().to_owned())))
            .unwrap_or((phone_number, None))
    }

    /// Tries to extract a country calling code from a number. Country calling
    /// codes are extracted in the following ways:
    /// - by stripping the international dialing prefix of the default region,
    ///   or `00` when there is none, and taking the code that follows;
    /// - by stripping a leading plus sign and taking the code that follows;
    /// - by taking the default region's own code when the number starts with
    ///   it and is only valid without it.
    ///
    /// Returns a code of 0 when the number is national and the default
    /// region's code applies.
    fn maybe_extract_country_code(
        &self,
        default_region_metadata: Option<&PhoneMetadata>,
        phone_number: &str,
    ) -> Result<(i32, PhoneNumberWithCountryCodeSource), ParseErrorInternal> {
        // Set the default prefix to be something that will never match if there is
        // no default region.
        let possible_country_idd_prefix = default_region_metadata
            .map(|metadata| metadata.international_prefix())
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or(DEFAULT_INTERNATIONAL_PREFIX);

        let mut stripped = self
            .maybe_strip_international_prefix_and_normalize(phone_number, possible_country_idd_prefix)?;

        if stripped.country_code_source != CountryCodeSource::FromDefaultCountry {
            if stripped.phone_number.len() <= MIN_LENGTH_FOR_NSN {
                trace!("Phone number had an IDD, but after this was not long enough to be a viable phone number.");
                return Err(ParseError::TooShortAfterIdd.into());
            }
            let Some((country_code, code_length)) = self.extract_country_code(&stripped.phone_number)
            else {
                trace!("Number '{}' has no known country calling code.", stripped.phone_number);
                return Err(ParseError::InvalidCountryCode.into());
            };
            stripped.phone_number.drain(..code_length);
            return Ok((country_code, stripped));
        }

        if let Some(metadata) = default_region_metadata {
            // Check to see if the number starts with the country calling code
            // for the default region. If so, we remove the country calling code,
            // and do some checks on the validity of the number before and after.
            let mut buf = itoa::Buffer::new();
            let default_country_code = buf.format(metadata.country_code());
            if let Some(potential_national_number) =
                stripped.phone_number.strip_prefix(default_country_code)
            {
                let general_desc = &metadata.general_desc;
                let mut potential_national_number = potential_national_number.to_owned();
                self.maybe_strip_national_prefix(&mut potential_national_number, metadata)?;
                // If the number was not valid before but is valid now, or if it
                // was too long before, we consider the number with the country
                // calling code stripped to be a better result and keep that
                // instead.
                let was_valid = helper_functions::is_match(
                    self.matcher_api.as_ref(),
                    &stripped.phone_number,
                    general_desc,
                );
                let is_valid_now = helper_functions::is_match(
                    self.matcher_api.as_ref(),
                    &potential_national_number,
                    general_desc,
                );
                if (!was_valid && is_valid_now)
                    || test_number_length_with_unknown_type(&stripped.phone_number, metadata)
                        == Err(NumberLengthError::TooLong)
                {
                    return Ok((
                        metadata.country_code(),
                        PhoneNumberWithCountryCodeSource::new(
                            potential_national_number,
                            CountryCodeSource::FromNumberWithoutPlusSign,
                        ),
                    ));
                }
            }
        }
        Ok((0, stripped))
    }

    /// Extracts the longest known country calling code from the start of a
    /// normalized number. Returns the code and the number of digits it took.
    fn extract_country_code(&self, full_number: &str) -> Option<(i32, usize)> {
        // Country codes do not begin with a '0'.
        if full_number.is_empty() || full_number.starts_with('0') {
            return None;
        }
        let max_length = MAX_LENGTH_COUNTRY_CODE.min(full_number.len());
        (1..=max_length).rev().find_map(|length| {
            let potential_country_code = full_number.get(..length)?.parse::<i32>().ok()?;
            (!self
                .metadata
                .lookup_by_country_code(potential_country_code)
                .is_empty())
            .then_some((potential_country_code, length))
        })
    }

    /// Strips any international prefix (such as +, 00, 011) present in the
    /// number provided, normalizes the resulting number, and indicates if an
    /// international prefix was present.
    fn maybe_strip_international_prefix_and_normalize(
        &self,
        phone_number: &str,
        possible_idd_prefix: &str,
    ) -> Result<PhoneNumberWithCountryCodeSource, ParseErrorInternal> {
        if phone_number.is_empty() {
            return Ok(PhoneNumberWithCountryCodeSource::new(
                String::new(),
                CountryCodeSource::FromDefaultCountry,
            ));
        }
        if let Some(rest) = self.reg_exps.plus_chars_pattern.consume_start(phone_number) {
            return Ok(PhoneNumberWithCountryCodeSource::new(
                self.normalize(rest)?,
                CountryCodeSource::FromNumberWithPlusSign,
            ));
        }
        // Attempt to parse the first digits as an international prefix.
        let normalized_number = self.normalize(phone_number)?;
        let idd_pattern = self.reg_exps.regexp_cache.get_regex(possible_idd_prefix)?;
        if let Some(rest) = Self::parse_prefix_as_idd(&idd_pattern, &normalized_number) {
            return Ok(PhoneNumberWithCountryCodeSource::new(
                rest.to_owned(),
                CountryCodeSource::FromNumberWithIdd,
            ));
        }
        Ok(PhoneNumberWithCountryCodeSource::new(
            normalized_number,
            CountryCodeSource::FromDefaultCountry,
        ))
    }

    /// Strips the IDD from the start of the number if present. Helper function
    /// used by maybe_strip_international_prefix_and_normalize.
    fn parse_prefix_as_idd<'a>(idd_pattern: &Regex, phone_number: &'a str) -> Option<&'a str> {
        let rest = idd_pattern.consume_start(phone_number)?;
        // Only strip this if the first digit after the match is not a 0, since
        // country calling codes cannot begin with 0.
        if rest.starts_with('0') {
            return None;
        }
        Some(rest)
    }

    /// Normalizes a string of characters representing a phone number. Numbers
    /// with three or more letters are vanity numbers whose letters map to
    /// keypad digits; otherwise punctuation is removed and anything left must
    /// be an ASCII digit.
    fn normalize(&self, phone_number: &str) -> Result<String, NotANumberError> {
        if self.reg_exps.valid_alpha_phone_pattern.is_match(phone_number) {
            return Ok(normalize_helper(
                &self.reg_exps.alpha_phone_mappings,
                true,
                phone_number,
            ));
        }
        let digits = self.reg_exps.separator_pattern.replace_all(phone_number, "");
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            trace!("Number '{}' contains invalid characters.", phone_number);
            return Err(NotANumberError::InvalidCharacters);
        }
        Ok(digits.into_owned())
    }

    /// Strips the national prefix from the start of the number when what
    /// remains is still a number of the region. Returns whether anything was
    /// stripped.
    fn maybe_strip_national_prefix(
        &self,
        phone_number: &mut String,
        metadata: &PhoneMetadata,
    ) -> Result<bool, InvalidRegexError> {
        let possible_national_prefix = metadata.national_prefix_for_parsing();
        if phone_number.is_empty() || possible_national_prefix.is_empty() {
            return Ok(false);
        }
        let prefix_pattern = self
            .reg_exps
            .regexp_cache
            .get_regex(possible_national_prefix)?;
        let Some(rest) = prefix_pattern.consume_start(phone_number) else {
            return Ok(false);
        };
        if rest.is_empty()
            || !helper_functions::is_match(self.matcher_api.as_ref(), rest, &metadata.general_desc)
        {
            return Ok(false);
        }
        *phone_number = rest.to_owned();
        Ok(true)
    }

    /// A number is valid when, for any region using its country calling code,
    /// its length is one of the region's possible lengths and it matches the
    /// region's general number pattern.
    pub fn is_valid_number(&self, phone_number: &PhoneNumber) -> bool {
        let country_calling_code = phone_number.country_code();
        self.metadata
            .lookup_by_country_code(country_calling_code)
            .iter()
            .filter_map(|region_code| {
                self.metadata
                    .metadata_for_region_or_calling_code(country_calling_code, region_code)
            })
            .any(|metadata| {
                self.is_number_matching_desc(phone_number.national_number(), &metadata.general_desc)
            })
    }

    /// Checks that the number is valid and belongs to the given region. For
    /// calling codes shared by several regions the number must be one the
    /// region claims.
    pub fn is_valid_number_for_region(&self, phone_number: &PhoneNumber, region_code: &str) -> bool {
        let country_calling_code = phone_number.country_code();
        let Some(metadata) = self
            .metadata
            .metadata_for_region_or_calling_code(country_calling_code, region_code)
        else {
            warn!("Invalid or unknown region code ({}) provided.", region_code);
            return false;
        };
        if metadata.country_code() != country_calling_code {
            return false;
        }
        if !self.is_number_matching_desc(phone_number.national_number(), &metadata.general_desc) {
            return false;
        }
        match self.metadata.lookup_by_country_code(country_calling_code) {
            [_] => true,
            _ => self
                .get_region_code_for_number(phone_number)
                .eq_ignore_ascii_case(region_code),
        }
    }

    /// Returns the single most specific type of a number. Numbers matching
    /// both the fixed-line and the mobile description are `FixedLineOrMobile`;
    /// numbers that match no description, or whose region cannot be found, are
    /// `Unknown`.
    pub fn get_number_type(&self, phone_number: &PhoneNumber) -> PhoneNumberType {
        match self.get_metadata_for_number(phone_number) {
            Some(metadata) => {
                self.get_number_type_helper(phone_number.national_number(), metadata)
            }
            None => PhoneNumberType::Unknown,
        }
    }

    /// Returns every type whose description the number matches, plus
    /// `FixedLineOrMobile` when it is both fixed-line and mobile. Returns only
    /// `Unknown` when nothing matches.
    pub fn classify(&self, phone_number: &PhoneNumber) -> HashSet<PhoneNumberType> {
        let national_number = phone_number.national_number();
        let mut types = HashSet::new();
        if let Some(metadata) = self.get_metadata_for_number(phone_number)
            && self.is_number_matching_desc(national_number, &metadata.general_desc)
        {
            types.extend(
                SPECIFIC_TYPES_IN_ORDER
                    .into_iter()
                    .chain([PhoneNumberType::FixedLine, PhoneNumberType::Mobile])
                    .filter(|number_type| {
                        self.is_number_matching_desc(
                            national_number,
                            get_number_desc_by_type(metadata, *number_type),
                        )
                    }),
            );
            if types.contains(&PhoneNumberType::FixedLine)
                && (types.contains(&PhoneNumberType::Mobile)
                    || metadata.same_mobile_and_fixed_line_pattern())
            {
                types.insert(PhoneNumberType::Mobile);
                types.insert(PhoneNumberType::FixedLineOrMobile);
            }
        }
        if types.is_empty() {
            types.insert(PhoneNumberType::Unknown);
        }
        trace!("Number '{}' classified as {:?}", phone_number, types);
        types
    }

    /// Checks a valid number against a type constraint. `FixedLineOrMobile`
    /// numbers satisfy both `FixedLine` and `Mobile`, and a
    /// `FixedLineOrMobile` constraint accepts either of them. `Unknown`
    /// constrains nothing: every valid number satisfies it.
    pub fn matches_type(&self, phone_number: &PhoneNumber, number_type: PhoneNumberType) -> bool {
        if !self.is_valid_number(phone_number) {
            return false;
        }
        if number_type == PhoneNumberType::Unknown {
            return true;
        }
        let actual_type = self.get_number_type(phone_number);
        match number_type {
            PhoneNumberType::FixedLine => matches!(
                actual_type,
                PhoneNumberType::FixedLine | PhoneNumberType::FixedLineOrMobile
            ),
            PhoneNumberType::Mobile => matches!(
                actual_type,
                PhoneNumberType::Mobile | PhoneNumberType::FixedLineOrMobile
            ),
            PhoneNumberType::FixedLineOrMobile => matches!(
                actual_type,
                PhoneNumberType::FixedLine
                    | PhoneNumberType::Mobile
                    | PhoneNumberType::FixedLineOrMobile
            ),
            other => actual_type == other,
        }
    }

    fn get_metadata_for_number(&self, phone_number: &PhoneNumber) -> Option<&PhoneMetadata> {
        let region_code = self.get_region_code_for_number(phone_number);
        self.metadata
            .metadata_for_region_or_calling_code(phone_number.country_code(), region_code)
    }

    fn get_number_type_helper(
        &self,
        national_number: &str,
        metadata: &PhoneMetadata,
    ) -> PhoneNumberType {
        if !self.is_number_matching_desc(national_number, &metadata.general_desc) {
            trace!("Number '{national_number}' type unknown - doesn't match general national number pattern");
            return PhoneNumberType::Unknown;
        }
        if let Some(number_type) = SPECIFIC_TYPES_IN_ORDER.into_iter().find(|number_type| {
            self.is_number_matching_desc(
                national_number,
                get_number_desc_by_type(metadata, *number_type),
            )
        }) {
            trace!("Number '{national_number}' is a {number_type} number.");
            return number_type;
        }

        let is_fixed_line = self.is_number_matching_desc(national_number, &metadata.fixed_line);
        if is_fixed_line {
            if metadata.same_mobile_and_fixed_line_pattern() {
                trace!("Number '{national_number}': fixed-line and mobile patterns equal, number is fixed-line or mobile");
                return PhoneNumberType::FixedLineOrMobile;
            } else if self.is_number_matching_desc(national_number, &metadata.mobile) {
                trace!("Number '{national_number}': Fixed-line and mobile patterns differ, but number is still fixed-line or mobile");
                return PhoneNumberType::FixedLineOrMobile;
            }
            trace!("Number '{national_number}' is a fixed line number.");
            return PhoneNumberType::FixedLine;
        }
        // Otherwise, test to see if the number is mobile. Only do this if certain
        // that the patterns for mobile and fixed line aren't the same.
        if !metadata.same_mobile_and_fixed_line_pattern()
            && self.is_number_matching_desc(national_number, &metadata.mobile)
        {
            trace!("Number '{national_number}' is a mobile number.");
            return PhoneNumberType::Mobile;
        }
        trace!("Number '{national_number}' type unknown - doesn't match any specific number type pattern.");
        PhoneNumberType::Unknown
    }

    fn is_number_matching_desc(&self, national_number: &str, number_desc: &PhoneNumberDesc) -> bool {
        // Type descriptions always list their lengths once loaded; only a
        // general description may leave them out, and then any length goes.
        let actual_length = national_number.len() as i32;
        if !number_desc.possible_length.is_empty()
            && !number_desc.possible_length.contains(&actual_length)
        {
            return false;
        }
        helper_functions::is_match(self.matcher_api.as_ref(), national_number, number_desc)
    }

    /// Checks whether a number has a length that is possible in its region,
    /// without checking the number patterns.
    pub fn is_possible_number(&self, phone_number: &PhoneNumber) -> bool {
        self.is_possible_number_with_reason(phone_number).is_ok()
    }

    pub fn is_possible_number_with_reason(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<NumberLengthType, NumberLengthError> {
        self.is_possible_number_for_type_with_reason(phone_number, PhoneNumberType::Unknown)
    }

    /// Length check against the possible lengths of one number type. A type
    /// the region has no numbers of gives `InvalidLength`.
    pub fn is_possible_number_for_type_with_reason(
        &self,
        phone_number: &PhoneNumber,
        number_type: PhoneNumberType,
    ) -> Result<NumberLengthType, NumberLengthError> {
        let country_calling_code = phone_number.country_code();
        let region_code = self.get_region_code_for_country_code(country_calling_code);
        let Some(metadata) = self
            .metadata
            .metadata_for_region_or_calling_code(country_calling_code, region_code)
        else {
            return Err(NumberLengthError::InvalidCountryCode);
        };
        test_number_length(phone_number.national_number(), metadata, number_type)
    }

    /// Returns false for numbers that can only be dialled from within their
    /// own region, such as some toll-free numbers.
    pub fn can_be_internationally_dialled(&self, phone_number: &PhoneNumber) -> bool {
        let region_code = self.get_region_code_for_number(phone_number);
        let Some(metadata) = self.metadata.lookup(region_code) else {
            // Note numbers belonging to non-geographical entities (e.g. +800 numbers)
            // are always internationally diallable, and will be caught here.
            return true;
        };
        !self.is_number_matching_desc(
            phone_number.national_number(),
            &metadata.no_international_dialling,
        )
    }

    /// Formats a phone number in the specified format using default rules.
    ///
    /// Numbers without a matching formatting rule are written as ungrouped
    /// digits.
    pub fn format(&self, phone_number: &PhoneNumber, number_format: PhoneNumberFormat) -> String {
        let country_calling_code = phone_number.country_code();
        let national_significant_number = phone_number.national_number();
        let mut formatted_number = national_significant_number.to_owned();

        if matches!(number_format, PhoneNumberFormat::E164) {
            // Early exit for E164 case since no formatting of the national
            // number needs to be applied. Extensions are not formatted.
            prefix_number_with_country_calling_code(
                country_calling_code,
                PhoneNumberFormat::E164,
                &mut formatted_number,
            );
            return formatted_number;
        }
        // Note here that all NANPA formatting rules are contained by US, so we use
        // that to format NANPA numbers.
        let region_code = self.get_region_code_for_country_code(country_calling_code);
        let Some(metadata) = self
            .metadata
            .metadata_for_region_or_calling_code(country_calling_code, region_code)
        else {
            warn!("No metadata for country calling code {}", country_calling_code);
            return formatted_number;
        };

        match self.format_nsn(national_significant_number, metadata, number_format) {
            Ok(Cow::Owned(s)) => formatted_number = s,
            Ok(Cow::Borrowed(_)) => {}
            Err(err) => error!(
                "Could not format number {} for region {}: {}",
                phone_number, region_code, err
            ),
        }
        if let Some(formatted_extension) =
            Self::get_formatted_extension(phone_number, metadata, number_format)
        {
            formatted_number.push_str(&formatted_extension);
        }
        prefix_number_with_country_calling_code(
            country_calling_code,
            number_format,
            &mut formatted_number,
        );
        formatted_number
    }

    fn format_nsn<'b>(
        &self,
        number: &'b str,
        metadata: &PhoneMetadata,
        number_format: PhoneNumberFormat,
    ) -> Result<Cow<'b, str>, InvalidRegexError> {
        // When the intl_number_formats exists, we use that to format national number
        // for the INTERNATIONAL format instead of using the number_formats.
        let available_formats = if metadata.intl_number_format.is_empty()
            || number_format == PhoneNumberFormat::National
        {
            &metadata.number_format
        } else {
            &metadata.intl_number_format
        };
        let formatting_pattern =
            self.choose_formatting_pattern_for_number(available_formats, number)?;
        if let Some(formatting_pattern) = formatting_pattern {
            self.format_nsn_using_pattern(number, formatting_pattern, number_format)
        } else {
            Ok(Cow::Borrowed(number))
        }
    }

    fn choose_formatting_pattern_for_number<'b>(
        &self,
        available_formats: &'b [NumberFormat],
        national_number: &str,
    ) -> Result<Option<&'b NumberFormat>, InvalidRegexError> {
        for format in available_formats {
            // We always use the last leading_digits_pattern, as it is the most
            // detailed.
            if let Some(last) = format.leading_digits_pattern.last()
                && !self
                    .reg_exps
                    .regexp_cache
                    .get_regex(last)?
                    .matches_start(national_number)
            {
                continue;
            }
            let pattern_to_match = self
                .reg_exps
                .regexp_cache
                .get_anchored_regex(format.pattern())?;
            if pattern_to_match.is_match(national_number) {
                return Ok(Some(format));
            }
        }
        Ok(None)
    }

    fn format_nsn_using_pattern<'b>(
        &self,
        national_number: &'b str,
        formatting_pattern: &NumberFormat,
        number_format: PhoneNumberFormat,
    ) -> Result<Cow<'b, str>, InvalidRegexError> {
        let mut number_format_rule = Cow::Borrowed(formatting_pattern.format());
        // Use the national prefix formatting rule for the first group.
        let national_prefix_formatting_rule = formatting_pattern.national_prefix_formatting_rule();
        if matches!(number_format, PhoneNumberFormat::National)
            && !national_prefix_formatting_rule.is_empty()
        {
            // Apply the national_prefix_formatting_rule as the formatting_pattern
            // contains only information on how the national significant number
            // should be formatted at this point.
            if let Cow::Owned(s) = self
                .reg_exps
                .first_group_capturing_pattern
                .replace(&number_format_rule, national_prefix_formatting_rule)
            {
                number_format_rule = Cow::Owned(s);
            }
        }

        let pattern_to_match = self
            .reg_exps
            .regexp_cache
            .get_anchored_regex(formatting_pattern.pattern())?;

        let mut formatted_number =
            pattern_to_match.replace(national_number, number_format_rule.as_ref());

        if matches!(number_format, PhoneNumberFormat::RFC3966) {
            // First consume any leading punctuation, if any was present.
            if let Some(rest) = self
                .reg_exps
                .separator_pattern
                .consume_start(&formatted_number)
            {
                formatted_number = Cow::Owned(rest.to_string());
            }
            // Then replace all separators with a "-".
            if let Cow::Owned(s) = self
                .reg_exps
                .separator_pattern
                .replace_all(&formatted_number, "-")
            {
                formatted_number = Cow::Owned(s)
            }
        }
        Ok(formatted_number)
    }

    // Returns the formatted extension of a phone number, if the phone number had an
    // extension specified else None.
    fn get_formatted_extension(
        phone_number: &PhoneNumber,
        metadata: &PhoneMetadata,
        number_format: PhoneNumberFormat,
    ) -> Option<String> {
        let extension = phone_number.extension().filter(|ext| !ext.is_empty())?;

        let prefix = if matches!(number_format, PhoneNumberFormat::RFC3966) {
            RFC3966_EXTN_PREFIX
        } else if metadata.has_preferred_extn_prefix() {
            metadata.preferred_extn_prefix()
        } else {
            DEFAULT_EXTN_PREFIX
        };
        Some(fast_cat::concat_str!(prefix, extension))
    }

    /// Gets a valid fixed-line number for the specified region.
    pub fn get_example_number(&self, region_code: &str) -> Result<PhoneNumber, GetExampleNumberError> {
        self.get_example_number_for_type(region_code, PhoneNumberType::FixedLine)
    }

    /// Gets a valid number of the given type for the specified region.
    pub fn get_example_number_for_type(
        &self,
        region_code: &str,
        number_type: PhoneNumberType,
    ) -> Result<PhoneNumber, GetExampleNumberError> {
        let Some(metadata) = self.metadata.lookup(region_code) else {
            warn!("Invalid or unknown region code ({}) provided.", region_code);
            return Err(GetExampleNumberError::InvalidRegionCode);
        };
        self.example_number_from_metadata(metadata, number_type)
    }

    /// Gets a valid number for the specified non-geographical country calling
    /// code.
    pub fn get_example_number_for_non_geo_entity(
        &self,
        country_calling_code: i32,
    ) -> Result<PhoneNumber, GetExampleNumberError> {
        let Some(metadata) = self.metadata.lookup_non_geographical(country_calling_code) else {
            warn!(
                "Invalid or unknown country calling code provided: {}",
                country_calling_code
            );
            return Err(GetExampleNumberError::InvalidRegionCode);
        };
        SPECIFIC_TYPES_IN_ORDER
            .into_iter()
            .chain([PhoneNumberType::FixedLine, PhoneNumberType::Mobile])
            .find_map(|number_type| {
                self.example_number_from_metadata(metadata, number_type).ok()
            })
            .ok_or(GetExampleNumberError::NoExampleNumber)
    }

    fn example_number_from_metadata(
        &self,
        metadata: &PhoneMetadata,
        number_type: PhoneNumberType,
    ) -> Result<PhoneNumber, GetExampleNumberError> {
        let desc = get_number_desc_by_type(metadata, number_type);
        if !desc.has_example_number() {
            return Err(GetExampleNumberError::NoExampleNumber);
        }
        Ok(self.create_number(metadata.country_code(), desc.example_number())?)
    }
}
