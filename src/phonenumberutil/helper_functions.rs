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

use std::collections::{HashMap, HashSet};

use strum::IntoEnumIterator;

use crate::{
    interfaces::MatcherApi,
    proto_gen::phonemetadata::{PhoneMetadata, PhoneNumberDesc},
};

use super::{
    NumberLengthType, PhoneNumberFormat, PhoneNumberType,
    errors::NumberLengthError,
    helper_constants::{
        DIGITS, FIRST_GROUP_PLACEHOLDER, NATIONAL_PREFIX_PLACEHOLDER, NO_NUMBERS_POSSIBLE_LENGTH,
        OPTIONAL_EXT_SUFFIX, PLUS_SIGN, POSSIBLE_CHARS_AFTER_EXT_LABEL,
        POSSIBLE_SEPARATORS_BETWEEN_NUMBER_AND_EXT_LABEL, RFC3966_EXTN_PREFIX, RFC3966_PREFIX,
    },
};

/// Labels that leave no doubt an extension follows ("ext", "extn", "anexo",
/// full-width and Cyrillic spellings). Accented letters are accepted both
/// precomposed and with a combining accent.
const EXPLICIT_EXT_LABELS: &str = "(?:e?xt(?:ensi(?:o\u{0301}?|\u{00F3}))?n?|(?:\u{FF45})?\u{FF58}\u{FF54}(?:\u{FF4E})?|\u{0434}\u{043E}\u{0431}|anexo)";
/// Single characters and short words that may also mean something else.
const AMBIGUOUS_EXT_LABELS: &str = "(?:[x\u{FF58}#\u{FF03}~\u{FF5E}]|int|\u{FF49}\u{FF4E}\u{FF54})";
/// ",," and ";" make diallers send the extension once the call connects.
const AUTO_DIALLING_EXT_LABELS: &str = "(?:,{2}|;)";
const ONLY_COMMAS_EXT_LABEL: &str = "(?:,)+";
/// Like the separators before an ext label, minus the comma, which is a
/// label of its own here.
const SEPARATORS_BEFORE_AUTO_DIALLING_LABEL: &str = "[ \u{00A0}\t]*";

// The fewer doubts a label leaves, the more digits may follow it.
const MAX_EXT_DIGITS_AFTER_EXPLICIT_LABEL: u32 = 20;
const MAX_EXT_DIGITS_AFTER_AUTO_DIALLING_LABEL: u32 = 15;
const MAX_EXT_DIGITS_AFTER_AMBIGUOUS_LABEL: u32 = 9;
const MAX_EXT_DIGITS_BEFORE_HASH: u32 = 6;

/// Returns the description of one number type. `FixedLineOrMobile` reads
/// the fixed-line description and `Unknown` the general one.
pub(super) fn get_number_desc_by_type(
    metadata: &PhoneMetadata,
    phone_number_type: PhoneNumberType,
) -> &PhoneNumberDesc {
    match phone_number_type {
        PhoneNumberType::PremiumRate => &metadata.premium_rate,
        PhoneNumberType::TollFree => &metadata.toll_free,
        PhoneNumberType::Mobile => &metadata.mobile,
        PhoneNumberType::FixedLine | PhoneNumberType::FixedLineOrMobile => &metadata.fixed_line,
        PhoneNumberType::SharedCost => &metadata.shared_cost,
        PhoneNumberType::VoIP => &metadata.voip,
        PhoneNumberType::PersonalNumber => &metadata.personal_number,
        PhoneNumberType::Pager => &metadata.pager,
        PhoneNumberType::UAN => &metadata.uan,
        PhoneNumberType::VoiceMail => &metadata.voicemail,
        PhoneNumberType::Unknown => &metadata.general_desc,
    }
}

/// Puts the country calling code in front of an already formatted national
/// number, in the shape each style wants. National numbers stay as they are.
pub(super) fn prefix_number_with_country_calling_code(
    country_calling_code: i32,
    number_format: PhoneNumberFormat,
    formatted_number: &mut String,
) {
    let mut buf = itoa::Buffer::new();
    let code = buf.format(country_calling_code);
    let national = formatted_number.as_str();
    let prefixed = match number_format {
        PhoneNumberFormat::National => return,
        PhoneNumberFormat::E164 => fast_cat::concat_str!(PLUS_SIGN, code, national),
        PhoneNumberFormat::International => {
            fast_cat::concat_str!(PLUS_SIGN, code, " ", national)
        }
        PhoneNumberFormat::RFC3966 => {
            fast_cat::concat_str!(RFC3966_PREFIX, PLUS_SIGN, code, "-", national)
        }
    };
    *formatted_number = prefixed;
}

/// A capturing group of one to `max_length` digits.
pub(super) fn extn_digits(max_length: u32) -> String {
    let mut buf = itoa::Buffer::new();
    fast_cat::concat_str!("([", DIGITS, "]{1,", buf.format(max_length), "})")
}

/// Builds the pattern that finds an extension at the end of a number. Every
/// alternative captures the extension digits in its only group, so callers
/// take the first group that matched.
pub(super) fn create_extn_pattern() -> String {
    let labelled = |separators: &str, labels: &str, max_digits: u32| {
        fast_cat::concat_str!(
            separators,
            labels,
            POSSIBLE_CHARS_AFTER_EXT_LABEL,
            &extn_digits(max_digits),
            OPTIONAL_EXT_SUFFIX
        )
    };
    [
        fast_cat::concat_str!(
            RFC3966_EXTN_PREFIX,
            &extn_digits(MAX_EXT_DIGITS_AFTER_EXPLICIT_LABEL)
        ),
        labelled(
            POSSIBLE_SEPARATORS_BETWEEN_NUMBER_AND_EXT_LABEL,
            EXPLICIT_EXT_LABELS,
            MAX_EXT_DIGITS_AFTER_EXPLICIT_LABEL,
        ),
        labelled(
            POSSIBLE_SEPARATORS_BETWEEN_NUMBER_AND_EXT_LABEL,
            AMBIGUOUS_EXT_LABELS,
            MAX_EXT_DIGITS_AFTER_AMBIGUOUS_LABEL,
        ),
        // "- 503#"
        fast_cat::concat_str!("[- ]+", &extn_digits(MAX_EXT_DIGITS_BEFORE_HASH), "#"),
        labelled(
            SEPARATORS_BEFORE_AUTO_DIALLING_LABEL,
            AUTO_DIALLING_EXT_LABELS,
            MAX_EXT_DIGITS_AFTER_AUTO_DIALLING_LABEL,
        ),
        labelled(
            SEPARATORS_BEFORE_AUTO_DIALLING_LABEL,
            ONLY_COMMAS_EXT_LABEL,
            MAX_EXT_DIGITS_AFTER_AMBIGUOUS_LABEL,
        ),
    ]
    .join("|")
}

/// Maps every character of `phone_number` through `replacements` (looked up
/// in upper case). Characters without a replacement are dropped when
/// `remove_non_matches` is set and kept otherwise.
pub(super) fn normalize_helper(
    replacements: &HashMap<char, char>,
    remove_non_matches: bool,
    phone_number: &str,
) -> String {
    phone_number
        .chars()
        .filter_map(|phone_char| match replacements.get(&phone_char.to_ascii_uppercase()) {
            Some(replacement) => Some(*replacement),
            None => (!remove_non_matches).then_some(phone_char),
        })
        .collect()
}

/// Whether the region has numbers of the type this description stands for.
/// The metadata store leaves types without a pattern with the single length
/// [`NO_NUMBERS_POSSIBLE_LENGTH`].
pub(super) fn desc_has_numbers(desc: &PhoneNumberDesc) -> bool {
    !desc.national_number_pattern().is_empty()
        && !desc.possible_length.contains(&NO_NUMBERS_POSSIBLE_LENGTH)
}

/// The specific types the region has numbers of. Never includes
/// `FixedLineOrMobile` or `Unknown`.
pub(super) fn get_supported_types_for_metadata(metadata: &PhoneMetadata) -> HashSet<PhoneNumberType> {
    PhoneNumberType::iter()
        .filter(|number_type| {
            !matches!(
                number_type,
                PhoneNumberType::FixedLineOrMobile | PhoneNumberType::Unknown
            )
        })
        .filter(|number_type| desc_has_numbers(get_number_desc_by_type(metadata, *number_type)))
        .collect()
}

/// Sorted possible and local-only lengths of a number type.
/// `FixedLineOrMobile` merges the fixed-line and mobile lengths, skipping a
/// side the region has no numbers of. Empty when the type has no numbers.
fn possible_lengths_for_type(
    metadata: &PhoneMetadata,
    phone_number_type: PhoneNumberType,
) -> (Vec<i32>, Vec<i32>) {
    let descs = match phone_number_type {
        PhoneNumberType::FixedLineOrMobile => vec![&*metadata.fixed_line, &*metadata.mobile],
        other => vec![get_number_desc_by_type(metadata, other)],
    };
    let mut possible_lengths = Vec::new();
    let mut local_lengths = Vec::new();
    for desc in descs.into_iter().filter(|desc| desc_has_numbers(desc)) {
        possible_lengths.extend_from_slice(&desc.possible_length);
        local_lengths.extend_from_slice(&desc.possible_length_local_only);
    }
    possible_lengths.sort_unstable();
    possible_lengths.dedup();
    local_lengths.sort_unstable();
    local_lengths.dedup();
    (possible_lengths, local_lengths)
}

/// Checks the length of a national number against the possible lengths of a
/// number type. A type the region has no numbers of gives `InvalidLength`.
pub(super) fn test_number_length(
    phone_number: &str,
    phone_metadata: &PhoneMetadata,
    phone_number_type: PhoneNumberType,
) -> Result<NumberLengthType, NumberLengthError> {
    let (possible_lengths, local_lengths) =
        possible_lengths_for_type(phone_metadata, phone_number_type);
    let (Some(&shortest), Some(&longest)) = (possible_lengths.first(), possible_lengths.last())
    else {
        return Err(NumberLengthError::InvalidLength);
    };

    let actual_length = phone_number.len() as i32;
    if local_lengths.contains(&actual_length) {
        Ok(NumberLengthType::IsPossibleLocalOnly)
    } else if possible_lengths.contains(&actual_length) {
        Ok(NumberLengthType::IsPossible)
    } else if actual_length < shortest {
        Err(NumberLengthError::TooShort)
    } else if actual_length > longest {
        Err(NumberLengthError::TooLong)
    } else {
        Err(NumberLengthError::InvalidLength)
    }
}

/// Length check against the general description of the region.
pub(super) fn test_number_length_with_unknown_type(
    phone_number: &str,
    phone_metadata: &PhoneMetadata,
) -> Result<NumberLengthType, NumberLengthError> {
    test_number_length(phone_number, phone_metadata, PhoneNumberType::Unknown)
}

/// Full match of a national number against a description's pattern. Does
/// not look at the possible lengths.
pub(super) fn is_match(
    matcher_api: &dyn MatcherApi,
    number: &str,
    number_desc: &PhoneNumberDesc,
) -> bool {
    matcher_api.match_national_number(number, number_desc, false)
}

/// Expands the `$NP` and `$FG` placeholders of a national prefix formatting
/// rule. Returns `None` when the rule needs a national prefix the region does
/// not have.
pub(super) fn expand_national_prefix_formatting_rule(
    rule: &str,
    national_prefix: &str,
) -> Option<String> {
    if national_prefix.is_empty() && rule.contains(NATIONAL_PREFIX_PLACEHOLDER) {
        return None;
    }
    Some(
        rule.replace(NATIONAL_PREFIX_PLACEHOLDER, national_prefix)
            .replace(FIRST_GROUP_PLACEHOLDER, "$1"),
    )
}
