// Copyright (C) 2009 The Libphonenumber Authors
// Copyright (C) 2025 The Kashin Vladislav (Rust adaptation author)
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


use std::collections::HashMap;

use regex::Regex;

use crate::{
    phonenumberutil::{
        helper_constants::{
            CAPTURE_UP_TO_SECOND_NUMBER_START, DIGITS, MIN_LENGTH_FOR_NSN, PLUS_CHARS, STAR_SIGN,
            VALID_ALPHA, VALID_PUNCTUATION,
        },
        helper_functions::create_extn_pattern,
    },
    regexp_cache::RegexCache,
};

pub(super) struct PhoneNumberRegExpsAndMappings {
    pub regexp_cache: RegexCache,

    /// These mappings map a character (key) to a specific digit that should
    /// replace it for normalization purposes.
    pub alpha_mappings: HashMap<char, char>,
    /// For performance reasons, store a map of combining alpha_mappings with ASCII
    /// digits.
    pub alpha_phone_mappings: HashMap<char, char>,

    /// Regular expression of acceptable characters that may start a phone number
    /// for the purposes of parsing. This allows us to strip away meaningless
    /// prefixes to phone numbers that may be mistakenly given to us. This consists
    /// of digits and the plus symbol. It does not contain alpha characters,
    /// although they may be used later in the number.
    pub valid_start_char_pattern: Regex,

    /// Regular expression of valid characters before a marker that might indicate
    /// a second number.
    pub capture_up_to_second_number_start_pattern: Regex,

    /// Matches a single trailing character we want to remove: anything that is
    /// not a letter or a number. The hash character is retained, as it may
    /// signify the previous block was an extension.
    pub unwanted_end_char_pattern: Regex,

    /// Regular expression of groups of valid punctuation characters.
    pub separator_pattern: Regex,

    /// Regexp of all known extension prefixes used by different regions followed
    /// by 1 or more valid digits, for use when parsing.
    pub extn_pattern: Regex,

    /// Regular expression of viable phone numbers. Checks we have at least three
    /// leading digits, and only valid punctuation, alpha characters and digits
    /// in the phone number, optionally followed by an extension. Two bare digits
    /// are accepted too, but only without punctuation. Multiple plus signs are
    /// allowed at the start.
    pub valid_phone_number_pattern: Regex,

    /// We use this pattern to check if the phone number has at least three letters
    /// in it - if so, then we treat it as a number where some phone-number digits
    /// are represented by letters.
    pub valid_alpha_phone_pattern: Regex,

    pub first_group_capturing_pattern: Regex,

    pub plus_chars_pattern: Regex,
}

impl PhoneNumberRegExpsAndMappings {
    fn initialize_regexp_mappings(&mut self) {
        let mut alpha_map = HashMap::with_capacity(26);
        for (letters, digit) in [
            ("ABC", '2'),
            ("DEF", '3'),
            ("GHI", '4'),
            ("JKL", '5'),
            ("MNO", '6'),
            ("PQRS", '7'),
            ("TUV", '8'),
            ("WXYZ", '9'),
        ] {
            for letter in letters.chars() {
                alpha_map.insert(letter, digit);
            }
        }
        // only uppercase keys: lookups upper-case the character first
        self.alpha_mappings = alpha_map;

        let mut combined_map = HashMap::with_capacity(36);
        combined_map.extend(self.alpha_mappings.iter());
        for d in '0'..='9' {
            combined_map.insert(d, d);
        }
        self.alpha_phone_mappings = combined_map;
    }

    pub fn new() -> Self {
        let extn_patterns_for_parsing = create_extn_pattern();
        // it'll be initialized only once, so we can use slow format!
        let valid_phone_number = format!(
            // the 2-digits alternative goes last so the full number is tried first
            "[{}]*(?:[{}{}]*{}){{3,}}[{}{}{}{}]*|{}{{{}}}",
            PLUS_CHARS,
            VALID_PUNCTUATION, STAR_SIGN, DIGITS,
            VALID_PUNCTUATION, STAR_SIGN, DIGITS, VALID_ALPHA,
            DIGITS, MIN_LENGTH_FOR_NSN,
        );

        let mut instance = Self {
            regexp_cache: RegexCache::with_capacity(128),
            alpha_mappings: Default::default(),
            alpha_phone_mappings: Default::default(),
            valid_start_char_pattern: Regex::new(&format!("[{}{}]", PLUS_CHARS, DIGITS)).unwrap(),
            capture_up_to_second_number_start_pattern: Regex::new(CAPTURE_UP_TO_SECOND_NUMBER_START)
                .unwrap(),
            unwanted_end_char_pattern: Regex::new("^[^\\p{N}\\p{L}#]$").unwrap(),
            separator_pattern: Regex::new(&format!("[{}]+", VALID_PUNCTUATION)).unwrap(),
            extn_pattern: Regex::new(&format!("(?i)(?:{})$", &extn_patterns_for_parsing)).unwrap(),
            valid_phone_number_pattern: Regex::new(&format!(
                "(?i)^(?:{})(?:{})?$",
                &valid_phone_number, &extn_patterns_for_parsing
            ))
            .unwrap(),
            valid_alpha_phone_pattern: Regex::new("(?:.*?[A-Za-z]){3}.*").unwrap(),
            // Matches the first group reference of a format, which is where the
            // national prefix formatting rule is substituted.
            first_group_capturing_pattern: Regex::new("(\\$\\d)").unwrap(),
            plus_chars_pattern: Regex::new(&format!("[{}]+", PLUS_CHARS)).unwrap(),
        };
        instance.initialize_regexp_mappings();
        instance
    }
}

#[cfg(test)]
mod tests {
    use super::PhoneNumberRegExpsAndMappings;

    #[test]
    fn check_regexps_are_compiling() {
        PhoneNumberRegExpsAndMappings::new();
    }

    #[test]
    fn valid_phone_number_pattern_accepts_punctuation_and_extensions() {
        let reg_exps = PhoneNumberRegExpsAndMappings::new();
        let pattern = &reg_exps.valid_phone_number_pattern;
        assert!(pattern.is_match("+44 (0) 1234-567 890"));
        assert!(pattern.is_match("1800 MICROSOFT"));
        assert!(pattern.is_match("12"));
        assert!(pattern.is_match("650 253 0000 ext. 4567"));
        assert!(!pattern.is_match("1"));
        assert!(!pattern.is_match("1-2"));
        assert!(!pattern.is_match("foo"));
    }

    #[test]
    fn alpha_mappings_follow_keypad() {
        let reg_exps = PhoneNumberRegExpsAndMappings::new();
        assert_eq!(reg_exps.alpha_mappings.get(&'S'), Some(&'7'));
        assert_eq!(reg_exps.alpha_mappings.get(&'Z'), Some(&'9'));
        assert_eq!(reg_exps.alpha_phone_mappings.get(&'0'), Some(&'0'));
        assert_eq!(reg_exps.alpha_mappings.get(&'s'), None);
    }
}
