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

use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, error};
use regex::Regex;

use crate::{
    i18n,
    phonenumberutil::{
        errors::MetadataLoadError,
        helper_constants::{NO_NUMBERS_POSSIBLE_LENGTH, REGION_CODE_FOR_NON_GEO_ENTITY},
        helper_functions::expand_national_prefix_formatting_rule,
    },
    proto_gen::phonemetadata::{PhoneMetadata, PhoneMetadataCollection, PhoneNumberDesc},
    regexp_cache::InvalidRegexError,
};

/// Immutable, validated index over the numbering-plan metadata.
///
/// Built once from a [`PhoneMetadataCollection`]; every pattern it holds is
/// known to compile and every entry carries an id, a country calling code and
/// a general description.
#[derive(Debug)]
pub struct MetadataStore {
    /// A mapping from a country calling code to the region codes which denote
    /// the regions represented by that country calling code. Regions under
    /// NANPA share the country calling code 1; the main region for a code is
    /// always first. Sorted by calling code for binary search.
    country_calling_code_to_region_code_map: Vec<(i32, Vec<String>)>,

    /// A mapping from a region code to a PhoneMetadata for that region.
    region_to_metadata_map: HashMap<String, PhoneMetadata>,

    /// A mapping from a country calling code for a non-geographical entity to the
    /// PhoneMetadata for that country calling code. Examples of the country
    /// calling codes include 800 (International Toll Free Service) and 808
    /// (International Shared Cost Service).
    country_code_to_non_geographical_metadata_map: HashMap<i32, PhoneMetadata>,
}

impl MetadataStore {
    /// Parses a `PhoneMetadataCollection` written in protobuf text format.
    /// Lines starting with `#` are comments.
    pub fn from_text_format(text: &str) -> Result<Self, MetadataLoadError> {
        let without_comments = text
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .collect::<Vec<_>>()
            .join("\n");
        let collection =
            protobuf::text_format::parse_from_str::<PhoneMetadataCollection>(&without_comments)
                .map_err(|err| MetadataLoadError::Malformed(err.to_string()))?;
        Self::from_collection(collection)
    }

    pub fn from_collection(collection: PhoneMetadataCollection) -> Result<Self, MetadataLoadError> {
        let mut region_to_metadata_map = HashMap::new();
        let mut country_code_to_non_geographical_metadata_map = HashMap::new();
        // Storing data in a temporary map to make it easier to find other regions
        // that share a country calling code when inserting data.
        let mut country_calling_code_to_region_map = HashMap::<i32, VecDeque<String>>::new();

        for mut metadata in collection.metadata {
            check_required_fields(&metadata)?;
            let region_code = metadata.id().to_ascii_uppercase();
            if i18n::RegionCode::get_unknown() == region_code {
                debug!("Skipping metadata for the unknown region");
                continue;
            }
            check_patterns(&region_code, &metadata)?;
            normalize_metadata(&mut metadata);

            let country_calling_code = metadata.country_code();
            let main_country_for_code = metadata.main_country_for_code();
            if REGION_CODE_FOR_NON_GEO_ENTITY == region_code {
                if country_code_to_non_geographical_metadata_map
                    .insert(country_calling_code, metadata)
                    .is_some()
                {
                    return Err(MetadataLoadError::DuplicateRegion(format!(
                        "{}/{}",
                        region_code, country_calling_code
                    )));
                }
            } else if region_to_metadata_map
                .insert(region_code.clone(), metadata)
                .is_some()
            {
                return Err(MetadataLoadError::DuplicateRegion(region_code));
            }

            let regions = country_calling_code_to_region_map
                .entry(country_calling_code)
                .or_default();
            if main_country_for_code {
                regions.push_front(region_code);
            } else {
                regions.push_back(region_code);
            }
        }

        let mut country_calling_code_to_region_code_map = country_calling_code_to_region_map
            .into_iter()
            .map(|(code, regions)| (code, Vec::from(regions)))
            .collect::<Vec<_>>();
        // Sort all the pairs in ascending order according to country calling code.
        country_calling_code_to_region_code_map.sort_by_key(|(code, _)| *code);

        debug!(
            "Loaded metadata for {} regions and {} non-geographical entities",
            region_to_metadata_map.len(),
            country_code_to_non_geographical_metadata_map.len()
        );
        Ok(Self {
            country_calling_code_to_region_code_map,
            region_to_metadata_map,
            country_code_to_non_geographical_metadata_map,
        })
    }

    /// Returns the metadata of a region. The region code is case-insensitive.
    pub fn lookup(&self, region_code: &str) -> Option<&PhoneMetadata> {
        if let Some(metadata) = self.region_to_metadata_map.get(region_code) {
            return Some(metadata);
        }
        self.region_to_metadata_map
            .get(&region_code.to_ascii_uppercase())
    }

    /// Returns the regions that use the given country calling code, main
    /// region first. Non-geographical entities are listed as "001". Empty when
    /// the code is unknown.
    pub fn lookup_by_country_code(&self, country_calling_code: i32) -> &[String] {
        self.country_calling_code_to_region_code_map
            .binary_search_by_key(&country_calling_code, |(code, _)| *code)
            .map(|index| self.country_calling_code_to_region_code_map[index].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn lookup_non_geographical(&self, country_calling_code: i32) -> Option<&PhoneMetadata> {
        self.country_code_to_non_geographical_metadata_map
            .get(&country_calling_code)
    }

    pub fn metadata_for_region_or_calling_code(
        &self,
        country_calling_code: i32,
        region_code: &str,
    ) -> Option<&PhoneMetadata> {
        if REGION_CODE_FOR_NON_GEO_ENTITY == region_code {
            self.lookup_non_geographical(country_calling_code)
        } else {
            self.lookup(region_code)
        }
    }

    pub fn supported_regions(&self) -> impl Iterator<Item = &str> {
        self.region_to_metadata_map.keys().map(String::as_str)
    }

    pub fn supported_calling_codes(&self) -> HashSet<i32> {
        self.country_calling_code_to_region_code_map
            .iter()
            .map(|(code, _)| *code)
            .collect()
    }

    pub fn supported_global_network_calling_codes(&self) -> HashSet<i32> {
        self.country_code_to_non_geographical_metadata_map
            .keys()
            .copied()
            .collect()
    }
}

fn check_required_fields(metadata: &PhoneMetadata) -> Result<(), MetadataLoadError> {
    let region = metadata.id();
    let missing = |field: &'static str| MetadataLoadError::MissingField {
        region: region.to_owned(),
        field,
    };
    if region.is_empty() {
        return Err(missing("id"));
    }
    if !metadata.has_country_code() || metadata.country_code() <= 0 {
        return Err(missing("country_code"));
    }
    if metadata.general_desc.national_number_pattern().is_empty() {
        return Err(missing("general_desc.national_number_pattern"));
    }
    Ok(())
}

fn check_patterns(region_code: &str, metadata: &PhoneMetadata) -> Result<(), MetadataLoadError> {
    let descs: [&PhoneNumberDesc; 12] = [
        &metadata.general_desc,
        &metadata.fixed_line,
        &metadata.mobile,
        &metadata.toll_free,
        &metadata.premium_rate,
        &metadata.shared_cost,
        &metadata.personal_number,
        &metadata.voip,
        &metadata.pager,
        &metadata.uan,
        &metadata.voicemail,
        &metadata.no_international_dialling,
    ];
    let formats = metadata
        .number_format
        .iter()
        .chain(metadata.intl_number_format.iter());

    let patterns = descs
        .into_iter()
        .map(|desc| desc.national_number_pattern())
        .chain([
            metadata.international_prefix(),
            metadata.national_prefix_for_parsing(),
            metadata.leading_digits(),
        ])
        .chain(formats.flat_map(|format| {
            std::iter::once(format.pattern())
                .chain(format.leading_digits_pattern.iter().map(String::as_str))
        }));

    for pattern in patterns.filter(|pattern| !pattern.is_empty()) {
        if let Err(err) = Regex::new(pattern) {
            error!("Metadata for {} holds an invalid pattern {:?}: {}", region_code, pattern, err);
            return Err(MetadataLoadError::InvalidPattern {
                region: region_code.to_owned(),
                source: InvalidRegexError::from(err),
            });
        }
    }
    Ok(())
}

/// Resolves the shorthand the metadata table allows so lookups never have to.
fn normalize_metadata(metadata: &mut PhoneMetadata) {
    let national_prefix = metadata.national_prefix().to_owned();
    if !metadata.has_national_prefix_for_parsing() && !national_prefix.is_empty() {
        metadata.set_national_prefix_for_parsing(regex::escape(&national_prefix));
    }

    let territory_rule = metadata.national_prefix_formatting_rule().to_owned();
    for number_format in metadata.number_format.iter_mut() {
        let rule = if number_format.has_national_prefix_formatting_rule() {
            number_format.national_prefix_formatting_rule().to_owned()
        } else {
            territory_rule.clone()
        };
        match expand_national_prefix_formatting_rule(&rule, &national_prefix) {
            Some(expanded) if !expanded.is_empty() => {
                number_format.set_national_prefix_formatting_rule(expanded)
            }
            _ => number_format.clear_national_prefix_formatting_rule(),
        }
    }

    let general_desc = metadata.general_desc.get_or_default().clone();
    for desc in [
        &mut metadata.fixed_line,
        &mut metadata.mobile,
        &mut metadata.toll_free,
        &mut metadata.premium_rate,
        &mut metadata.shared_cost,
        &mut metadata.personal_number,
        &mut metadata.voip,
        &mut metadata.pager,
        &mut metadata.uan,
        &mut metadata.voicemail,
    ] {
        complete_type_desc(desc.mut_or_insert_default(), &general_desc);
    }

    if !metadata.has_same_mobile_and_fixed_line_pattern() {
        let fixed_line_pattern = metadata.fixed_line.national_number_pattern();
        let same_pattern = !fixed_line_pattern.is_empty()
            && fixed_line_pattern == metadata.mobile.national_number_pattern();
        metadata.set_same_mobile_and_fixed_line_pattern(same_pattern);
    }
}

/// The table leaves out the number types a region has none of, and lets a
/// type reuse the general lengths by listing none. After this every type
/// description lists its lengths, and one without a pattern lists only
/// [`NO_NUMBERS_POSSIBLE_LENGTH`].
fn complete_type_desc(desc: &mut PhoneNumberDesc, general_desc: &PhoneNumberDesc) {
    if desc.national_number_pattern().is_empty() {
        desc.possible_length = vec![NO_NUMBERS_POSSIBLE_LENGTH];
        desc.possible_length_local_only.clear();
    } else if desc.possible_length.is_empty() {
        desc.possible_length = general_desc.possible_length.clone();
        if desc.possible_length_local_only.is_empty() {
            desc.possible_length_local_only = general_desc.possible_length_local_only.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        phonenumberutil::{
            errors::MetadataLoadError, helper_constants::NO_NUMBERS_POSSIBLE_LENGTH,
        },
        proto_gen::phonemetadata::{NumberFormat, PhoneMetadata, PhoneMetadataCollection},
    };

    use super::MetadataStore;

    fn region(id: &str, country_code: i32, general_pattern: &str) -> PhoneMetadata {
        let mut metadata = PhoneMetadata::new();
        metadata.set_id(id.to_owned());
        metadata.set_country_code(country_code);
        metadata
            .general_desc
            .mut_or_insert_default()
            .set_national_number_pattern(general_pattern.to_owned());
        metadata
    }

    fn collection(entries: Vec<PhoneMetadata>) -> PhoneMetadataCollection {
        let mut collection = PhoneMetadataCollection::new();
        collection.metadata = entries;
        collection
    }

    #[test]
    fn main_country_is_listed_first() {
        let mut main = region("US", 1, "\\d{10}");
        main.set_main_country_for_code(true);
        let store = MetadataStore::from_collection(collection(vec![
            region("CA", 1, "\\d{10}"),
            main,
            region("BS", 1, "\\d{10}"),
        ]))
        .unwrap();

        assert_eq!(store.lookup_by_country_code(1), ["US", "CA", "BS"]);
        assert!(store.lookup_by_country_code(2).is_empty());
    }

    #[test]
    fn lookup_ignores_case() {
        let store = MetadataStore::from_collection(collection(vec![region("GB", 44, "\\d{10}")]))
            .unwrap();
        assert!(store.lookup("gb").is_some());
        assert!(store.lookup("GB").is_some());
        assert!(store.lookup("FR").is_none());
    }

    #[test]
    fn non_geographical_entities() {
        let store = MetadataStore::from_collection(collection(vec![
            region("001", 800, "\\d{8}"),
            region("GB", 44, "\\d{10}"),
        ]))
        .unwrap();
        assert_eq!(store.lookup_by_country_code(800), ["001"]);
        assert!(store.lookup_non_geographical(800).is_some());
        assert!(store.lookup("001").is_none());
        assert!(store.metadata_for_region_or_calling_code(800, "001").is_some());
        assert_eq!(
            store.supported_global_network_calling_codes(),
            [800].into_iter().collect()
        );
        assert_eq!(
            store.supported_calling_codes(),
            [44, 800].into_iter().collect()
        );
        assert_eq!(store.supported_regions().collect::<Vec<_>>(), ["GB"]);
    }

    #[test]
    fn type_descriptions_are_completed() {
        let mut gb = region("GB", 44, "[17]\\d{8,9}");
        let general_desc = gb.general_desc.mut_or_insert_default();
        general_desc.possible_length = vec![9, 10];
        general_desc.possible_length_local_only = vec![6];
        gb.fixed_line
            .mut_or_insert_default()
            .set_national_number_pattern("1\\d{8,9}".to_owned());
        let mobile = gb.mobile.mut_or_insert_default();
        mobile.set_national_number_pattern("7\\d{9}".to_owned());
        mobile.possible_length = vec![10];

        let store = MetadataStore::from_collection(collection(vec![gb])).unwrap();
        let gb = store.lookup("GB").unwrap();
        assert_eq!(gb.fixed_line.possible_length, [9, 10]);
        assert_eq!(gb.fixed_line.possible_length_local_only, [6]);
        assert_eq!(gb.mobile.possible_length, [10]);
        assert!(gb.mobile.possible_length_local_only.is_empty());
        assert_eq!(gb.voicemail.possible_length, [NO_NUMBERS_POSSIBLE_LENGTH]);
        assert_eq!(gb.pager.possible_length, [NO_NUMBERS_POSSIBLE_LENGTH]);
        assert!(gb.pager.national_number_pattern().is_empty());
    }

    #[test]
    fn duplicate_region_is_rejected() {
        let result = MetadataStore::from_collection(collection(vec![
            region("GB", 44, "\\d{10}"),
            region("GB", 44, "\\d{9}"),
        ]));
        assert_eq!(
            result.unwrap_err(),
            MetadataLoadError::DuplicateRegion("GB".to_owned())
        );
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut without_code = region("GB", 44, "\\d{10}");
        without_code.clear_country_code();
        assert!(matches!(
            MetadataStore::from_collection(collection(vec![without_code])),
            Err(MetadataLoadError::MissingField { field: "country_code", .. })
        ));

        assert!(matches!(
            MetadataStore::from_collection(collection(vec![region("GB", 44, "")])),
            Err(MetadataLoadError::MissingField { field: "general_desc.national_number_pattern", .. })
        ));

        assert!(matches!(
            MetadataStore::from_collection(collection(vec![region("", 44, "\\d")])),
            Err(MetadataLoadError::MissingField { field: "id", .. })
        ));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut metadata = region("GB", 44, "\\d{10}");
        metadata
            .mobile
            .mut_or_insert_default()
            .set_national_number_pattern("7(\\d{9}".to_owned());
        assert!(matches!(
            MetadataStore::from_collection(collection(vec![metadata])),
            Err(MetadataLoadError::InvalidPattern { region, .. }) if region == "GB"
        ));
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert!(matches!(
            MetadataStore::from_text_format("metadata { id: "),
            Err(MetadataLoadError::Malformed(_))
        ));
    }

    #[test]
    fn text_format_with_comments_is_parsed() {
        let store = MetadataStore::from_text_format(
            r#"
            # a comment
            metadata {
              id: "GB"
              country_code: 44
              national_prefix: "0"
              national_prefix_formatting_rule: "$NP$FG"
              general_desc { national_number_pattern: "\\d{10}" possible_length: 10 }
              number_format { pattern: "(\\d{4})(\\d{6})" format: "$1 $2" }
            }
            "#,
        )
        .unwrap();
        let metadata = store.lookup("GB").unwrap();
        assert_eq!(metadata.general_desc.possible_length, [10]);
        assert_eq!(metadata.national_prefix_for_parsing(), "0");
        assert_eq!(
            metadata.number_format[0].national_prefix_formatting_rule(),
            "0$1"
        );
    }

    #[test]
    fn formatting_rules_are_expanded() {
        let mut metadata = region("AU", 61, "\\d{9}");
        metadata.set_national_prefix("0".to_owned());
        metadata.set_national_prefix_formatting_rule("$NP$FG".to_owned());
        let mut inherits = NumberFormat::new();
        inherits.set_pattern("(\\d)(\\d{4})(\\d{4})".to_owned());
        inherits.set_format("$1 $2 $3".to_owned());
        let mut own_rule = inherits.clone();
        own_rule.set_national_prefix_formatting_rule("($NP$FG)".to_owned());
        let mut first_group_only = inherits.clone();
        first_group_only.set_national_prefix_formatting_rule("$FG".to_owned());
        metadata.number_format = vec![inherits, own_rule, first_group_only];

        let mut without_prefix = region("IT", 39, "\\d{10}");
        let mut it_format = NumberFormat::new();
        it_format.set_pattern("(\\d{2})(\\d{8})".to_owned());
        it_format.set_format("$1 $2".to_owned());
        it_format.set_national_prefix_formatting_rule("$NP $FG".to_owned());
        without_prefix.number_format = vec![it_format];

        let store =
            MetadataStore::from_collection(collection(vec![metadata, without_prefix])).unwrap();
        let rules = store
            .lookup("AU")
            .unwrap()
            .number_format
            .iter()
            .map(|format| format.national_prefix_formatting_rule())
            .collect::<Vec<_>>();
        assert_eq!(rules, ["0$1", "(0$1)", "$1"]);
        assert!(!store.lookup("IT").unwrap().number_format[0].has_national_prefix_formatting_rule());
    }

    #[test]
    fn same_mobile_and_fixed_line_pattern_is_derived() {
        let mut metadata = region("US", 1, "\\d{10}");
        metadata
            .fixed_line
            .mut_or_insert_default()
            .set_national_number_pattern("[2-9]\\d{9}".to_owned());
        metadata
            .mobile
            .mut_or_insert_default()
            .set_national_number_pattern("[2-9]\\d{9}".to_owned());
        let store = MetadataStore::from_collection(collection(vec![
            metadata,
            region("GB", 44, "\\d{10}"),
        ]))
        .unwrap();
        assert!(store.lookup("US").unwrap().same_mobile_and_fixed_line_pattern());
        assert!(!store.lookup("GB").unwrap().same_mobile_and_fixed_line_pattern());
    }
}
