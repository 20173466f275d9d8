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

use strum::{Display, EnumIter, EnumString};

/// Defines the various standardized formats for representing phone numbers.
///
/// `INTERNATIONAL` and `NATIONAL` formats align with the ITU-T E.123 recommendation,
/// but use local conventions like hyphens (-) instead of spaces for separators.
///
/// For example, the Google Switzerland office number would be:
/// - **INTERNATIONAL**: `+41 44 668 1800`
/// - **NATIONAL**: `044 668 18 00`
/// - **E164**: `+41446681800` (international format without formatting)
/// - **RFC3966**: `tel:+41-44-668-18-00` (hyphen-separated with a "tel:" prefix)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhoneNumberFormat {
    /// `+` followed by the country code and the national significant number,
    /// without any separator. The extension is never part of this format.
    E164,
    /// Country code and grouped national number, e.g. `+41 44 668 18 00`.
    International,
    /// Grouped national number with the national prefix, e.g. `044 668 18 00`.
    National,
    /// `tel:` URI with hyphen separators and an optional `;ext=` suffix.
    RFC3966,
}

/// Categorizes phone numbers based on their primary use.
///
/// The `Display` and `FromStr` forms are the snake-case names hosts use in
/// validation constraints (`fixed_line`, `toll_free`, `voip`, ...).
#[derive(Debug, EnumIter, EnumString, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum PhoneNumberType {
    /// **Fixed-line numbers.**
    /// These are traditional landline telephone numbers tied to a specific geographic location.
    FixedLine,
    /// **Mobile numbers.**
    /// These numbers are assigned to wireless devices like mobile phones.
    Mobile,
    /// **Fixed-line or mobile.**
    /// Used in regions (e.g., the USA) where it's impossible to distinguish between
    /// fixed-line and mobile numbers by looking at the phone number itself.
    FixedLineOrMobile,
    /// **Toll-free numbers.**
    /// Calls to these numbers are free for the caller, with the cost being paid by the recipient.
    TollFree,
    /// **Premium-rate numbers.**
    /// These numbers charge a higher rate than normal calls.
    PremiumRate,
    /// **Shared-cost numbers.**
    /// The cost of the call is split between the caller and the recipient.
    SharedCost,
    /// **Voice over IP (VoIP) numbers.**
    #[strum(to_string = "voip")]
    VoIP,
    /// **Personal numbers.**
    /// A number associated with a person, not a location or device.
    PersonalNumber,
    /// **Pagers.**
    Pager,
    /// **Universal Access Numbers (UAN).**
    /// A single number that a company can use to route calls to different offices.
    #[strum(to_string = "uan")]
    UAN,
    /// **Voicemail access numbers.**
    #[strum(to_string = "voicemail")]
    VoiceMail,
    /// **Unknown type.**
    /// The number does not match any of the known patterns for its region and its type
    /// cannot be determined.
    Unknown,
}

/// Represents the possible outcomes when checking if a phone number's length is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberLengthType {
    /// **The length is valid for a dialable number.**
    IsPossible,
    /// **The length is valid for a local-only number.**
    /// The number is too short for a full national number but can be dialed
    /// within a specific local area (e.g., without the area code).
    IsPossibleLocalOnly,
}

/// Where the country calling code of a parsed number came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountryCodeSource {
    /// The input started with a plus sign.
    FromNumberWithPlusSign,
    /// The input started with an international dialling prefix such as `00` or `011`.
    FromNumberWithIdd,
    /// The input started with the country code of the default region, without
    /// a plus sign or IDD.
    FromNumberWithoutPlusSign,
    /// The country code was taken from the default region.
    FromDefaultCountry,
}
