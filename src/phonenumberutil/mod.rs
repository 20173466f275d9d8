mod helper_constants;
mod helper_functions;
mod helper_types;
mod phone_number_regexps_and_mappings;
pub mod enums;
pub mod errors;
pub mod metadata_store;
pub mod phone_number;
pub mod phonenumberutil;

use std::sync::LazyLock;

pub use enums::{CountryCodeSource, NumberLengthType, PhoneNumberFormat, PhoneNumberType};
pub use metadata_store::MetadataStore;
pub use phone_number::PhoneNumber;
pub use phonenumberutil::PhoneNumberUtil;

/// Process-wide engine over the compiled-in metadata. The table is parsed and
/// checked on first access; a broken table is fatal.
pub static PHONE_NUMBER_UTIL: LazyLock<PhoneNumberUtil> = LazyLock::new(|| {
    match PhoneNumberUtil::try_new() {
        Ok(util) => util,
        Err(err) => {
            let err_message = format!("Could not load compiled-in metadata: {}", err);
            log::error!("{}", err_message);
            panic!("{}", err_message);
        }
    }
});
