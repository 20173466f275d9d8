mod region_code;

use crate::PhoneNumberUtil;

static ONCE: std::sync::Once = std::sync::Once::new();

fn get_phone_util() -> PhoneNumberUtil {
    ONCE.call_once(|| {
        colog::default_builder()
            .filter_level(log::LevelFilter::Trace)
            .init()
    });
    PhoneNumberUtil::try_new().expect("Compiled-in metadata should be valid")
}
