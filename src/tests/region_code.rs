pub struct RegionCode {}

#[allow(unused)]
impl RegionCode {
    pub fn au() -> &'static str {
        "AU"
    }

    pub fn ca() -> &'static str {
        "CA"
    }

    pub fn ch() -> &'static str {
        "CH"
    }

    pub fn fr() -> &'static str {
        "FR"
    }

    pub fn gb() -> &'static str {
        "GB"
    }

    pub fn it() -> &'static str {
        "IT"
    }

    pub fn us() -> &'static str {
        "US"
    }

    pub fn un001() -> &'static str {
        "001"
    }

    /// Region with no metadata in the table.
    pub fn de() -> &'static str {
        "DE"
    }

    pub fn zz() -> &'static str {
        "ZZ"
    }
}
