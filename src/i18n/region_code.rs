pub struct RegionCode {
}

impl RegionCode {
    /// Returns a region code string representing the "unknown" region.
    pub fn get_unknown() -> &'static str {
        return Self::zz();
    }

    pub fn zz() -> &'static str {
        return "ZZ";    
    }

    /// Region code used for numbers of non-geographical entities such as
    /// +800 international freephone numbers.
    pub fn un001() -> &'static str {
        return "001";
    }
}
