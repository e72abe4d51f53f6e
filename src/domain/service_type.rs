use {
    serde::{Deserialize, Serialize},
    strum_macros::{Display, EnumIter, EnumString},
};

/// Transport mode. Only changes the icon of the "in transit" step and the fee quote.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ServiceType {
    #[default]
    Ground,
    Air,
    Ocean,
    // Service levels written by the admin panel variant
    Standard,
    Express,
    Overnight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("AIR".parse::<ServiceType>().ok(), Some(ServiceType::Air));
        assert_eq!("ocean".parse::<ServiceType>().ok(), Some(ServiceType::Ocean));
        assert!("teleport".parse::<ServiceType>().is_err());
        assert_eq!(ServiceType::Express.to_string(), "express");
    }
}
